use std::str::FromStr;

use sqlx::{PgPool, Row, postgres::PgRow};

use crate::app_error::{AppError, AppResult, FieldError};
use crate::application::use_cases::purchase::ALREADY_SUBSCRIBED;
use crate::domain::entities::user::UserSummary;

pub mod analytics;
pub mod client;
pub mod purchase;
pub mod service;
pub mod ticket;
pub mod user;

const MAX_JSON_LOG_LEN: usize = 200;

/// Parse JSON value to target type, logging a warning on failure.
///
/// SQL NULL becomes the default without logging.
pub fn parse_json_with_fallback<T: serde::de::DeserializeOwned + Default>(
    json: &serde_json::Value,
    field_name: &str,
    entity_type: &str,
    entity_id: &str,
) -> T {
    if json.is_null() {
        return T::default();
    }

    serde_json::from_value(json.clone()).unwrap_or_else(|err| {
        let raw_str = json.to_string();
        let truncated = if raw_str.len() > MAX_JSON_LOG_LEN {
            let cut: String = raw_str.chars().take(MAX_JSON_LOG_LEN).collect();
            format!("{cut}...")
        } else {
            raw_str
        };

        tracing::warn!(
            field = field_name,
            entity_type = entity_type,
            entity_id = entity_id,
            raw_json = %truncated,
            error = %err,
            "Failed to parse JSON field, using default value"
        );
        T::default()
    })
}

/// Reads a TEXT column holding one of the closed enum spellings.
pub(crate) fn enum_column<T: FromStr>(row: &PgRow, column: &str) -> AppResult<T> {
    let raw: String = row.try_get(column).map_err(AppError::from)?;
    raw.parse().map_err(|_| {
        tracing::error!(column, value = %raw, "Unrecognised enum value in database");
        AppError::Internal(format!("unrecognised {column} value"))
    })
}

/// Reads the `<prefix>_id/_name/_email` triple produced by a LEFT JOIN on users.
pub(crate) fn user_summary(row: &PgRow, prefix: &str) -> Option<UserSummary> {
    let id = row.get::<Option<uuid::Uuid>, _>(format!("{prefix}_id").as_str())?;
    Some(UserSummary {
        id,
        name: row
            .get::<Option<String>, _>(format!("{prefix}_name").as_str())
            .unwrap_or_default(),
        email: row
            .get::<Option<String>, _>(format!("{prefix}_email").as_str())
            .unwrap_or_default(),
    })
}

/// ILIKE pattern matching `term` as a literal substring.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }
}

fn unique_violation_message(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("users_email_key") => "User already exists",
        Some("clients_email_key") => "Client with this email already exists",
        Some("services_name_key") => "Service with this name already exists",
        Some("purchases_one_active_idx") => ALREADY_SUBSCRIBED,
        _ => "A record with this value already exists",
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    AppError::Conflict(unique_violation_message(db_err.constraint()).into())
                } else if db_err.is_foreign_key_violation() {
                    AppError::Validation(vec![FieldError::new(
                        "id",
                        "Referenced record not found",
                    )])
                } else if db_err.is_check_violation() {
                    AppError::Validation(vec![FieldError::new("price", "Price cannot be negative")])
                } else {
                    tracing::error!(error = ?err, "Database error");
                    AppError::Database("Database operation failed".into())
                }
            }
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}
