use async_trait::async_trait;
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, enum_column, parse_json_with_fallback},
    app_error::{AppError, AppResult},
    domain::entities::user::{NotificationPreferences, User},
    use_cases::user::{Credentials, NewUser, UserRepo},
};

const USER_COLUMNS: &str =
    "id, name, email, role, notifications, password_hash, created_at, updated_at";

fn row_to_user(row: &PgRow) -> AppResult<User> {
    let id: Uuid = row.get("id");
    let notifications: serde_json::Value = row.get("notifications");
    Ok(User {
        id,
        name: row.get("name"),
        email: row.get("email"),
        role: enum_column(row, "role")?,
        notifications: parse_json_with_fallback(
            &notifications,
            "notifications",
            "user",
            &id.to_string(),
        ),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_credentials(row: PgRow) -> AppResult<Credentials> {
    Ok(Credentials {
        user: row_to_user(&row)?,
        password_hash: row.get("password_hash"),
    })
}

fn notifications_json(prefs: &NotificationPreferences) -> AppResult<serde_json::Value> {
    serde_json::to_value(prefs).map_err(|e| AppError::Internal(e.to_string()))
}

#[async_trait]
impl UserRepo for PostgresPersistence {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, notifications)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_ref())
        .bind(notifications_json(&NotificationPreferences::default())?)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        row_to_user(&row)
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_credentials(&self, id: Uuid) -> AppResult<Option<Credentials>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        row.map(row_to_credentials).transpose()
    }

    async fn get_credentials_by_email(&self, email: &str) -> AppResult<Option<Credentials>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        row.map(row_to_credentials).transpose()
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<String>,
        email: Option<String>,
    ) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }
        Ok(())
    }

    async fn update_notifications(
        &self,
        id: Uuid,
        notifications: NotificationPreferences,
    ) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET notifications = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(notifications_json(&notifications)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        rows.iter().map(row_to_user).collect()
    }
}
