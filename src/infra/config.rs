use std::net::{Ipv4Addr, SocketAddr};

use axum::http::HeaderValue;
use env_helpers::get_env_default;
use secrecy::SecretString;
use time::Duration;
use url::Url;

use crate::infra::error::InfraError;

pub const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: SecretString,
    pub access_token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<HeaderValue>,
    /// Empty when unset; chat requests then fail upstream and enrichments fall back.
    pub gemini_api_key: SecretString,
    pub gemini_api_url: Url,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = SecretString::from(required("JWT_SECRET")?);

        let db_max_connections: u32 = get_env_default("DB_MAX_CONNECTIONS", 5);
        let access_token_ttl_secs: i64 = get_env_default("ACCESS_TOKEN_TTL_SECS", 7 * 86_400);
        let bcrypt_cost: u32 = get_env_default("BCRYPT_COST", bcrypt::DEFAULT_COST);
        let bind_addr: SocketAddr = get_env_default(
            "BIND_ADDR",
            SocketAddr::from((Ipv4Addr::LOCALHOST, 5000)),
        );

        let cors_origins = parse_origins(&get_env_default(
            "CORS_ORIGINS",
            String::from("http://localhost:5173"),
        ))?;

        let gemini_api_key = SecretString::from(get_env_default("GEMINI_API_KEY", String::new()));
        let gemini_api_url = Url::parse(&get_env_default(
            "GEMINI_API_URL",
            DEFAULT_GEMINI_API_URL.to_string(),
        ))
        .map_err(|_| InfraError::ConfigInvalid {
            var: "GEMINI_API_URL",
        })?;

        Ok(Self {
            database_url,
            db_max_connections,
            jwt_secret,
            access_token_ttl: Duration::seconds(access_token_ttl_secs),
            bcrypt_cost,
            bind_addr,
            cors_origins,
            gemini_api_key,
            gemini_api_url,
        })
    }
}

fn required(var: &'static str) -> Result<String, InfraError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(InfraError::ConfigMissing { var })
}

/// Splits a comma-separated origin list, skipping blanks.
fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, InfraError> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            origin.parse().map_err(|_| InfraError::ConfigInvalid {
                var: "CORS_ORIGINS",
            })
        })
        .collect()
}
