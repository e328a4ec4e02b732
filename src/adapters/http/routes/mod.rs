pub mod analytics;
pub mod auth;
pub mod chat;
pub mod clients;
pub mod purchases;
pub mod services;
pub mod tickets;
pub mod users;

use axum::{Json, Router, response::IntoResponse};
use serde_json::json;

use crate::{adapters::http::app_state::AppState, app_error::AppError};

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/clients", clients::router())
        .nest("/services", services::router())
        .nest("/tickets", tickets::router())
        .nest("/purchases", purchases::router())
        .nest("/analytics", analytics::router())
        .nest("/chat", chat::router())
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "success": true, "message": "TechSphere API is running" }))
}

pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".into())
}
