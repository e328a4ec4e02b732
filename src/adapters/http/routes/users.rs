use axum::{Router, extract::State, response::IntoResponse, routing::get};

use crate::{
    adapters::http::{
        app_state::AppState,
        envelope::{self, keyed},
        middleware::AdminUser,
    },
    app_error::AppResult,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_users))
}

/// Assignment picker for the ticket screen.
async fn list_users(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
) -> AppResult<impl IntoResponse> {
    let users = app_state.auth_use_cases.list_users(&identity).await?;
    Ok(envelope::ok(keyed("users", users)))
}
