use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{delete, get, post, put},
};

use crate::{
    adapters::http::{
        app_state::AppState,
        envelope::{self, keyed},
        extract::JsonBody,
        middleware::AuthUser,
    },
    app_error::AppResult,
    use_cases::user::{
        ChangePasswordInput, DeleteAccountInput, LoginInput, NotificationsInput, ProfileInput,
        RegisterInput,
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(get_profile))
        .route("/profile", put(update_profile))
        .route("/change-password", put(change_password))
        .route("/notifications", put(update_notifications))
        .route("/account", delete(delete_account))
}

async fn register(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterInput>,
) -> AppResult<impl IntoResponse> {
    let session = app_state.auth_use_cases.register(payload).await?;
    Ok(envelope::created("User registered successfully", session))
}

async fn login(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<LoginInput>,
) -> AppResult<impl IntoResponse> {
    let session = app_state.auth_use_cases.login(payload).await?;
    Ok(envelope::ok_with("Login successful", session))
}

async fn get_profile(
    State(app_state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> AppResult<impl IntoResponse> {
    let user = app_state.auth_use_cases.profile(&identity).await?;
    Ok(envelope::ok(keyed("user", user)))
}

async fn update_profile(
    State(app_state): State<AppState>,
    AuthUser(identity): AuthUser,
    JsonBody(payload): JsonBody<ProfileInput>,
) -> AppResult<impl IntoResponse> {
    let user = app_state
        .auth_use_cases
        .update_profile(&identity, payload)
        .await?;
    Ok(envelope::ok_with("Profile updated successfully", keyed("user", user)))
}

async fn change_password(
    State(app_state): State<AppState>,
    AuthUser(identity): AuthUser,
    JsonBody(payload): JsonBody<ChangePasswordInput>,
) -> AppResult<impl IntoResponse> {
    app_state
        .auth_use_cases
        .change_password(&identity, payload)
        .await?;
    Ok(envelope::done("Password changed successfully"))
}

async fn update_notifications(
    State(app_state): State<AppState>,
    AuthUser(identity): AuthUser,
    JsonBody(payload): JsonBody<NotificationsInput>,
) -> AppResult<impl IntoResponse> {
    let user = app_state
        .auth_use_cases
        .update_notifications(&identity, payload)
        .await?;
    Ok(envelope::ok_with(
        "Notification preferences updated",
        keyed("user", user),
    ))
}

async fn delete_account(
    State(app_state): State<AppState>,
    AuthUser(identity): AuthUser,
    JsonBody(payload): JsonBody<DeleteAccountInput>,
) -> AppResult<impl IntoResponse> {
    app_state
        .auth_use_cases
        .delete_account(&identity, payload)
        .await?;
    Ok(envelope::done("Account deleted successfully"))
}
