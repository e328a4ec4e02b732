use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppError,
    application::authz::Identity,
};

/// Identity of the bearer-token holder. Rejects with 401 when the token is missing,
/// invalid, expired, or names a user that no longer exists.
pub struct AuthUser(pub Identity);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        app_state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, app_state)
                .await
                .map_err(|_| AppError::Unauthenticated("Not authorized, no token".into()))?;

        let identity = app_state
            .auth_use_cases
            .authenticate(bearer.token())
            .await?;
        tracing::debug!(user_id = %identity.user_id, role = %identity.role, "Authenticated request");
        Ok(AuthUser(identity))
    }
}

/// An [`AuthUser`] whose role is admin; 403 otherwise.
pub struct AdminUser(pub Identity);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        app_state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, app_state).await?;
        identity.require_admin()?;
        Ok(AdminUser(identity))
    }
}
