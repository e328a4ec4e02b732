use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use time::Duration;
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::{authz::Identity, jwt, validators::FieldErrors};
use crate::domain::entities::user::{NotificationPreferences, Role, User};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// A user together with the stored password hash. Never leaves the application layer.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    pub password_hash: String,
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn get_credentials(&self, id: Uuid) -> AppResult<Option<Credentials>>;
    async fn get_credentials_by_email(&self, email: &str) -> AppResult<Option<Credentials>>;
    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<String>,
        email: Option<String>,
    ) -> AppResult<Option<User>>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()>;
    async fn update_notifications(
        &self,
        id: Uuid,
        notifications: NotificationPreferences,
    ) -> AppResult<Option<User>>;
    async fn delete_user(&self, id: Uuid) -> AppResult<bool>;
    async fn list_users(&self) -> AppResult<Vec<User>>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsInput {
    pub email: Option<bool>,
    pub push: Option<bool>,
    pub weekly_reports: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteAccountInput {
    pub password: Option<String>,
}

/// Result of a successful register or login.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthUseCases {
    repo: Arc<dyn UserRepo>,
    jwt_secret: SecretString,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthUseCases {
    pub fn new(
        repo: Arc<dyn UserRepo>,
        jwt_secret: SecretString,
        token_ttl: Duration,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            repo,
            jwt_secret,
            token_ttl,
            bcrypt_cost,
        }
    }

    #[instrument(skip(self, input))]
    pub async fn register(&self, input: RegisterInput) -> AppResult<AuthSession> {
        let mut errors = FieldErrors::new();
        let name = errors.required("name", input.name.as_deref(), "Name is required");
        let email = errors.required(
            "email",
            input.email.as_deref(),
            "Please provide a valid email",
        );
        let email = errors.email("email", email, "Please provide a valid email");
        check_password(&mut errors, "password", input.password.as_deref(), "Password must be at least 6 characters");
        let role: Option<Role> = errors.parse_enum("role", input.role.as_deref(), "Invalid role");
        errors.into_result()?;

        let (Some(name), Some(email), Some(password)) = (name, email, input.password) else {
            return Err(AppError::Internal("validated registration is missing fields".into()));
        };

        if self.repo.get_credentials_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".into()));
        }

        let password_hash = self.hash_password(password).await?;
        let user = self
            .repo
            .create_user(NewUser {
                name,
                email,
                password_hash,
                role: role.unwrap_or_default(),
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        let token = self.issue_token(user.id)?;
        Ok(AuthSession { user, token })
    }

    #[instrument(skip(self, input))]
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthSession> {
        let mut errors = FieldErrors::new();
        let email = errors.required(
            "email",
            input.email.as_deref(),
            "Please provide a valid email",
        );
        let email = errors.email("email", email, "Please provide a valid email");
        errors.required("password", input.password.as_deref(), "Password is required");
        errors.into_result()?;

        let (Some(email), Some(password)) = (email, input.password) else {
            return Err(AppError::Internal("validated login is missing fields".into()));
        };

        let invalid = || AppError::Unauthenticated("Invalid email or password".into());
        let credentials = self
            .repo
            .get_credentials_by_email(&email)
            .await?
            .ok_or_else(invalid)?;

        if !self
            .verify_password(password, credentials.password_hash.clone())
            .await?
        {
            return Err(invalid());
        }

        let token = self.issue_token(credentials.user.id)?;
        Ok(AuthSession {
            user: credentials.user,
            token,
        })
    }

    /// Resolves a bearer token to the identity of a user that still exists.
    #[instrument(skip(self, token))]
    pub async fn authenticate(&self, token: &str) -> AppResult<Identity> {
        let claims = jwt::verify(token, &self.jwt_secret)?;
        let user_id = claims.user_id()?;
        let user = self
            .repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("Not authorized, user not found".into()))?;
        Ok(Identity::new(user.id, user.role))
    }

    #[instrument(skip(self))]
    pub async fn profile(&self, identity: &Identity) -> AppResult<User> {
        self.repo
            .get_user(identity.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    #[instrument(skip(self, input))]
    pub async fn update_profile(&self, identity: &Identity, input: ProfileInput) -> AppResult<User> {
        let mut errors = FieldErrors::new();
        let name = errors.non_blank("name", input.name.as_deref(), "Name cannot be empty");
        let email = errors.non_blank(
            "email",
            input.email.as_deref(),
            "Please provide a valid email",
        );
        let email = errors.email("email", email, "Please provide a valid email");
        errors.into_result()?;

        if let Some(email) = email.as_deref() {
            let taken = self
                .repo
                .get_credentials_by_email(email)
                .await?
                .is_some_and(|c| c.user.id != identity.user_id);
            if taken {
                return Err(AppError::Conflict("Email is already in use".into()));
            }
        }

        self.repo
            .update_profile(identity.user_id, name, email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    #[instrument(skip(self, input))]
    pub async fn change_password(&self, identity: &Identity, input: ChangePasswordInput) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        errors.required(
            "currentPassword",
            input.current_password.as_deref(),
            "Current password is required",
        );
        check_password(
            &mut errors,
            "newPassword",
            input.new_password.as_deref(),
            "New password must be at least 6 characters",
        );
        errors.into_result()?;

        let (Some(current), Some(new)) = (input.current_password, input.new_password) else {
            return Err(AppError::Internal("validated password change is missing fields".into()));
        };

        let credentials = self.credentials(identity.user_id).await?;
        if !self.verify_password(current, credentials.password_hash).await? {
            return Err(AppError::Unauthenticated("Current password is incorrect".into()));
        }

        let password_hash = self.hash_password(new).await?;
        self.repo.update_password(identity.user_id, &password_hash).await
    }

    #[instrument(skip(self))]
    pub async fn update_notifications(
        &self,
        identity: &Identity,
        input: NotificationsInput,
    ) -> AppResult<User> {
        let user = self.profile(identity).await?;
        let mut prefs = user.notifications;
        if let Some(email) = input.email {
            prefs.email = email;
        }
        if let Some(push) = input.push {
            prefs.push = push;
        }
        if let Some(weekly) = input.weekly_reports {
            prefs.weekly_reports = weekly;
        }

        self.repo
            .update_notifications(identity.user_id, prefs)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    #[instrument(skip(self, input))]
    pub async fn delete_account(&self, identity: &Identity, input: DeleteAccountInput) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        errors.required(
            "password",
            input.password.as_deref(),
            "Password is required to delete account",
        );
        errors.into_result()?;

        let credentials = self.credentials(identity.user_id).await?;
        if !self
            .verify_password(input.password.unwrap_or_default(), credentials.password_hash)
            .await?
        {
            return Err(AppError::Unauthenticated("Password is incorrect".into()));
        }

        self.repo.delete_user(identity.user_id).await?;
        tracing::info!(user_id = %identity.user_id, "account deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self, identity: &Identity) -> AppResult<Vec<User>> {
        identity.require_admin()?;
        self.repo.list_users().await
    }

    async fn credentials(&self, user_id: Uuid) -> AppResult<Credentials> {
        self.repo
            .get_credentials(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    fn issue_token(&self, user_id: Uuid) -> AppResult<String> {
        jwt::issue(user_id, &self.jwt_secret, self.token_ttl)
    }

    async fn hash_password(&self, password: String) -> AppResult<String> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    async fn verify_password(&self, password: String, hash: String) -> AppResult<bool> {
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}

fn check_password(errors: &mut FieldErrors, field: &str, value: Option<&str>, message: &str) {
    if value.is_none_or(|p| p.chars().count() < MIN_PASSWORD_LEN) {
        errors.add(field, message);
    }
}
