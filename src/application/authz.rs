use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::domain::entities::user::Role;

/// The authenticated caller attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Client => false,
        }
    }

    pub fn require_role(&self, allowed: &[Role]) -> AppResult<()> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "User role {} is not authorized to access this route",
                self.role
            )))
        }
    }

    pub fn require_admin(&self) -> AppResult<()> {
        self.require_role(&[Role::Admin])
    }

    /// Owner-or-admin check for records that belong to a user.
    pub fn can_access(&self, owner_id: Uuid) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Client => self.user_id == owner_id,
        }
    }

    /// `None` for admins, the caller's id otherwise. Used to scope list queries.
    pub fn owner_scope(&self) -> Option<Uuid> {
        match self.role {
            Role::Admin => None,
            Role::Client => Some(self.user_id),
        }
    }
}
