use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::{
    authz::Identity,
    pagination::{PageRequest, Paged},
    use_cases::user::UserRepo,
    validators::FieldErrors,
};
use crate::domain::entities::ticket::{
    Ticket, TicketCategory, TicketPriority, TicketStatus, resolution_stamp,
};

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub category: TicketCategory,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct TicketPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TicketPriority>,
    pub status: Option<TicketStatus>,
    pub category: Option<TicketCategory>,
    /// `Some(None)` clears the assignee.
    pub assigned_to: Option<Option<Uuid>>,
    /// Applied only when the stored ticket has no resolution time yet.
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    /// Restricts results to one reporter.
    pub owner: Option<Uuid>,
    /// Case-insensitive substring over title and description.
    pub search: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
}

#[async_trait]
pub trait TicketRepo: Send + Sync {
    async fn create_ticket(&self, ticket: NewTicket) -> AppResult<Ticket>;
    async fn get_ticket(&self, id: Uuid) -> AppResult<Option<Ticket>>;
    async fn list_tickets(
        &self,
        filter: &TicketFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Ticket>, i64)>;
    async fn update_ticket(&self, id: Uuid, patch: TicketPatch) -> AppResult<Option<Ticket>>;
    async fn add_ticket_note(
        &self,
        id: Uuid,
        message: &str,
        added_by: Uuid,
    ) -> AppResult<Option<Ticket>>;
    async fn delete_ticket(&self, id: Uuid) -> AppResult<bool>;
}

/// Body of `POST /tickets`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
}

/// Body of `PUT /tickets/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketUpdateInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub assigned_to: Option<Option<String>>,
}

/// Body of `PUT /tickets/{id}/assign`. A missing or empty assignee unassigns.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignInput {
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteInput {
    pub message: Option<String>,
}

/// Distinguishes an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_core(
    errors: &mut FieldErrors,
    title: Option<&str>,
    description: Option<&str>,
    creating: bool,
) -> (Option<String>, Option<String>) {
    let title = errors.text("title", title, creating, "Ticket title is required");
    errors.max_chars("title", title.as_deref(), 200, "Title cannot exceed 200 characters");

    let description = errors.text("description", description, creating, "Description is required");
    errors.max_chars(
        "description",
        description.as_deref(),
        1000,
        "Description cannot exceed 1000 characters",
    );
    (title, description)
}

fn parse_assignee(errors: &mut FieldErrors, raw: Option<&str>) -> Option<Uuid> {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty())?;
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add("assignedTo", "Invalid assignee");
            None
        }
    }
}

impl TicketInput {
    fn validate(&self, user_id: Uuid) -> AppResult<NewTicket> {
        let mut errors = FieldErrors::new();
        let (title, description) = validate_core(
            &mut errors,
            self.title.as_deref(),
            self.description.as_deref(),
            true,
        );
        let priority = errors.parse_enum("priority", self.priority.as_deref(), "Invalid priority");
        let category = errors.parse_enum("category", self.category.as_deref(), "Invalid category");
        errors.into_result()?;

        let (Some(title), Some(description)) = (title, description) else {
            return Err(AppError::Internal("validated ticket is missing fields".into()));
        };
        Ok(NewTicket {
            title,
            description,
            priority: priority.unwrap_or_default(),
            category: category.unwrap_or_default(),
            user_id,
        })
    }
}

impl TicketUpdateInput {
    fn validate(&self) -> AppResult<TicketPatch> {
        let mut errors = FieldErrors::new();
        let (title, description) = validate_core(
            &mut errors,
            self.title.as_deref(),
            self.description.as_deref(),
            false,
        );
        let priority = errors.parse_enum("priority", self.priority.as_deref(), "Invalid priority");
        let status = errors.parse_enum("status", self.status.as_deref(), "Invalid status");
        let category = errors.parse_enum("category", self.category.as_deref(), "Invalid category");
        let assigned_to = self
            .assigned_to
            .as_ref()
            .map(|raw| parse_assignee(&mut errors, raw.as_deref()));
        errors.into_result()?;

        Ok(TicketPatch {
            title,
            description,
            priority,
            status,
            category,
            assigned_to,
            resolved_at: None,
        })
    }
}

#[derive(Clone)]
pub struct TicketUseCases {
    repo: Arc<dyn TicketRepo>,
    users: Arc<dyn UserRepo>,
}

impl TicketUseCases {
    pub fn new(repo: Arc<dyn TicketRepo>, users: Arc<dyn UserRepo>) -> Self {
        Self { repo, users }
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, identity: &Identity, input: TicketInput) -> AppResult<Ticket> {
        let ticket = input.validate(identity.user_id)?;
        self.repo.create_ticket(ticket).await
    }

    /// Lists tickets visible to the caller. Non-admins only ever see their own.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        identity: &Identity,
        mut filter: TicketFilter,
        page: PageRequest,
    ) -> AppResult<Paged<Ticket>> {
        filter.owner = identity.owner_scope();
        let (records, total) = self.repo.list_tickets(&filter, page).await?;
        Ok(Paged::new(records, total, page))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, identity: &Identity, id: Uuid) -> AppResult<Ticket> {
        let ticket = self.find(id).await?;
        if !identity.can_access(ticket.user.id) {
            return Err(AppError::Forbidden(
                "Not authorized to access this ticket".into(),
            ));
        }
        Ok(ticket)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        identity: &Identity,
        id: Uuid,
        input: TicketUpdateInput,
    ) -> AppResult<Ticket> {
        identity.require_admin()?;
        let mut patch = input.validate()?;
        let current = self.find(id).await?;

        if let Some(Some(assignee)) = patch.assigned_to {
            self.ensure_user_exists(assignee).await?;
        }
        if let Some(status) = patch.status {
            patch.resolved_at = resolution_stamp(current.resolved_at, status, Utc::now())
                .filter(|_| current.resolved_at.is_none());
        }

        self.repo
            .update_ticket(id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket not found".into()))
    }

    /// Assigns (status In Progress) or unassigns (status Open) in one step.
    #[instrument(skip(self, input))]
    pub async fn assign(
        &self,
        identity: &Identity,
        id: Uuid,
        input: AssignInput,
    ) -> AppResult<Ticket> {
        identity.require_admin()?;
        let mut errors = FieldErrors::new();
        let assignee = parse_assignee(&mut errors, input.assigned_to.as_deref());
        errors.into_result()?;

        self.find(id).await?;
        if let Some(assignee) = assignee {
            self.ensure_user_exists(assignee).await?;
        }

        let patch = TicketPatch {
            assigned_to: Some(assignee),
            status: Some(TicketStatus::for_assignment(assignee.is_some())),
            ..Default::default()
        };
        self.repo
            .update_ticket(id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket not found".into()))
    }

    #[instrument(skip(self, input))]
    pub async fn add_note(&self, identity: &Identity, id: Uuid, input: NoteInput) -> AppResult<Ticket> {
        let mut errors = FieldErrors::new();
        let message = errors.required("message", input.message.as_deref(), "Note message is required");
        errors.max_chars("message", message.as_deref(), 1000, "Note cannot exceed 1000 characters");
        errors.into_result()?;
        let message = message.unwrap_or_default();

        let ticket = self.find(id).await?;
        if !identity.can_access(ticket.user.id) {
            return Err(AppError::Forbidden(
                "Not authorized to add notes to this ticket".into(),
            ));
        }

        self.repo
            .add_ticket_note(id, &message, identity.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket not found".into()))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, identity: &Identity, id: Uuid) -> AppResult<()> {
        identity.require_admin()?;
        if self.repo.delete_ticket(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Ticket not found".into()))
        }
    }

    async fn find(&self, id: Uuid) -> AppResult<Ticket> {
        self.repo
            .get_ticket(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket not found".into()))
    }

    async fn ensure_user_exists(&self, user_id: Uuid) -> AppResult<()> {
        match self.users.get_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::invalid("assignedTo", "Assigned user does not exist")),
        }
    }
}
