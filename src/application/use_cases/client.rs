use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::{
    authz::Identity,
    pagination::{PageRequest, Paged},
    validators::{FieldErrors, is_valid_contact_number},
};
use crate::domain::entities::client::{Client, PlanType, SubscriptionStatus};

#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub company: String,
    pub contact_number: String,
    pub plan_type: PlanType,
    pub subscription_status: SubscriptionStatus,
    pub address: Option<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub contact_number: Option<String>,
    pub plan_type: Option<PlanType>,
    pub subscription_status: Option<SubscriptionStatus>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ClientFilter {
    /// Case-insensitive substring over name, email and company.
    pub search: Option<String>,
    pub status: Option<SubscriptionStatus>,
}

#[async_trait]
pub trait ClientRepo: Send + Sync {
    async fn create_client(&self, client: NewClient) -> AppResult<Client>;
    async fn get_client(&self, id: Uuid) -> AppResult<Option<Client>>;
    async fn list_clients(
        &self,
        filter: &ClientFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Client>, i64)>;
    async fn update_client(&self, id: Uuid, patch: ClientPatch) -> AppResult<Option<Client>>;
    async fn delete_client(&self, id: Uuid) -> AppResult<bool>;
}

/// Body of `POST /clients` and `PUT /clients/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub contact_number: Option<String>,
    pub plan_type: Option<String>,
    pub subscription_status: Option<String>,
    pub address: Option<String>,
}

impl ClientInput {
    fn validate(&self, creating: bool) -> AppResult<ClientPatch> {
        let mut errors = FieldErrors::new();

        let name = errors.text("name", self.name.as_deref(), creating, "Client name is required");
        errors.max_chars("name", name.as_deref(), 100, "Name cannot exceed 100 characters");

        let email = errors.text(
            "email",
            self.email.as_deref(),
            creating,
            "Please provide a valid email",
        );
        let email = errors.email("email", email, "Please provide a valid email");

        let company = errors.text(
            "company",
            self.company.as_deref(),
            creating,
            "Company name is required",
        );

        let contact_number = errors.text(
            "contactNumber",
            self.contact_number.as_deref(),
            creating,
            "Please provide a valid contact number",
        );
        if contact_number
            .as_deref()
            .is_some_and(|n| !is_valid_contact_number(n))
        {
            errors.add("contactNumber", "Please provide a valid contact number");
        }

        let plan_type = errors.parse_enum("planType", self.plan_type.as_deref(), "Invalid plan type");
        let subscription_status = errors.parse_enum(
            "subscriptionStatus",
            self.subscription_status.as_deref(),
            "Invalid subscription status",
        );

        errors.into_result()?;

        Ok(ClientPatch {
            name,
            email,
            company,
            contact_number,
            plan_type,
            subscription_status,
            address: self.address.as_deref().map(|a| a.trim().to_string()),
        })
    }
}

#[derive(Clone)]
pub struct ClientUseCases {
    repo: Arc<dyn ClientRepo>,
}

impl ClientUseCases {
    pub fn new(repo: Arc<dyn ClientRepo>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, identity: &Identity, input: ClientInput) -> AppResult<Client> {
        identity.require_admin()?;
        let patch = input.validate(true)?;

        let (Some(name), Some(email), Some(company), Some(contact_number)) =
            (patch.name, patch.email, patch.company, patch.contact_number)
        else {
            return Err(AppError::Internal("validated client is missing fields".into()));
        };

        self.repo
            .create_client(NewClient {
                name,
                email,
                company,
                contact_number,
                plan_type: patch.plan_type.unwrap_or_default(),
                subscription_status: patch.subscription_status.unwrap_or_default(),
                address: patch.address.filter(|a| !a.is_empty()),
                created_by: identity.user_id,
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: ClientFilter, page: PageRequest) -> AppResult<Paged<Client>> {
        let (records, total) = self.repo.list_clients(&filter, page).await?;
        Ok(Paged::new(records, total, page))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> AppResult<Client> {
        self.repo
            .get_client(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Client not found".into()))
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, identity: &Identity, id: Uuid, input: ClientInput) -> AppResult<Client> {
        identity.require_admin()?;
        let patch = input.validate(false)?;
        self.repo
            .update_client(id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound("Client not found".into()))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, identity: &Identity, id: Uuid) -> AppResult<()> {
        identity.require_admin()?;
        if self.repo.delete_client(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Client not found".into()))
        }
    }
}
