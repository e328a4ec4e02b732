use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::{
    authz::Identity,
    pagination::{PageRequest, Paged},
    validators::FieldErrors,
};
use crate::domain::entities::service::{DEFAULT_SERVICE_ICON, Service, ServiceCategory};

pub const SERVICE_HAS_PURCHASES: &str = "Service has purchases and cannot be deleted";

#[derive(Debug, Clone)]
pub struct NewService {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: ServiceCategory,
    pub active_status: bool,
    pub features: Vec<String>,
    pub icon: String,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<ServiceCategory>,
    pub active_status: Option<bool>,
    pub features: Option<Vec<String>>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceFilter {
    /// Case-insensitive substring over name and description.
    pub search: Option<String>,
    pub category: Option<ServiceCategory>,
    pub active: Option<bool>,
}

#[async_trait]
pub trait ServiceRepo: Send + Sync {
    async fn create_service(&self, service: NewService) -> AppResult<Service>;
    async fn get_service(&self, id: Uuid) -> AppResult<Option<Service>>;
    async fn list_services(
        &self,
        filter: &ServiceFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Service>, i64)>;
    async fn update_service(&self, id: Uuid, patch: ServicePatch) -> AppResult<Option<Service>>;
    /// Removes the service and its purchases.
    async fn delete_service(&self, id: Uuid) -> AppResult<bool>;
}

/// Body of `POST /services` and `PUT /services/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub active_status: Option<bool>,
    pub features: Option<Vec<String>>,
    pub icon: Option<String>,
}

impl ServiceInput {
    fn validate(&self, creating: bool) -> AppResult<ServicePatch> {
        let mut errors = FieldErrors::new();

        let name = errors.text("name", self.name.as_deref(), creating, "Service name is required");
        errors.max_chars("name", name.as_deref(), 100, "Name cannot exceed 100 characters");

        let description = errors.text(
            "description",
            self.description.as_deref(),
            creating,
            "Description is required",
        );
        errors.max_chars(
            "description",
            description.as_deref(),
            500,
            "Description cannot exceed 500 characters",
        );

        match self.price {
            None if creating => errors.add("price", "Price must be a number"),
            Some(p) if !p.is_finite() => errors.add("price", "Price must be a number"),
            Some(p) if p < 0.0 => errors.add("price", "Price cannot be negative"),
            _ => {}
        }

        let category = errors.parse_enum("category", self.category.as_deref(), "Invalid category");

        let icon = errors.non_blank("icon", self.icon.as_deref(), "Icon cannot be empty");

        errors.into_result()?;

        Ok(ServicePatch {
            name,
            description,
            price: self.price,
            category,
            active_status: self.active_status,
            features: self.features.as_ref().map(|f| clean_features(f)),
            icon,
        })
    }
}

fn clean_features(features: &[String]) -> Vec<String> {
    features
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone)]
pub struct ServiceUseCases {
    repo: Arc<dyn ServiceRepo>,
}

impl ServiceUseCases {
    pub fn new(repo: Arc<dyn ServiceRepo>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, identity: &Identity, input: ServiceInput) -> AppResult<Service> {
        identity.require_admin()?;
        let patch = input.validate(true)?;

        let (Some(name), Some(description), Some(price)) = (patch.name, patch.description, patch.price)
        else {
            return Err(AppError::Internal("validated service is missing fields".into()));
        };

        self.repo
            .create_service(NewService {
                name,
                description,
                price,
                category: patch.category.unwrap_or_default(),
                active_status: patch.active_status.unwrap_or(true),
                features: patch.features.unwrap_or_default(),
                icon: patch.icon.unwrap_or_else(|| DEFAULT_SERVICE_ICON.to_string()),
                created_by: identity.user_id,
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: ServiceFilter, page: PageRequest) -> AppResult<Paged<Service>> {
        let (records, total) = self.repo.list_services(&filter, page).await?;
        Ok(Paged::new(records, total, page))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> AppResult<Service> {
        self.repo
            .get_service(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Service not found".into()))
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, identity: &Identity, id: Uuid, input: ServiceInput) -> AppResult<Service> {
        identity.require_admin()?;
        let patch = input.validate(false)?;
        self.repo
            .update_service(id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound("Service not found".into()))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, identity: &Identity, id: Uuid) -> AppResult<()> {
        identity.require_admin()?;
        if self.repo.delete_service(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Service not found".into()))
        }
    }
}
