use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::{authz::Identity, use_cases::service::ServiceRepo, validators::FieldErrors};
use crate::domain::entities::purchase::{BillingCycle, Purchase, PurchaseStatus};

pub const ALREADY_SUBSCRIBED: &str = "You already have an active subscription for this service";

#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub user_id: Uuid,
    pub service_id: Uuid,
    pub billing_cycle: BillingCycle,
    pub price: f64,
    pub start_date: DateTime<Utc>,
    pub next_billing_date: DateTime<Utc>,
}

#[async_trait]
pub trait PurchaseRepo: Send + Sync {
    /// Fails with `Conflict` if the user already holds an active purchase of the service.
    async fn create_purchase(&self, purchase: NewPurchase) -> AppResult<Purchase>;
    async fn get_purchase(&self, id: Uuid) -> AppResult<Option<Purchase>>;
    async fn has_active_purchase(&self, user_id: Uuid, service_id: Uuid) -> AppResult<bool>;
    /// Newest first. `None` for `user_id` returns every user's purchases.
    async fn list_purchases(
        &self,
        user_id: Option<Uuid>,
        status: Option<PurchaseStatus>,
    ) -> AppResult<Vec<Purchase>>;
    async fn set_purchase_status(
        &self,
        id: Uuid,
        status: PurchaseStatus,
    ) -> AppResult<Option<Purchase>>;
}

/// Body of `POST /purchases`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseInput {
    pub service_id: Option<String>,
    pub billing_cycle: Option<String>,
}

#[derive(Clone)]
pub struct PurchaseUseCases {
    repo: Arc<dyn PurchaseRepo>,
    services: Arc<dyn ServiceRepo>,
}

impl PurchaseUseCases {
    pub fn new(repo: Arc<dyn PurchaseRepo>, services: Arc<dyn ServiceRepo>) -> Self {
        Self { repo, services }
    }

    #[instrument(skip(self))]
    pub async fn purchase(&self, identity: &Identity, input: PurchaseInput) -> AppResult<Purchase> {
        let mut errors = FieldErrors::new();
        let service_id = errors
            .required("serviceId", input.service_id.as_deref(), "Service ID is required")
            .and_then(|raw| match Uuid::parse_str(&raw) {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("serviceId", "Invalid ID format");
                    None
                }
            });
        let billing_cycle: Option<BillingCycle> = errors.parse_enum(
            "billingCycle",
            input.billing_cycle.as_deref(),
            "Invalid billing cycle",
        );
        errors.into_result()?;
        let service_id = service_id.unwrap_or_default();
        let billing_cycle = billing_cycle.unwrap_or_default();

        let service = self
            .services
            .get_service(service_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Service not found".into()))?;

        if self
            .repo
            .has_active_purchase(identity.user_id, service.id)
            .await?
        {
            return Err(AppError::Conflict(ALREADY_SUBSCRIBED.into()));
        }

        let start_date = Utc::now();
        let next_billing_date = billing_cycle
            .next_billing_date(start_date)
            .ok_or_else(|| AppError::Internal("next billing date out of range".into()))?;

        let purchase = self
            .repo
            .create_purchase(NewPurchase {
                user_id: identity.user_id,
                service_id: service.id,
                billing_cycle,
                price: service.price,
                start_date,
                next_billing_date,
            })
            .await?;

        tracing::info!(
            purchase_id = %purchase.id,
            service_id = %service.id,
            billing_cycle = %billing_cycle,
            "service purchased"
        );
        Ok(purchase)
    }

    #[instrument(skip(self))]
    pub async fn list_mine(
        &self,
        identity: &Identity,
        status: Option<PurchaseStatus>,
    ) -> AppResult<Vec<Purchase>> {
        self.repo.list_purchases(Some(identity.user_id), status).await
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self, identity: &Identity) -> AppResult<Vec<Purchase>> {
        identity.require_admin()?;
        self.repo.list_purchases(None, None).await
    }

    /// Cancels one of the caller's own purchases. The record is kept.
    #[instrument(skip(self))]
    pub async fn cancel(&self, identity: &Identity, id: Uuid) -> AppResult<Purchase> {
        let purchase = self
            .repo
            .get_purchase(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase not found".into()))?;

        if !purchase.is_owned_by(identity.user_id) {
            return Err(AppError::Forbidden(
                "Not authorized to cancel this purchase".into(),
            ));
        }

        self.repo
            .set_purchase_status(id, PurchaseStatus::Cancelled)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase not found".into()))
    }
}
