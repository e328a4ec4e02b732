use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use super::user::UserSummary;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
pub enum PlanType {
    #[default]
    Basic,
    Pro,
    Premium,
    Enterprise,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Inactive,
    Pending,
    Suspended,
}

impl SubscriptionStatus {
    /// Statuses counted as churned on the dashboard.
    pub fn is_churned(&self) -> bool {
        matches!(self, SubscriptionStatus::Inactive | SubscriptionStatus::Suspended)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: String,
    pub contact_number: String,
    pub plan_type: PlanType,
    pub subscription_status: SubscriptionStatus,
    pub address: Option<String>,
    pub created_by: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
