use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use super::{service::ServiceSummary, user::UserSummary};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
pub enum PurchaseStatus {
    #[default]
    Active,
    Inactive,
    Pending,
    Suspended,
    Cancelled,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
}

impl BillingCycle {
    /// One calendar month or year after `start`. Day-of-month overflow clamps to the
    /// last day of the target month (Jan 31 -> Feb 28/29).
    pub fn next_billing_date(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            BillingCycle::Monthly => start.checked_add_months(Months::new(1)),
            BillingCycle::Yearly => start.checked_add_months(Months::new(12)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user: UserSummary,
    #[serde(rename = "serviceId")]
    pub service: ServiceSummary,
    pub status: PurchaseStatus,
    pub start_date: DateTime<Utc>,
    pub next_billing_date: DateTime<Utc>,
    pub billing_cycle: BillingCycle,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user.id == user_id
    }
}
