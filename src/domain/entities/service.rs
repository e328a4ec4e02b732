use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use super::user::UserSummary;

pub const DEFAULT_SERVICE_ICON: &str = "server";

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
pub enum ServiceCategory {
    #[serde(rename = "Cloud Hosting")]
    #[strum(serialize = "Cloud Hosting")]
    CloudHosting,
    Security,
    Monitoring,
    Database,
    Analytics,
    #[default]
    Other,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: ServiceCategory,
    pub active_status: bool,
    pub features: Vec<String>,
    pub icon: String,
    pub created_by: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Service {
    pub fn summary(&self) -> ServiceSummary {
        ServiceSummary {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category,
            price: self.price,
            icon: self.icon.clone(),
        }
    }
}

/// Expansion of a service reference on purchases.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: ServiceCategory,
    pub price: f64,
    pub icon: String,
}
