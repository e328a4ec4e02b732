use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use super::user::UserSummary;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
pub enum TicketStatus {
    #[default]
    Open,
    #[serde(rename = "In Progress")]
    #[strum(serialize = "In Progress")]
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// Status implied by assigning (or unassigning) a ticket.
    pub fn for_assignment(assigned: bool) -> Self {
        if assigned {
            TicketStatus::InProgress
        } else {
            TicketStatus::Open
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
pub enum TicketCategory {
    Technical,
    Billing,
    #[default]
    General,
    #[serde(rename = "Feature Request")]
    #[strum(serialize = "Feature Request")]
    FeatureRequest,
    #[serde(rename = "Bug Report")]
    #[strum(serialize = "Bug Report")]
    BugReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketNote {
    pub id: Uuid,
    pub message: String,
    pub added_by: Option<UserSummary>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub category: TicketCategory,
    #[serde(rename = "userId")]
    pub user: UserSummary,
    pub assigned_to: Option<UserSummary>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub notes: Vec<TicketNote>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns the `resolved_at` value a status change should produce.
///
/// The timestamp is written the first time a ticket enters `Resolved` and is kept
/// through every later transition, including a return to `Open`.
pub fn resolution_stamp(
    current: Option<DateTime<Utc>>,
    next_status: TicketStatus,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (current, next_status) {
        (Some(stamped), _) => Some(stamped),
        (None, TicketStatus::Resolved) => Some(now),
        (None, _) => None,
    }
}
