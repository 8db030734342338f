use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Leave,
    Payroll,
    Asset,
    Referral,
    Learning,
    Grievance,
    Invoice,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Notification {
    #[schema(example = 1)]
    pub id: u64,

    pub user_id: u64,

    #[schema(example = "leave", value_type = String)]
    pub kind: String,

    #[schema(example = "Leave approved")]
    pub title: String,

    #[schema(example = "Your sick leave for 2026-02-02 to 2026-02-04 was approved.")]
    pub body: String,

    /// Id of the row that triggered the notification, when there is one.
    pub reference_id: Option<u64>,

    pub is_read: bool,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}
