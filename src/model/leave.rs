use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Withdrawn,
}

impl LeaveStatus {
    /// Approved/rejected/withdrawn applications are immutable except through
    /// the admin correction endpoint.
    pub fn is_terminal(self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    Casual,
    Sick,
    Earned,
    Unpaid,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveApplication {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1001)]
    pub employee_id: u64,

    #[schema(example = "sick", value_type = String)]
    pub leave_type: String,

    #[schema(example = "2026-02-02", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(example = "2026-02-04", value_type = String, format = "date")]
    pub end_date: NaiveDate,

    /// Requested days; half-days make this fractional.
    #[schema(example = 3.0)]
    pub days_count: f64,

    /// Portion of `days_count` that is loss-of-pay.
    #[schema(example = 1.0)]
    pub lop_days: f64,

    #[schema(example = "fever", nullable = true)]
    pub reason: Option<String>,

    #[schema(example = "pending", value_type = String)]
    pub status: String,

    #[schema(value_type = String, format = "date-time")]
    pub applied_at: DateTime<Utc>,

    pub decided_by: Option<u64>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub decided_at: Option<NaiveDateTime>,

    pub decision_note: Option<String>,
}
