use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GrievanceStatus {
    Open,
    UnderReview,
    Resolved,
    Dismissed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GrievanceCategory {
    Harassment,
    Payroll,
    Facilities,
    Management,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Grievance {
    #[schema(example = 1)]
    pub id: u64,

    pub employee_id: u64,

    #[schema(example = "payroll", value_type = String)]
    pub category: String,

    #[schema(example = "Incorrect LOP in January payslip")]
    pub subject: String,

    pub details: String,

    /// Confidential grievances hide the filer from non-HR listings.
    pub confidential: bool,

    #[schema(example = "open", value_type = String)]
    pub status: String,

    pub resolution_note: Option<String>,
    pub handled_by: Option<u64>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub resolved_at: Option<NaiveDateTime>,
}
