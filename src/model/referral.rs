use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    Submitted,
    Screening,
    Interviewing,
    Hired,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Referral {
    #[schema(example = 1)]
    pub id: u64,

    pub referrer_employee_id: u64,

    #[schema(example = "Ravi Kumar")]
    pub candidate_name: String,

    #[schema(example = "ravi.kumar@mail.com")]
    pub candidate_email: String,

    #[schema(example = "Backend Engineer")]
    pub position: String,

    pub resume_url: Option<String>,

    #[schema(example = "submitted", value_type = String)]
    pub status: String,

    pub note: Option<String>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}
