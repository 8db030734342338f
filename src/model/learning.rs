use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Assigned,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Course {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Secure Coding Basics")]
    pub title: String,

    #[schema(example = "security")]
    pub category: String,

    pub duration_hours: f64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CourseEnrollment {
    pub id: u64,
    pub course_id: u64,
    pub employee_id: u64,
    pub assigned_by: u64,

    #[schema(example = "in_progress", value_type = String)]
    pub status: String,

    /// 0..=100; reaching 100 flips the status to completed.
    pub progress_pct: u8,

    #[schema(value_type = String, format = "date-time")]
    pub assigned_at: DateTime<Utc>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub completed_at: Option<NaiveDateTime>,
}
