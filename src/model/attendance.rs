use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Row in the external time tracker. Read-only from this application.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimeEntry {
    pub id: u64,
    pub user_id: u64,
    /// Local start time. A night shift starting before midnight belongs
    /// entirely to this date.
    pub start_time: NaiveDateTime,
    pub duration_minutes: u64,
    pub project: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrackerUser {
    pub id: u64,
    pub email: String,
    pub display_name: Option<String>,
}
