use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    PartiallyPaid,
    Paid,
    Void,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Invoice {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "INV-2026-0042")]
    pub invoice_number: String,

    #[schema(example = "Acme Corp")]
    pub client_name: String,

    #[schema(example = "2026-03-15", value_type = Option<String>, format = "date")]
    pub due_date: Option<NaiveDate>,

    #[schema(example = "sent", value_type = String)]
    pub status: String,

    pub amount_received: f64,

    pub notes: Option<String>,

    /// Sum of task amounts. Recomputed on every write, never edited directly
    /// and never change-logged.
    pub total_amount: f64,

    pub created_by: u64,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct InvoiceTask {
    #[schema(example = 7)]
    pub id: u64,

    pub invoice_id: u64,

    #[schema(example = "Backend integration")]
    pub name: String,

    pub hours: f64,
    pub rate: f64,
    pub display_order: u32,
}

impl InvoiceTask {
    pub fn amount(&self) -> f64 {
        self.hours * self.rate
    }
}

/// Append-only change record. One row per changed field, plus one row per
/// task added or removed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct InvoiceLog {
    pub id: u64,
    pub invoice_id: u64,
    pub task_id: Option<u64>,

    #[schema(example = "due_date")]
    pub field_name: String,

    /// JSON-serialized previous value; null for additions.
    pub old_value: Option<String>,
    /// JSON-serialized new value; null for removals.
    pub new_value: Option<String>,

    pub changed_by: u64,

    #[schema(example = "client requested extension")]
    pub reason: String,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}
