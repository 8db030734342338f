use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Available,
    Assigned,
    Repair,
    Retired,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Asset {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "LAP-0042")]
    pub asset_tag: String,

    #[schema(example = "ThinkPad T14")]
    pub name: String,

    #[schema(example = "laptop")]
    pub category: String,

    pub serial_number: Option<String>,

    #[schema(value_type = Option<String>, format = "date")]
    pub purchase_date: Option<NaiveDate>,

    #[schema(example = "available", value_type = String)]
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AssetAssignment {
    pub id: u64,
    pub asset_id: u64,
    pub employee_id: u64,
    pub assigned_by: u64,

    #[schema(value_type = String, format = "date")]
    pub assigned_on: NaiveDate,

    #[schema(value_type = Option<String>, format = "date")]
    pub returned_on: Option<NaiveDate>,

    pub return_note: Option<String>,
    pub notes: Option<String>,
}
