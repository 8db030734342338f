use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One employee's payroll for one month. Derived by the payroll engine; the
/// bulk run also archives it into `payroll_statements` where that table
/// exists. `id` and the `generated_*` fields are set only on archived rows.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PayrollStatement {
    pub id: Option<u64>,

    #[schema(example = 1001)]
    pub employee_id: u64,

    #[schema(example = 2026)]
    pub year: u32,

    #[schema(example = 2)]
    pub month: u32,

    pub total_working_days: u32,
    pub days_present: u32,
    pub paid_leave_days: f64,
    pub weekend_days_paid: u32,

    /// min(total_working_days, present + paid leave + paid weekends), never
    /// negative.
    pub payable_days: f64,

    /// payable_days / total_working_days; 0 when the month has no working
    /// days. Scales every figure below.
    pub attendance_ratio: f64,

    pub hours_worked: f64,

    pub basic_pay: f64,
    pub hra: f64,
    pub night_allowance: f64,
    pub special_allowance: f64,
    pub gross_pay: f64,

    pub pf_deduction: f64,
    pub esi_deduction: f64,
    pub tds_deduction: f64,
    pub professional_tax: f64,
    pub voluntary_fund: f64,
    pub total_deductions: f64,

    /// take_home_salary × attendance_ratio. Deliberately not
    /// gross − deductions; the deduction lines are reported for transparency
    /// only.
    pub net_pay: f64,

    pub generated_by: Option<u64>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub generated_at: Option<DateTime<Utc>>,
}
