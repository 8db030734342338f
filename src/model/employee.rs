use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "first_name": "Asha",
        "last_name": "Nair",
        "email": "asha.nair@company.com",
        "phone": "+919812345678",
        "department": "Engineering",
        "designation": "Senior Developer",
        "hire_date": "2023-04-01",
        "status": "active",
        "basic_pay": 60000.0,
        "hra": 24000.0,
        "night_allowance": 3000.0,
        "special_allowance": 8000.0,
        "pf_rate": 12.0,
        "esi_rate": 0.75,
        "tds_monthly": 4500.0,
        "professional_tax": 200.0,
        "voluntary_fund": 1000.0,
        "take_home_salary": 78000.0
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "Asha")]
    pub first_name: String,

    #[schema(example = "Nair")]
    pub last_name: String,

    #[schema(example = "asha.nair@company.com")]
    pub email: String,

    #[schema(example = "+919812345678", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "Engineering")]
    pub department: String,

    #[schema(example = "Senior Developer")]
    pub designation: String,

    #[schema(example = "2023-04-01", value_type = String, format = "date")]
    pub hire_date: NaiveDate,

    /// "active" or "inactive". Employees are deactivated, never deleted.
    #[schema(example = "active")]
    pub status: String,

    // Monthly compensation structure. The payroll compositor scales every one
    // of these by the attendance ratio.
    pub basic_pay: f64,
    pub hra: f64,
    pub night_allowance: f64,
    pub special_allowance: f64,

    /// Provident fund, percent of basic.
    pub pf_rate: f64,
    /// Employee state insurance, percent of gross.
    pub esi_rate: f64,
    pub tds_monthly: f64,
    pub professional_tax: f64,
    pub voluntary_fund: f64,

    /// Contractual net monthly pay at full attendance. Net pay is this figure
    /// times the attendance ratio.
    pub take_home_salary: f64,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Full-month gross: the sum of all compensation components.
    pub fn monthly_gross(&self) -> f64 {
        self.basic_pay + self.hra + self.night_allowance + self.special_allowance
    }
}
