use crate::{
    auth::auth::AuthUser,
    model::employee::Employee,
    utils::db_utils::{build_update_sql, execute_update},
};
use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

/// Profile and pay-structure columns HR may edit in place. The email stays
/// fixed because it is the join key into the time tracker, and the code
/// because payslips reference it.
const UPDATABLE_COLUMNS: &[&str] = &[
    "first_name",
    "last_name",
    "phone",
    "department",
    "designation",
    "hire_date",
    "basic_pay",
    "hra",
    "night_allowance",
    "special_allowance",
    "pf_rate",
    "esi_rate",
    "tds_monthly",
    "professional_tax",
    "voluntary_fund",
    "take_home_salary",
];

fn default_pf_rate() -> f64 {
    12.0
}

fn default_esi_rate() -> f64 {
    0.75
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-1001")]
    pub employee_code: String,
    #[schema(example = "Asha")]
    pub first_name: String,
    #[schema(example = "Nair")]
    pub last_name: String,
    #[schema(example = "asha.nair@company.com", format = "email")]
    pub email: String,
    pub phone: Option<String>,
    #[schema(example = "Engineering")]
    pub department: String,
    #[schema(example = "Senior Developer")]
    pub designation: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub hire_date: NaiveDate,

    #[serde(default)]
    pub basic_pay: f64,
    #[serde(default)]
    pub hra: f64,
    #[serde(default)]
    pub night_allowance: f64,
    #[serde(default)]
    pub special_allowance: f64,
    #[serde(default = "default_pf_rate")]
    pub pf_rate: f64,
    #[serde(default = "default_esi_rate")]
    pub esi_rate: f64,
    #[serde(default)]
    pub tds_monthly: f64,
    #[serde(default)]
    pub professional_tax: f64,
    #[serde(default)]
    pub voluntary_fund: f64,
    #[serde(default)]
    pub take_home_salary: f64,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,
    #[schema(example = 20)]
    pub per_page: Option<u32>,
    /// Filter by department name
    pub department: Option<String>,
    /// Filter by status ("active" / "inactive")
    pub status: Option<String>,
    /// Search by name or email
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    Str(&'a str),
    Text(String),
}

const EMPLOYEE_SELECT: &str = "SELECT id, employee_code, first_name, last_name, email, phone, \
     department, designation, hire_date, status, basic_pay, hra, night_allowance, \
     special_allowance, pf_rate, esi_rate, tds_monthly, professional_tax, voluntary_fund, \
     take_home_salary FROM employees";

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Object, example = json!({
            "message": "Employee created",
            "id": 1001
        })),
        (status = 409, description = "Employee code or email already in use"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (employee_code, first_name, last_name, email, phone, department, designation, hire_date,
         basic_pay, hra, night_allowance, special_allowance, pf_rate, esi_rate, tds_monthly,
         professional_tax, voluntary_fund, take_home_salary)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.employee_code)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.department)
    .bind(&payload.designation)
    .bind(payload.hire_date)
    .bind(payload.basic_pay)
    .bind(payload.hra)
    .bind(payload.night_allowance)
    .bind(payload.special_allowance)
    .bind(payload.pf_rate)
    .bind(payload.esi_rate)
    .bind(payload.tds_monthly)
    .bind(payload.professional_tax)
    .bind(payload.voluntary_fund)
    .bind(payload.take_home_salary)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(done) => Ok(HttpResponse::Created().json(json!({
            "message": "Employee created",
            "id": done.last_insert_id()
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Employee code or email already in use"
                    })));
                }
            }

            error!(error = %e, "Failed to create employee");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(department) = query.department.as_deref() {
        where_sql.push_str(" AND department = ?");
        args.push(FilterValue::Str(department));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    if let Some(search) = query.search.as_deref() {
        where_sql.push_str(" AND (first_name LIKE ? OR last_name LIKE ? OR email LIKE ?)");
        let like = format!("%{}%", search);
        args.push(FilterValue::Text(like.clone()));
        args.push(FilterValue::Text(like.clone()));
        args.push(FilterValue::Text(like));
    }

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM employees{}", where_sql);
    debug!(sql = %count_sql, "Counting employees");

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::Str(s) => count_q.bind(*s),
            FilterValue::Text(s) => count_q.bind(s.clone()),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count employees");
        ErrorInternalServerError("Internal Server Error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "{}{} ORDER BY id DESC LIMIT ? OFFSET ?",
        EMPLOYEE_SELECT, where_sql
    );
    debug!(sql = %data_sql, page, per_page, "Fetching employees");

    let mut data_q = sqlx::query_as::<_, Employee>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::Str(s) => data_q.bind(s),
            FilterValue::Text(s) => data_q.bind(s),
        };
    }

    let employees = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, sql = %data_sql, "Failed to fetch employees");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    // Employees may look at their own record, HR and admin at any.
    if auth.is_employee() && auth.employee_id != Some(employee_id) {
        return Err(actix_web::error::ErrorForbidden("Own record only"));
    }

    let sql = format!("{} WHERE id = ?", EMPLOYEE_SELECT);
    let employee = sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to fetch employee");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Employee not found"
        }))),
    }
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Employee updated successfully"),
        (status = 400, description = "Unknown or non-editable field in payload"),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    let update = build_update_sql("employees", &body, UPDATABLE_COLUMNS, "id", employee_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to update employee");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee updated successfully"
    })))
}

/// Deactivate Employee
///
/// Employment records are never deleted; payroll history keeps pointing at
/// them. Deactivation takes the employee out of payroll runs and listings.
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}/deactivate",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee deactivated", body = Object, example = json!({
            "message": "Employee deactivated"
        })),
        (status = 400, description = "Employee not found or already inactive"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn deactivate_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE employees
        SET status = 'inactive'
        WHERE id = ?
        AND status = 'active'
        "#,
    )
    .bind(employee_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to deactivate employee");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Employee not found or already inactive"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deactivated"
    })))
}
