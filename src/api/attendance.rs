use crate::auth::auth::AuthUser;
use crate::db::Databases;
use crate::payroll::{
    attendance::load_month_attendance,
    calendar::{month_bounds, MonthCalendar},
    fetch_employee, load_holiday_dates,
};
use actix_web::{web, HttpResponse, Responder};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MonthQuery {
    #[schema(example = 2026)]
    pub year: u32,
    #[schema(example = 2)]
    pub month: u32,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceSummaryResponse {
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(example = 2026)]
    pub year: u32,
    #[schema(example = 2)]
    pub month: u32,
    #[schema(example = 20)]
    pub total_working_days: u32,
    #[schema(example = 18)]
    pub days_present: u32,
    #[schema(example = 151.5)]
    pub hours_worked: f64,
    /// Distinct dates with at least one tracker entry.
    #[schema(value_type = Vec<String>)]
    pub worked_dates: Vec<NaiveDate>,
}

/// Month attendance preview
///
/// Collapses the employee's raw tracker entries for one month into the
/// per-day summary payroll uses. An employee unknown to the tracker gets an
/// all-zero month.
#[utoipa::path(
    get,
    path = "/api/attendance/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        MonthQuery
    ),
    responses(
        (status = 200, description = "Attendance summary", body = AttendanceSummaryResponse),
        (status = 400, description = "Not a calendar month"),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn month_attendance(
    auth: AuthUser,
    db: web::Data<Databases>,
    path: web::Path<u64>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    if auth.is_employee() && auth.employee_id != Some(employee_id) {
        return Err(actix_web::error::ErrorForbidden("Own attendance only"));
    }

    let Some((first, last)) = month_bounds(query.year, query.month) else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Not a calendar month"
        })));
    };

    // Same holiday-aware calendar the payroll pipeline derives from, so the
    // preview and the statement agree on working days.
    let holidays = load_holiday_dates(&db.hr, first, last).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to load holidays");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(cal) = MonthCalendar::new(query.year, query.month, holidays) else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Not a calendar month"
        })));
    };

    let employee = fetch_employee(&db.hr, employee_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to fetch employee");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(employee) = employee else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Employee not found"
        })));
    };

    let summary = load_month_attendance(&db.tracker, &employee.email, &cal)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to load attendance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(AttendanceSummaryResponse {
        employee_id,
        year: query.year,
        month: query.month,
        total_working_days: summary.total_working_days,
        days_present: summary.days_present,
        hours_worked: summary.hours_worked,
        worked_dates: summary.worked_dates.into_iter().collect(),
    }))
}
