use crate::auth::auth::AuthUser;
use crate::db::Databases;
use crate::model::notification::NotificationKind;
use crate::model::payroll::PayrollStatement;
use crate::notify::{self, Audience, Notice};
use crate::payroll::{self, MonthRun, PayrollError};
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayrollMonthQuery {
    #[schema(example = 2026)]
    pub year: u32,
    #[schema(example = 2)]
    pub month: u32,
}

#[derive(Deserialize, ToSchema)]
pub struct RunMonth {
    #[schema(example = 2026)]
    pub year: u32,
    #[schema(example = 2)]
    pub month: u32,
}

fn payroll_response(err: PayrollError) -> actix_web::Result<HttpResponse> {
    match err {
        PayrollError::InvalidMonth { year, month } => {
            Ok(HttpResponse::BadRequest().json(json!({
                "message": format!("{}-{:02} is not a calendar month", year, month)
            })))
        }
        PayrollError::UnknownEmployee(id) => Ok(HttpResponse::NotFound().json(json!({
            "message": format!("Employee {} not found", id)
        }))),
        PayrollError::Db(e) => {
            error!(error = %e, "Payroll query failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/// Preview one employee's statement
///
/// Derives the statement from live attendance, leave and holiday data
/// without archiving anything.
#[utoipa::path(
    get,
    path = "/api/payroll/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        PayrollMonthQuery
    ),
    responses(
        (status = 200, description = "Derived statement", body = PayrollStatement),
        (status = 400, description = "Not a calendar month"),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Payroll"
)]
pub async fn preview_statement(
    auth: AuthUser,
    db: web::Data<Databases>,
    path: web::Path<u64>,
    query: web::Query<PayrollMonthQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    // Employees may preview their own statement, HR and admin anyone's.
    if auth.is_employee() && auth.employee_id != Some(employee_id) {
        return Err(actix_web::error::ErrorForbidden("Own statement only"));
    }

    match payroll::statement_for(db.get_ref(), employee_id, query.year, query.month).await {
        Ok(statement) => Ok(HttpResponse::Ok().json(statement)),
        Err(e) => payroll_response(e),
    }
}

/// Run monthly payroll (Admin)
///
/// Derives a statement for every active employee, one at a time, and
/// archives the results where the archive table exists. Each employee is
/// notified once the run completes.
#[utoipa::path(
    post,
    path = "/api/payroll/run",
    request_body = RunMonth,
    responses(
        (status = 200, description = "Completed run", body = MonthRun),
        (status = 400, description = "Not a calendar month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Payroll"
)]
pub async fn run_payroll(
    auth: AuthUser,
    db: web::Data<Databases>,
    payload: web::Json<RunMonth>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let run = match payroll::run_month(db.get_ref(), payload.year, payload.month, auth.user_id)
        .await
    {
        Ok(run) => run,
        Err(e) => return payroll_response(e),
    };

    info!(
        year = payload.year,
        month = payload.month,
        employees = run.statements.len(),
        archived = run.archived,
        "Payroll run completed"
    );

    let notices = run
        .statements
        .iter()
        .map(|s| {
            Notice::new(
                NotificationKind::Payroll,
                Audience::Employee(s.employee_id),
                format!("Payroll for {}-{:02}", run.year, run.month),
                format!(
                    "Your statement is ready: {:.2} payable days of {}, net pay {:.2}.",
                    s.payable_days, s.total_working_days, s.net_pay
                ),
            )
        })
        .collect();
    notify::dispatch(db.hr.clone(), notices);

    Ok(HttpResponse::Ok().json(run))
}

/// List archived statements for a month
#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollMonthQuery),
    responses(
        (status = 200, description = "Archived statements, oldest employee first", body = Vec<PayrollStatement>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Payroll"
)]
pub async fn list_statements(
    auth: AuthUser,
    db: web::Data<Databases>,
    query: web::Query<PayrollMonthQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    match payroll::archived_statements(&db.hr, query.year, query.month).await {
        Ok(statements) => Ok(HttpResponse::Ok().json(statements)),
        Err(e) => payroll_response(e),
    }
}
