use crate::auth::auth::AuthUser;
use crate::model::leave::{LeaveApplication, LeaveStatus, LeaveType};
use crate::model::notification::NotificationKind;
use crate::model::role::Role;
use crate::notify::{self, Audience, Notice};
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::collections::HashMap;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

const LEAVE_SELECT: &str = "SELECT id, employee_id, leave_type, start_date, end_date, days_count, \
     lop_days, reason, status, applied_at, decided_by, decided_at, decision_note \
     FROM leave_applications";

#[derive(Deserialize, ToSchema)]
pub struct ApplyLeave {
    #[schema(example = "earned")]
    pub leave_type: LeaveType, // enum ensures Swagger dropdown
    #[schema(example = "2026-04-06", format = "date", value_type = String)]
    pub start_date: chrono::NaiveDate,
    #[schema(example = "2026-04-08", format = "date", value_type = String)]
    pub end_date: chrono::NaiveDate,
    /// Working days the application covers, as counted by the requester.
    #[schema(example = 3.0)]
    pub days_count: f64,
    /// Loss-of-pay share of days_count.
    #[serde(default)]
    #[schema(example = 0.0)]
    pub lop_days: f64,
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct DecisionNote {
    #[schema(example = "Approved, plan handover before you go")]
    pub note: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by employee ID (HR/Admin only; employees always see their own)
    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
    /// Filter by leave status
    #[schema(example = "pending")]
    pub status: Option<String>,
    /// Filter by leave type
    #[schema(example = "sick")]
    pub leave_type: Option<String>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>, // 1-based
    /// Pagination per page number
    #[schema(example = 10)]
    pub per_page: Option<u64>, // items per page
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

#[derive(Serialize, ToSchema)]
pub struct LeaveItem {
    #[serde(flatten)]
    pub application: LeaveApplication,
    /// Stitched in from the employees table; absent if the employee row is
    /// gone.
    #[schema(example = "Asha Nair")]
    pub employee_name: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveItem>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/* =========================
Apply for leave
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = ApplyLeave,
        description = "Leave application payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave application submitted",
         body = Object,
         example = json!({
            "message": "Leave application submitted",
            "id": 17,
            "status": "pending"
         })
        ),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ApplyLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id: u64 = auth.employee_id_required()?;

    if payload.start_date > payload.end_date {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "start_date cannot be after end_date"
        })));
    }

    if payload.days_count <= 0.0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "days_count must be positive"
        })));
    }

    if payload.lop_days < 0.0 || payload.lop_days > payload.days_count {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "lop_days must be between 0 and days_count"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO leave_applications
            (employee_id, leave_type, start_date, end_date, days_count, lop_days, reason)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.leave_type.to_string())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.days_count)
    .bind(payload.lop_days)
    .bind(&payload.reason)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to create leave application");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let leave_id = result.last_insert_id();

    notify::dispatch(
        pool.get_ref().clone(),
        vec![Notice::new(
            NotificationKind::Leave,
            Audience::Role(Role::Hr),
            "New leave application",
            format!(
                "Employee #{} applied for {} leave, {} to {}.",
                employee_id, payload.leave_type, payload.start_date, payload.end_date
            ),
        )
        .about(leave_id)],
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave application submitted",
        "id": leave_id,
        "status": "pending"
    })))
}

/* =========================
List leave applications
========================= */
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    // Employees only ever see their own applications.
    if auth.is_employee() {
        let own = auth.employee_id_required()?;
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(own));
    } else if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    if let Some(leave_type) = query.leave_type.as_deref() {
        where_sql.push_str(" AND leave_type = ?");
        args.push(FilterValue::Str(leave_type));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_applications{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count leave applications");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        "{}{} ORDER BY applied_at DESC LIMIT ? OFFSET ?",
        LEAVE_SELECT, where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveApplication>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let applications = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch leave list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // -------------------------
    // Stitch employee names
    // -------------------------
    let ids: Vec<u64> = applications.iter().map(|a| a.employee_id).collect();
    let names = super::employee_names(pool.get_ref(), &ids)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to stitch employee names");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let data = stitch_names(applications, &names);

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/* =========================
Get one application
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave application to fetch")
    ),
    responses(
        (status = 200, description = "Leave application found", body = LeaveItem),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave application not found", body = Object, example = json!({
            "message": "Leave application not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let application = fetch_leave(pool.get_ref(), leave_id).await?;

    let Some(application) = application else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Leave application not found"
        })));
    };

    if auth.is_employee() && auth.employee_id != Some(application.employee_id) {
        return Err(actix_web::error::ErrorForbidden("Own applications only"));
    }

    let names = super::employee_names(pool.get_ref(), &[application.employee_id])
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to stitch employee name");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let employee_name = names.get(&application.employee_id).cloned();

    Ok(HttpResponse::Ok().json(LeaveItem {
        application,
        employee_name,
    }))
}

/* =========================
Approve leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave application to approve")
    ),
    request_body = DecisionNote,
    responses(
        (status = 200, description = "Leave approved", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 400, description = "Leave application not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<DecisionNote>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    decide_leave(auth, pool, path.into_inner(), LeaveStatus::Approved, &body.note).await
}

/* =========================
Reject leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave application to reject")
    ),
    request_body = DecisionNote,
    responses(
        (status = 200, description = "Leave rejected", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Leave application not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<DecisionNote>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    decide_leave(auth, pool, path.into_inner(), LeaveStatus::Rejected, &body.note).await
}

async fn decide_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    leave_id: u64,
    decision: LeaveStatus,
    note: &Option<String>,
) -> actix_web::Result<HttpResponse> {
    let application = fetch_leave(pool.get_ref(), leave_id).await?;

    let Some(application) = application else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Leave application not found or already processed"
        })));
    };

    let result = sqlx::query(
        r#"
        UPDATE leave_applications
        SET status = ?, decided_by = ?, decided_at = NOW(), decision_note = ?
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(decision.to_string())
    .bind(auth.user_id)
    .bind(note)
    .bind(leave_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Leave decision failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Leave application not found or already processed"
        })));
    }

    let verdict = match decision {
        LeaveStatus::Approved => "approved",
        _ => "rejected",
    };

    notify::dispatch(
        pool.get_ref().clone(),
        vec![Notice::new(
            NotificationKind::Leave,
            Audience::Employee(application.employee_id),
            format!("Leave {}", verdict),
            format!(
                "Your {} leave for {} to {} was {}.",
                application.leave_type, application.start_date, application.end_date, verdict
            ),
        )
        .about(leave_id)],
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Leave {}", verdict)
    })))
}

/* =========================
Withdraw own application
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/withdraw",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave application to withdraw")
    ),
    responses(
        (status = 200, description = "Leave withdrawn", body = Object, example = json!({
            "message": "Leave withdrawn"
        })),
        (status = 400, description = "Leave application not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn withdraw_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id_required()?;
    let leave_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE leave_applications
        SET status = 'withdrawn'
        WHERE id = ?
        AND employee_id = ?
        AND status = 'pending'
        "#,
    )
    .bind(leave_id)
    .bind(employee_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Withdraw leave failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Leave application not found or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave withdrawn"
    })))
}

/* =========================
Correct a settled application (Admin)
========================= */
/// Payroll corrections sometimes need the recorded day counts fixed after
/// the fact. Only settled applications can be corrected, and only the
/// counts and the note; dates and status stay as decided.
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/correct",
    params(
        ("leave_id" = u64, Path, description = "ID of the settled leave application")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Leave application corrected"),
        (status = 400, description = "Application still pending, or a non-correctable field was sent"),
        (status = 404, description = "Leave application not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn correct_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<serde_json::Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let leave_id = path.into_inner();

    let application = fetch_leave(pool.get_ref(), leave_id).await?;

    let Some(application) = application else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Leave application not found"
        })));
    };

    let settled = LeaveStatus::from_str(&application.status)
        .map(|s| s.is_terminal())
        .unwrap_or(false);
    if !settled {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Only settled applications can be corrected"
        })));
    }

    let update = crate::utils::db_utils::build_update_sql(
        "leave_applications",
        &body,
        &["days_count", "lop_days", "decision_note"],
        "id",
        leave_id,
    )?;

    crate::utils::db_utils::execute_update(pool.get_ref(), update)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Leave correction failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave application corrected"
    })))
}

/// Attaches the display name to each row. Names are looked up, not taken:
/// one employee appearing on many rows gets their name on every one.
fn stitch_names(
    applications: Vec<LeaveApplication>,
    names: &HashMap<u64, String>,
) -> Vec<LeaveItem> {
    applications
        .into_iter()
        .map(|application| {
            let employee_name = names.get(&application.employee_id).cloned();
            LeaveItem {
                application,
                employee_name,
            }
        })
        .collect()
}

async fn fetch_leave(
    pool: &MySqlPool,
    leave_id: u64,
) -> actix_web::Result<Option<LeaveApplication>> {
    let sql = format!("{} WHERE id = ?", LEAVE_SELECT);
    sqlx::query_as::<_, LeaveApplication>(&sql)
        .bind(leave_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch leave application");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn application(id: u64, employee_id: u64) -> LeaveApplication {
        LeaveApplication {
            id,
            employee_id,
            leave_type: "sick".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 2, 4).unwrap(),
            days_count: 3.0,
            lop_days: 0.0,
            reason: None,
            status: "approved".to_string(),
            applied_at: Utc::now(),
            decided_by: None,
            decided_at: None,
            decision_note: None,
        }
    }

    #[test]
    fn repeated_employee_keeps_the_name_on_every_row() {
        // An employee listing their own history: every row shares one id.
        let names = HashMap::from([(1001, "Asha Nair".to_string())]);
        let rows = vec![
            application(1, 1001),
            application(2, 1001),
            application(3, 1001),
        ];

        let items = stitch_names(rows, &names);
        assert_eq!(items.len(), 3);
        assert!(items
            .iter()
            .all(|item| item.employee_name.as_deref() == Some("Asha Nair")));
    }

    #[test]
    fn missing_employee_row_stitches_to_none() {
        let names = HashMap::from([(1001, "Asha Nair".to_string())]);
        let items = stitch_names(vec![application(1, 2002)], &names);
        assert_eq!(items[0].employee_name, None);
    }
}
