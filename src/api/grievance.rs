use crate::auth::auth::AuthUser;
use crate::model::grievance::{Grievance, GrievanceCategory, GrievanceStatus};
use crate::model::notification::NotificationKind;
use crate::model::role::Role;
use crate::notify::{self, Audience, Notice};
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

const GRIEVANCE_SELECT: &str = "SELECT id, employee_id, category, subject, details, confidential, \
     status, resolution_note, handled_by, created_at, resolved_at FROM grievances";

#[derive(Deserialize, ToSchema)]
pub struct FileGrievance {
    #[schema(example = "payroll")]
    pub category: GrievanceCategory,
    #[schema(example = "Incorrect LOP in January payslip")]
    pub subject: String,
    pub details: String,
    /// Hide the filer's identity from non-HR listings.
    #[serde(default)]
    pub confidential: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct GrievanceTransition {
    #[schema(example = "resolved")]
    pub status: GrievanceStatus,
    pub resolution_note: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct GrievanceQuery {
    /// Filter by status
    #[schema(example = "open")]
    pub status: Option<String>,
    /// Filter by category
    #[schema(example = "payroll")]
    pub category: Option<String>,
}

/// File a grievance
#[utoipa::path(
    post,
    path = "/api/grievances",
    request_body = FileGrievance,
    responses(
        (status = 201, description = "Grievance filed", body = Object, example = json!({
            "message": "Grievance filed",
            "id": 5
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Grievance"
)]
pub async fn file_grievance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<FileGrievance>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id_required()?;

    let result = sqlx::query(
        "INSERT INTO grievances (employee_id, category, subject, details, confidential) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(employee_id)
    .bind(payload.category.to_string())
    .bind(&payload.subject)
    .bind(&payload.details)
    .bind(payload.confidential)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to file grievance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let grievance_id = result.last_insert_id();

    // The notice to HR names the subject but not the filer; the listing
    // applies the confidentiality rule.
    notify::dispatch(
        pool.get_ref().clone(),
        vec![Notice::new(
            NotificationKind::Grievance,
            Audience::Role(Role::Hr),
            "New grievance",
            format!("A {} grievance was filed: {}", payload.category, payload.subject),
        )
        .about(grievance_id)],
    );

    Ok(HttpResponse::Created().json(json!({
        "message": "Grievance filed",
        "id": grievance_id
    })))
}

/// List grievances
///
/// HR and admin see every grievance; employees see only their own.
#[utoipa::path(
    get,
    path = "/api/grievances",
    params(GrievanceQuery),
    responses(
        (status = 200, description = "Grievances visible to the caller", body = Vec<Grievance>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Grievance"
)]
pub async fn list_grievances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<GrievanceQuery>,
) -> actix_web::Result<impl Responder> {
    let mut sql = format!("{} WHERE 1=1", GRIEVANCE_SELECT);
    let mut own: Option<u64> = None;

    if auth.is_employee() {
        own = Some(auth.employee_id_required()?);
        sql.push_str(" AND employee_id = ?");
    } else {
        auth.require_hr_or_admin()?;
    }

    if query.status.is_some() {
        sql.push_str(" AND status = ?");
    }
    if query.category.is_some() {
        sql.push_str(" AND category = ?");
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut q = sqlx::query_as::<_, Grievance>(&sql);
    if let Some(employee_id) = own {
        q = q.bind(employee_id);
    }
    if let Some(status) = query.status.as_deref() {
        q = q.bind(status);
    }
    if let Some(category) = query.category.as_deref() {
        q = q.bind(category);
    }

    let grievances = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch grievances");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(grievances))
}

/// Transition a grievance (HR/Admin)
///
/// Resolved and dismissed are terminal: the handler and resolution time are
/// stamped and the filer is notified. Moving to under_review just records
/// who picked it up.
#[utoipa::path(
    put,
    path = "/api/grievances/{grievance_id}/status",
    params(
        ("grievance_id" = u64, Path, description = "Grievance ID")
    ),
    request_body = GrievanceTransition,
    responses(
        (status = 200, description = "Grievance updated", body = Object, example = json!({
            "message": "Grievance updated"
        })),
        (status = 400, description = "Grievance already settled, or reopening attempted"),
        (status = 404, description = "Grievance not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Grievance"
)]
pub async fn transition_grievance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<GrievanceTransition>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let grievance_id = path.into_inner();

    if payload.status == GrievanceStatus::Open {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Grievances cannot be reopened"
        })));
    }

    let sql = format!("{} WHERE id = ?", GRIEVANCE_SELECT);
    let grievance = sqlx::query_as::<_, Grievance>(&sql)
        .bind(grievance_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, grievance_id, "Failed to fetch grievance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(grievance) = grievance else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Grievance not found"
        })));
    };

    let settling = matches!(
        payload.status,
        GrievanceStatus::Resolved | GrievanceStatus::Dismissed
    );

    let sql = if settling {
        "UPDATE grievances SET status = ?, resolution_note = ?, handled_by = ?, \
                resolved_at = NOW() \
         WHERE id = ? AND status IN ('open', 'under_review')"
    } else {
        "UPDATE grievances SET status = ?, resolution_note = COALESCE(?, resolution_note), \
                handled_by = ? \
         WHERE id = ? AND status = 'open'"
    };

    let result = sqlx::query(sql)
        .bind(payload.status.to_string())
        .bind(&payload.resolution_note)
        .bind(auth.user_id)
        .bind(grievance_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, grievance_id, "Failed to transition grievance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Grievance already settled"
        })));
    }

    if settling {
        notify::dispatch(
            pool.get_ref().clone(),
            vec![Notice::new(
                NotificationKind::Grievance,
                Audience::Employee(grievance.employee_id),
                format!("Grievance {}", payload.status),
                format!("Your grievance \"{}\" was {}.", grievance.subject, payload.status),
            )
            .about(grievance_id)],
        );
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Grievance updated"
    })))
}
