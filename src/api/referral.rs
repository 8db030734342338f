use crate::auth::auth::AuthUser;
use crate::model::notification::NotificationKind;
use crate::model::referral::{Referral, ReferralStatus};
use crate::model::role::Role;
use crate::notify::{self, Audience, Notice};
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

const REFERRAL_SELECT: &str = "SELECT id, referrer_employee_id, candidate_name, candidate_email, \
     position, resume_url, status, note, created_at, updated_at FROM referrals";

#[derive(Deserialize, ToSchema)]
pub struct SubmitReferral {
    #[schema(example = "Ravi Kumar")]
    pub candidate_name: String,
    #[schema(example = "ravi.kumar@mail.com", format = "email")]
    pub candidate_email: String,
    #[schema(example = "Backend Engineer")]
    pub position: String,
    pub resume_url: Option<String>,
    pub note: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReferralDecision {
    #[schema(example = "interviewing")]
    pub status: ReferralStatus,
    pub note: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReferralQuery {
    /// Filter by status
    #[schema(example = "submitted")]
    pub status: Option<String>,
    /// Filter by referring employee (HR/Admin; employees always see their own)
    #[schema(example = 1001)]
    pub referrer_employee_id: Option<u64>,
}

/// Refer a candidate
#[utoipa::path(
    post,
    path = "/api/referrals",
    request_body = SubmitReferral,
    responses(
        (status = 201, description = "Referral submitted", body = Object, example = json!({
            "message": "Referral submitted",
            "id": 9
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Referral"
)]
pub async fn submit_referral(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SubmitReferral>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id_required()?;

    let result = sqlx::query(
        "INSERT INTO referrals \
            (referrer_employee_id, candidate_name, candidate_email, position, resume_url, note) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(employee_id)
    .bind(&payload.candidate_name)
    .bind(&payload.candidate_email)
    .bind(&payload.position)
    .bind(&payload.resume_url)
    .bind(&payload.note)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to submit referral");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let referral_id = result.last_insert_id();

    notify::dispatch(
        pool.get_ref().clone(),
        vec![Notice::new(
            NotificationKind::Referral,
            Audience::Role(Role::Hr),
            "New referral",
            format!(
                "Employee #{} referred {} for {}.",
                employee_id, payload.candidate_name, payload.position
            ),
        )
        .about(referral_id)],
    );

    Ok(HttpResponse::Created().json(json!({
        "message": "Referral submitted",
        "id": referral_id
    })))
}

/// List referrals
#[utoipa::path(
    get,
    path = "/api/referrals",
    params(ReferralQuery),
    responses(
        (status = 200, description = "Referrals matching the filters", body = Vec<Referral>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Referral"
)]
pub async fn list_referrals(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReferralQuery>,
) -> actix_web::Result<impl Responder> {
    let mut sql = format!("{} WHERE 1=1", REFERRAL_SELECT);
    let mut referrer: Option<u64> = None;

    // Employees only ever see their own referrals.
    if auth.is_employee() {
        referrer = Some(auth.employee_id_required()?);
    } else if let Some(employee_id) = query.referrer_employee_id {
        referrer = Some(employee_id);
    }

    if referrer.is_some() {
        sql.push_str(" AND referrer_employee_id = ?");
    }
    if query.status.is_some() {
        sql.push_str(" AND status = ?");
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut q = sqlx::query_as::<_, Referral>(&sql);
    if let Some(employee_id) = referrer {
        q = q.bind(employee_id);
    }
    if let Some(status) = query.status.as_deref() {
        q = q.bind(status);
    }

    let referrals = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch referrals");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(referrals))
}

/// Move a referral through the pipeline (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/referrals/{referral_id}/status",
    params(
        ("referral_id" = u64, Path, description = "Referral ID")
    ),
    request_body = ReferralDecision,
    responses(
        (status = 200, description = "Referral updated", body = Object, example = json!({
            "message": "Referral updated"
        })),
        (status = 404, description = "Referral not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Referral"
)]
pub async fn update_referral_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ReferralDecision>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let referral_id = path.into_inner();

    let sql = format!("{} WHERE id = ?", REFERRAL_SELECT);
    let referral = sqlx::query_as::<_, Referral>(&sql)
        .bind(referral_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, referral_id, "Failed to fetch referral");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(referral) = referral else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Referral not found"
        })));
    };

    sqlx::query("UPDATE referrals SET status = ?, note = COALESCE(?, note) WHERE id = ?")
        .bind(payload.status.to_string())
        .bind(&payload.note)
        .bind(referral_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, referral_id, "Failed to update referral");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    notify::dispatch(
        pool.get_ref().clone(),
        vec![Notice::new(
            NotificationKind::Referral,
            Audience::Employee(referral.referrer_employee_id),
            "Referral update",
            format!(
                "Your referral of {} for {} moved to {}.",
                referral.candidate_name, referral.position, payload.status
            ),
        )
        .about(referral_id)],
    );

    Ok(HttpResponse::Ok().json(json!({
        "message": "Referral updated"
    })))
}
