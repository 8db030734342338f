use crate::auth::auth::AuthUser;
use crate::model::asset::{Asset, AssetAssignment};
use crate::model::notification::NotificationKind;
use crate::notify::{self, Audience, Notice};
use actix_web::{web, HttpResponse, Responder};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateAsset {
    #[schema(example = "LAP-0042")]
    pub asset_tag: String,
    #[schema(example = "ThinkPad T14")]
    pub name: String,
    #[schema(example = "laptop")]
    pub category: String,
    pub serial_number: Option<String>,
    #[schema(example = "2025-11-20", value_type = Option<String>, format = "date")]
    pub purchase_date: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct AssignAsset {
    #[schema(example = 1001)]
    pub employee_id: u64,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReturnAsset {
    #[schema(example = "minor scratches on the lid")]
    pub return_note: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AssetQuery {
    /// Filter by asset status
    #[schema(example = "available")]
    pub status: Option<String>,
    /// Filter by category
    #[schema(example = "laptop")]
    pub category: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AssignmentQuery {
    /// Restrict to one employee (HR/Admin; employees always see their own)
    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
    /// Only assignments not yet returned
    #[serde(default)]
    pub open_only: bool,
}

#[derive(Serialize, ToSchema)]
pub struct AssignmentItem {
    #[serde(flatten)]
    pub assignment: AssetAssignment,
    /// Stitched in from the assets table.
    #[schema(example = "ThinkPad T14")]
    pub asset_name: Option<String>,
    #[schema(example = "LAP-0042")]
    pub asset_tag: Option<String>,
}

/// Register an asset
#[utoipa::path(
    post,
    path = "/api/assets",
    request_body = CreateAsset,
    responses(
        (status = 201, description = "Asset registered", body = Object, example = json!({
            "message": "Asset registered",
            "id": 12
        })),
        (status = 409, description = "Asset tag already in use"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Asset"
)]
pub async fn create_asset(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAsset>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let result = sqlx::query(
        "INSERT INTO assets (asset_tag, name, category, serial_number, purchase_date) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&payload.asset_tag)
    .bind(&payload.name)
    .bind(&payload.category)
    .bind(&payload.serial_number)
    .bind(payload.purchase_date)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(done) => Ok(HttpResponse::Created().json(json!({
            "message": "Asset registered",
            "id": done.last_insert_id()
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Asset tag already in use"
                    })));
                }
            }

            error!(error = %e, "Failed to register asset");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// List assets
#[utoipa::path(
    get,
    path = "/api/assets",
    params(AssetQuery),
    responses(
        (status = 200, description = "Assets matching the filters", body = Vec<Asset>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Asset"
)]
pub async fn list_assets(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AssetQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let mut sql = String::from(
        "SELECT id, asset_tag, name, category, serial_number, purchase_date, status \
         FROM assets WHERE 1=1",
    );
    let mut args: Vec<&str> = Vec::new();

    if let Some(status) = query.status.as_deref() {
        sql.push_str(" AND status = ?");
        args.push(status);
    }
    if let Some(category) = query.category.as_deref() {
        sql.push_str(" AND category = ?");
        args.push(category);
    }
    sql.push_str(" ORDER BY asset_tag");

    let mut q = sqlx::query_as::<_, Asset>(&sql);
    for arg in args {
        q = q.bind(arg);
    }

    let assets = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch assets");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(assets))
}

/// Assign an asset to an employee
///
/// The availability check and the status flip are the same statement, so two
/// concurrent assignments of one asset cannot both succeed.
#[utoipa::path(
    post,
    path = "/api/assets/{asset_id}/assign",
    params(
        ("asset_id" = u64, Path, description = "Asset ID")
    ),
    request_body = AssignAsset,
    responses(
        (status = 200, description = "Asset assigned", body = Object, example = json!({
            "message": "Asset assigned",
            "assignment_id": 31
        })),
        (status = 400, description = "Asset not found or not available"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Asset"
)]
pub async fn assign_asset(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<AssignAsset>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let asset_id = path.into_inner();

    let mut tx = pool.begin().await.map_err(|e| {
        error!(error = %e, asset_id, "Failed to open assignment transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let claimed = sqlx::query(
        "UPDATE assets SET status = 'assigned' WHERE id = ? AND status = 'available'",
    )
    .bind(asset_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, asset_id, "Failed to claim asset");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if claimed.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Asset not found or not available"
        })));
    }

    let assigned_on = Utc::now().date_naive();
    let inserted = sqlx::query(
        "INSERT INTO asset_assignments (asset_id, employee_id, assigned_by, assigned_on, notes) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(asset_id)
    .bind(payload.employee_id)
    .bind(auth.user_id)
    .bind(assigned_on)
    .bind(&payload.notes)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, asset_id, "Failed to record assignment");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tx.commit().await.map_err(|e| {
        error!(error = %e, asset_id, "Failed to commit assignment");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let assignment_id = inserted.last_insert_id();

    notify::dispatch(
        pool.get_ref().clone(),
        vec![Notice::new(
            NotificationKind::Asset,
            Audience::Employee(payload.employee_id),
            "Asset assigned to you",
            format!("Asset #{} was assigned to you on {}.", asset_id, assigned_on),
        )
        .about(assignment_id)],
    );

    Ok(HttpResponse::Ok().json(json!({
        "message": "Asset assigned",
        "assignment_id": assignment_id
    })))
}

/// Return an assigned asset
#[utoipa::path(
    put,
    path = "/api/assets/{asset_id}/return",
    params(
        ("asset_id" = u64, Path, description = "Asset ID")
    ),
    request_body = ReturnAsset,
    responses(
        (status = 200, description = "Asset returned", body = Object, example = json!({
            "message": "Asset returned"
        })),
        (status = 400, description = "No open assignment for this asset"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Asset"
)]
pub async fn return_asset(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ReturnAsset>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let asset_id = path.into_inner();

    let mut tx = pool.begin().await.map_err(|e| {
        error!(error = %e, asset_id, "Failed to open return transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let closed = sqlx::query(
        "UPDATE asset_assignments SET returned_on = ?, return_note = ? \
         WHERE asset_id = ? AND returned_on IS NULL",
    )
    .bind(Utc::now().date_naive())
    .bind(&payload.return_note)
    .bind(asset_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, asset_id, "Failed to close assignment");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if closed.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "No open assignment for this asset"
        })));
    }

    sqlx::query("UPDATE assets SET status = 'available' WHERE id = ?")
        .bind(asset_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, asset_id, "Failed to release asset");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    tx.commit().await.map_err(|e| {
        error!(error = %e, asset_id, "Failed to commit return");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Asset returned"
    })))
}

/// List asset assignments
#[utoipa::path(
    get,
    path = "/api/assets/assignments",
    params(AssignmentQuery),
    responses(
        (status = 200, description = "Assignments with asset details stitched in", body = Vec<AssignmentItem>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Asset"
)]
pub async fn list_assignments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AssignmentQuery>,
) -> actix_web::Result<impl Responder> {
    let mut sql = String::from(
        "SELECT id, asset_id, employee_id, assigned_by, assigned_on, returned_on, \
                return_note, notes \
         FROM asset_assignments WHERE 1=1",
    );
    let mut args: Vec<u64> = Vec::new();

    // Employees only ever see their own assignments.
    if auth.is_employee() {
        let own = auth.employee_id_required()?;
        sql.push_str(" AND employee_id = ?");
        args.push(own);
    } else if let Some(employee_id) = query.employee_id {
        sql.push_str(" AND employee_id = ?");
        args.push(employee_id);
    }

    if query.open_only {
        sql.push_str(" AND returned_on IS NULL");
    }
    sql.push_str(" ORDER BY assigned_on DESC, id DESC");

    let mut q = sqlx::query_as::<_, AssetAssignment>(&sql);
    for arg in args {
        q = q.bind(arg);
    }

    let assignments = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch assignments");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // Stitch asset names client-side, same pattern as employee names.
    let asset_ids: Vec<u64> = assignments.iter().map(|a| a.asset_id).collect();
    let details = asset_details(pool.get_ref(), &asset_ids).await.map_err(|e| {
        error!(error = %e, "Failed to stitch asset details");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // Looked up, not taken: an asset reassigned over the years appears on
    // several rows and keeps its name on each.
    let data: Vec<AssignmentItem> = assignments
        .into_iter()
        .map(|assignment| {
            let detail = details.get(&assignment.asset_id).cloned();
            let (asset_name, asset_tag) = match detail {
                Some((name, tag)) => (Some(name), Some(tag)),
                None => (None, None),
            };
            AssignmentItem {
                assignment,
                asset_name,
                asset_tag,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

async fn asset_details(
    pool: &MySqlPool,
    ids: &[u64],
) -> Result<std::collections::HashMap<u64, (String, String)>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(std::collections::HashMap::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT id, name, asset_tag FROM assets WHERE id IN ({})",
        placeholders
    );

    let mut q = sqlx::query_as::<_, (u64, String, String)>(&sql);
    for id in ids {
        q = q.bind(*id);
    }

    Ok(q.fetch_all(pool)
        .await?
        .into_iter()
        .map(|(id, name, tag)| (id, (name, tag)))
        .collect())
}
