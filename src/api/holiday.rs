use crate::auth::auth::AuthUser;
use crate::model::holiday::Holiday;
use actix_web::{web, HttpResponse, Responder};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateHoliday {
    #[schema(example = "2026-01-26", format = "date", value_type = String)]
    pub holiday_date: NaiveDate,
    #[schema(example = "Republic Day")]
    pub name: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HolidayQuery {
    #[schema(example = 2026)]
    pub year: u32,
    /// Restrict to one month; omit for the whole year.
    #[schema(example = 1)]
    pub month: Option<u32>,
}

/// Add a holiday to the calendar
#[utoipa::path(
    post,
    path = "/api/holidays",
    request_body = CreateHoliday,
    responses(
        (status = 201, description = "Holiday created", body = Object, example = json!({
            "message": "Holiday created",
            "id": 3
        })),
        (status = 409, description = "Date already marked as a holiday"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn create_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateHoliday>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let result = sqlx::query("INSERT INTO holidays (holiday_date, name) VALUES (?, ?)")
        .bind(payload.holiday_date)
        .bind(&payload.name)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(done) => Ok(HttpResponse::Created().json(json!({
            "message": "Holiday created",
            "id": done.last_insert_id()
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Date already marked as a holiday"
                    })));
                }
            }

            error!(error = %e, "Failed to create holiday");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// List holidays for a year or month
#[utoipa::path(
    get,
    path = "/api/holidays",
    params(HolidayQuery),
    responses(
        (status = 200, description = "Holidays in the requested window", body = Vec<Holiday>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HolidayQuery>,
) -> actix_web::Result<impl Responder> {
    let mut sql = String::from(
        "SELECT id, holiday_date, name FROM holidays WHERE YEAR(holiday_date) = ?",
    );
    if query.month.is_some() {
        sql.push_str(" AND MONTH(holiday_date) = ?");
    }
    sql.push_str(" ORDER BY holiday_date");

    let mut q = sqlx::query_as::<_, Holiday>(&sql).bind(query.year);
    if let Some(month) = query.month {
        q = q.bind(month);
    }

    let holidays = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch holidays");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(holidays))
}

/// Remove a holiday
///
/// Payroll statements already archived keep the working-day counts they were
/// generated with; removal only affects future runs.
#[utoipa::path(
    delete,
    path = "/api/holidays/{holiday_id}",
    params(
        ("holiday_id" = u64, Path, description = "Holiday ID")
    ),
    responses(
        (status = 200, description = "Holiday removed", body = Object, example = json!({
            "message": "Holiday removed"
        })),
        (status = 404, description = "Holiday not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let holiday_id = path.into_inner();

    let result = sqlx::query("DELETE FROM holidays WHERE id = ?")
        .bind(holiday_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, holiday_id, "Failed to delete holiday");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Holiday not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Holiday removed"
    })))
}
