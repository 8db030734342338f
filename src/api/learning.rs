use crate::auth::auth::AuthUser;
use crate::model::learning::{Course, CourseEnrollment};
use crate::model::notification::NotificationKind;
use crate::notify::{self, Audience, Notice};
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::collections::HashMap;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateCourse {
    #[schema(example = "Secure Coding Basics")]
    pub title: String,
    #[schema(example = "security")]
    pub category: String,
    #[schema(example = 6.0)]
    pub duration_hours: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct AssignCourse {
    #[schema(example = 3)]
    pub course_id: u64,
    #[schema(example = 1001)]
    pub employee_id: u64,
}

#[derive(Deserialize, ToSchema)]
pub struct ProgressUpdate {
    /// 0..=100; 100 marks the enrollment completed.
    #[schema(example = 60)]
    pub progress_pct: u8,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct CourseQuery {
    /// Include retired courses
    #[serde(default)]
    pub include_inactive: bool,
    /// Filter by category
    #[schema(example = "security")]
    pub category: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EnrollmentItem {
    #[serde(flatten)]
    pub enrollment: CourseEnrollment,
    /// Stitched in from the courses table.
    #[schema(example = "Secure Coding Basics")]
    pub course_title: Option<String>,
}

/// Add a course to the catalog
#[utoipa::path(
    post,
    path = "/api/learning/courses",
    request_body = CreateCourse,
    responses(
        (status = 201, description = "Course created", body = Object, example = json!({
            "message": "Course created",
            "id": 3
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Learning"
)]
pub async fn create_course(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCourse>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let result = sqlx::query(
        "INSERT INTO courses (title, category, duration_hours) VALUES (?, ?, ?)",
    )
    .bind(&payload.title)
    .bind(&payload.category)
    .bind(payload.duration_hours)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create course");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Course created",
        "id": result.last_insert_id()
    })))
}

/// Course catalog
#[utoipa::path(
    get,
    path = "/api/learning/courses",
    params(CourseQuery),
    responses(
        (status = 200, description = "Courses in the catalog", body = Vec<Course>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Learning"
)]
pub async fn list_courses(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<CourseQuery>,
) -> actix_web::Result<impl Responder> {
    let mut sql = String::from(
        "SELECT id, title, category, duration_hours, is_active FROM courses WHERE 1=1",
    );
    if !query.include_inactive {
        sql.push_str(" AND is_active = 1");
    }
    if query.category.is_some() {
        sql.push_str(" AND category = ?");
    }
    sql.push_str(" ORDER BY title");

    let mut q = sqlx::query_as::<_, Course>(&sql);
    if let Some(category) = query.category.as_deref() {
        q = q.bind(category);
    }

    let courses = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch courses");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(courses))
}

/// Assign a course to an employee (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/learning/assign",
    request_body = AssignCourse,
    responses(
        (status = 201, description = "Course assigned", body = Object, example = json!({
            "message": "Course assigned",
            "enrollment_id": 14
        })),
        (status = 409, description = "Employee already enrolled in this course"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Learning"
)]
pub async fn assign_course(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<AssignCourse>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let result = sqlx::query(
        "INSERT INTO course_enrollments (course_id, employee_id, assigned_by) VALUES (?, ?, ?)",
    )
    .bind(payload.course_id)
    .bind(payload.employee_id)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await;

    let enrollment_id = match result {
        Ok(done) => done.last_insert_id(),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Employee already enrolled in this course"
                    })));
                }
            }
            error!(error = %e, "Failed to assign course");
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    };

    notify::dispatch(
        pool.get_ref().clone(),
        vec![Notice::new(
            NotificationKind::Learning,
            Audience::Employee(payload.employee_id),
            "New course assigned",
            format!("Course #{} was assigned to you.", payload.course_id),
        )
        .about(enrollment_id)],
    );

    Ok(HttpResponse::Created().json(json!({
        "message": "Course assigned",
        "enrollment_id": enrollment_id
    })))
}

/// My enrollments
#[utoipa::path(
    get,
    path = "/api/learning/mine",
    responses(
        (status = 200, description = "Caller's enrollments with course titles", body = Vec<EnrollmentItem>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Learning"
)]
pub async fn my_enrollments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id_required()?;

    let enrollments = sqlx::query_as::<_, CourseEnrollment>(
        "SELECT id, course_id, employee_id, assigned_by, status, progress_pct, assigned_at, \
                completed_at \
         FROM course_enrollments WHERE employee_id = ? ORDER BY assigned_at DESC",
    )
    .bind(employee_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch enrollments");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let course_ids: Vec<u64> = enrollments.iter().map(|e| e.course_id).collect();
    let titles = course_titles(pool.get_ref(), &course_ids).await.map_err(|e| {
        error!(error = %e, "Failed to stitch course titles");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data: Vec<EnrollmentItem> = enrollments
        .into_iter()
        .map(|enrollment| {
            let course_title = titles.get(&enrollment.course_id).cloned();
            EnrollmentItem {
                enrollment,
                course_title,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

/// Record course progress
///
/// Reaching 100 percent flips the enrollment to completed and stamps the
/// completion time.
#[utoipa::path(
    put,
    path = "/api/learning/enrollments/{enrollment_id}/progress",
    params(
        ("enrollment_id" = u64, Path, description = "Enrollment ID")
    ),
    request_body = ProgressUpdate,
    responses(
        (status = 200, description = "Progress recorded", body = Object, example = json!({
            "message": "Progress recorded",
            "status": "in_progress"
        })),
        (status = 400, description = "progress_pct over 100"),
        (status = 404, description = "Enrollment not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Learning"
)]
pub async fn update_progress(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ProgressUpdate>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id_required()?;
    let enrollment_id = path.into_inner();

    if payload.progress_pct > 100 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "progress_pct cannot exceed 100"
        })));
    }

    let completed = payload.progress_pct == 100;
    let status = if completed { "completed" } else { "in_progress" };

    let sql = if completed {
        "UPDATE course_enrollments SET progress_pct = ?, status = ?, completed_at = NOW() \
         WHERE id = ? AND employee_id = ?"
    } else {
        "UPDATE course_enrollments SET progress_pct = ?, status = ? \
         WHERE id = ? AND employee_id = ?"
    };

    let result = sqlx::query(sql)
        .bind(payload.progress_pct)
        .bind(status)
        .bind(enrollment_id)
        .bind(employee_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, enrollment_id, "Failed to record progress");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Enrollment not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Progress recorded",
        "status": status
    })))
}

async fn course_titles(
    pool: &MySqlPool,
    ids: &[u64],
) -> Result<HashMap<u64, String>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("SELECT id, title FROM courses WHERE id IN ({})", placeholders);

    let mut q = sqlx::query_as::<_, (u64, String)>(&sql);
    for id in ids {
        q = q.bind(*id);
    }

    Ok(q.fetch_all(pool).await?.into_iter().collect())
}
