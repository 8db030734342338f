use crate::audit::{self, AuditError, InvoiceEdit};
use crate::auth::auth::AuthUser;
use crate::model::invoice::{Invoice, InvoiceLog, InvoiceTask};
use crate::model::notification::NotificationKind;
use crate::model::role::Role;
use crate::notify::{self, Audience, Notice};
use actix_web::{web, HttpResponse, Responder};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

const INVOICE_SELECT: &str = "SELECT id, invoice_number, client_name, due_date, status, \
     amount_received, notes, total_amount, created_by, created_at, updated_at FROM invoices";

#[derive(Deserialize, ToSchema)]
pub struct NewTask {
    #[schema(example = "Backend integration")]
    pub name: String,
    #[schema(example = 10.0)]
    pub hours: f64,
    #[schema(example = 120.0)]
    pub rate: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateInvoice {
    #[schema(example = "INV-2026-0042")]
    pub invoice_number: String,
    #[schema(example = "Acme Corp")]
    pub client_name: String,
    #[schema(example = "2026-03-15", value_type = Option<String>, format = "date")]
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub tasks: Vec<NewTask>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct InvoiceQuery {
    /// Filter by invoice status
    #[schema(example = "sent")]
    pub status: Option<String>,
    /// Search by client name
    pub client: Option<String>,
    #[schema(example = 1)]
    pub page: Option<u32>,
    #[schema(example = 20)]
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub tasks: Vec<InvoiceTask>,
}

#[derive(Serialize, ToSchema)]
pub struct InvoiceListResponse {
    pub data: Vec<Invoice>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 7)]
    pub total: i64,
}

enum FilterValue<'a> {
    Str(&'a str),
    Text(String),
}

/// Create an invoice with its task list
#[utoipa::path(
    post,
    path = "/api/invoices",
    request_body = CreateInvoice,
    responses(
        (status = 201, description = "Invoice created", body = Object, example = json!({
            "message": "Invoice created",
            "id": 42
        })),
        (status = 409, description = "Invoice number already in use"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Invoice"
)]
pub async fn create_invoice(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateInvoice>,
) -> actix_web::Result<impl Responder> {
    auth.require_finance_or_admin()?;

    let total_amount: f64 = payload.tasks.iter().map(|t| t.hours * t.rate).sum();

    let mut tx = pool.begin().await.map_err(|e| {
        error!(error = %e, "Failed to open invoice transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        "INSERT INTO invoices (invoice_number, client_name, due_date, notes, total_amount, created_by) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&payload.invoice_number)
    .bind(&payload.client_name)
    .bind(payload.due_date)
    .bind(&payload.notes)
    .bind(total_amount)
    .bind(auth.user_id)
    .execute(&mut *tx)
    .await;

    let invoice_id = match result {
        Ok(done) => done.last_insert_id(),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Invoice number already in use"
                    })));
                }
            }
            error!(error = %e, "Failed to create invoice");
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    };

    for (position, task) in payload.tasks.iter().enumerate() {
        sqlx::query(
            "INSERT INTO invoice_tasks (invoice_id, name, hours, rate, display_order) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(invoice_id)
        .bind(&task.name)
        .bind(task.hours)
        .bind(task.rate)
        .bind(position as u32)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, invoice_id, "Failed to insert invoice task");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;
    }

    tx.commit().await.map_err(|e| {
        error!(error = %e, invoice_id, "Failed to commit invoice");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Invoice created",
        "id": invoice_id
    })))
}

/// Get an invoice with its tasks
#[utoipa::path(
    get,
    path = "/api/invoices/{invoice_id}",
    params(
        ("invoice_id" = u64, Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, description = "Invoice with task list", body = InvoiceDetail),
        (status = 404, description = "Invoice not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Invoice"
)]
pub async fn get_invoice(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_finance_or_admin()?;

    let invoice_id = path.into_inner();

    let sql = format!("{} WHERE id = ?", INVOICE_SELECT);
    let invoice = sqlx::query_as::<_, Invoice>(&sql)
        .bind(invoice_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, invoice_id, "Failed to fetch invoice");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(invoice) = invoice else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Invoice not found"
        })));
    };

    let tasks = sqlx::query_as::<_, InvoiceTask>(
        "SELECT id, invoice_id, name, hours, rate, display_order \
         FROM invoice_tasks WHERE invoice_id = ? ORDER BY display_order, id",
    )
    .bind(invoice_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, invoice_id, "Failed to fetch invoice tasks");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(InvoiceDetail { invoice, tasks }))
}

/// List invoices
#[utoipa::path(
    get,
    path = "/api/invoices",
    params(InvoiceQuery),
    responses(
        (status = 200, description = "Paginated invoice list", body = InvoiceListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Invoice"
)]
pub async fn list_invoices(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<InvoiceQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_finance_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    if let Some(client) = query.client.as_deref() {
        where_sql.push_str(" AND client_name LIKE ?");
        args.push(FilterValue::Text(format!("%{}%", client)));
    }

    let count_sql = format!("SELECT COUNT(*) FROM invoices{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::Str(s) => count_q.bind(*s),
            FilterValue::Text(s) => count_q.bind(s.clone()),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count invoices");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        "{}{} ORDER BY id DESC LIMIT ? OFFSET ?",
        INVOICE_SELECT, where_sql
    );
    let mut data_q = sqlx::query_as::<_, Invoice>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::Str(s) => data_q.bind(s),
            FilterValue::Text(s) => data_q.bind(s),
        };
    }

    let invoices = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch invoices");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(InvoiceListResponse {
        data: invoices,
        page,
        per_page,
        total,
    }))
}

/// Update an invoice, logging every field change
///
/// The payload is the complete desired state of the invoice and its task
/// list. Every changed allow-listed field, task addition and task removal
/// is written to the append-only change log inside the same transaction;
/// the derived total is recomputed but never logged.
#[utoipa::path(
    put,
    path = "/api/invoices/{invoice_id}",
    params(
        ("invoice_id" = u64, Path, description = "Invoice ID")
    ),
    request_body = InvoiceEdit,
    responses(
        (status = 200, description = "Invoice updated", body = Object, example = json!({
            "message": "Invoice updated",
            "changes_logged": 3
        })),
        (status = 400, description = "A task id does not belong to this invoice"),
        (status = 404, description = "Invoice not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Invoice"
)]
pub async fn update_invoice(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<InvoiceEdit>,
) -> actix_web::Result<impl Responder> {
    auth.require_finance_or_admin()?;

    let invoice_id = path.into_inner();

    let logged = match audit::apply_invoice_edit(pool.get_ref(), invoice_id, &payload, auth.user_id)
        .await
    {
        Ok(count) => count,
        Err(AuditError::UnknownInvoice(_)) => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Invoice not found"
            })));
        }
        Err(AuditError::ForeignTask { task_id, .. }) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": format!("Task {} does not belong to this invoice", task_id)
            })));
        }
        Err(AuditError::Db(e)) => {
            error!(error = %e, invoice_id, "Invoice update failed");
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    };

    if logged > 0 {
        notify::dispatch(
            pool.get_ref().clone(),
            vec![Notice::new(
                NotificationKind::Invoice,
                Audience::Role(Role::Finance),
                "Invoice updated",
                format!(
                    "Invoice #{} was edited by user #{} ({} change{} logged).",
                    invoice_id,
                    auth.user_id,
                    logged,
                    if logged == 1 { "" } else { "s" }
                ),
            )
            .about(invoice_id)],
        );
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Invoice updated",
        "changes_logged": logged
    })))
}

/// Change history of an invoice
#[utoipa::path(
    get,
    path = "/api/invoices/{invoice_id}/logs",
    params(
        ("invoice_id" = u64, Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, description = "Change log rows, newest first", body = Vec<InvoiceLog>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Invoice"
)]
pub async fn invoice_logs(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_finance_or_admin()?;

    let invoice_id = path.into_inner();

    let logs = sqlx::query_as::<_, InvoiceLog>(
        "SELECT id, invoice_id, task_id, field_name, old_value, new_value, changed_by, \
                reason, created_at \
         FROM invoice_logs WHERE invoice_id = ? ORDER BY id DESC",
    )
    .bind(invoice_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, invoice_id, "Failed to fetch invoice logs");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(logs))
}
