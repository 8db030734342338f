use crate::model::invoice::{Invoice, InvoiceStatus, InvoiceTask};
use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{MySql, MySqlPool, Transaction};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Desired final state of an invoice, sent by the finance UI. The task list
/// is the complete list: tasks carrying an id replace the stored row with
/// that id, tasks without an id are new, and stored ids missing from the
/// list are deleted.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InvoiceEdit {
    #[schema(example = "Acme Corp")]
    pub client_name: String,
    #[schema(example = "2026-03-15", value_type = Option<String>, format = "date")]
    pub due_date: Option<NaiveDate>,
    pub status: InvoiceStatus,
    pub amount_received: f64,
    pub notes: Option<String>,
    pub tasks: Vec<TaskEdit>,
    #[serde(default)]
    #[schema(example = "client requested extension")]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TaskEdit {
    /// Stored id of the task being edited; omit for a new task.
    pub id: Option<u64>,
    #[schema(example = "Backend integration")]
    pub name: String,
    pub hours: f64,
    pub rate: f64,
}

#[derive(Debug, Display)]
pub enum AuditError {
    #[display(fmt = "invoice {} not found", _0)]
    UnknownInvoice(u64),
    #[display(fmt = "task {} does not belong to invoice {}", task_id, invoice_id)]
    ForeignTask { invoice_id: u64, task_id: u64 },
    #[display(fmt = "database error: {}", _0)]
    Db(sqlx::Error),
}

impl std::error::Error for AuditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuditError::Db(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for AuditError {
    fn from(e: sqlx::Error) -> Self {
        AuditError::Db(e)
    }
}

/// One pending `invoice_logs` row.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub task_id: Option<u64>,
    pub field_name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Everything the transaction will do to the task list.
#[derive(Debug, Default)]
pub struct TaskPlan {
    /// Id-matched tasks whose stored row gets rewritten.
    pub updates: Vec<(u64, TaskEdit)>,
    /// Per-field log rows for id-matched tasks.
    pub field_changes: Vec<FieldChange>,
    pub additions: Vec<TaskEdit>,
    pub removals: Vec<InvoiceTask>,
}

fn json_text<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

/// Field-level diff of the editable invoice columns. The derived
/// `total_amount` is not an editable column and never appears here.
pub fn diff_invoice(current: &Invoice, edit: &InvoiceEdit) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    let mut push = |field: &str, old: String, new: String| {
        if old != new {
            changes.push(FieldChange {
                task_id: None,
                field_name: field.to_string(),
                old_value: Some(old),
                new_value: Some(new),
            });
        }
    };

    push(
        "client_name",
        json_text(&current.client_name),
        json_text(&edit.client_name),
    );
    push("due_date", json_text(&current.due_date), json_text(&edit.due_date));
    push(
        "status",
        json_text(&current.status),
        json_text(&edit.status.to_string()),
    );
    push(
        "amount_received",
        json_text(&current.amount_received),
        json_text(&edit.amount_received),
    );
    push("notes", json_text(&current.notes), json_text(&edit.notes));

    changes
}

fn task_snapshot(name: &str, hours: f64, rate: f64) -> String {
    json!({ "name": name, "hours": hours, "rate": rate }).to_string()
}

/// Matches payload tasks to stored ones by id and plans updates, additions
/// and removals. A payload id that does not belong to the invoice is a
/// client error, not a new task.
pub fn plan_tasks(
    invoice_id: u64,
    current: &[InvoiceTask],
    edits: &[TaskEdit],
) -> Result<TaskPlan, AuditError> {
    let stored: BTreeMap<u64, &InvoiceTask> = current.iter().map(|t| (t.id, t)).collect();
    let mut plan = TaskPlan::default();
    let mut seen = Vec::new();

    for edit in edits {
        let Some(id) = edit.id else {
            plan.additions.push(edit.clone());
            continue;
        };
        let Some(existing) = stored.get(&id) else {
            return Err(AuditError::ForeignTask {
                invoice_id,
                task_id: id,
            });
        };
        seen.push(id);

        let mut push = |field: &str, old: String, new: String| {
            if old != new {
                plan.field_changes.push(FieldChange {
                    task_id: Some(id),
                    field_name: field.to_string(),
                    old_value: Some(old),
                    new_value: Some(new),
                });
            }
        };
        push("name", json_text(&existing.name), json_text(&edit.name));
        push("hours", json_text(&existing.hours), json_text(&edit.hours));
        push("rate", json_text(&existing.rate), json_text(&edit.rate));

        if existing.name != edit.name || existing.hours != edit.hours || existing.rate != edit.rate
        {
            plan.updates.push((id, edit.clone()));
        }
    }

    for task in current {
        if !seen.contains(&task.id) {
            plan.removals.push(task.clone());
        }
    }

    Ok(plan)
}

/// Applies an edit and its change log in one transaction. Any failure,
/// including a failure to write a log row, rolls the whole edit back.
/// Returns the number of log rows written.
pub async fn apply_invoice_edit(
    hr: &MySqlPool,
    invoice_id: u64,
    edit: &InvoiceEdit,
    changed_by: u64,
) -> Result<usize, AuditError> {
    let mut tx = hr.begin().await?;

    let current = sqlx::query_as::<_, Invoice>(
        "SELECT id, invoice_number, client_name, due_date, status, amount_received, notes, \
                total_amount, created_by, created_at, updated_at \
         FROM invoices WHERE id = ? FOR UPDATE",
    )
    .bind(invoice_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AuditError::UnknownInvoice(invoice_id))?;

    let current_tasks = sqlx::query_as::<_, InvoiceTask>(
        "SELECT id, invoice_id, name, hours, rate, display_order \
         FROM invoice_tasks WHERE invoice_id = ? ORDER BY display_order, id FOR UPDATE",
    )
    .bind(invoice_id)
    .fetch_all(&mut *tx)
    .await?;

    let invoice_changes = diff_invoice(&current, edit);
    let plan = plan_tasks(invoice_id, &current_tasks, &edit.tasks)?;

    // The payload is the desired final task list, so the new total is fully
    // determined by it.
    let total_amount: f64 = edit.tasks.iter().map(|t| t.hours * t.rate).sum();

    sqlx::query(
        "UPDATE invoices SET client_name = ?, due_date = ?, status = ?, \
                amount_received = ?, notes = ?, total_amount = ? WHERE id = ?",
    )
    .bind(&edit.client_name)
    .bind(edit.due_date)
    .bind(edit.status.to_string())
    .bind(edit.amount_received)
    .bind(&edit.notes)
    .bind(total_amount)
    .bind(invoice_id)
    .execute(&mut *tx)
    .await?;

    for (task_id, task) in &plan.updates {
        sqlx::query("UPDATE invoice_tasks SET name = ?, hours = ?, rate = ? WHERE id = ?")
            .bind(&task.name)
            .bind(task.hours)
            .bind(task.rate)
            .bind(task_id)
            .execute(&mut *tx)
            .await?;
    }

    let mut logged = Vec::new();
    logged.extend(invoice_changes);
    logged.extend(plan.field_changes);

    for (position, task) in plan.additions.iter().enumerate() {
        let inserted = sqlx::query(
            "INSERT INTO invoice_tasks (invoice_id, name, hours, rate, display_order) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(invoice_id)
        .bind(&task.name)
        .bind(task.hours)
        .bind(task.rate)
        .bind((current_tasks.len() + position) as u32)
        .execute(&mut *tx)
        .await?;
        logged.push(FieldChange {
            task_id: Some(inserted.last_insert_id()),
            field_name: "task_added".to_string(),
            old_value: None,
            new_value: Some(task_snapshot(&task.name, task.hours, task.rate)),
        });
    }

    for task in &plan.removals {
        sqlx::query("DELETE FROM invoice_tasks WHERE id = ?")
            .bind(task.id)
            .execute(&mut *tx)
            .await?;
        logged.push(FieldChange {
            task_id: Some(task.id),
            field_name: "task_removed".to_string(),
            old_value: Some(task_snapshot(&task.name, task.hours, task.rate)),
            new_value: None,
        });
    }

    for change in &logged {
        insert_log(&mut tx, invoice_id, change, changed_by, &edit.reason).await?;
    }

    tx.commit().await?;
    Ok(logged.len())
}

async fn insert_log(
    tx: &mut Transaction<'_, MySql>,
    invoice_id: u64,
    change: &FieldChange,
    changed_by: u64,
    reason: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO invoice_logs (invoice_id, task_id, field_name, old_value, new_value, \
                changed_by, reason) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(invoice_id)
    .bind(change.task_id)
    .bind(&change.field_name)
    .bind(&change.old_value)
    .bind(&change.new_value)
    .bind(changed_by)
    .bind(reason)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn invoice() -> Invoice {
        Invoice {
            id: 5,
            invoice_number: "INV-2026-0042".to_string(),
            client_name: "Acme Corp".to_string(),
            due_date: NaiveDate::from_ymd_opt(2026, 3, 15),
            status: "sent".to_string(),
            amount_received: 0.0,
            notes: None,
            total_amount: 1200.0,
            created_by: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn task(id: u64, name: &str, hours: f64, rate: f64) -> InvoiceTask {
        InvoiceTask {
            id,
            invoice_id: 5,
            name: name.to_string(),
            hours,
            rate,
            display_order: 0,
        }
    }

    fn edit_of(invoice: &Invoice, tasks: Vec<TaskEdit>) -> InvoiceEdit {
        InvoiceEdit {
            client_name: invoice.client_name.clone(),
            due_date: invoice.due_date,
            status: InvoiceStatus::Sent,
            amount_received: invoice.amount_received,
            notes: invoice.notes.clone(),
            tasks,
            reason: String::new(),
        }
    }

    fn keep(task: &InvoiceTask) -> TaskEdit {
        TaskEdit {
            id: Some(task.id),
            name: task.name.clone(),
            hours: task.hours,
            rate: task.rate,
        }
    }

    #[test]
    fn unchanged_edit_diffs_to_nothing() {
        let inv = invoice();
        assert!(diff_invoice(&inv, &edit_of(&inv, vec![])).is_empty());
    }

    #[test]
    fn each_changed_field_yields_one_row() {
        let inv = invoice();
        let mut edit = edit_of(&inv, vec![]);
        edit.client_name = "Acme Corporation".to_string();
        edit.due_date = NaiveDate::from_ymd_opt(2026, 4, 1);

        let changes = diff_invoice(&inv, &edit);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].field_name, "client_name");
        assert_eq!(changes[0].old_value.as_deref(), Some("\"Acme Corp\""));
        assert_eq!(changes[0].new_value.as_deref(), Some("\"Acme Corporation\""));
        assert_eq!(changes[1].field_name, "due_date");
        assert_eq!(changes[1].old_value.as_deref(), Some("\"2026-03-15\""));
        assert_eq!(changes[1].new_value.as_deref(), Some("\"2026-04-01\""));
    }

    #[test]
    fn clearing_an_optional_field_is_logged_as_json_null() {
        let inv = invoice();
        let mut edit = edit_of(&inv, vec![]);
        edit.due_date = None;

        let changes = diff_invoice(&inv, &edit);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new_value.as_deref(), Some("null"));
    }

    #[test]
    fn derived_total_never_appears_in_the_diff() {
        // Task hours change moves total_amount, but only the task field is
        // logged.
        let inv = invoice();
        let stored = vec![task(7, "Backend integration", 10.0, 120.0)];
        let mut edited = keep(&stored[0]);
        edited.hours = 14.0;

        let changes = diff_invoice(&inv, &edit_of(&inv, vec![edited.clone()]));
        assert!(changes.iter().all(|c| c.field_name != "total_amount"));

        let plan = plan_tasks(5, &stored, &[edited]).unwrap();
        assert_eq!(plan.field_changes.len(), 1);
        assert_eq!(plan.field_changes[0].field_name, "hours");
        assert_eq!(plan.field_changes[0].task_id, Some(7));
        assert_eq!(plan.field_changes[0].old_value.as_deref(), Some("10.0"));
        assert_eq!(plan.field_changes[0].new_value.as_deref(), Some("14.0"));
    }

    #[test]
    fn payload_task_without_id_is_an_addition() {
        let stored = vec![task(7, "Backend integration", 10.0, 120.0)];
        let new_task = TaskEdit {
            id: None,
            name: "Deployment".to_string(),
            hours: 4.0,
            rate: 150.0,
        };
        let plan = plan_tasks(5, &stored, &[keep(&stored[0]), new_task]).unwrap();
        assert_eq!(plan.additions.len(), 1);
        assert!(plan.removals.is_empty());
        assert!(plan.field_changes.is_empty());
        assert!(plan.updates.is_empty());
    }

    #[test]
    fn stored_id_missing_from_payload_is_a_removal() {
        let stored = vec![
            task(7, "Backend integration", 10.0, 120.0),
            task(8, "Code review", 2.0, 100.0),
        ];
        let plan = plan_tasks(5, &stored, &[keep(&stored[0])]).unwrap();
        assert_eq!(plan.removals.len(), 1);
        assert_eq!(plan.removals[0].id, 8);
        assert!(plan.additions.is_empty());
    }

    #[test]
    fn renamed_task_is_an_update_not_a_replacement() {
        // Same stored id with every field different stays matched by id.
        let stored = vec![task(7, "Backend integration", 10.0, 120.0)];
        let mut edited = keep(&stored[0]);
        edited.name = "Platform integration".to_string();
        edited.hours = 12.0;
        edited.rate = 130.0;

        let plan = plan_tasks(5, &stored, &[edited]).unwrap();
        assert!(plan.additions.is_empty());
        assert!(plan.removals.is_empty());
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.field_changes.len(), 3);
        assert!(plan.field_changes.iter().all(|c| c.task_id == Some(7)));
    }

    #[test]
    fn identical_payload_plans_nothing() {
        let stored = vec![
            task(7, "Backend integration", 10.0, 120.0),
            task(8, "Code review", 2.0, 100.0),
        ];
        let plan = plan_tasks(5, &stored, &[keep(&stored[0]), keep(&stored[1])]).unwrap();
        assert!(plan.updates.is_empty());
        assert!(plan.field_changes.is_empty());
        assert!(plan.additions.is_empty());
        assert!(plan.removals.is_empty());
    }

    #[test]
    fn foreign_task_id_is_rejected() {
        let stored = vec![task(7, "Backend integration", 10.0, 120.0)];
        let foreign = TaskEdit {
            id: Some(99),
            name: "Smuggled".to_string(),
            hours: 1.0,
            rate: 1.0,
        };
        match plan_tasks(5, &stored, &[foreign]) {
            Err(AuditError::ForeignTask { task_id: 99, .. }) => {}
            other => panic!("expected ForeignTask, got {:?}", other.map(|p| p.updates.len())),
        }
    }

    #[test]
    fn status_changes_log_the_wire_names() {
        let inv = invoice();
        let mut edit = edit_of(&inv, vec![]);
        edit.status = InvoiceStatus::PartiallyPaid;

        let changes = diff_invoice(&inv, &edit);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field_name, "status");
        assert_eq!(changes[0].old_value.as_deref(), Some("\"sent\""));
        assert_eq!(changes[0].new_value.as_deref(), Some("\"partially_paid\""));
    }
}
