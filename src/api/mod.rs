use sqlx::MySqlPool;
use std::collections::HashMap;

pub mod asset;
pub mod attendance;
pub mod employee;
pub mod grievance;
pub mod holiday;
pub mod invoice;
pub mod learning;
pub mod leave;
pub mod notification;
pub mod payroll;
pub mod referral;

/// Display names for a set of employees, for stitching into list responses.
/// The join happens here instead of in SQL so list queries stay on a single
/// table.
pub(crate) async fn employee_names(
    pool: &MySqlPool,
    ids: &[u64],
) -> Result<HashMap<u64, String>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT id, CONCAT(first_name, ' ', last_name) FROM employees WHERE id IN ({})",
        placeholders
    );

    let mut q = sqlx::query_as::<_, (u64, String)>(&sql);
    for id in ids {
        q = q.bind(*id);
    }

    Ok(q.fetch_all(pool).await?.into_iter().collect())
}
