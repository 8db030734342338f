pub mod attendance;
pub mod calendar;
pub mod leave;
pub mod statement;
pub mod weekend;

use crate::db::Databases;
use crate::model::employee::Employee;
use crate::model::payroll::PayrollStatement;
use calendar::{month_bounds, MonthCalendar};
use chrono::{NaiveDate, Utc};
use derive_more::Display;
use serde::Serialize;
use sqlx::MySqlPool;
use std::collections::BTreeSet;
use utoipa::ToSchema;

#[derive(Debug, Display)]
pub enum PayrollError {
    #[display(fmt = "{}-{:02} is not a calendar month", year, month)]
    InvalidMonth { year: u32, month: u32 },
    #[display(fmt = "employee {} not found", _0)]
    UnknownEmployee(u64),
    #[display(fmt = "database error: {}", _0)]
    Db(sqlx::Error),
}

impl std::error::Error for PayrollError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PayrollError::Db(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for PayrollError {
    fn from(e: sqlx::Error) -> Self {
        PayrollError::Db(e)
    }
}

/// Result of a bulk payroll run. `archived` is false when the
/// `payroll_statements` table does not exist and the figures could only be
/// derived, not stored.
#[derive(Debug, Serialize, ToSchema)]
pub struct MonthRun {
    pub year: u32,
    pub month: u32,
    pub statements: Vec<PayrollStatement>,
    pub archived: bool,
}

/// Derives one employee's statement for one month. Pulls holidays and
/// approved leave from the HR database and time entries from the tracker,
/// then runs the pure pipeline: attendance summary, leave resolution,
/// weekend qualification, composition.
pub async fn build_statement(
    db: &Databases,
    employee: &Employee,
    year: u32,
    month: u32,
) -> Result<PayrollStatement, PayrollError> {
    let (first, last) =
        month_bounds(year, month).ok_or(PayrollError::InvalidMonth { year, month })?;
    let holidays = load_holiday_dates(&db.hr, first, last).await?;
    let cal = MonthCalendar::new(year, month, holidays)
        .ok_or(PayrollError::InvalidMonth { year, month })?;

    let summary = attendance::load_month_attendance(&db.tracker, &employee.email, &cal).await?;
    let leaves = leave::load_approved_leaves(&db.hr, employee.id, &cal).await?;
    let breakdown = leave::resolve_leaves(&cal, &leaves);

    let mut covered = summary.worked_dates.clone();
    covered.extend(breakdown.leave_dates.iter().copied());
    let weekend_days_paid = weekend::qualified_weekend_days(&cal, &covered);

    Ok(statement::compose(
        employee,
        year,
        month,
        &summary,
        breakdown.paid_leave_days,
        weekend_days_paid,
    ))
}

/// Statement for a single employee looked up by id.
pub async fn statement_for(
    db: &Databases,
    employee_id: u64,
    year: u32,
    month: u32,
) -> Result<PayrollStatement, PayrollError> {
    let employee = fetch_employee(&db.hr, employee_id)
        .await?
        .ok_or(PayrollError::UnknownEmployee(employee_id))?;
    build_statement(db, &employee, year, month).await
}

/// Runs payroll for every active employee, one at a time in id order, then
/// archives the statements. A failure for any employee fails the whole run;
/// only a missing archive table downgrades to derived-only output.
pub async fn run_month(
    db: &Databases,
    year: u32,
    month: u32,
    run_by: u64,
) -> Result<MonthRun, PayrollError> {
    let employees = fetch_active_employees(&db.hr).await?;
    let mut statements = Vec::with_capacity(employees.len());
    for employee in &employees {
        let statement = build_statement(db, employee, year, month).await?;
        statements.push(statement);
    }

    let archived = archive_statements(&db.hr, &statements, run_by).await?;
    if archived {
        let stamped_at = Utc::now();
        for statement in &mut statements {
            statement.generated_by = Some(run_by);
            statement.generated_at = Some(stamped_at);
        }
    }

    Ok(MonthRun {
        year,
        month,
        statements,
        archived,
    })
}

/// Previously archived statements for a month. Deployments that never
/// created the archive table get an empty list, not an error.
pub async fn archived_statements(
    hr: &MySqlPool,
    year: u32,
    month: u32,
) -> Result<Vec<PayrollStatement>, PayrollError> {
    let result = sqlx::query_as::<_, PayrollStatement>(
        "SELECT id, employee_id, year, month, total_working_days, days_present, \
                paid_leave_days, weekend_days_paid, payable_days, attendance_ratio, \
                hours_worked, basic_pay, hra, night_allowance, special_allowance, \
                gross_pay, pf_deduction, esi_deduction, tds_deduction, professional_tax, \
                voluntary_fund, total_deductions, net_pay, generated_by, generated_at \
         FROM payroll_statements WHERE year = ? AND month = ? ORDER BY employee_id",
    )
    .bind(year)
    .bind(month)
    .fetch_all(hr)
    .await;

    match result {
        Ok(rows) => Ok(rows),
        Err(e) if table_missing(&e) => {
            tracing::warn!(year = year, month = month, "payroll_statements table missing, returning empty history");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

async fn archive_statements(
    hr: &MySqlPool,
    statements: &[PayrollStatement],
    run_by: u64,
) -> Result<bool, PayrollError> {
    for s in statements {
        let result = sqlx::query(
            "INSERT INTO payroll_statements \
                (employee_id, year, month, total_working_days, days_present, paid_leave_days, \
                 weekend_days_paid, payable_days, attendance_ratio, hours_worked, basic_pay, \
                 hra, night_allowance, special_allowance, gross_pay, pf_deduction, esi_deduction, \
                 tds_deduction, professional_tax, voluntary_fund, total_deductions, net_pay, \
                 generated_by) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON DUPLICATE KEY UPDATE \
                total_working_days = VALUES(total_working_days), \
                days_present = VALUES(days_present), \
                paid_leave_days = VALUES(paid_leave_days), \
                weekend_days_paid = VALUES(weekend_days_paid), \
                payable_days = VALUES(payable_days), \
                attendance_ratio = VALUES(attendance_ratio), \
                hours_worked = VALUES(hours_worked), \
                basic_pay = VALUES(basic_pay), \
                hra = VALUES(hra), \
                night_allowance = VALUES(night_allowance), \
                special_allowance = VALUES(special_allowance), \
                gross_pay = VALUES(gross_pay), \
                pf_deduction = VALUES(pf_deduction), \
                esi_deduction = VALUES(esi_deduction), \
                tds_deduction = VALUES(tds_deduction), \
                professional_tax = VALUES(professional_tax), \
                voluntary_fund = VALUES(voluntary_fund), \
                total_deductions = VALUES(total_deductions), \
                net_pay = VALUES(net_pay), \
                generated_by = VALUES(generated_by), \
                generated_at = CURRENT_TIMESTAMP",
        )
        .bind(s.employee_id)
        .bind(s.year)
        .bind(s.month)
        .bind(s.total_working_days)
        .bind(s.days_present)
        .bind(s.paid_leave_days)
        .bind(s.weekend_days_paid)
        .bind(s.payable_days)
        .bind(s.attendance_ratio)
        .bind(s.hours_worked)
        .bind(s.basic_pay)
        .bind(s.hra)
        .bind(s.night_allowance)
        .bind(s.special_allowance)
        .bind(s.gross_pay)
        .bind(s.pf_deduction)
        .bind(s.esi_deduction)
        .bind(s.tds_deduction)
        .bind(s.professional_tax)
        .bind(s.voluntary_fund)
        .bind(s.total_deductions)
        .bind(s.net_pay)
        .bind(run_by)
        .execute(hr)
        .await;

        match result {
            Ok(_) => {}
            Err(e) if table_missing(&e) => {
                tracing::warn!("payroll_statements table missing, skipping archive");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

fn table_missing(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code == "42S02")
        .unwrap_or(false)
}

pub(crate) async fn load_holiday_dates(
    hr: &MySqlPool,
    first: NaiveDate,
    last: NaiveDate,
) -> Result<BTreeSet<NaiveDate>, sqlx::Error> {
    let dates = sqlx::query_scalar::<_, NaiveDate>(
        "SELECT holiday_date FROM holidays WHERE holiday_date BETWEEN ? AND ?",
    )
    .bind(first)
    .bind(last)
    .fetch_all(hr)
    .await?;
    Ok(dates.into_iter().collect())
}

pub async fn fetch_employee(
    hr: &MySqlPool,
    employee_id: u64,
) -> Result<Option<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        "SELECT id, employee_code, first_name, last_name, email, phone, department, \
                designation, hire_date, status, basic_pay, hra, night_allowance, \
                special_allowance, pf_rate, esi_rate, tds_monthly, professional_tax, \
                voluntary_fund, take_home_salary \
         FROM employees WHERE id = ?",
    )
    .bind(employee_id)
    .fetch_optional(hr)
    .await
}

pub async fn fetch_active_employees(hr: &MySqlPool) -> Result<Vec<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        "SELECT id, employee_code, first_name, last_name, email, phone, department, \
                designation, hire_date, status, basic_pay, hra, night_allowance, \
                special_allowance, pf_rate, esi_rate, tds_monthly, professional_tax, \
                voluntary_fund, take_home_salary \
         FROM employees WHERE status = 'active' ORDER BY id",
    )
    .fetch_all(hr)
    .await
}
