use crate::model::leave::{LeaveApplication, LeaveStatus};
use crate::payroll::calendar::MonthCalendar;
use chrono::NaiveDate;
use sqlx::MySqlPool;
use std::collections::BTreeSet;

/// Approved leave distilled for one payroll month.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveBreakdown {
    /// Sum over approved applications of days-inside-the-month scaled by the
    /// paid share of the application (1 - lopDays / daysCount).
    pub paid_leave_days: f64,
    /// Every date covered by an approved application, including dates
    /// outside the month. Weekend qualification looks at Fridays and Mondays
    /// that can fall on either side of a month boundary.
    pub leave_dates: BTreeSet<NaiveDate>,
}

pub fn resolve_leaves(cal: &MonthCalendar, leaves: &[LeaveApplication]) -> LeaveBreakdown {
    let mut paid_leave_days = 0.0;
    let mut leave_dates = BTreeSet::new();

    for leave in leaves {
        if leave.end_date < leave.start_date {
            continue;
        }
        let mut day = leave.start_date;
        while day <= leave.end_date {
            leave_dates.insert(day);
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        let from = leave.start_date.max(cal.first());
        let to = leave.end_date.min(cal.last());
        if from > to {
            continue;
        }
        let days_in_month = ((to - from).num_days() + 1) as f64;
        if leave.days_count <= 0.0 {
            continue;
        }
        let lop_fraction = leave.lop_days / leave.days_count;
        paid_leave_days += days_in_month * (1.0 - lop_fraction);
    }

    LeaveBreakdown {
        paid_leave_days,
        leave_dates,
    }
}

/// Approved applications overlapping the month, including ones that start or
/// end outside it.
pub async fn load_approved_leaves(
    hr: &MySqlPool,
    employee_id: u64,
    cal: &MonthCalendar,
) -> Result<Vec<LeaveApplication>, sqlx::Error> {
    sqlx::query_as::<_, LeaveApplication>(
        "SELECT id, employee_id, leave_type, start_date, end_date, days_count, lop_days, \
                reason, status, applied_at, decided_by, decided_at, decision_note \
         FROM leave_applications \
         WHERE employee_id = ? AND status = ? AND start_date <= ? AND end_date >= ? \
         ORDER BY start_date",
    )
    .bind(employee_id)
    .bind(LeaveStatus::Approved.to_string())
    .bind(cal.last())
    .bind(cal.first())
    .fetch_all(hr)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn d(y: u32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y as i32, m, day).unwrap()
    }

    fn cal() -> MonthCalendar {
        MonthCalendar::new(2026, 4, BTreeSet::new()).unwrap()
    }

    fn approved(start: NaiveDate, end: NaiveDate, days_count: f64, lop_days: f64) -> LeaveApplication {
        LeaveApplication {
            id: 1,
            employee_id: 9,
            leave_type: "earned".to_string(),
            start_date: start,
            end_date: end,
            days_count,
            lop_days,
            reason: None,
            status: LeaveStatus::Approved.to_string(),
            applied_at: Utc::now(),
            decided_by: None,
            decided_at: None,
            decision_note: None,
        }
    }

    #[test]
    fn fully_paid_leave_counts_every_day_in_month() {
        let leaves = vec![approved(d(2026, 4, 6), d(2026, 4, 8), 3.0, 0.0)];
        let breakdown = resolve_leaves(&cal(), &leaves);
        assert_eq!(breakdown.paid_leave_days, 3.0);
    }

    #[test]
    fn span_is_clipped_to_the_month() {
        // Eight days total, only the first three fall inside April.
        let leaves = vec![approved(d(2026, 3, 28), d(2026, 4, 3), 7.0, 0.0)];
        let breakdown = resolve_leaves(&cal(), &leaves);
        assert_eq!(breakdown.paid_leave_days, 3.0);
        // The qualifying set still carries the March dates.
        assert!(breakdown.leave_dates.contains(&d(2026, 3, 28)));
        assert!(breakdown.leave_dates.contains(&d(2026, 4, 3)));
    }

    #[test]
    fn lop_share_reduces_paid_days() {
        // 4 of 10 days are loss-of-pay, so each day is worth 0.6 paid days.
        let leaves = vec![approved(d(2026, 4, 6), d(2026, 4, 15), 10.0, 4.0)];
        let breakdown = resolve_leaves(&cal(), &leaves);
        assert!((breakdown.paid_leave_days - 6.0).abs() < 1e-9);
    }

    #[test]
    fn zero_day_count_contributes_no_paid_days() {
        let leaves = vec![approved(d(2026, 4, 6), d(2026, 4, 8), 0.0, 0.0)];
        let breakdown = resolve_leaves(&cal(), &leaves);
        assert_eq!(breakdown.paid_leave_days, 0.0);
        // The dates still count for weekend qualification.
        assert!(breakdown.leave_dates.contains(&d(2026, 4, 7)));
    }

    #[test]
    fn fully_unpaid_leave_contributes_no_paid_days() {
        let leaves = vec![approved(d(2026, 4, 6), d(2026, 4, 10), 5.0, 5.0)];
        let breakdown = resolve_leaves(&cal(), &leaves);
        assert_eq!(breakdown.paid_leave_days, 0.0);
        assert_eq!(breakdown.leave_dates.len(), 5);
    }

    #[test]
    fn applications_accumulate() {
        let leaves = vec![
            approved(d(2026, 4, 1), d(2026, 4, 2), 2.0, 0.0),
            approved(d(2026, 4, 20), d(2026, 4, 21), 2.0, 1.0),
        ];
        let breakdown = resolve_leaves(&cal(), &leaves);
        assert!((breakdown.paid_leave_days - 3.0).abs() < 1e-9);
    }

    #[test]
    fn inverted_span_is_ignored() {
        let leaves = vec![approved(d(2026, 4, 10), d(2026, 4, 6), 3.0, 0.0)];
        let breakdown = resolve_leaves(&cal(), &leaves);
        assert_eq!(breakdown.paid_leave_days, 0.0);
        assert!(breakdown.leave_dates.is_empty());
    }
}
