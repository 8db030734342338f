use crate::model::attendance::{TimeEntry, TrackerUser};
use crate::payroll::calendar::MonthCalendar;
use chrono::{Days, NaiveDate};
use sqlx::MySqlPool;
use std::collections::BTreeSet;

/// One employee's presence for one month, distilled from raw time entries.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthAttendance {
    pub total_working_days: u32,
    pub days_present: u32,
    pub hours_worked: f64,
    /// Distinct local dates with at least one entry.
    pub worked_dates: BTreeSet<NaiveDate>,
}

impl MonthAttendance {
    /// Summary for an employee with no presence at all, e.g. one the time
    /// tracker has never heard of.
    pub fn absent(cal: &MonthCalendar) -> Self {
        MonthAttendance {
            total_working_days: cal.total_working_days(),
            days_present: 0,
            hours_worked: 0.0,
            worked_dates: BTreeSet::new(),
        }
    }
}

/// Collapses raw entries into per-day presence. An entry belongs to the
/// calendar date its start time falls on, so a night shift clocked in at
/// 23:30 counts for that day even though most of it runs past midnight.
pub fn summarize_entries(cal: &MonthCalendar, entries: &[TimeEntry]) -> MonthAttendance {
    let mut worked_dates = BTreeSet::new();
    let mut minutes: u64 = 0;
    for entry in entries {
        worked_dates.insert(entry.start_time.date());
        minutes += entry.duration_minutes;
    }
    MonthAttendance {
        total_working_days: cal.total_working_days(),
        days_present: worked_dates.len() as u32,
        hours_worked: minutes as f64 / 60.0,
        worked_dates,
    }
}

/// Loads a month of attendance from the tracker database. Employees are
/// matched to tracker accounts by email; an employee the tracker does not
/// know yields a zero summary rather than an error.
pub async fn load_month_attendance(
    tracker: &MySqlPool,
    email: &str,
    cal: &MonthCalendar,
) -> Result<MonthAttendance, sqlx::Error> {
    let account = sqlx::query_as::<_, TrackerUser>(
        "SELECT id, email, display_name FROM tracker_users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(tracker)
    .await?;

    let Some(account) = account else {
        tracing::info!(email = %email, "no tracker account for employee, treating month as absent");
        return Ok(MonthAttendance::absent(cal));
    };

    let window_end = cal
        .last()
        .checked_add_days(Days::new(1))
        .unwrap_or_else(|| cal.last());
    let entries = sqlx::query_as::<_, TimeEntry>(
        "SELECT id, user_id, start_time, duration_minutes, project \
         FROM time_entries \
         WHERE user_id = ? AND start_time >= ? AND start_time < ? \
         ORDER BY start_time",
    )
    .bind(account.id)
    .bind(cal.first().and_hms_opt(0, 0, 0))
    .bind(window_end.and_hms_opt(0, 0, 0))
    .fetch_all(tracker)
    .await?;

    Ok(summarize_entries(cal, &entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use std::collections::BTreeSet;

    fn cal() -> MonthCalendar {
        MonthCalendar::new(2026, 3, BTreeSet::new()).unwrap()
    }

    fn entry(id: u64, stamp: &str, minutes: u64) -> TimeEntry {
        TimeEntry {
            id,
            user_id: 7,
            start_time: NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").unwrap(),
            duration_minutes: minutes,
            project: None,
        }
    }

    #[test]
    fn multiple_entries_on_one_date_count_once() {
        let entries = vec![
            entry(1, "2026-03-02 09:00:00", 240),
            entry(2, "2026-03-02 14:00:00", 240),
            entry(3, "2026-03-03 09:00:00", 480),
        ];
        let summary = summarize_entries(&cal(), &entries);
        assert_eq!(summary.days_present, 2);
        assert_eq!(summary.hours_worked, 16.0);
    }

    #[test]
    fn night_shift_belongs_to_its_start_date() {
        // Starts 23:30 on the 2nd, runs five hours into the 3rd.
        let entries = vec![entry(1, "2026-03-02 23:30:00", 300)];
        let summary = summarize_entries(&cal(), &entries);
        assert_eq!(summary.days_present, 1);
        let worked: Vec<_> = summary.worked_dates.iter().collect();
        assert_eq!(
            worked,
            vec![&NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()]
        );
    }

    #[test]
    fn no_entries_is_a_zero_month() {
        let summary = summarize_entries(&cal(), &[]);
        assert_eq!(summary.days_present, 0);
        assert_eq!(summary.hours_worked, 0.0);
        assert!(summary.worked_dates.is_empty());
        assert_eq!(summary.total_working_days, cal().total_working_days());
    }

    #[test]
    fn absent_summary_matches_empty_summary() {
        assert_eq!(MonthAttendance::absent(&cal()), summarize_entries(&cal(), &[]));
    }

    #[test]
    fn summary_working_days_exclude_holidays() {
        // 2026-03-17 is a Tuesday; a summary built over a holiday-aware
        // calendar must report one working day fewer.
        let holidays = BTreeSet::from([NaiveDate::from_ymd_opt(2026, 3, 17).unwrap()]);
        let with_holiday = MonthCalendar::new(2026, 3, holidays).unwrap();
        let summary = summarize_entries(&with_holiday, &[]);
        assert_eq!(
            summary.total_working_days,
            cal().total_working_days() - 1
        );
    }
}
