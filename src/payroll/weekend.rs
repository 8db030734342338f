use crate::payroll::calendar::{adjacent_weekdays, MonthCalendar};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Counts weekend days of the month that are paid because the employee was
/// covered on both sides: the bracketing Friday and Monday each appear in
/// `covered_dates` (dates worked or on approved leave). A weekend adjacent
/// to an uncovered weekday stays unpaid.
pub fn qualified_weekend_days(cal: &MonthCalendar, covered_dates: &BTreeSet<NaiveDate>) -> u32 {
    cal.weekend_days()
        .into_iter()
        .filter(|day| match adjacent_weekdays(*day) {
            Some((friday, monday)) => {
                covered_dates.contains(&friday) && covered_dates.contains(&monday)
            }
            None => false,
        })
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: u32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y as i32, m, day).unwrap()
    }

    fn cal() -> MonthCalendar {
        // February 2026: weekends on 1, 7/8, 14/15, 21/22, 28.
        MonthCalendar::new(2026, 2, BTreeSet::new()).unwrap()
    }

    #[test]
    fn weekend_with_both_sides_covered_is_paid() {
        let covered = BTreeSet::from([d(2026, 2, 6), d(2026, 2, 9)]);
        assert_eq!(qualified_weekend_days(&cal(), &covered), 2); // Sat 7 and Sun 8
    }

    #[test]
    fn weekend_with_one_side_covered_is_unpaid() {
        let covered = BTreeSet::from([d(2026, 2, 6)]);
        assert_eq!(qualified_weekend_days(&cal(), &covered), 0);
    }

    #[test]
    fn leave_dates_qualify_like_worked_dates() {
        // Friday worked, Monday on approved leave: caller merges both kinds
        // of coverage into one set before asking.
        let covered = BTreeSet::from([d(2026, 2, 13), d(2026, 2, 16)]);
        assert_eq!(qualified_weekend_days(&cal(), &covered), 2); // Sat 14 and Sun 15
    }

    #[test]
    fn month_boundary_weekend_uses_out_of_month_weekdays() {
        // Sunday 2026-02-01: its Friday is January 30th.
        let covered = BTreeSet::from([d(2026, 1, 30), d(2026, 2, 2)]);
        assert_eq!(qualified_weekend_days(&cal(), &covered), 1);
    }

    #[test]
    fn no_coverage_means_no_paid_weekends() {
        assert_eq!(qualified_weekend_days(&cal(), &BTreeSet::new()), 0);
    }
}
