use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use std::collections::BTreeSet;

/// Working-day calendar for one month: calendar days minus Saturdays/Sundays
/// minus holidays. Holidays falling on a weekend do not reduce the count a
/// second time.
#[derive(Debug, Clone)]
pub struct MonthCalendar {
    year: u32,
    month: u32,
    first: NaiveDate,
    last: NaiveDate,
    holidays: BTreeSet<NaiveDate>,
}

impl MonthCalendar {
    pub fn new(year: u32, month: u32, holidays: BTreeSet<NaiveDate>) -> Option<Self> {
        let (first, last) = month_bounds(year, month)?;
        Some(MonthCalendar {
            year,
            month,
            first,
            last,
            holidays,
        })
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first(&self) -> NaiveDate {
        self.first
    }

    pub fn last(&self) -> NaiveDate {
        self.last
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first && date <= self.last
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let last = self.last;
        std::iter::successors(Some(self.first), move |d| {
            d.succ_opt().filter(|next| *next <= last)
        })
    }

    pub fn total_working_days(&self) -> u32 {
        self.days()
            .filter(|d| !is_weekend(*d) && !self.is_holiday(*d))
            .count() as u32
    }

    /// Saturdays and Sundays of the month, in order.
    pub fn weekend_days(&self) -> Vec<NaiveDate> {
        self.days().filter(|d| is_weekend(*d)).collect()
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn month_bounds(year: u32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year as i32, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((first, last))
}

/// The Friday/Monday pair that brackets a weekend day. Saturday pairs with
/// the day before and the Monday two days after; Sunday with the Friday two
/// days before and the day after. Returns None for weekdays.
pub fn adjacent_weekdays(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    match date.weekday() {
        Weekday::Sat => Some((
            date.checked_sub_days(Days::new(1))?,
            date.checked_add_days(Days::new(2))?,
        )),
        Weekday::Sun => Some((
            date.checked_sub_days(Days::new(2))?,
            date.checked_add_days(Days::new(1))?,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: u32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y as i32, m, day).unwrap()
    }

    #[test]
    fn working_days_without_holidays() {
        // June 2024: 30 days, 10 weekend days.
        let cal = MonthCalendar::new(2024, 6, BTreeSet::new()).unwrap();
        assert_eq!(cal.total_working_days(), 20);
    }

    #[test]
    fn holidays_reduce_working_days() {
        // 2026-01-26 is a Monday.
        let holidays = BTreeSet::from([d(2026, 1, 26)]);
        let without = MonthCalendar::new(2026, 1, BTreeSet::new()).unwrap();
        let with = MonthCalendar::new(2026, 1, holidays).unwrap();
        assert_eq!(with.total_working_days(), without.total_working_days() - 1);
    }

    #[test]
    fn weekend_holiday_not_double_subtracted() {
        // 2026-01-04 is a Sunday; marking it a holiday must change nothing.
        let holidays = BTreeSet::from([d(2026, 1, 4)]);
        let without = MonthCalendar::new(2026, 1, BTreeSet::new()).unwrap();
        let with = MonthCalendar::new(2026, 1, holidays).unwrap();
        assert_eq!(with.total_working_days(), without.total_working_days());
    }

    #[test]
    fn month_bounds_cover_leap_february() {
        let (first, last) = month_bounds(2024, 2).unwrap();
        assert_eq!(first, d(2024, 2, 1));
        assert_eq!(last, d(2024, 2, 29));
    }

    #[test]
    fn invalid_month_rejected() {
        assert!(MonthCalendar::new(2026, 13, BTreeSet::new()).is_none());
        assert!(month_bounds(2026, 0).is_none());
    }

    #[test]
    fn saturday_pairs_with_previous_friday_and_next_monday() {
        // 2026-02-07 is a Saturday.
        let (fri, mon) = adjacent_weekdays(d(2026, 2, 7)).unwrap();
        assert_eq!(fri, d(2026, 2, 6));
        assert_eq!(mon, d(2026, 2, 9));
    }

    #[test]
    fn sunday_pairs_with_same_bracket() {
        // 2026-02-08 is the Sunday of the same weekend.
        let (fri, mon) = adjacent_weekdays(d(2026, 2, 8)).unwrap();
        assert_eq!(fri, d(2026, 2, 6));
        assert_eq!(mon, d(2026, 2, 9));
    }

    #[test]
    fn weekdays_have_no_bracket() {
        assert!(adjacent_weekdays(d(2026, 2, 11)).is_none());
    }

    #[test]
    fn weekend_days_listed_in_order() {
        let cal = MonthCalendar::new(2026, 2, BTreeSet::new()).unwrap();
        let weekends = cal.weekend_days();
        assert_eq!(weekends.len(), 8);
        assert_eq!(weekends[0], d(2026, 2, 1)); // Feb 2026 starts on a Sunday
        assert_eq!(*weekends.last().unwrap(), d(2026, 2, 28));
    }
}
