use chrono::{Datelike, Days, Duration, NaiveDate};

use crate::slots::DATE_FORMAT;

/// Dates outside these years are refused at input so that week and month
/// arithmetic never runs off chrono's range.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

pub const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_sunday() as usize
}

pub fn weekday_name(date: NaiveDate) -> &'static str {
    WEEKDAY_NAMES[weekday_index(date)]
}

pub fn is_supported(date: NaiveDate) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&date.year())
}

/// Parses a `YYYY-MM-DD` date within the supported years.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .ok()
        .filter(|date| is_supported(*date))
}

/// `date` moved by `days`, or `None` when the result leaves the supported years.
pub fn offset_date(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .filter(|moved| is_supported(*moved))
}

pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(weekday_index(date) as u64)).unwrap_or(date)
}

/// Sunday through Saturday of the week containing `date`. Days chrono cannot
/// represent are left out.
pub fn week_of(date: NaiveDate) -> Vec<NaiveDate> {
    let start = start_of_week(date);
    (0..7)
        .filter_map(|offset| start.checked_add_days(Days::new(offset)))
        .collect()
}

/// Every day of the month containing `date`, ascending.
pub fn month_of(date: NaiveDate) -> Vec<NaiveDate> {
    let first = first_day_of_month(date);
    (0..days_in_month(date.year(), date.month()))
        .filter_map(|offset| first.checked_add_days(Days::new(u64::from(offset))))
        .collect()
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

pub fn shift_month(date: NaiveDate, delta: i32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 + delta;
    while month > 12 {
        year += 1;
        month -= 12;
    }
    while month < 1 {
        year -= 1;
        month += 12;
    }
    let month = month as u32;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .filter(|shifted| is_supported(*shifted))
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Duration, NaiveDate, Weekday};

    use super::{
        days_in_month, month_of, offset_date, parse_date, shift_month, week_of, weekday_name,
    };

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn week_spans_sunday_to_saturday_and_contains_date() {
        let mut date = day(2023, 12, 20);
        while date <= day(2024, 3, 10) {
            let week = week_of(date);
            assert_eq!(week.len(), 7);
            assert_eq!(week[0].weekday(), Weekday::Sun);
            assert!(week.contains(&date));
            for pair in week.windows(2) {
                assert_eq!(pair[1] - pair[0], Duration::days(1));
            }
            date += Duration::days(1);
        }
    }

    #[test]
    fn week_crosses_year_boundary() {
        let week = week_of(day(2025, 1, 1));
        assert_eq!(week[0], day(2024, 12, 29));
        assert_eq!(week[6], day(2025, 1, 4));
    }

    #[test]
    fn sunday_starts_its_own_week() {
        let week = week_of(day(2024, 3, 10));
        assert_eq!(week[0], day(2024, 3, 10));
        assert_eq!(week[6], day(2024, 3, 16));
    }

    #[test]
    fn month_length_follows_calendar() {
        assert_eq!(month_of(day(2024, 2, 14)).len(), 29);
        assert_eq!(month_of(day(2023, 2, 14)).len(), 28);
        assert_eq!(month_of(day(1900, 2, 1)).len(), 28);
        assert_eq!(month_of(day(2000, 2, 1)).len(), 29);
        assert_eq!(month_of(day(2024, 1, 31)).len(), 31);
        assert_eq!(month_of(day(2024, 4, 30)).len(), 30);
        assert_eq!(days_in_month(2024, 12), 31);

        let december = month_of(day(2024, 12, 25));
        assert_eq!(december.first(), Some(&day(2024, 12, 1)));
        assert_eq!(december.last(), Some(&day(2024, 12, 31)));
    }

    #[test]
    fn names_weekdays_from_sunday() {
        assert_eq!(weekday_name(day(2024, 3, 10)), "Sun");
        assert_eq!(weekday_name(day(2024, 3, 11)), "Mon");
        assert_eq!(weekday_name(day(2024, 3, 16)), "Sat");
    }

    #[test]
    fn shifting_months_clamps_day() {
        assert_eq!(shift_month(day(2024, 1, 31), 1), day(2024, 2, 29));
        assert_eq!(shift_month(day(2024, 1, 15), -1), day(2023, 12, 15));
        assert_eq!(shift_month(day(2024, 11, 30), 14), day(2026, 1, 30));
    }

    #[test]
    fn parse_date_refuses_years_outside_range() {
        assert_eq!(parse_date(" 2024-03-10 "), Some(day(2024, 3, 10)));
        assert_eq!(parse_date("9999-12-31"), Some(day(9999, 12, 31)));
        assert_eq!(parse_date("0000-01-01"), None);
        assert_eq!(parse_date("+262142-12-31"), None);
        assert_eq!(parse_date("2024-02-30"), None);
    }

    #[test]
    fn date_moves_stop_at_range_ends() {
        assert_eq!(offset_date(day(2024, 3, 10), 7), Some(day(2024, 3, 17)));
        assert_eq!(offset_date(day(9999, 12, 31), 1), None);
        assert_eq!(offset_date(day(1, 1, 1), -1), None);
        assert_eq!(offset_date(day(2024, 3, 10), i64::MAX), None);
        assert_eq!(shift_month(day(9999, 12, 15), 1), day(9999, 12, 15));
        assert_eq!(shift_month(day(1, 1, 15), -1), day(1, 1, 15));
    }

    #[test]
    fn extreme_dates_do_not_overflow() {
        assert_eq!(week_of(day(9999, 12, 31)).len(), 7);
        assert!(week_of(NaiveDate::MAX).contains(&NaiveDate::MAX));
        assert!(week_of(NaiveDate::MIN).contains(&NaiveDate::MIN));
        assert_eq!(month_of(NaiveDate::MAX).last(), Some(&NaiveDate::MAX));
        assert_eq!(shift_month(NaiveDate::MAX, 1), NaiveDate::MAX);
    }
}
