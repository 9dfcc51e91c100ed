//! Calendar-day interval arithmetic. All inputs are already normalized to
//! calendar dates at the API edge, so day counts here are exact and free of
//! time-of-day drift.

use chrono::NaiveDate;

/// Whole days between two dates, direction-insensitive.
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (a - b).num_days().abs()
}

/// Inclusive day-span of a range: a period that starts and ends on the same
/// day is 1 day long.
pub fn day_span_inclusive(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Whether `date` falls inside `[start, end]`, both bounds inclusive.
/// `end == None` means the range is still open ("ongoing").
pub fn is_within_range(date: NaiveDate, start: NaiveDate, end: Option<NaiveDate>) -> bool {
    date >= start && end.map_or(true, |e| date <= e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn days_between_is_symmetric() {
        let a = d(2024, 1, 1);
        let b = d(2024, 1, 29);
        assert_eq!(days_between(a, b), 28);
        assert_eq!(days_between(b, a), 28);
    }

    #[test]
    fn days_between_same_day_is_zero() {
        assert_eq!(days_between(d(2024, 6, 15), d(2024, 6, 15)), 0);
    }

    #[test]
    fn day_span_same_day_counts_as_one() {
        assert_eq!(day_span_inclusive(d(2024, 3, 3), d(2024, 3, 3)), 1);
    }

    #[test]
    fn day_span_is_inclusive_on_both_ends() {
        assert_eq!(day_span_inclusive(d(2024, 1, 1), d(2024, 1, 5)), 5);
    }

    #[test]
    fn range_check_includes_both_bounds() {
        let start = d(2024, 2, 1);
        let end = Some(d(2024, 2, 5));
        assert!(is_within_range(d(2024, 2, 1), start, end));
        assert!(is_within_range(d(2024, 2, 5), start, end));
        assert!(!is_within_range(d(2024, 2, 6), start, end));
        assert!(!is_within_range(d(2024, 1, 31), start, end));
    }

    #[test]
    fn open_ended_range_has_no_upper_bound() {
        let start = d(2024, 2, 1);
        assert!(is_within_range(d(2030, 1, 1), start, None));
        assert!(!is_within_range(d(2024, 1, 31), start, None));
    }
}
