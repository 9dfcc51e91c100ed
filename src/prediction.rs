//! Cycle statistics and next-period prediction.
//!
//! Input is the period history as stored: newest first, at most a handful of
//! rows. Gaps between consecutive start dates are taken as absolute values so
//! duplicate or out-of-order entries degrade the average instead of breaking
//! it. Missing data falls back to the user's settings and lowers confidence;
//! an empty history is a normal state, never an error.

use chrono::{Duration, NaiveDate};

use crate::cycle_math;
use crate::models::{Confidence, Period, Prediction, UserSettings};

/// Predict the next period from history, with settings as the prior.
pub fn predict(periods: &[Period], settings: &UserSettings, today: NaiveDate) -> Prediction {
    if periods.is_empty() {
        return Prediction {
            next_period_date: today + Duration::days(settings.average_cycle_length as i64),
            cycle_length: settings.average_cycle_length,
            period_length: settings.average_period_length,
            confidence: Confidence::Low,
        };
    }

    let gaps: Vec<i64> = periods
        .windows(2)
        .map(|pair| cycle_math::days_between(pair[0].start_date, pair[1].start_date))
        .collect();

    let cycle_length = if gaps.is_empty() {
        settings.average_cycle_length
    } else {
        rounded_mean(&gaps) as i32
    };

    // Only closed periods contribute a duration sample.
    let spans: Vec<i64> = periods
        .iter()
        .filter_map(|p| {
            p.end_date
                .map(|end| cycle_math::day_span_inclusive(p.start_date, end))
        })
        .collect();

    let period_length = if spans.is_empty() {
        settings.average_period_length
    } else {
        rounded_mean(&spans) as i32
    };

    let confidence = match gaps.len() {
        0 => Confidence::Low,
        1 | 2 => Confidence::Medium,
        _ => Confidence::High,
    };

    Prediction {
        next_period_date: periods[0].start_date + Duration::days(cycle_length as i64),
        cycle_length,
        period_length,
        confidence,
    }
}

/// Day number within the period containing `today`, if one is active.
/// The first day of a period is day 1.
pub fn current_period_day(periods: &[Period], today: NaiveDate) -> Option<i64> {
    periods
        .iter()
        .find(|p| cycle_math::is_within_range(today, p.start_date, p.end_date))
        .map(|p| cycle_math::days_between(p.start_date, today) + 1)
}

fn rounded_mean(values: &[i64]) -> i64 {
    (values.iter().sum::<i64>() as f64 / values.len() as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn make_period(start: &str, end: Option<&str>) -> Period {
        Period {
            id: Uuid::new_v4(),
            start_date: date(start),
            end_date: end.map(date),
            flow_level: None,
            created_at: Utc::now(),
        }
    }

    fn settings(cycle: i32, period: i32) -> UserSettings {
        UserSettings {
            average_cycle_length: cycle,
            average_period_length: period,
            ..UserSettings::default()
        }
    }

    #[test]
    fn empty_history_falls_back_to_settings() {
        let prediction = predict(&[], &settings(30, 5), date("2024-06-01"));
        assert_eq!(prediction.next_period_date, date("2024-07-01"));
        assert_eq!(prediction.cycle_length, 30);
        assert_eq!(prediction.period_length, 5);
        assert_eq!(prediction.confidence, Confidence::Low);
    }

    #[test]
    fn two_gap_samples_give_medium_confidence() {
        // Newest first: ongoing period on 02-26, then two closed 5-day periods
        // 28 days apart.
        let periods = vec![
            make_period("2024-02-26", None),
            make_period("2024-01-29", Some("2024-02-02")),
            make_period("2024-01-01", Some("2024-01-05")),
        ];
        let prediction = predict(&periods, &settings(28, 5), date("2024-02-27"));
        assert_eq!(prediction.cycle_length, 28);
        assert_eq!(prediction.confidence, Confidence::Medium);
        assert_eq!(prediction.next_period_date, date("2024-03-25"));
        // Average duration comes from the two closed periods only.
        assert_eq!(prediction.period_length, 5);
    }

    #[test]
    fn single_period_has_no_gap_sample() {
        let periods = vec![make_period("2024-05-01", Some("2024-05-04"))];
        let prediction = predict(&periods, &settings(31, 6), date("2024-05-10"));
        assert_eq!(prediction.cycle_length, 31);
        assert_eq!(prediction.confidence, Confidence::Low);
        assert_eq!(prediction.next_period_date, date("2024-06-01"));
        assert_eq!(prediction.period_length, 4);
    }

    #[test]
    fn three_gap_samples_give_high_confidence() {
        let periods = vec![
            make_period("2024-04-01", None),
            make_period("2024-03-04", None),
            make_period("2024-02-05", None),
            make_period("2024-01-08", None),
        ];
        let prediction = predict(&periods, &settings(28, 5), date("2024-04-02"));
        assert_eq!(prediction.confidence, Confidence::High);
        assert_eq!(prediction.cycle_length, 28);
        // No closed periods, so the duration prior applies.
        assert_eq!(prediction.period_length, 5);
    }

    #[test]
    fn gap_average_rounds_to_nearest_day() {
        // Gaps of 27 and 28 days average to 27.5, rounded to 28.
        let periods = vec![
            make_period("2024-02-25", None),
            make_period("2024-01-28", None),
            make_period("2024-01-01", None),
        ];
        let prediction = predict(&periods, &settings(28, 5), date("2024-02-26"));
        assert_eq!(prediction.cycle_length, 28);
    }

    #[test]
    fn reversed_history_produces_identical_gaps() {
        // Absolute values make an oldest-first history read the same as the
        // stored newest-first order.
        let reversed = vec![
            make_period("2024-01-01", None),
            make_period("2024-01-29", None),
            make_period("2024-02-26", None),
        ];
        let prediction = predict(&reversed, &settings(28, 5), date("2024-03-01"));
        assert_eq!(prediction.cycle_length, 28);
        assert_eq!(prediction.confidence, Confidence::Medium);
    }

    #[test]
    fn misfiled_entry_degrades_the_average_instead_of_breaking() {
        // One entry out of place stretches an adjacent gap. The gaps here are
        // 28 and 56 days, so the estimate worsens to 42 but stays usable.
        let messy = vec![
            make_period("2024-01-29", None),
            make_period("2024-02-26", None),
            make_period("2024-01-01", None),
        ];
        let prediction = predict(&messy, &settings(28, 5), date("2024-03-01"));
        assert_eq!(prediction.cycle_length, 42);
        assert_eq!(prediction.confidence, Confidence::Medium);
    }

    #[test]
    fn average_is_independent_of_entry_order_once_resorted() {
        let mut shuffled = vec![
            make_period("2024-01-29", None),
            make_period("2024-03-27", None),
            make_period("2024-01-01", None),
            make_period("2024-02-27", None),
        ];
        shuffled.sort_by(|a, b| b.start_date.cmp(&a.start_date));

        let sorted = vec![
            make_period("2024-03-27", None),
            make_period("2024-02-27", None),
            make_period("2024-01-29", None),
            make_period("2024-01-01", None),
        ];

        let today = date("2024-04-01");
        let prefs = settings(28, 5);
        let a = predict(&shuffled, &prefs, today);
        let b = predict(&sorted, &prefs, today);
        assert_eq!(a.cycle_length, b.cycle_length);
        assert_eq!(a.next_period_date, b.next_period_date);
        assert_eq!(a.confidence, b.confidence);
    }

    #[test]
    fn current_day_counts_from_one() {
        let periods = vec![make_period("2024-02-26", None)];
        assert_eq!(current_period_day(&periods, date("2024-02-26")), Some(1));
        assert_eq!(current_period_day(&periods, date("2024-02-28")), Some(3));
    }

    #[test]
    fn no_current_day_outside_any_period() {
        let periods = vec![make_period("2024-01-01", Some("2024-01-05"))];
        assert_eq!(current_period_day(&periods, date("2024-01-06")), None);
        assert_eq!(current_period_day(&periods, date("2023-12-31")), None);
    }
}
