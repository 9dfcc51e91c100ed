//! Frequency analysis over symptom and mood histories.
//!
//! Grouping accumulates in first-appearance order and the final ordering uses
//! a stable sort, so types with equal counts come out in the order they first
//! appeared in the input. Empty histories produce empty analyses.

use std::collections::HashMap;

use crate::models::{Mood, MoodTypeSummary, Symptom, SymptomTypeSummary};

/// Group symptoms by type: occurrence count, average severity (one decimal),
/// most recent occurrence. Sorted by descending count.
pub fn analyze_symptoms(symptoms: &[Symptom]) -> Vec<SymptomTypeSummary> {
    struct Acc {
        count: usize,
        severity_sum: i64,
        last_occurrence: chrono::NaiveDate,
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Acc> = HashMap::new();

    for symptom in symptoms {
        match groups.get_mut(&symptom.symptom_type) {
            Some(acc) => {
                acc.count += 1;
                acc.severity_sum += symptom.severity as i64;
                if symptom.date > acc.last_occurrence {
                    acc.last_occurrence = symptom.date;
                }
            }
            None => {
                order.push(symptom.symptom_type.clone());
                groups.insert(
                    symptom.symptom_type.clone(),
                    Acc {
                        count: 1,
                        severity_sum: symptom.severity as i64,
                        last_occurrence: symptom.date,
                    },
                );
            }
        }
    }

    let mut summaries: Vec<SymptomTypeSummary> = order
        .into_iter()
        .map(|symptom_type| {
            let acc = &groups[&symptom_type];
            SymptomTypeSummary {
                symptom_type,
                count: acc.count,
                average_severity: round_one_decimal(acc.severity_sum as f64 / acc.count as f64),
                last_occurrence: acc.last_occurrence,
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

/// Group moods by type and count occurrences, descending.
pub fn analyze_moods(moods: &[Mood]) -> Vec<MoodTypeSummary> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for mood in moods {
        match counts.get_mut(&mood.mood_type) {
            Some(count) => *count += 1,
            None => {
                order.push(mood.mood_type.clone());
                counts.insert(mood.mood_type.clone(), 1);
            }
        }
    }

    let mut summaries: Vec<MoodTypeSummary> = order
        .into_iter()
        .map(|mood_type| {
            let count = counts[&mood_type];
            MoodTypeSummary { mood_type, count }
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
