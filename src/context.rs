//! Builds the grounding narrative injected into the assistant prompt.
//!
//! Pure text assembly: everything here works on records already loaded by the
//! service layer, performs no I/O, and stays bounded in size (top-5 lists,
//! last-5 entries, notes clipped to a per-entry character budget) so the
//! prompt cannot grow with the user's full history. A user with no tracked
//! data gets an explicit "nothing logged yet" notice instead of a personalized
//! narrative; the two branches never mix.

use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{CurrentSymptom, Mood, Note, Period, Symptom, User, UserSettings};
use crate::patterns;
use crate::prediction;

const TOP_TYPES: usize = 5;
const RECENT_ENTRIES: usize = 5;
const NOTE_CHAR_BUDGET: usize = 100;

/// Everything the assembler narrates. All record slices are newest-first, as
/// the store returns them. `current_symptoms` are the ones reported in the
/// ongoing conversation, not yet persisted.
pub struct ContextInput<'a> {
    pub user: &'a User,
    pub settings: &'a UserSettings,
    pub periods: &'a [Period],
    pub symptoms: &'a [Symptom],
    pub moods: &'a [Mood],
    pub notes: &'a [Note],
    pub current_symptoms: &'a [CurrentSymptom],
    pub today: NaiveDate,
}

impl ContextInput<'_> {
    fn has_tracked_data(&self) -> bool {
        !self.periods.is_empty()
            || !self.symptoms.is_empty()
            || !self.moods.is_empty()
            || !self.notes.is_empty()
    }

    fn display_name(&self) -> &str {
        self.user.name.as_deref().unwrap_or(&self.user.email)
    }
}

pub fn assemble(input: &ContextInput<'_>) -> String {
    let mut output = String::new();

    if input.has_tracked_data() {
        write_personalized(&mut output, input);
    } else {
        let _ = writeln!(
            output,
            "{} has not logged any cycle data yet, so personalized insights are \
             unavailable until they record periods, symptoms, moods, or notes. \
             Answer general questions normally and gently encourage tracking.",
            input.display_name()
        );
    }

    if !input.current_symptoms.is_empty() {
        write_current_symptoms(&mut output, input.current_symptoms);
    }

    output
}

fn write_personalized(output: &mut String, input: &ContextInput<'_>) {
    let _ = writeln!(
        output,
        "You are assisting {} ({}).",
        input.display_name(),
        input.user.email
    );
    let _ = writeln!(output, "Today's date: {}.", input.today);
    let _ = writeln!(output);

    let _ = writeln!(output, "Period history ({} logged):", input.periods.len());
    if input.periods.is_empty() {
        let _ = writeln!(output, "- No periods logged yet.");
    } else {
        let starts: Vec<String> = input
            .periods
            .iter()
            .take(RECENT_ENTRIES)
            .map(|p| p.start_date.to_string())
            .collect();
        let _ = writeln!(output, "- Recent period start dates: {}", starts.join(", "));

        let forecast = prediction::predict(input.periods, input.settings, input.today);
        let _ = writeln!(output, "- Average cycle length: {} days", forecast.cycle_length);
        let _ = writeln!(output, "- Average period length: {} days", forecast.period_length);
        let _ = writeln!(
            output,
            "- Next period expected around {} ({} confidence)",
            forecast.next_period_date,
            forecast.confidence.as_str()
        );
        if let Some(day) = prediction::current_period_day(input.periods, input.today) {
            let _ = writeln!(output, "- Currently on day {day} of an active period");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Most common symptoms:");
    let symptom_summary = patterns::analyze_symptoms(input.symptoms);
    if symptom_summary.is_empty() {
        let _ = writeln!(output, "- None logged yet.");
    } else {
        for summary in symptom_summary.iter().take(TOP_TYPES) {
            let _ = writeln!(
                output,
                "- {}: {} times, average severity {:.1}/5, last on {}",
                summary.symptom_type,
                summary.count,
                summary.average_severity,
                summary.last_occurrence
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Recent symptom entries:");
    if input.symptoms.is_empty() {
        let _ = writeln!(output, "- None logged yet.");
    } else {
        for symptom in input.symptoms.iter().take(RECENT_ENTRIES) {
            let _ = writeln!(
                output,
                "- {}: {} (severity {}/5)",
                symptom.date, symptom.symptom_type, symptom.severity
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Most common moods:");
    let mood_summary = patterns::analyze_moods(input.moods);
    if mood_summary.is_empty() {
        let _ = writeln!(output, "- None logged yet.");
    } else {
        for summary in mood_summary.iter().take(TOP_TYPES) {
            let _ = writeln!(output, "- {}: {} times", summary.mood_type, summary.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Recent mood entries:");
    if input.moods.is_empty() {
        let _ = writeln!(output, "- None logged yet.");
    } else {
        for mood in input.moods.iter().take(RECENT_ENTRIES) {
            let _ = writeln!(output, "- {}: {}", mood.date, mood.mood_type);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Recent notes:");
    if input.notes.is_empty() {
        let _ = writeln!(output, "- None logged yet.");
    } else {
        for note in input.notes.iter().take(RECENT_ENTRIES) {
            let _ = writeln!(output, "- {}: {}", note.date, clip(&note.content));
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Cycle settings: average cycle length {} days, average period length {} days, \
         reminders {}.",
        input.settings.average_cycle_length,
        input.settings.average_period_length,
        if input.settings.reminder_enabled {
            format!("{} days before", input.settings.reminder_days_before)
        } else {
            "off".to_string()
        }
    );
}

fn write_current_symptoms(output: &mut String, current: &[CurrentSymptom]) {
    let _ = writeln!(output);
    let _ = writeln!(output, "Symptoms reported in this conversation (not yet logged):");
    for symptom in current {
        let severity = symptom.severity.map_or("moderate", |s| s.label());
        let _ = writeln!(output, "- {} ({severity})", symptom.symptom);
    }
    let _ = writeln!(
        output,
        "Consider these symptoms together when answering, say whether they are \
         concerning, and what the user should do."
    );
}

/// Per-note character budget keeps the prompt bounded no matter how long the
/// user's free text runs. Counted in chars to stay safe on multibyte input.
fn clip(content: &str) -> String {
    if content.chars().count() <= NOTE_CHAR_BUDGET {
        return content.to_string();
    }
    let mut clipped: String = content.chars().take(NOTE_CHAR_BUDGET).collect();
    clipped.push_str("...");
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeverityLabel;
    use chrono::Utc;
    use uuid::Uuid;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "mara@example.com".to_string(),
            name: Some("Mara".to_string()),
            created_at: Utc::now(),
        }
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

    fn make_symptom(day: &str, symptom_type: &str, severity: i32) -> Symptom {
        Symptom {
            id: Uuid::new_v4(),
            date: date(day),
            symptom_type: symptom_type.to_string(),
            severity,
            created_at: Utc::now(),
        }
    }

    fn make_mood(day: &str, mood_type: &str) -> Mood {
        Mood {
            id: Uuid::new_v4(),
            date: date(day),
            mood_type: mood_type.to_string(),
            created_at: Utc::now(),
        }
    }

    fn make_note(day: &str, content: &str) -> Note {
        Note {
            id: Uuid::new_v4(),
            date: date(day),
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    fn input_with<'a>(
        user: &'a User,
        settings: &'a UserSettings,
        periods: &'a [Period],
        symptoms: &'a [Symptom],
        moods: &'a [Mood],
        notes: &'a [Note],
        current: &'a [CurrentSymptom],
    ) -> ContextInput<'a> {
        ContextInput {
            user,
            settings,
            periods,
            symptoms,
            moods,
            notes,
            current_symptoms: current,
            today: date("2024-02-27"),
        }
    }

    #[test]
    fn no_tracked_data_takes_the_notice_branch() {
        let user = user();
        let settings = UserSettings::default();
        let narrative = assemble(&input_with(&user, &settings, &[], &[], &[], &[], &[]));
        assert!(narrative.contains("has not logged any cycle data yet"));
        assert!(!narrative.contains("Period history"));
        assert!(!narrative.contains("Cycle settings"));
    }

    #[test]
    fn any_tracked_data_takes_the_personalized_branch() {
        let user = user();
        let settings = UserSettings::default();
        let symptoms = vec![make_symptom("2024-02-20", "cramps", 3)];
        let narrative = assemble(&input_with(&user, &settings, &[], &symptoms, &[], &[], &[]));
        assert!(!narrative.contains("has not logged any cycle data yet"));
        assert!(narrative.contains("Most common symptoms:"));
        assert!(narrative.contains("cramps: 1 times, average severity 3.0/5"));
        assert!(narrative.contains("No periods logged yet."));
    }

    #[test]
    fn period_summary_carries_the_forecast() {
        let user = user();
        let settings = UserSettings::default();
        let periods = vec![
            make_period("2024-02-26", None),
            make_period("2024-01-29", Some("2024-02-02")),
            make_period("2024-01-01", Some("2024-01-05")),
        ];
        let narrative = assemble(&input_with(&user, &settings, &periods, &[], &[], &[], &[]));
        assert!(narrative.contains("Period history (3 logged):"));
        assert!(narrative.contains("Average cycle length: 28 days"));
        assert!(narrative.contains("Next period expected around 2024-03-25 (medium confidence)"));
        // Today (02-27) is day 2 of the open period that started 02-26.
        assert!(narrative.contains("Currently on day 2 of an active period"));
    }

    #[test]
    fn notes_are_clipped_to_the_character_budget() {
        let user = user();
        let settings = UserSettings::default();
        let long = "x".repeat(150);
        let notes = vec![make_note("2024-02-20", &long)];
        let narrative = assemble(&input_with(&user, &settings, &[], &[], &[], &notes, &[]));
        let clipped = format!("{}...", "x".repeat(100));
        assert!(narrative.contains(&clipped));
        assert!(!narrative.contains(&"x".repeat(101)));
    }

    #[test]
    fn short_notes_pass_through_unclipped() {
        assert_eq!(clip("slept badly"), "slept badly");
        assert_eq!(clip(&"y".repeat(100)), "y".repeat(100));
    }

    #[test]
    fn frequency_lists_stop_at_five_types() {
        let user = user();
        let settings = UserSettings::default();
        // Six types, newest first; backache is oldest so it is outside both
        // the top-5 list (tie order follows first appearance) and the last-5
        // raw entries.
        let symptoms = vec![
            make_symptom("2024-02-26", "cramps", 3),
            make_symptom("2024-02-25", "headache", 2),
            make_symptom("2024-02-24", "bloating", 2),
            make_symptom("2024-02-23", "fatigue", 4),
            make_symptom("2024-02-22", "nausea", 1),
            make_symptom("2024-02-21", "backache", 5),
        ];
        let narrative = assemble(&input_with(&user, &settings, &[], &symptoms, &[], &[], &[]));
        assert!(narrative.contains("nausea"));
        assert!(!narrative.contains("backache"));
    }

    #[test]
    fn conversation_symptoms_are_appended_with_default_severity() {
        let user = user();
        let settings = UserSettings::default();
        let current = vec![
            CurrentSymptom {
                symptom: "cramps".to_string(),
                severity: None,
            },
            CurrentSymptom {
                symptom: "dizziness".to_string(),
                severity: Some(SeverityLabel::Severe),
            },
        ];
        let narrative = assemble(&input_with(&user, &settings, &[], &[], &[], &[], &current));
        // Notice branch plus the conversation section; unrated symptoms read
        // as moderate.
        assert!(narrative.contains("has not logged any cycle data yet"));
        assert!(narrative.contains("cramps (moderate)"));
        assert!(narrative.contains("dizziness (severe)"));
    }

    #[test]
    fn settings_line_reflects_reminder_state() {
        let user = user();
        let settings = UserSettings {
            reminder_enabled: false,
            ..UserSettings::default()
        };
        let moods = vec![make_mood("2024-02-20", "tired")];
        let narrative = assemble(&input_with(&user, &settings, &[], &[], &moods, &[], &[]));
        assert!(narrative.contains("reminders off."));
    }
}
