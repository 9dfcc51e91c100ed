use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reported menstrual flow intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowLevel {
    Light,
    Medium,
    Heavy,
}

impl FlowLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowLevel::Light => "light",
            FlowLevel::Medium => "medium",
            FlowLevel::Heavy => "heavy",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(FlowLevel::Light),
            "medium" => Some(FlowLevel::Medium),
            "heavy" => Some(FlowLevel::Heavy),
            _ => None,
        }
    }
}

/// One logged period. `end_date` absent means the period is ongoing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub flow_level: Option<FlowLevel>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Symptom {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub symptom_type: String,
    pub severity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mood {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub mood_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub date: NaiveDate,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub average_cycle_length: i32,
    pub average_period_length: i32,
    pub reminder_enabled: bool,
    pub reminder_days_before: i32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            average_cycle_length: 28,
            average_period_length: 5,
            reminder_enabled: true,
            reminder_days_before: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Qualitative reliability of a prediction, driven by how many cycle-gap
/// samples backed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub next_period_date: NaiveDate,
    pub cycle_length: i32,
    pub period_length: i32,
    pub confidence: Confidence,
}

/// Per-type symptom aggregate, ordered by descending count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomTypeSummary {
    #[serde(rename = "type")]
    pub symptom_type: String,
    pub count: usize,
    pub average_severity: f64,
    pub last_occurrence: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodTypeSummary {
    #[serde(rename = "type")]
    pub mood_type: String,
    pub count: usize,
}

/// Severity label used when symptoms are reported in conversation rather than
/// logged with a 1-5 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLabel {
    VeryMild,
    Mild,
    Moderate,
    Severe,
    VerySevere,
}

impl SeverityLabel {
    /// Human wording for prompt text ("very_mild" → "very mild").
    pub fn label(&self) -> &'static str {
        match self {
            SeverityLabel::VeryMild => "very mild",
            SeverityLabel::Mild => "mild",
            SeverityLabel::Moderate => "moderate",
            SeverityLabel::Severe => "severe",
            SeverityLabel::VerySevere => "very severe",
        }
    }
}

/// A symptom mentioned in the current chat interaction, not (yet) persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentSymptom {
    pub symptom: String,
    #[serde(default)]
    pub severity: Option<SeverityLabel>,
}

/// Date fields in request bodies: mobile clients send either a plain
/// `YYYY-MM-DD` or a full RFC 3339 timestamp. Either way the value is reduced
/// to its calendar-day components, so a period logged at 23:00 and one logged
/// at 01:00 compare the way the user perceives them.
pub mod flex_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date);
        }
        DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
    }

    pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}"))),
        }
    }

    /// For PATCH bodies where an absent field means "leave unchanged" and an
    /// explicit null means "clear". Pair with `#[serde(default)]`.
    pub fn deserialize_patch<'de, D>(
        deserializer: D,
    ) -> Result<Option<Option<NaiveDate>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(Some(None)),
            Some(raw) => parse(&raw)
                .map(|date| Some(Some(date)))
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}"))),
        }
    }
}

/// Same absent/null/value distinction as [`flex_date::deserialize_patch`] for
/// fields that deserialize directly. Pair with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flex_date_accepts_plain_dates() {
        assert_eq!(
            flex_date::parse("2024-01-05"),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
    }

    #[test]
    fn flex_date_normalizes_timestamps_to_the_calendar_day() {
        // 23:00 on the 5th stays the 5th regardless of time-of-day.
        assert_eq!(
            flex_date::parse("2024-01-05T23:00:00Z"),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
        assert_eq!(
            flex_date::parse("2024-01-06T01:00:00+02:00"),
            NaiveDate::from_ymd_opt(2024, 1, 6)
        );
    }

    #[test]
    fn flex_date_rejects_garbage() {
        assert_eq!(flex_date::parse("yesterday"), None);
        assert_eq!(flex_date::parse("05/01/2024"), None);
    }

    #[test]
    fn flow_level_round_trips_through_text() {
        for level in [FlowLevel::Light, FlowLevel::Medium, FlowLevel::Heavy] {
            assert_eq!(FlowLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(FlowLevel::parse("spotting"), None);
    }

    #[test]
    fn severity_labels_read_naturally() {
        assert_eq!(SeverityLabel::VeryMild.label(), "very mild");
        assert_eq!(SeverityLabel::Moderate.label(), "moderate");
    }

    #[test]
    fn default_settings_match_provisioning_defaults() {
        let settings = UserSettings::default();
        assert_eq!(settings.average_cycle_length, 28);
        assert_eq!(settings.average_period_length, 5);
        assert!(settings.reminder_enabled);
        assert_eq!(settings.reminder_days_before, 3);
    }

    #[test]
    fn patch_fields_distinguish_absent_from_null() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "crate::models::double_option")]
            name: Option<Option<String>>,
        }

        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.name, None);

        let cleared: Patch = serde_json::from_str(r#"{"name":null}"#).unwrap();
        assert_eq!(cleared.name, Some(None));

        let set: Patch = serde_json::from_str(r#"{"name":"Maya"}"#).unwrap();
        assert_eq!(set.name, Some(Some("Maya".to_string())));
    }
}
