//! Text-generation collaborator: an OpenAI-compatible chat-completion API.
//!
//! The contract is deliberately narrow: hand over text, get text (or a typed
//! failure) back. Model choice, temperature and token caps live here; what to
//! say lives in the context assembler. When the API is down the callers fall
//! back to canned-but-honest replies rather than erroring the whole request,
//! since the assembled context is pure and reusable on retry.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::models::{FlowLevel, SeverityLabel};

const CHAT_TEMPERATURE: f32 = 0.7;
const CHAT_MAX_TOKENS: u32 = 300;

/// Persona for the conversational assistant.
pub const SYSTEM_PROMPT: &str = r#"You are Luna, a compassionate, empathetic women's health assistant. Your role is to provide gentle, supportive, and medically-informed guidance about menstrual health.

Always use:
- Warm, understanding, and non-judgmental tone
- Soft, sweet language with phrases like "I understand", "It's completely normal to feel", "You're doing the right thing", "Don't worry", "I'm here to help"
- Validation of the user's experiences
- Practical, evidence-based advice
- Clear guidance about when medical attention is needed
- Hope and reassurance while being honest about risks
- Simple, easy-to-understand language

When answering questions about symptoms:
- If symptoms are mild or moderate: reassure and suggest home remedies and comfort
- If symptoms are severe: gently recommend seeing a doctor with understanding
- Always be supportive and understanding
- Include emojis sparingly for warmth (💕, 🌸) but not too many

Keep responses concise (2-4 sentences typically) but complete. Be a friend who knows about women's health."#;

/// Instruction for the structured symptom-insight call.
const ANALYSIS_PROMPT: &str = r#"You are a compassionate, empathetic women's health assistant. Your role is to provide gentle, supportive, and medically-informed guidance about menstrual health symptoms.

Always:
1. Use a warm, understanding, and non-judgmental tone
2. Validate the user's experiences and concerns
3. Provide practical, evidence-based advice
4. Be clear about when medical attention is needed
5. Offer hope and reassurance while being honest about risks
6. Use soft language like "I understand", "It's completely normal to feel", "You're doing the right thing by tracking this"

Medical guidelines:
- Normal: mild cramps, bloating, mood swings, light spotting -> suggest home remedies
- Moderate: heavy flow, back pain, pain 4-6/10 -> monitoring plus lifestyle changes
- Serious: severe pain 8+/10, vomiting, fainting, heavy bleeding over 7 days -> see a doctor within 48 hours
- Urgent: fainting or pain that prevents normal function -> immediate medical attention

Common conditions to consider:
- PCOS: irregular periods, excessive hair growth, weight gain, acne, dark skin patches
- Endometriosis: severe cramps, pain during sex, painful bowel movements
- Fibroids: heavy bleeding, pelvic pressure, frequent urination
- Anemia: pale skin, dizziness, shortness of breath (with heavy bleeding)
- Thyroid: irregular periods, extreme fatigue, hair loss

Always provide actionable, specific recommendations."#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// How a chat reply was produced. The wire response tells the client which
/// path it got, so degraded answers are never silently passed off as the
/// model's.
#[derive(Debug, Clone)]
pub enum ChatOutcome {
    Model(String),
    Fallback(String),
}

/// A symptom as reported for analysis, with a qualitative severity.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportedSymptom {
    pub symptom: String,
    pub severity: SeverityLabel,
    #[serde(default)]
    pub frequency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub symptoms: Vec<ReportedSymptom>,
    #[serde(default)]
    pub pain_level: Option<i32>,
    #[serde(default)]
    pub cycle_length: Option<i32>,
    #[serde(default)]
    pub period_length: Option<i32>,
    #[serde(default)]
    pub bleeding_intensity: Option<FlowLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InsightSeverity {
    #[default]
    Normal,
    Mild,
    Moderate,
    Serious,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Likelihood {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PossibleCondition {
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub probability: Likelihood,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub action: String,
}

/// Structured symptom assessment. Every field defaults so a partially-formed
/// model reply still deserializes instead of failing the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomInsight {
    #[serde(default = "default_assessment")]
    pub overall_assessment: String,
    #[serde(default)]
    pub severity_level: InsightSeverity,
    #[serde(default = "default_personal_message")]
    pub personalized_message: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub home_remedies: Vec<String>,
    #[serde(default)]
    pub doctor_advice: Option<String>,
    #[serde(default)]
    pub red_flag_alerts: Vec<String>,
    #[serde(default)]
    pub possible_conditions: Vec<PossibleCondition>,
}

fn default_assessment() -> String {
    "Thank you for tracking your symptoms.".to_string()
}

fn default_personal_message() -> String {
    "Your symptoms matter. Let's take care of you.".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("assistant request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("assistant returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("assistant returned no content")]
    Empty,
    #[error("assistant JSON was malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct AiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AiClient {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// One completion over the given messages. The caller supplies the full
    /// message stack (persona, context, conversation window).
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AiError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": CHAT_TEMPERATURE,
            "max_tokens": CHAT_MAX_TOKENS,
        });
        self.completion_text(&body).await
    }

    /// Like [`chat`], degrading to the canned supportive reply when the API
    /// fails. The explicit outcome type keeps degraded replies visible to the
    /// caller.
    ///
    /// [`chat`]: AiClient::chat
    pub async fn chat_or_fallback(&self, messages: &[ChatMessage]) -> ChatOutcome {
        match self.chat(messages).await {
            Ok(reply) => ChatOutcome::Model(reply),
            Err(e) => {
                tracing::warn!("⚠️ assistant call failed, using canned reply: {e}");
                ChatOutcome::Fallback(fallback_reply().to_string())
            }
        }
    }

    /// Structured symptom assessment via JSON-mode completion.
    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<SymptomInsight, AiError> {
        let messages = [
            ChatMessage {
                role: ChatRole::System,
                content: ANALYSIS_PROMPT.to_string(),
            },
            ChatMessage {
                role: ChatRole::User,
                content: analysis_request_text(request),
            },
        ];
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": CHAT_TEMPERATURE,
            "response_format": { "type": "json_object" },
        });
        let content = self.completion_text(&body).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn completion_text(&self, body: &serde_json::Value) -> Result<String, AiError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api { status, body });
        }

        #[derive(Deserialize)]
        struct Completion {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMessage,
        }
        #[derive(Deserialize)]
        struct ChoiceMessage {
            content: Option<String>,
        }

        let completion: Completion = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(AiError::Empty);
        }
        Ok(content)
    }
}

pub fn fallback_reply() -> &'static str {
    "I apologize, but I'm having trouble right now. Please try again. 💕"
}

/// Rule-based assessment used when the model call fails: severity from the
/// reported labels and pain level, generic but safe advice.
pub fn fallback_insight(request: &AnalyzeRequest) -> SymptomInsight {
    let has_severe = request
        .symptoms
        .iter()
        .any(|s| matches!(s.severity, SeverityLabel::Severe | SeverityLabel::VerySevere));
    let pain_severe = request.pain_level.map_or(false, |pain| pain >= 8);

    let severity_level = if has_severe || pain_severe {
        InsightSeverity::Urgent
    } else if request
        .symptoms
        .iter()
        .any(|s| s.severity == SeverityLabel::Moderate)
    {
        InsightSeverity::Moderate
    } else if request
        .symptoms
        .iter()
        .any(|s| s.severity == SeverityLabel::Mild)
    {
        InsightSeverity::Mild
    } else {
        InsightSeverity::Normal
    };

    let needs_doctor = severity_level == InsightSeverity::Urgent;

    SymptomInsight {
        overall_assessment:
            "Thank you for tracking your symptoms. Let's ensure you get the care you need."
                .to_string(),
        severity_level,
        personalized_message: "Your health matters. We're here to support you through this."
            .to_string(),
        recommendations: vec![
            "Continue monitoring your symptoms".to_string(),
            if needs_doctor {
                "Please consider seeing a healthcare provider".to_string()
            } else {
                "These symptoms may be manageable at home".to_string()
            },
        ],
        home_remedies: vec![
            "Apply heat to painful areas".to_string(),
            "Stay hydrated".to_string(),
            "Get adequate rest".to_string(),
        ],
        doctor_advice: needs_doctor
            .then(|| "Please consider seeing a healthcare provider soon.".to_string()),
        red_flag_alerts: Vec::new(),
        possible_conditions: Vec::new(),
    }
}

fn analysis_request_text(request: &AnalyzeRequest) -> String {
    let symptoms = request
        .symptoms
        .iter()
        .map(|s| {
            let mut part = format!("{} ({})", s.symptom, s.severity.label());
            if let Some(frequency) = &s.frequency {
                part.push_str(&format!(" - {frequency}"));
            }
            part
        })
        .collect::<Vec<_>>()
        .join(", ");

    let mut text = format!("A user is experiencing:\n\nSymptoms: {symptoms}\n");
    if let Some(pain) = request.pain_level {
        let _ = writeln!(text, "Pain Level: {pain}/10");
    }
    if let Some(cycle) = request.cycle_length {
        let _ = writeln!(text, "Cycle Length: {cycle} days");
    }
    if let Some(period) = request.period_length {
        let _ = writeln!(text, "Period Length: {period} days");
    }
    if let Some(bleeding) = request.bleeding_intensity {
        let _ = writeln!(text, "Bleeding: {}", bleeding.as_str());
    }

    text.push_str(
        "\nPlease provide JSON with:\n\
         1. overallAssessment: Warm 2-3 sentence assessment\n\
         2. severityLevel: normal|mild|moderate|serious|urgent\n\
         3. personalizedMessage: Compassionate 3-4 sentence validation\n\
         4. recommendations: Array of specific advice\n\
         5. homeRemedies: Array of actionable remedies if appropriate\n\
         6. doctorAdvice: When to see a doctor, or null\n\
         7. redFlagAlerts: Array of urgent alerts if any\n\
         8. possibleConditions: Array of {condition, probability, description, action}\n\n\
         Be warm, validating, and supportive while being medically accurate.",
    );
    text
}
