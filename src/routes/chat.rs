use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::ai::{ChatMessage, ChatOutcome, ChatRole, SYSTEM_PROMPT};
use crate::auth;
use crate::error::ApiResult;
use crate::models::CurrentSymptom;
use crate::service;
use crate::AppState;

/// Only the tail of the conversation goes to the model; the context narrative
/// carries the long-term memory.
const RECENT_MESSAGE_WINDOW: usize = 10;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub symptoms: Vec<CurrentSymptom>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub source: ChatSource,
}

/// Whether the reply came from the model or the canned fallback, so clients
/// can tell a degraded answer from a real one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSource {
    Model,
    Fallback,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .with_state(state)
}

async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    let context = service::build_chat_context(&state.pool, &user, &body.symptoms).await?;

    let mut conversation = body.messages;
    drop_system_turns(&mut conversation);
    clamp_to_recent(&mut conversation);

    let mut messages = vec![
        ChatMessage {
            role: ChatRole::System,
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: ChatRole::System,
            content: context,
        },
    ];
    messages.extend(conversation);

    let (message, source) = match state.ai.chat_or_fallback(&messages).await {
        ChatOutcome::Model(message) => (message, ChatSource::Model),
        ChatOutcome::Fallback(message) => (message, ChatSource::Fallback),
    };
    Ok(Json(ChatResponse { message, source }))
}

fn clamp_to_recent(messages: &mut Vec<ChatMessage>) {
    let excess = messages.len().saturating_sub(RECENT_MESSAGE_WINDOW);
    if excess > 0 {
        messages.drain(..excess);
    }
}

/// The persona prompt and the context narrative are the only system turns;
/// any a caller sends are discarded.
fn drop_system_turns(messages: &mut Vec<ChatMessage>) {
    messages.retain(|m| m.role != ChatRole::System);
}
