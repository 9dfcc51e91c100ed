use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{flex_date, Note};
use crate::AppState;

#[derive(Deserialize)]
pub struct NewNote {
    #[serde(deserialize_with = "flex_date::deserialize")]
    pub date: NaiveDate,
    pub content: String,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/notes", get(get_notes).post(create_note))
        .route("/api/notes/:id", delete(delete_note))
        .with_state(state)
}

async fn get_notes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Note>>> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    let notes = db::list_notes(&state.pool, user.id, None).await?;
    Ok(Json(notes))
}

async fn create_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewNote>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    if body.content.trim().is_empty() {
        return Err(ApiError::Validation("content must not be empty".to_string()));
    }
    let note = db::create_note(&state.pool, user.id, body.date, &body.content).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

async fn delete_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    db::delete_note(&state.pool, user.id, id).await?;
    Ok(Json(serde_json::json!({ "message": "Note deleted" })))
}
