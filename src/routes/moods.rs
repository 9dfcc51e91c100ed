use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth;
use crate::db;
use crate::error::ApiResult;
use crate::models::{flex_date, Mood};
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMood {
    #[serde(deserialize_with = "flex_date::deserialize")]
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub mood_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(default, deserialize_with = "flex_date::deserialize_opt")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "flex_date::deserialize_opt")]
    pub end_date: Option<NaiveDate>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/moods", get(get_moods).post(create_mood))
        .route("/api/moods/:id", delete(delete_mood))
        .with_state(state)
}

async fn get_moods(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(range): Query<DateRange>,
) -> ApiResult<Json<Vec<Mood>>> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    let moods =
        db::list_moods(&state.pool, user.id, range.start_date, range.end_date, None).await?;
    Ok(Json(moods))
}

async fn create_mood(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewMood>,
) -> ApiResult<(StatusCode, Json<Mood>)> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    let mood = db::create_mood(&state.pool, user.id, body.date, &body.mood_type).await?;
    Ok((StatusCode::CREATED, Json(mood)))
}

async fn delete_mood(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    db::delete_mood(&state.pool, user.id, id).await?;
    Ok(Json(serde_json::json!({ "message": "Mood deleted" })))
}
