use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth;
use crate::db::{self, PeriodPatch};
use crate::error::{ApiError, ApiResult};
use crate::models::{flex_date, FlowLevel, Period};
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPeriod {
    #[serde(deserialize_with = "flex_date::deserialize")]
    pub start_date: NaiveDate,
    #[serde(default, deserialize_with = "flex_date::deserialize_opt")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub flow_level: Option<FlowLevel>,
}

/// Partial update: absent fields stay untouched, an explicit null clears the
/// end date or flow level. The start date can move but not be cleared.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePeriod {
    #[serde(default, deserialize_with = "flex_date::deserialize_opt")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "flex_date::deserialize_patch")]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub flow_level: Option<Option<FlowLevel>>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/periods", get(get_periods).post(create_period))
        .route("/api/periods/:id", patch(update_period).delete(delete_period))
        .with_state(state)
}

async fn get_periods(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Period>>> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    let periods = db::list_periods(&state.pool, user.id, None).await?;
    Ok(Json(periods))
}

async fn create_period(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewPeriod>,
) -> ApiResult<(StatusCode, Json<Period>)> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    if let Some(end) = body.end_date {
        if end < body.start_date {
            return Err(ApiError::Validation(
                "endDate must be on or after startDate".to_string(),
            ));
        }
    }
    let period = db::create_period(
        &state.pool,
        user.id,
        body.start_date,
        body.end_date,
        body.flow_level,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(period)))
}

async fn update_period(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdatePeriod>,
) -> ApiResult<Json<Period>> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    let patch = PeriodPatch {
        start_date: body.start_date,
        end_date: body.end_date,
        flow_level: body.flow_level,
    };
    let period = db::update_period(&state.pool, user.id, id, &patch).await?;
    Ok(Json(period))
}

async fn delete_period(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    db::delete_period(&state.pool, user.id, id).await?;
    Ok(Json(serde_json::json!({ "message": "Period deleted successfully" })))
}
