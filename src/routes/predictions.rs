use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};

use crate::auth;
use crate::error::ApiResult;
use crate::models::Prediction;
use crate::service;
use crate::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/predictions", get(get_prediction))
        .with_state(state)
}

async fn get_prediction(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Prediction>> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    let prediction = service::compute_prediction(&state.pool, &user).await?;
    Ok(Json(prediction))
}
