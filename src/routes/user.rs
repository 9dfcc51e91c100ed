use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{User, UserSettings};
use crate::AppState;

/// Profile payload: the user row with its settings inlined.
#[derive(Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub settings: UserSettings,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub name: Option<Option<String>>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/user", get(get_user).patch(update_user))
        .with_state(state)
}

/// Fetch-or-provision: the first authenticated call creates the user row and
/// its default settings.
async fn get_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<UserProfile>> {
    let identity = auth::identify(&state.verifier, &headers).await?;
    let email = identity
        .email
        .ok_or_else(|| ApiError::Validation("identity token has no email claim".to_string()))?;
    let user = db::ensure_user(&state.pool, &identity.subject, &email).await?;
    let settings = db::fetch_or_create_settings(&state.pool, user.id).await?;
    Ok(Json(UserProfile { user, settings }))
}

async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserProfile>> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    let user = match body.name {
        // Absent field leaves the name as is; explicit null clears it.
        None => user,
        Some(name) => db::update_user_name(&state.pool, user.id, name.as_deref()).await?,
    };
    let settings = db::fetch_or_create_settings(&state.pool, user.id).await?;
    Ok(Json(UserProfile { user, settings }))
}
