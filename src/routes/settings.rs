use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};
use serde::Deserialize;

use crate::auth;
use crate::db::{self, SettingsPatch};
use crate::error::{ApiError, ApiResult};
use crate::models::UserSettings;
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettings {
    #[serde(default)]
    pub average_cycle_length: Option<i32>,
    #[serde(default)]
    pub average_period_length: Option<i32>,
    #[serde(default)]
    pub reminder_enabled: Option<bool>,
    #[serde(default)]
    pub reminder_days_before: Option<i32>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/settings", get(get_settings).patch(update_settings))
        .with_state(state)
}

async fn get_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<UserSettings>> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    let settings = db::fetch_or_create_settings(&state.pool, user.id).await?;
    Ok(Json(settings))
}

async fn update_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UpdateSettings>,
) -> ApiResult<Json<UserSettings>> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    validate(&body)?;
    let patch = SettingsPatch {
        average_cycle_length: body.average_cycle_length,
        average_period_length: body.average_period_length,
        reminder_enabled: body.reminder_enabled,
        reminder_days_before: body.reminder_days_before,
    };
    let settings = db::update_settings(&state.pool, user.id, &patch).await?;
    Ok(Json(settings))
}

fn validate(body: &UpdateSettings) -> Result<(), ApiError> {
    if let Some(cycle) = body.average_cycle_length {
        if !(20..=40).contains(&cycle) {
            return Err(ApiError::Validation(
                "averageCycleLength must be between 20 and 40".to_string(),
            ));
        }
    }
    if let Some(period) = body.average_period_length {
        if !(2..=10).contains(&period) {
            return Err(ApiError::Validation(
                "averagePeriodLength must be between 2 and 10".to_string(),
            ));
        }
    }
    if let Some(days) = body.reminder_days_before {
        if !(0..=7).contains(&days) {
            return Err(ApiError::Validation(
                "reminderDaysBefore must be between 0 and 7".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch() -> UpdateSettings {
        UpdateSettings {
            average_cycle_length: None,
            average_period_length: None,
            reminder_enabled: None,
            reminder_days_before: None,
        }
    }

    #[test]
    fn empty_patch_is_valid() {
        assert!(validate(&patch()).is_ok());
    }

    #[test]
    fn cycle_length_bounds_are_inclusive() {
        let mut body = patch();
        body.average_cycle_length = Some(20);
        assert!(validate(&body).is_ok());
        body.average_cycle_length = Some(40);
        assert!(validate(&body).is_ok());
        body.average_cycle_length = Some(19);
        assert!(validate(&body).is_err());
        body.average_cycle_length = Some(41);
        assert!(validate(&body).is_err());
    }

    #[test]
    fn period_length_and_reminder_days_are_bounded() {
        let mut body = patch();
        body.average_period_length = Some(1);
        assert!(validate(&body).is_err());

        let mut body = patch();
        body.reminder_days_before = Some(0);
        assert!(validate(&body).is_ok());
        body.reminder_days_before = Some(8);
        assert!(validate(&body).is_err());
    }
}
