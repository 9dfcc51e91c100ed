use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::ai::{self, AnalyzeRequest, SymptomInsight};
use crate::auth;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{flex_date, Symptom};
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSymptom {
    #[serde(deserialize_with = "flex_date::deserialize")]
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub symptom_type: String,
    pub severity: i32,
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
        .route("/api/symptoms", get(get_symptoms).post(create_symptom))
        .route("/api/symptoms/:id", delete(delete_symptom))
        .route("/api/symptoms/analyze", post(analyze_symptoms))
        .with_state(state)
}

async fn get_symptoms(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(range): Query<DateRange>,
) -> ApiResult<Json<Vec<Symptom>>> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    let symptoms =
        db::list_symptoms(&state.pool, user.id, range.start_date, range.end_date, None).await?;
    Ok(Json(symptoms))
}

async fn create_symptom(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewSymptom>,
) -> ApiResult<(StatusCode, Json<Symptom>)> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    validate_severity(body.severity)?;
    let symptom = db::create_symptom(
        &state.pool,
        user.id,
        body.date,
        &body.symptom_type,
        body.severity,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(symptom)))
}

async fn delete_symptom(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = auth::authenticate(&state.verifier, &state.pool, &headers).await?;
    db::delete_symptom(&state.pool, user.id, id).await?;
    Ok(Json(serde_json::json!({ "message": "Symptom deleted" })))
}

/// Structured assessment of reported symptoms. Needs only a verified identity,
/// not a provisioned user row, since nothing here touches stored history. When
/// the model call fails the rule-based insight stands in, still as a 200.
async fn analyze_symptoms(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AnalyzeRequest>,
) -> ApiResult<Json<SymptomInsight>> {
    auth::identify(&state.verifier, &headers).await?;
    validate_pain_level(body.pain_level)?;

    let insight = match state.ai.analyze(&body).await {
        Ok(insight) => insight,
        Err(e) => {
            tracing::warn!("⚠️ symptom analysis failed, using rule-based insight: {e}");
            ai::fallback_insight(&body)
        }
    };
    Ok(Json(insight))
}

fn validate_severity(severity: i32) -> Result<(), ApiError> {
    if !(1..=5).contains(&severity) {
        return Err(ApiError::Validation(
            "severity must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

fn validate_pain_level(pain_level: Option<i32>) -> Result<(), ApiError> {
    if let Some(pain) = pain_level {
        if !(1..=10).contains(&pain) {
            return Err(ApiError::Validation(
                "painLevel must be between 1 and 10".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_must_stay_in_range() {
        assert!(validate_severity(1).is_ok());
        assert!(validate_severity(5).is_ok());
        assert!(validate_severity(0).is_err());
        assert!(validate_severity(6).is_err());
    }

    #[test]
    fn pain_level_is_optional_but_bounded() {
        assert!(validate_pain_level(None).is_ok());
        assert!(validate_pain_level(Some(1)).is_ok());
        assert!(validate_pain_level(Some(10)).is_ok());
        assert!(validate_pain_level(Some(0)).is_err());
        assert!(validate_pain_level(Some(11)).is_err());
    }

    #[test]
    fn new_symptom_accepts_wire_field_names() {
        let body: NewSymptom = serde_json::from_str(
            r#"{"date":"2024-03-01T08:00:00Z","type":"cramps","severity":4}"#,
        )
        .unwrap();
        assert_eq!(body.symptom_type, "cramps");
        assert_eq!(body.severity, 4);
        assert_eq!(
            body.date,
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }
}
