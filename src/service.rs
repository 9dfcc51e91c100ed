//! Read-side facades over the pure engines. Each one loads exactly the slice
//! of history its engine needs, so route handlers stay at "authenticate, call,
//! serialize" and the engines stay testable without a database.

use sqlx::PgPool;

use crate::context::{self, ContextInput};
use crate::db;
use crate::error::ApiResult;
use crate::models::{CurrentSymptom, Prediction, User};
use crate::prediction;

/// Cycle gaps stabilize fast; the most recent six periods give five gap
/// samples, which already lands in the high-confidence band.
const PREDICTION_PERIODS: i64 = 6;

// History caps for the chat context. Enough to fill the narrative's
// top-five lists without shipping a multi-year log into every prompt.
const CONTEXT_SYMPTOMS: i64 = 50;
const CONTEXT_MOODS: i64 = 50;
const CONTEXT_NOTES: i64 = 10;

pub async fn compute_prediction(pool: &PgPool, user: &User) -> ApiResult<Prediction> {
    let settings = db::fetch_or_create_settings(pool, user.id).await?;
    let periods = db::list_periods(pool, user.id, Some(PREDICTION_PERIODS)).await?;
    let today = chrono::Utc::now().naive_utc().date();
    Ok(prediction::predict(&periods, &settings, today))
}

pub async fn build_chat_context(
    pool: &PgPool,
    user: &User,
    current_symptoms: &[CurrentSymptom],
) -> ApiResult<String> {
    let settings = db::fetch_or_create_settings(pool, user.id).await?;
    let periods = db::list_periods(pool, user.id, None).await?;
    let symptoms = db::list_symptoms(pool, user.id, None, None, Some(CONTEXT_SYMPTOMS)).await?;
    let moods = db::list_moods(pool, user.id, None, None, Some(CONTEXT_MOODS)).await?;
    let notes = db::list_notes(pool, user.id, Some(CONTEXT_NOTES)).await?;
    let today = chrono::Utc::now().naive_utc().date();

    Ok(context::assemble(&ContextInput {
        user,
        settings: &settings,
        periods: &periods,
        symptoms: &symptoms,
        moods: &moods,
        notes: &notes,
        current_symptoms,
        today,
    }))
}
