use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure taxonomy surfaced to callers. Every variant carries a stable
/// machine-checkable kind; human-readable detail rides alongside it.
/// "No history yet" is never an error anywhere in the crate.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("record belongs to another user")]
    Forbidden,
    #[error("missing or invalid credentials")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("{0} is unavailable")]
    Upstream(&'static str),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::Forbidden => "forbidden",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Validation(_) => "validation",
            ApiError::Database(_) => "database",
            ApiError::Upstream(_) => "upstream_unavailable",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Database(ref e) = self {
            tracing::error!("❌ DB error: {e}");
        }

        // Source chains are only exposed in development builds.
        let details = if cfg!(debug_assertions) {
            std::error::Error::source(&self).map(|src| src.to_string())
        } else {
            None
        };

        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
            details,
        };

        (self.status(), Json(body)).into_response()
    }
}
