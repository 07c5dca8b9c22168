use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Error taxonomy for the HTTP boundary (§7). Internal check failures never
/// reach this type — they are converted to `CheckOutcome::Fail` at the
/// dispatch site (src/checks/mod.rs) and never propagate.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("malformed input: {0}")]
    InputMalformed(String),
    #[error("mobile number already onboarded and active")]
    OnboardingConflict,
    #[error("no onboarding record for that mobile number")]
    OnboardingNotFound,
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::InputMalformed(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::OnboardingConflict => (StatusCode::CONFLICT, self.to_string()),
            AppError::OnboardingNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Store(e) => {
                tracing::error!(error = %e, "store_error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal store error".into())
            }
            AppError::Cache(e) => {
                tracing::error!(error = %e, "cache_error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal cache error".into())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
