// =============================================================================
// C9 — Ingress + onboarding API (§4.9, §6).
// =============================================================================
// Thin boundary: these handlers only write the rows the pipeline later
// consumes. No check ever runs on this path. `raw_intake` logs the body
// before any parsing is attempted, so a malformed payload that never
// becomes an InputMessage row is still observable (§10.5).
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::instrument;
use uuid::Uuid;

use crate::checks::is_valid_local_mobile;
use crate::error::AppError;
use crate::onboarding::OnboardingRegistry;
use crate::settings::SettingsStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

pub fn router(pool: PgPool) -> Router {
    let state = Arc::new(AppState { pool });

    Router::new()
        .route("/sms/receive", post(receive_sms))
        .route("/onboarding/register", post(register_onboarding))
        .route("/onboarding/status/{mobile_number}", get(onboarding_status))
        .route("/onboarding/{mobile_number}", delete(deactivate_onboarding))
        .route("/health", get(health))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CompressionLayer::new()).layer(CorsLayer::permissive()))
}

#[derive(Deserialize)]
struct ReceiveSmsRequest {
    sender_number: String,
    sms_message: String,
    received_timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct ReceiveSmsResponse {
    status: &'static str,
}

#[instrument(skip_all)]
async fn receive_sms(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(raw = %String::from_utf8_lossy(&body), "raw_intake");

    let req: ReceiveSmsRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::InputMalformed(format!("invalid request body: {e}")))?;

    if req.sender_number.trim().is_empty() || req.sms_message.trim().is_empty() {
        return Err(AppError::InputMalformed("sender_number and sms_message are required".into()));
    }

    sqlx::query(
        "INSERT INTO input_sms (uuid, sender_number, sms_message, received_timestamp)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::now_v7())
    .bind(&req.sender_number)
    .bind(&req.sms_message)
    .bind(req.received_timestamp)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::OK, Json(ReceiveSmsResponse { status: "received" })))
}

#[derive(Deserialize)]
struct RegisterRequest {
    mobile_number: String,
}

#[derive(Serialize)]
struct RegisterResponse {
    mobile_number: String,
    hash: String,
    message: String,
}

#[instrument(skip_all)]
async fn register_onboarding(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.mobile_number.trim().is_empty() {
        return Err(AppError::InputMalformed("mobile_number is required".into()));
    }
    if !is_valid_local_mobile(&req.mobile_number) {
        return Err(AppError::InputMalformed("mobile_number must be 10-15 digits".into()));
    }

    let settings = SettingsStore::new(&state.pool).snapshot().await?;
    let registry = OnboardingRegistry::new(&state.pool);
    let (hash, message) = registry.register(&req.mobile_number, settings.hash_salt_length).await?;

    Ok((
        StatusCode::OK,
        Json(RegisterResponse {
            mobile_number: req.mobile_number,
            hash,
            message,
        }),
    ))
}

#[instrument(skip_all)]
async fn onboarding_status(
    State(state): State<Arc<AppState>>,
    Path(mobile_number): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let registry = OnboardingRegistry::new(&state.pool);
    let status = registry.status(&mobile_number).await?;
    Ok(Json(status))
}

#[instrument(skip_all)]
async fn deactivate_onboarding(
    State(state): State<Arc<AppState>>,
    Path(mobile_number): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let registry = OnboardingRegistry::new(&state.pool);
    registry.deactivate(&mobile_number).await?;
    Ok(Json(json!({ "status": "deactivated" })))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}
