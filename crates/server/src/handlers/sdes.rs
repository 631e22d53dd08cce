//! Inbound SDES status-update endpoint.

use crate::auth::require_service;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use courier_core::SubmissionStatus;
use serde::Deserialize;

/// Maximum request body size for status updates (64 KiB).
const MAX_BODY_SIZE: usize = 64 * 1024;

/// Per-file outcome reported by SDES.
#[derive(Debug, Clone, Copy, Deserialize)]
pub enum SdesOutcome {
    Processed,
    Failed,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdesCallbackRequest {
    pub correlation_id: String,
    pub status: SdesOutcome,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

/// POST /sdes-callback - apply an SDES-reported outcome to the matching
/// submission. SDES delivers at-least-once; a repeated notification finds
/// the transition already made and is answered 409.
#[tracing::instrument(skip(state, req))]
pub async fn sdes_callback(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<StatusCode> {
    require_service(&req)?;

    let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
    let body: SdesCallbackRequest = serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON: {e}")))?;

    let status = match body.status {
        SdesOutcome::Processed => SubmissionStatus::Processed,
        SdesOutcome::Failed => SubmissionStatus::Failed,
    };

    let row = state
        .metadata
        .update_by_correlation_id(&body.correlation_id, status, body.failure_reason)
        .await?;

    tracing::info!(
        correlation_id = %body.correlation_id,
        owner = %row.owner,
        id = %row.id,
        status = %status,
        "SDES outcome recorded"
    );
    Ok(StatusCode::OK)
}
