//! Shared handlers.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;

/// GET /v1/health - liveness probe for load balancers and orchestration.
/// Intentionally unauthenticated.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    state.metadata.health_check().await?;
    state.storage.health_check().await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
