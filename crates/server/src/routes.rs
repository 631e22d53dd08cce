//! Route configuration.

use crate::auth::auth_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    // Room for the PDF part plus metadata fields and multipart framing.
    let body_limit = state.config.server.max_file_size + 1024 * 1024;

    Router::new()
        // Health check (intentionally unauthenticated for load balancers/k8s probes)
        .route("/v1/health", get(handlers::health_check))
        // Submit pipeline
        .route("/dms-submission/submit", post(handlers::submit))
        // Inbound SDES status updates
        .route("/sdes-callback", post(handlers::sdes_callback))
        // Inspection surface
        .route(
            "/dms-submission/submissions",
            get(handlers::list_submissions),
        )
        .route(
            "/dms-submission/submissions/{owner}/{id}",
            get(handlers::get_submission),
        )
        // Auth middleware (resolves bearer tokens into request extensions)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
