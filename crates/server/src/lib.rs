//! HTTP API and background workers for the courier submission service.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;
pub mod workers;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
