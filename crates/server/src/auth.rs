//! Authentication middleware.
//!
//! Two kinds of caller are recognised from the same bearer header:
//! submitting clients (configured token hashes mapping to a principal) and
//! the internal service token used by SDES status updates and the
//! inspection surface.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};

/// An authenticated submitting client.
#[derive(Clone, Debug)]
pub struct AuthenticatedClient {
    /// Principal recorded as the owner of this client's submissions.
    pub principal: String,
}

/// Marker for requests presenting the internal service token.
#[derive(Clone, Copy, Debug)]
pub struct ServiceAuth;

/// Extract bearer token from Authorization header.
/// Per RFC 6750, the "Bearer" scheme is case-insensitive.
fn extract_bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            if v.len() >= 7 && v[..7].eq_ignore_ascii_case("bearer ") {
                Some(&v[7..])
            } else {
                None
            }
        })
}

/// Hash a token for comparison against configured hashes.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Authentication middleware that resolves bearer tokens into request
/// extensions. Requests without a recognised token pass through; handlers
/// decide what they require.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_bearer_token(&req) {
        let presented = hash_token(token);

        // Compare hashes on both sides so the comparison does not leak the
        // configured token through timing.
        if presented == hash_token(&state.config.internal_auth.token) {
            req.extensions_mut().insert(ServiceAuth);
        }

        if let Some(client) = state
            .config
            .internal_auth
            .clients
            .iter()
            .find(|c| c.token_hash == presented)
        {
            req.extensions_mut().insert(AuthenticatedClient {
                principal: client.principal.clone(),
            });
        }
    }

    Ok(next.run(req).await)
}

/// Require an authenticated submitting client.
pub fn require_client(req: &Request) -> ApiResult<&AuthenticatedClient> {
    req.extensions()
        .get::<AuthenticatedClient>()
        .ok_or_else(|| ApiError::Unauthorized("client authentication required".to_string()))
}

/// Require the internal service token.
pub fn require_service(req: &Request) -> ApiResult<()> {
    req.extensions()
        .get::<ServiceAuth>()
        .map(|_| ())
        .ok_or_else(|| ApiError::Unauthorized("service token required".to_string()))
}

// Note: hex is a simple utility, we'll inline it
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }
}
