use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;

use super::{ApiError, AppState};

pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Rejects the request unless `X-Api-Key` matches the configured secret.
/// Runs before any handler touches the runtime or storage.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if provided.is_empty() || !bool::from(provided.as_bytes().ct_eq(state.api_key.as_bytes())) {
        log::warn!(
            "Rejected {} {}: missing or invalid API key",
            request.method(),
            request.uri()
        );
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}
