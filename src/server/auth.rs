use super::error::ApiError;
use super::state::AppState;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tracing::warn;

/// Require `Authorization: Bearer <api_key>` when a key is configured
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.config.server.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    if provided.is_some_and(|key| keys_match(key, expected)) {
        Ok(next.run(request).await)
    } else {
        warn!("Rejected request to {} without a valid API key", request.uri().path());
        Err(ApiError::unauthorized("Invalid or missing API key"))
    }
}

/// Constant-time key comparison
fn keys_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_match() {
        assert!(keys_match("sk-local", "sk-local"));
        assert!(!keys_match("sk-locaX", "sk-local"));
        assert!(!keys_match("sk-loc", "sk-local"));
        assert!(!keys_match("", "sk-local"));
    }
}
