//! OpenAI-style API errors

use crate::inference::InferenceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request_error", msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "authentication_error", msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "server_error", msg)
    }

    /// The `{"error": {...}}` envelope, also sent as an SSE event mid-stream
    pub fn body(&self) -> Value {
        json!({
            "error": {
                "message": self.message,
                "type": self.kind,
                "param": null,
                "code": self.status.as_str()
            }
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body())).into_response()
    }
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        match &err {
            InferenceError::Startup { .. } => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "inference_startup_error",
                err.to_string(),
            ),
            InferenceError::Fatal { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "inference_fatal_error",
                err.to_string(),
            ),
            InferenceError::NonFatal { stderr, .. } => {
                let mut message = err.to_string();
                let diagnostics = stderr.trim();
                if !diagnostics.is_empty() {
                    message = format!("{message}: {diagnostics}");
                }
                Self::new(StatusCode::BAD_GATEWAY, "inference_error", message)
            }
            InferenceError::Timeout(_) => {
                Self::new(StatusCode::GATEWAY_TIMEOUT, "timeout_error", err.to_string())
            }
            InferenceError::Unavailable => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                err.to_string(),
            ),
            InferenceError::Io(_) | InferenceError::Internal(_) => Self::internal(err.to_string()),
        }
    }
}
