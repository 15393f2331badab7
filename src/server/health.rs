//! `GET /health`

use super::error::ApiError;
use super::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

const DEFAULT_SELF_TEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Default, Deserialize)]
pub struct HealthQuery {
    #[serde(default)]
    pub self_test: bool,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub backend: String,
    pub model: String,
    pub binary_found: bool,
    pub model_found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_test: Option<SelfTestStatus>,
}

#[derive(Debug, Serialize)]
pub struct SelfTestStatus {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Resolve the binary the way the OS would: paths are checked directly, bare
/// names are searched on `PATH`. Only executable files count.
pub fn locate_binary(binary: &Path) -> Option<PathBuf> {
    which::which(binary).ok()
}

pub async fn health(
    State(state): State<AppState>,
    Query(query): Query<HealthQuery>,
) -> Response {
    let inference = state.client.config();
    let binary_found = locate_binary(&inference.binary_path).is_some();
    let model_found = inference.model_path.is_file();

    let self_test = if query.self_test {
        let timeout = Duration::from_secs(
            query
                .timeout_secs
                .unwrap_or(DEFAULT_SELF_TEST_TIMEOUT_SECS)
                .max(1),
        );
        Some(match state.client.self_test(timeout).await {
            Ok(report) => SelfTestStatus {
                ok: true,
                answer: Some(report.answer),
                elapsed_ms: Some(report.elapsed_ms),
                error: None,
            },
            Err(err) => {
                warn!("Health self-test failed: {}", err);
                SelfTestStatus {
                    ok: false,
                    answer: None,
                    elapsed_ms: None,
                    error: Some(ApiError::from(err).message),
                }
            }
        })
    } else {
        None
    };

    let healthy = binary_found
        && model_found
        && self_test.as_ref().map_or(true, |status| status.ok);
    let (code, status) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let report = HealthReport {
        status,
        backend: inference.backend.clone(),
        model: state.model_id(),
        binary_found,
        model_found,
        self_test,
    };
    (code, Json(report)).into_response()
}
