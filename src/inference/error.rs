use crate::error::{ErrorCode, GatewayError};
use crate::subprocess::ProcessError;
use std::time::Duration;
use thiserror::Error;

/// Failure of one inference invocation
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The binary could not be launched at all
    #[error("Failed to start inference binary '{binary}': {reason}")]
    Startup { binary: String, reason: String },

    /// The binary ran and hit an unrecoverable internal check
    #[error("Inference binary crashed: {line}")]
    Fatal { line: String },

    /// Non-zero exit without a recognized fatal signature
    #[error("Inference binary exited with code {exit_code}")]
    NonFatal { exit_code: i32, stderr: String },

    #[error("Inference timed out after {0:?}")]
    Timeout(Duration),

    #[error("Inference capacity is no longer available")]
    Unavailable,

    #[error("Failed to capture inference output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ProcessError> for InferenceError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::CommandNotFound(binary) => InferenceError::Startup {
                binary,
                reason: "executable not found".to_string(),
            },
            ProcessError::PermissionDenied(binary) => InferenceError::Startup {
                binary,
                reason: "permission denied".to_string(),
            },
            ProcessError::SpawnFailed { command, source } => InferenceError::Startup {
                binary: command,
                reason: source.to_string(),
            },
            ProcessError::Timeout(limit) => InferenceError::Timeout(limit),
            ProcessError::Io(e) => InferenceError::Io(e),
            ProcessError::MockExpectationNotMet(msg) => InferenceError::Internal(msg),
        }
    }
}

impl From<InferenceError> for GatewayError {
    fn from(err: InferenceError) -> Self {
        let code = match &err {
            InferenceError::Startup { .. } => ErrorCode::EXEC_SPAWN_FAILED,
            InferenceError::Fatal { .. } => ErrorCode::INFERENCE_FATAL,
            InferenceError::NonFatal { .. } => ErrorCode::INFERENCE_NON_FATAL,
            InferenceError::Timeout(_) => ErrorCode::EXEC_TIMEOUT,
            InferenceError::Unavailable => ErrorCode::INFERENCE_UNAVAILABLE,
            InferenceError::Io(_) => ErrorCode::EXEC_OUTPUT_ERROR,
            InferenceError::Internal(_) => ErrorCode::OTHER_INTERNAL_ERROR,
        };
        let mut message = err.to_string();
        if let InferenceError::NonFatal { stderr, .. } = &err {
            if !stderr.trim().is_empty() {
                message = format!("{message}\n{}", stderr.trim_end());
            }
        }
        GatewayError::inference(code, message).with_source(err)
    }
}
