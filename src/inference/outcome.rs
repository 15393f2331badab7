//! Classification of a finished inference process

use super::error::InferenceError;
use crate::extraction::{extract, extract_metrics, is_fatal_line, ExtractionResult};
use crate::subprocess::{ExitStatus, ProcessOutput};
use tracing::warn;

/// Answer used when the process succeeded but nothing could be extracted
pub const FALLBACK_GREETING: &str = "Hello! How can I help you today?";

/// Both output channels of one finished invocation
#[derive(Debug, Clone, Default)]
pub struct RawCapture {
    pub stdout: String,
    pub stderr: String,
}

impl From<ProcessOutput> for RawCapture {
    fn from(output: ProcessOutput) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

impl RawCapture {
    /// First fatal line, looking at stderr before stdout
    pub fn fatal_line(&self) -> Option<&str> {
        self.stderr
            .lines()
            .chain(self.stdout.lines())
            .find(|line| is_fatal_line(line))
            .map(str::trim)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvocationOutcome {
    Success(ExtractionResult),
    FatalError(String),
    NonFatalError { exit_code: i32, stderr: String },
}

impl InvocationOutcome {
    pub fn classify(status: &ExitStatus, capture: RawCapture) -> Self {
        let exit_code = match status {
            ExitStatus::Success => return Self::Success(resolve_answer(&capture)),
            ExitStatus::Error(code) => *code,
            // Shell convention for signal deaths
            ExitStatus::Signal(signal) => 128 + signal,
        };

        match capture.fatal_line() {
            Some(line) => Self::FatalError(line.to_string()),
            None => Self::NonFatalError {
                exit_code,
                stderr: capture.stderr,
            },
        }
    }

    pub fn into_result(self) -> Result<ExtractionResult, InferenceError> {
        match self {
            Self::Success(result) => Ok(result),
            Self::FatalError(line) => Err(InferenceError::Fatal { line }),
            Self::NonFatalError { exit_code, stderr } => {
                Err(InferenceError::NonFatal { exit_code, stderr })
            }
        }
    }
}

/// stdout, then stderr, then the fixed greeting
pub fn resolve_answer(capture: &RawCapture) -> ExtractionResult {
    let metrics = extract_metrics(&capture.stdout).or(extract_metrics(&capture.stderr));

    extract_from(&capture.stdout)
        .or_else(|| extract_from(&capture.stderr))
        .unwrap_or_else(|| {
            warn!(
                stdout_bytes = capture.stdout.len(),
                stderr_bytes = capture.stderr.len(),
                "No answer recognized in inference output, returning fallback greeting"
            );
            ExtractionResult::new(FALLBACK_GREETING)
        })
        .with_metrics(metrics)
}

fn extract_from(text: &str) -> Option<ExtractionResult> {
    let result = extract(text);
    (!result.is_empty()).then_some(result)
}
