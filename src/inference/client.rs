use super::error::InferenceError;
use super::outcome::{InvocationOutcome, RawCapture};
use crate::config::InferenceConfig;
use crate::extraction::ExtractionResult;
use crate::subprocess::{ProcessCommand, ProcessCommandBuilder, ProcessRunner};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Prompt used by health self-tests
pub const SELF_TEST_PROMPT: &str = "Reply with one short greeting.";

/// Runs one inference process per request
///
/// Cloning is cheap; clones share the concurrency limit.
#[derive(Clone)]
pub struct InferenceClient {
    runner: Arc<dyn ProcessRunner>,
    config: Arc<InferenceConfig>,
    permits: Arc<Semaphore>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelfTestReport {
    pub answer: String,
    pub elapsed_ms: u64,
}

impl InferenceClient {
    pub fn new(runner: Arc<dyn ProcessRunner>, config: InferenceConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            runner,
            config: Arc::new(config),
            permits,
        }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Argument vector: backend, model, configured extras, then the prompt
    pub fn build_command(
        &self,
        prompt: &str,
        backend: Option<&str>,
        timeout: Duration,
    ) -> ProcessCommand {
        let backend = backend.unwrap_or(&self.config.backend);
        ProcessCommandBuilder::new(&self.config.binary_path)
            .flag("backend", backend)
            .flag("model_path", self.config.model_path.to_string_lossy())
            .args(&self.config.extra_args)
            .flag("input_prompt", prompt)
            .timeout(timeout)
            .build()
    }

    /// Run the binary on `prompt` and return only the answer text
    pub async fn invoke(&self, prompt: &str) -> Result<String, InferenceError> {
        self.complete(prompt, None).await.map(|result| result.answer)
    }

    /// Run the binary on `prompt` with an optional backend override
    pub async fn complete(
        &self,
        prompt: &str,
        backend: Option<&str>,
    ) -> Result<ExtractionResult, InferenceError> {
        self.complete_within(prompt, backend, self.config.timeout).await
    }

    /// Short fixed prompt under a caller-chosen deadline
    pub async fn self_test(&self, timeout: Duration) -> Result<SelfTestReport, InferenceError> {
        let started = Instant::now();
        let result = self.complete_within(SELF_TEST_PROMPT, None, timeout).await?;
        Ok(SelfTestReport {
            answer: result.answer,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn complete_within(
        &self,
        prompt: &str,
        backend: Option<&str>,
        timeout: Duration,
    ) -> Result<ExtractionResult, InferenceError> {
        if self.permits.available_permits() == 0 {
            debug!("All inference slots busy, waiting for a free one");
        }
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| InferenceError::Unavailable)?;

        let command = self.build_command(prompt, backend, timeout);
        info!(
            backend = backend.unwrap_or(&self.config.backend),
            prompt_chars = prompt.chars().count(),
            "Starting inference"
        );

        let output = self.runner.run(command).await?;
        let status = output.status.clone();
        let duration = output.duration;

        let outcome = InvocationOutcome::classify(&status, RawCapture::from(output));
        match &outcome {
            InvocationOutcome::Success(result) => {
                info!(
                    answer_chars = result.answer.chars().count(),
                    elapsed_ms = duration.as_millis() as u64,
                    "Inference completed"
                );
            }
            InvocationOutcome::FatalError(line) => {
                tracing::error!("Inference binary crashed: {}", line);
            }
            InvocationOutcome::NonFatalError { exit_code, .. } => {
                tracing::warn!("Inference binary exited with code {}", exit_code);
            }
        }

        outcome.into_result()
    }

    /// Stop handing out slots; waiting and future calls fail with `Unavailable`
    pub fn close(&self) {
        self.permits.close();
    }
}
