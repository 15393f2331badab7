use crate::config::GatewayConfig;
use crate::inference::InferenceClient;
use crate::streaming::StreamSynthesizer;
use std::sync::Arc;

/// Shared handler state; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub client: InferenceClient,
    pub config: Arc<GatewayConfig>,
    pub synthesizer: StreamSynthesizer,
    /// Unix timestamp reported as the model's creation time
    pub started_at: i64,
}

impl AppState {
    pub fn new(client: InferenceClient, config: Arc<GatewayConfig>) -> Self {
        let synthesizer = StreamSynthesizer::from(&config.streaming);
        Self {
            client,
            config,
            synthesizer,
            started_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn model_id(&self) -> String {
        self.client.config().model_id()
    }
}
