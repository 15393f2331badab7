//! Startup: configuration layering and shared state

use crate::app::config::AppConfig;
use crate::config::{ConfigLoader, GatewayConfig};
use crate::error::Result;
use crate::inference::InferenceClient;
use crate::server::AppState;
use crate::subprocess::SubprocessManager;
use std::sync::Arc;
use tracing::debug;

/// Values given on the command line; they take precedence over everything
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub backend: Option<String>,
}

impl CliOverrides {
    pub fn apply(&self, config: &mut GatewayConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(backend) = &self.backend {
            config.inference.backend = backend.clone();
        }
    }
}

/// Load, override and validate the gateway configuration
pub async fn load_config(app: &AppConfig, overrides: &CliOverrides) -> Result<GatewayConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &app.config_path {
        loader = loader.with_file(path);
    }
    if let Ok(dir) = std::env::current_dir() {
        loader = loader.with_working_dir(dir);
    }

    let mut config = loader.load().await?;
    overrides.apply(&mut config);
    config.validate()?;

    debug!(
        binary = %config.inference.binary_path.display(),
        model = %config.inference.model_path.display(),
        backend = %config.inference.backend,
        "Configuration loaded"
    );
    Ok(config)
}

/// Wire the production runner, inference client and synthesizer together
pub fn build_state(config: GatewayConfig) -> AppState {
    build_state_with(config, SubprocessManager::production())
}

pub fn build_state_with(config: GatewayConfig, subprocess: SubprocessManager) -> AppState {
    let client = InferenceClient::new(subprocess.runner(), config.inference.clone());
    AppState::new(client, Arc::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_cli_overrides_win() {
        let mut config = GatewayConfig::default();
        config.server.port = 9000;

        CliOverrides {
            host: Some("0.0.0.0".into()),
            port: None,
            backend: Some("gpu".into()),
        }
        .apply(&mut config);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.inference.backend, "gpu");
    }

    #[tokio::test]
    async fn test_load_config_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        std::fs::write(
            &path,
            "[inference]\nmodel_path = \"/models/m.litertlm\"\n\n[server]\nport = 9100\n",
        )
        .unwrap();

        let app = AppConfig::new(0).with_config_path(Some(path));
        let overrides = CliOverrides {
            port: Some(9200),
            ..CliOverrides::default()
        };
        let config = load_config(&app, &overrides).await.unwrap();
        assert_eq!(config.server.port, 9200);
        assert_eq!(config.inference.model_path, PathBuf::from("/models/m.litertlm"));
    }

    #[tokio::test]
    async fn test_build_state_uses_configured_runner() {
        let mut config = GatewayConfig::default();
        config.inference.binary_path = PathBuf::from("lm");
        config.inference.model_path = PathBuf::from("/models/m.litertlm");
        config.streaming.chunk_words = 7;

        let (subprocess, mut mock) = SubprocessManager::mock();
        mock.expect_command("lm").returns_stdout("Response: ok").finish();

        let state = build_state_with(config, subprocess);
        assert_eq!(state.synthesizer.chunk_words, 7);
        assert_eq!(state.model_id(), "m");

        let report = state.client.self_test(Duration::from_secs(1)).await.unwrap();
        assert_eq!(report.answer, "ok");
    }
}
