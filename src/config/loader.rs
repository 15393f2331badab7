use super::{global_config_path, GatewayConfig, LOCAL_CONFIG_FILE};
use crate::error::{ErrorCode, GatewayError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Builds a [`GatewayConfig`] from files and the environment
pub struct ConfigLoader {
    explicit_path: Option<PathBuf>,
    global_path: Option<PathBuf>,
    working_dir: PathBuf,
    read_env: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            explicit_path: None,
            global_path: global_config_path(),
            working_dir: PathBuf::from("."),
            read_env: true,
        }
    }

    /// Use this file instead of the local `inferbridge.toml`; it must exist
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_path = Some(path.into());
        self
    }

    pub fn with_global_path(mut self, path: Option<PathBuf>) -> Self {
        self.global_path = path;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Skip `INFERBRIDGE_*` variables
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    pub async fn load(&self) -> Result<GatewayConfig> {
        let mut config = GatewayConfig::default();

        if let Some(global) = &self.global_path {
            if fs::try_exists(global).await.unwrap_or(false) {
                config = Self::read_file(global).await?;
                debug!("Loaded global configuration from {}", global.display());
            }
        }

        match &self.explicit_path {
            Some(path) => {
                if !fs::try_exists(path).await.unwrap_or(false) {
                    return Err(GatewayError::config_with_code(
                        ErrorCode::CONFIG_NOT_FOUND,
                        "Configuration file not found",
                        Some(path.clone()),
                    ));
                }
                config = Self::read_file(path).await?;
                debug!("Loaded configuration from {}", path.display());
            }
            None => {
                let local = self.working_dir.join(LOCAL_CONFIG_FILE);
                if fs::try_exists(&local).await.unwrap_or(false) {
                    config = Self::read_file(&local).await?;
                    debug!("Loaded local configuration from {}", local.display());
                }
            }
        }

        if self.read_env {
            config.merge_env(|name| std::env::var(name).ok())?;
        }

        Ok(config)
    }

    async fn read_file(path: &Path) -> Result<GatewayConfig> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            GatewayError::config_with_code(
                ErrorCode::CONFIG_PATH_ERROR,
                "Cannot read configuration file",
                Some(path.to_path_buf()),
            )
            .with_source(e)
        })?;
        GatewayConfig::from_toml_str(&content, Some(path))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
