//! Gateway configuration
//!
//! Values are layered: built-in defaults, the global config file, an explicit or
//! local `inferbridge.toml`, `INFERBRIDGE_*` environment variables and finally
//! CLI flags. The result is validated once and shared read-only.

use crate::error::{ErrorCode, GatewayError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod loader;

pub use loader::ConfigLoader;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "inferbridge.toml";

/// Get the global config file path (`<config dir>/config.toml`)
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "inferbridge", "inferbridge")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub inference: InferenceConfig,
    pub streaming: StreamingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token required on `/v1` routes when set
    pub api_key: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InferenceConfig {
    pub binary_path: PathBuf,
    pub model_path: PathBuf,
    /// Backend selector passed to the binary: cpu, gpu, npu, ...
    pub backend: String,
    /// Extra flags inserted before the prompt
    pub extra_args: Vec<String>,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Upper bound on concurrently running inference processes
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Words per streamed chunk
    pub chunk_words: usize,
    /// Pause between streamed chunks
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            api_key: None,
            log_level: None,
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("litert_lm_main"),
            model_path: PathBuf::new(),
            backend: "cpu".to_string(),
            extra_args: Vec::new(),
            timeout: Duration::from_secs(300),
            max_concurrent: 2,
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_words: 5,
            interval: Duration::from_millis(50),
        }
    }
}

impl InferenceConfig {
    /// Model identifier reported by the API: the model file stem
    pub fn model_id(&self) -> String {
        self.model_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| "local-model".to_string())
    }
}

impl GatewayConfig {
    pub fn from_toml_str(content: &str, path: Option<&Path>) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            GatewayError::config_with_code(
                ErrorCode::CONFIG_INVALID_TOML,
                e.message().to_string(),
                path.map(Path::to_path_buf),
            )
            .with_source(e)
        })
    }

    /// Apply `INFERBRIDGE_*` overrides through `lookup`, normally `std::env::var`
    pub fn merge_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("INFERBRIDGE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("INFERBRIDGE_PORT") {
            self.server.port = parse_env("INFERBRIDGE_PORT", &port)?;
        }
        if let Some(api_key) = lookup("INFERBRIDGE_API_KEY") {
            self.server.api_key = Some(api_key).filter(|k| !k.is_empty());
        }
        if let Some(level) = lookup("INFERBRIDGE_LOG_LEVEL") {
            self.server.log_level = Some(level);
        }
        if let Some(binary) = lookup("INFERBRIDGE_BINARY_PATH") {
            self.inference.binary_path = PathBuf::from(binary);
        }
        if let Some(model) = lookup("INFERBRIDGE_MODEL_PATH") {
            self.inference.model_path = PathBuf::from(model);
        }
        if let Some(backend) = lookup("INFERBRIDGE_BACKEND") {
            self.inference.backend = backend;
        }
        if let Some(timeout) = lookup("INFERBRIDGE_TIMEOUT") {
            self.inference.timeout = humantime_serde::re::humantime::parse_duration(&timeout)
                .map_err(|e| invalid_env("INFERBRIDGE_TIMEOUT", &timeout).with_source(e))?;
        }
        if let Some(max) = lookup("INFERBRIDGE_MAX_CONCURRENT") {
            self.inference.max_concurrent = parse_env("INFERBRIDGE_MAX_CONCURRENT", &max)?;
        }
        if let Some(words) = lookup("INFERBRIDGE_CHUNK_WORDS") {
            self.streaming.chunk_words = parse_env("INFERBRIDGE_CHUNK_WORDS", &words)?;
        }
        Ok(())
    }

    /// Reject configurations the gateway cannot serve with
    pub fn validate(&self) -> Result<()> {
        if self.inference.binary_path.as_os_str().is_empty() {
            return Err(missing("inference.binary_path"));
        }
        if self.inference.model_path.as_os_str().is_empty() {
            return Err(missing("inference.model_path"));
        }
        if self.inference.backend.trim().is_empty() {
            return Err(missing("inference.backend"));
        }
        if self.inference.max_concurrent == 0 {
            return Err(out_of_range("inference.max_concurrent", "must be at least 1"));
        }
        if self.inference.timeout.is_zero() {
            return Err(out_of_range("inference.timeout", "must be greater than zero"));
        }
        if self.streaming.chunk_words == 0 {
            return Err(out_of_range("streaming.chunk_words", "must be at least 1"));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| invalid_env(name, value))
}

fn invalid_env(name: &str, value: &str) -> GatewayError {
    GatewayError::config_with_code(
        ErrorCode::CONFIG_INVALID_VALUE,
        format!("{name} has invalid value '{value}'"),
        None,
    )
}

fn missing(field: &str) -> GatewayError {
    GatewayError::validation_with_code(
        ErrorCode::VALIDATION_REQUIRED_FIELD,
        "value is required",
        Some(field.to_string()),
    )
}

fn out_of_range(field: &str, message: &str) -> GatewayError {
    GatewayError::validation_with_code(
        ErrorCode::VALIDATION_OUT_OF_RANGE,
        message,
        Some(field.to_string()),
    )
}
