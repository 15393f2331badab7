//! Process-level settings that exist before the gateway config is loaded

use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Number of `-v` flags
    pub verbose: u8,
    /// `--config` file, replacing the local `inferbridge.toml`
    pub config_path: Option<PathBuf>,
    /// `log_level` from the gateway config; used when no `-v` was given
    pub log_level: Option<String>,
}

impl AppConfig {
    pub fn new(verbose: u8) -> Self {
        Self {
            verbose,
            ..Self::default()
        }
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn with_log_level(mut self, level: Option<String>) -> Self {
        self.log_level = level.filter(|l| !l.trim().is_empty());
        self
    }

    /// Filter directive: `-v` flags win over the configured level
    pub fn log_level(&self) -> String {
        match (self.verbose, &self.log_level) {
            (0, Some(level)) => level.clone(),
            (0, None) => "info".to_string(),
            (1, _) => "debug".to_string(),
            (2, _) => "trace".to_string(),
            _ => "trace,hyper=debug,tower=debug".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_verbosity() {
        assert_eq!(AppConfig::new(0).log_level(), "info");
        assert_eq!(AppConfig::new(1).log_level(), "debug");
        assert_eq!(AppConfig::new(2).log_level(), "trace");
        assert_eq!(
            AppConfig::new(5).log_level(),
            "trace,hyper=debug,tower=debug"
        );
    }

    #[test]
    fn test_configured_level_applies_without_flags() {
        let config = AppConfig::new(0).with_log_level(Some("warn,inferbridge=debug".into()));
        assert_eq!(config.log_level(), "warn,inferbridge=debug");

        let config = AppConfig::new(1).with_log_level(Some("warn".into()));
        assert_eq!(config.log_level(), "debug");

        let config = AppConfig::new(0).with_log_level(Some("  ".into()));
        assert_eq!(config.log_level(), "info");
    }
}
