//! Configuration management for Pressroom

pub mod schema;

pub use schema::{Config, Mode};

use crate::error::{PressroomError, PressroomResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pressroom")
            .join("config.toml")
    }

    /// Load configuration, falling back to defaults if no file exists
    pub async fn load(&self) -> PressroomResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> PressroomResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| PressroomError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| PressroomError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let manager = ConfigManager::with_path(PathBuf::from("/nonexistent/config.toml"));
        let config = manager.load().await.unwrap();
        assert_eq!(config.server.port, Config::default().server.port);
    }

    #[tokio::test]
    async fn loads_partial_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 8080\n\n[general]\nmode = \"production\""
        )
        .unwrap();

        let manager = ConfigManager::with_path(file.path().to_path_buf());
        let config = manager.load().await.unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.general.mode.is_production());
        // Unspecified sections keep their defaults
        assert_eq!(config.cache.capacity, 500);
    }

    #[tokio::test]
    async fn invalid_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport=").unwrap();

        let manager = ConfigManager::with_path(file.path().to_path_buf());
        let err = manager.load().await.unwrap_err();
        assert!(matches!(err, PressroomError::ConfigInvalid { .. }));
    }
}
