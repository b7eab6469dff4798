//! Configuration schema for Pressroom
//!
//! Configuration is stored at `~/.config/pressroom/config.toml`

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Build mode, gating the optional transform stages of the asset pipeline.
///
/// Development keeps bundles readable (no stripping, no minification) and
/// uses short cache/session lifetimes so edits show up quickly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Asset locations and pipeline inputs
    pub assets: AssetsConfig,

    /// Compiled-bundle cache settings
    pub cache: CacheConfig,

    /// Session settings
    pub session: SessionConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Build mode: "development" or "production"
    pub mode: Mode,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Development,
            log_format: "text".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3100,
        }
    }
}

/// Asset locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Project base directory
    pub base_dir: PathBuf,

    /// Source directory under `base_dir` holding index.html, assets/ and static/
    pub src_dir: String,

    /// Directory under `base_dir` holding installed client packages
    pub packages_dir: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            src_dir: "src".to_string(),
            packages_dir: "vendor".to_string(),
        }
    }
}

impl AssetsConfig {
    /// Directory the `/assets/*` routes resolve against
    pub fn assets_root(&self) -> PathBuf {
        self.base_dir.join(&self.src_dir).join("assets")
    }

    /// Directory bare package imports resolve against
    pub fn packages_root(&self) -> PathBuf {
        self.base_dir.join(&self.packages_dir)
    }

    /// Directory of as-is static files, served when present
    pub fn static_root(&self) -> PathBuf {
        self.base_dir.join(&self.src_dir).join("static")
    }

    /// Path of the HTML shell served at the root route
    pub fn index_html(&self) -> PathBuf {
        self.base_dir.join(&self.src_dir).join("index.html")
    }
}

/// Compiled-bundle cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached bundles
    pub capacity: usize,

    /// Entry time-to-live in seconds; defaults per mode when unset
    pub ttl_secs: Option<u64>,

    /// Also cache compiled CSS (keyed by path alone; no secret binding)
    pub cache_css: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 500,
            ttl_secs: None,
            cache_css: false,
        }
    }
}

impl CacheConfig {
    /// Effective TTL: explicit setting, or 5s in development and 3h in
    /// production so stale bundles never outlive a working session.
    pub fn effective_ttl(&self, mode: Mode) -> Duration {
        let secs = self.ttl_secs.unwrap_or(match mode {
            Mode::Development => 5,
            Mode::Production => 3 * 60 * 60,
        });
        Duration::from_secs(secs)
    }
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session cookie max-age in seconds; defaults per mode when unset
    pub cookie_max_age_secs: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_max_age_secs: None,
        }
    }
}

impl SessionConfig {
    /// Effective cookie max-age: 2 minutes in development, 2 hours in
    /// production (matching the credential lifetime served to clients).
    pub fn effective_max_age(&self, mode: Mode) -> Duration {
        let secs = self.cookie_max_age_secs.unwrap_or(match mode {
            Mode::Development => 2 * 60,
            Mode::Production => 2 * 60 * 60,
        });
        Duration::from_secs(secs)
    }
}
