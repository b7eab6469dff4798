//! Error types for Pressroom
//!
//! All modules use `PressroomResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Pressroom operations
pub type PressroomResult<T> = Result<T, PressroomError>;

/// All errors that can occur in Pressroom
#[derive(Error, Debug)]
pub enum PressroomError {
    // Asset pipeline errors
    #[error("Asset not found: {0}")]
    AssetNotFound(PathBuf),

    #[error("Failed to resolve module '{module}': {reason}")]
    Resolution { module: String, reason: String },

    #[error("Minification failed: {reason}")]
    Minify { reason: String },

    #[error("Invalid asset path '{path}': {reason}")]
    AssetPathInvalid { path: String, reason: String },

    // Session errors
    #[error("No session credentials established for this request")]
    MissingCredential,

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // Extraction errors
    #[error("Failed to fetch '{url}': {reason}")]
    Fetch { url: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PressroomError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a resolution error
    pub fn resolution(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            module: module.into(),
            reason: reason.into(),
        }
    }

    /// Create a minification error
    pub fn minify(reason: impl Into<String>) -> Self {
        Self::Minify {
            reason: reason.into(),
        }
    }

    /// True for failures that indicate a defect in the pipeline itself
    /// rather than a missing or unresolvable asset. A minifier rejecting
    /// code the resolver produced means the resolver emitted invalid
    /// output, so these are logged at error level instead of warn.
    pub fn is_pipeline_defect(&self) -> bool {
        matches!(self, Self::Minify { .. } | Self::Internal(_))
    }
}
