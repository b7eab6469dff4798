//! On-demand asset compilation
//!
//! Compiles client assets per request: JS bundles run through
//! resolve → inject → (strip) → (minify), guarded by the bundle cache;
//! stylesheets run through the single-stage CSS resolver. The stages
//! gated on production mode are stripping and minification — stripping
//! runs first so the minifier never wastes work on debug-only code.
//!
//! For a fixed `(asset path, client secret, mode)` and unchanged files
//! on disk, a build is a pure function of its inputs. That is what
//! makes the cache safe: a key derived from path and secret can only
//! ever map to one output.

pub mod css;
pub mod inject;
pub mod minify;
pub mod resolver;
pub mod strip;

use crate::cache::{bundle_key, CacheStore};
use crate::config::Mode;
use crate::error::{PressroomError, PressroomResult};
use resolver::BundleResolver;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Compiles and caches client assets for one server instance.
pub struct AssetPipeline {
    assets_root: PathBuf,
    packages_root: PathBuf,
    mode: Mode,
    cache: Arc<CacheStore>,
    cache_css: bool,
}

impl AssetPipeline {
    pub fn new(
        assets_root: impl Into<PathBuf>,
        packages_root: impl Into<PathBuf>,
        mode: Mode,
        cache: Arc<CacheStore>,
    ) -> Self {
        Self {
            assets_root: assets_root.into(),
            packages_root: packages_root.into(),
            mode,
            cache,
            cache_css: false,
        }
    }

    /// Opt in to caching compiled CSS (keyed by path alone).
    pub fn with_css_cache(mut self, enabled: bool) -> Self {
        self.cache_css = enabled;
        self
    }

    /// Compile a JS bundle bound to `client_secret`.
    ///
    /// Cache hits return immediately. A failure at any stage propagates
    /// without touching the cache, so a broken build can never poison
    /// later requests.
    pub async fn build_js(&self, asset_path: &str, client_secret: &str) -> PressroomResult<String> {
        validate_asset_path(asset_path)?;

        let key = bundle_key(asset_path, client_secret);
        if let Some(cached) = self.cache.get(&key) {
            debug!(asset = asset_path, "Bundle cache hit");
            return Ok(cached);
        }
        debug!(asset = asset_path, "Bundle cache miss");

        let entry = self.assets_root.join(asset_path);
        if !entry.is_file() {
            return Err(PressroomError::AssetNotFound(entry));
        }

        let packages_root = self.packages_root.clone();
        let mode = self.mode;
        let secret = client_secret.to_string();
        let compiled = tokio::task::spawn_blocking(move || {
            compile_bundle(&entry, &packages_root, &secret, mode)
        })
        .await
        .map_err(|e| PressroomError::Internal(format!("build task panicked: {e}")))??;

        self.cache.set(key, compiled.clone());
        Ok(compiled)
    }

    /// Concatenate a stylesheet and its import chain.
    pub async fn build_css(&self, asset_path: &str) -> PressroomResult<String> {
        validate_asset_path(asset_path)?;

        // CSS has no secret binding; when caching is enabled the key is
        // derived from the path alone.
        let key = self.cache_css.then(|| bundle_key(asset_path, ""));
        if let Some(key) = &key {
            if let Some(cached) = self.cache.get(key) {
                debug!(asset = asset_path, "Stylesheet cache hit");
                return Ok(cached);
            }
        }

        let entry = self.assets_root.join(asset_path);
        if !entry.is_file() {
            return Err(PressroomError::AssetNotFound(entry));
        }

        let compiled =
            tokio::task::spawn_blocking(move || css::resolve_css(&entry))
                .await
                .map_err(|e| PressroomError::Internal(format!("build task panicked: {e}")))??;

        if let Some(key) = key {
            self.cache.set(key, compiled.clone());
        }
        Ok(compiled)
    }
}

/// The synchronous transform chain, run on the blocking pool.
fn compile_bundle(
    entry: &Path,
    packages_root: &Path,
    client_secret: &str,
    mode: Mode,
) -> PressroomResult<String> {
    let resolved = BundleResolver::new(packages_root).resolve(entry)?;
    let injected = inject::inject_secret(&resolved, client_secret);

    if !mode.is_production() {
        return Ok(injected);
    }

    let stripped = strip::strip_debug_calls(&injected);
    minify::minify(&stripped)
}

/// Reject traversal and other hostile request paths before any
/// filesystem access.
fn validate_asset_path(path: &str) -> PressroomResult<()> {
    let invalid = |reason: &str| {
        Err(PressroomError::AssetPathInvalid {
            path: path.to_string(),
            reason: reason.to_string(),
        })
    };

    if path.is_empty() {
        return invalid("empty path");
    }
    if path.starts_with('/') || path.contains('\\') || path.contains('\0') {
        return invalid("absolute or malformed path");
    }
    if Path::new(path)
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return invalid("path traversal");
    }
    Ok(())
}
