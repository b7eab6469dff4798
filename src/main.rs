//! Pressroom server entry point

use clap::Parser;
use console::style;
use pressroom::cache::CacheStore;
use pressroom::cli::Cli;
use pressroom::config::ConfigManager;
use pressroom::error::PressroomResult;
use pressroom::extract::PageExtractor;
use pressroom::pipeline::AssetPipeline;
use pressroom::server::{self, AppState};
use pressroom::session::SessionStore;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> PressroomResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("pressroom=warn"),
        1 => EnvFilter::new("pressroom=info"),
        _ => EnvFilter::new("pressroom=debug"),
    };

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let mut config = config_manager.load().await?;

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    // CLI overrides
    if let Some(mode) = cli.mode {
        config.general.mode = mode;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(base_dir) = cli.base_dir {
        config.assets.base_dir = base_dir;
    }

    let mode = config.general.mode;
    info!("Starting in {mode} mode");

    let cache = Arc::new(CacheStore::new(
        config.cache.capacity,
        config.cache.effective_ttl(mode),
    ));
    let sessions = Arc::new(SessionStore::new(config.session.effective_max_age(mode)));
    let pipeline = AssetPipeline::new(
        config.assets.assets_root(),
        config.assets.packages_root(),
        mode,
        Arc::clone(&cache),
    )
    .with_css_cache(config.cache.cache_css);

    let state = AppState {
        pipeline: Arc::new(pipeline),
        sessions,
        extractor: Arc::new(PageExtractor),
        index_html: config.assets.index_html(),
        static_root: config.assets.static_root(),
        cookie_max_age: config.session.effective_max_age(mode),
    };

    server::serve(&config, state).await
}
