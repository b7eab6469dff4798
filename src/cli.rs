//! CLI argument definitions using clap derive

use crate::config::Mode;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Pressroom - article extraction server
///
/// Serves a single-page extraction tool whose client bundle is compiled
/// on demand and bound to a per-browser-session secret.
#[derive(Parser, Debug)]
#[command(name = "pressroom")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "PRESSROOM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Build mode override
    #[arg(short, long, env = "PRESSROOM_MODE", value_enum)]
    pub mode: Option<Mode>,

    /// Bind port override
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Bind address override
    #[arg(long)]
    pub host: Option<String>,

    /// Project base directory override
    #[arg(short, long)]
    pub base_dir: Option<PathBuf>,
}
