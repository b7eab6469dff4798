//! Pressroom - article extraction server
//!
//! Issues per-browser-session credentials, compiles the client bundle
//! on demand with the session secret injected, and proxies extraction
//! requests to the content-extraction handler.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod server;
pub mod session;

pub use error::{PressroomError, PressroomResult};
