//! ## Sets up logging by reading configuration from environment variables.
//!
//! Environment variables used:
//! - LOG_LEVEL: filter directive ("trace", "debug", "info", "warn", "error",
//!   or any `tracing` filter expression); default is "info"
//! - LOG_FORMAT: "text" (default) or "json"

use std::env;
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber. A no-op if a subscriber is
/// already installed (tests, embedding hosts).
pub fn setup_logging() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if log_format.to_lowercase() == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed, keeping it");
    }
}
