//! Core module: server configuration and bootstrap
//!
//! - [`Config`] - environment-driven configuration
//! - [`setup_environment`] - dotenv + logging initialization

pub mod config;

pub use config::Config;

use crate::utils::logger;

/// Load `.env` if present and initialize the tracing subscriber.
///
/// Called once at process start, before [`Config::from_env`].
pub fn setup_environment() -> anyhow::Result<()> {
    // Missing .env is fine; env vars may come from the parent process.
    let _ = dotenv::dotenv();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    logger::init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}
