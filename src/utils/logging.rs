//! Process-wide tracing setup.
//!
//! Two layers share one registry:
//! - console on stderr, filtered by `RUST_LOG` (default `info`, `debug` when verbose)
//! - `errorlogs.txt` under the log directory, ERROR events only, no ANSI codes

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::types::{AppError, Result};

pub const ERROR_LOG_FILE: &str = "errorlogs.txt";

/// Install the global subscriber. Call once, at process start.
pub fn init(log_dir: &Path, verbose: bool) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;
    let error_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(ERROR_LOG_FILE))?;

    let default_level = if verbose { "debug" } else { "info" };
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("groundwork={default_level},warn")));

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let errors = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(error_file))
        .with_ansi(false)
        .with_filter(LevelFilter::ERROR);

    tracing_subscriber::registry()
        .with(console)
        .with(errors)
        .try_init()
        .map_err(|e| AppError::Internal(format!("Failed to initialise logging: {}", e)))
}
