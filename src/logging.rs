use std::fs;

use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

pub const LOG_FILE_PREFIX: &str = "confnorm.log";

/// Build the filter from `RUST_LOG`, falling back to the configured directive.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("confnorm=info"))
}

/// Initializes console logging plus optional daily-rolling file output.
///
/// Keep the returned guard alive for as long as logs should be flushed to
/// the file. Returns `None` when no log directory is configured or it cannot
/// be created; console logging is installed either way. Calling this twice
/// leaves the first subscriber in place.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    // reported once the subscriber is up
    let mut dir_error = None;
    let usable_dir = match &config.log_dir {
        Some(dir) => match fs::create_dir_all(dir) {
            Ok(()) => Some(dir),
            Err(e) => {
                dir_error = Some(format!("{}: {}", dir.display(), e));
                None
            }
        },
        None => None,
    };

    let (file_layer, guard) = match usable_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

            let layer = if config.json {
                fmt::layer()
                    .json()
                    .with_writer(non_blocking_writer)
                    .boxed()
            } else {
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking_writer)
                    .boxed()
            };
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(file_layer)
        .with(console_layer)
        .try_init();

    if let Some(reason) = dir_error {
        warn!("⚠️ File logging disabled, cannot create log directory {}", reason);
    }
    guard
}
