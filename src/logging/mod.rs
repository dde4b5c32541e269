//! This module sets up `tracing` output for the receiver.
//!
//! Logs always go to the console; when a log directory is configured they are
//! also written to a daily-rotated file.
use anyhow::Result;
use std::path::Path;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_NAME: &str = "sms_receiver.log";

/// Keeps the non-blocking file writer alive. Dropping it flushes the file.
pub struct LogGuard {
    _guard: WorkerGuard,
}

/// Installs the global subscriber.
///
/// `level` accepts a plain level (`info`, `DEBUG`) or a full `EnvFilter`
/// directive string; anything unparsable falls back to `info`.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init(level: &str, log_dir: Option<&Path>) -> Result<Option<LogGuard>> {
    let env_filter =
        EnvFilter::try_new(level.to_lowercase()).unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer().with_target(true).compact();

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true);
            (Some(layer), Some(LogGuard { _guard: guard }))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    match log_dir {
        Some(dir) => tracing::info!("Logging at level={} to {}", level, dir.display()),
        None => tracing::info!("Logging at level={}", level),
    }

    Ok(guard)
}
