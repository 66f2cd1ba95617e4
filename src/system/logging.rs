//! Logging system initialization
//!
//! Installs the global tracing subscriber from [`LoggingConfig`].

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

use crate::config::LoggingConfig;
use crate::errors::{LinkvaultError, Result};

/// Initialize logging system based on configuration
///
/// Output goes to stdout unless `logging.file` is set; with
/// `enable_rotation` the file rolls daily and keeps `max_backups` files.
///
/// **Note**: call once, after the configuration has been loaded.
///
/// # Returns
/// * `WorkerGuard` - keep it alive for the lifetime of the program so the
///   non-blocking writer gets flushed
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let log_file = config.file.as_deref().filter(|f| !f.is_empty());

    let writer: Box<dyn std::io::Write + Send + Sync> = match log_file {
        Some(log_file) if config.enable_rotation => {
            let path = Path::new(log_file);
            let dir = path.parent().unwrap_or(Path::new("."));
            let filename = path
                .file_name()
                .and_then(|f| f.to_str())
                .unwrap_or("linkvault.log");
            let appender = rolling::Builder::new()
                .rotation(rolling::Rotation::DAILY)
                .filename_prefix(filename.trim_end_matches(".log"))
                .filename_suffix("log")
                .max_log_files(config.max_backups as usize)
                .build(dir)
                .map_err(|e| {
                    LinkvaultError::file_operation(format!(
                        "Failed to create rolling log appender: {}",
                        e
                    ))
                })?;
            Box::new(appender)
        }
        Some(log_file) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .map_err(|e| {
                    LinkvaultError::file_operation(format!(
                        "Failed to open log file {}: {}",
                        log_file, e
                    ))
                })?;
            Box::new(file)
        }
        None => Box::new(std::io::stdout()),
    };

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(log_file.is_none());

    let installed = if config.format == "json" {
        subscriber_builder.json().try_init()
    } else {
        subscriber_builder.try_init()
    };

    installed.map_err(|e| {
        LinkvaultError::config(format!("Failed to install tracing subscriber: {}", e))
    })?;

    Ok(guard)
}
