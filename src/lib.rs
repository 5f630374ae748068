//! rabbitmq-zabbix library
//!
//! This crate polls the RabbitMQ management API and reports queue, consumer,
//! node and overview metrics to Zabbix, either as low-level discovery JSON or
//! through `zabbix_sender`.

pub mod checks;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod sink;
pub mod transformer;

use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging subsystem
///
/// Stdout carries check output, so logs go to stderr, or are appended to
/// `file` when one is given.
///
/// # Arguments
/// * `level` - Log level string (trace, debug, info, warn, error)
/// * `file` - Optional log file
///
/// # Errors
/// Returns an error if the log file path is unusable or the logging system
/// fails to initialize
pub fn init_logging(level: &str, file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid log file path: {}", path.display()))?;
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));

            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(file_name.to_string_lossy())
                .build(directory)
                .map_err(|e| {
                    anyhow::anyhow!("Failed to open log file {}: {}", path.display(), e)
                })?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    let stderr_layer = file
        .is_none()
        .then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(guard)
}
