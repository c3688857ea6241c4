//! Logging configuration with file rotation
//!
//! This module provides logging setup with:
//! - File-based logging with daily rotation
//! - Structured logging with context
//! - Slow-poll warnings

use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    EnvFilter,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level
    pub level: Level,

    /// Log to file
    pub file_path: Option<PathBuf>,

    /// Log to stderr
    pub stderr: bool,

    /// Include thread IDs
    pub thread_ids: bool,

    /// Include spans
    pub spans: FmtSpan,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file_path: None,
            stderr: true,
            thread_ids: false,
            spans: FmtSpan::NONE,
        }
    }
}

impl LogConfig {
    /// Create config from environment
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Set log level from RUST_LOG
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            // Parse the env filter to extract the level
            if rust_log.contains("trace") {
                config.level = Level::TRACE;
            } else if rust_log.contains("debug") {
                config.level = Level::DEBUG;
            } else if rust_log.contains("info") {
                config.level = Level::INFO;
            } else if rust_log.contains("warn") {
                config.level = Level::WARN;
            } else if rust_log.contains("error") {
                config.level = Level::ERROR;
            }
        }

        // Set file path from VCENTER_LOG_FILE
        if let Ok(log_file) = std::env::var("VCENTER_LOG_FILE") {
            config.file_path = Some(PathBuf::from(log_file));
        }

        // Set stderr logging
        if let Ok(log_stderr) = std::env::var("VCENTER_LOG_STDERR") {
            config.stderr = log_stderr.to_lowercase() != "false";
        }

        config
    }
}

/// Build a daily-rotated file appender, creating the parent directory if needed
fn rolling_appender(file_path: &Path) -> Result<RollingFileAppender, std::io::Error> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    Ok(tracing_appender::rolling::daily(
        file_path.parent().unwrap_or_else(|| Path::new(".")),
        file_path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("vcenter-inventory.log")),
    ))
}

/// Initialize logging with the given configuration
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Create env filter
    let env_filter = EnvFilter::builder()
        .with_default_directive(config.level.into())
        .from_env_lossy();

    // Create formatter
    let format = fmt::format()
        .with_level(true)
        .with_target(true)
        .with_thread_ids(config.thread_ids);

    // Store spans to avoid move issues
    let span_events = config.spans;

    // Build subscriber based on configuration
    match (config.stderr, config.file_path) {
        (true, Some(file_path)) => {
            // Both stderr and file logging
            let stderr_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .event_format(format.clone())
                .with_span_events(span_events.clone());

            let file_layer = fmt::layer()
                .with_writer(rolling_appender(&file_path)?)
                .with_ansi(false)
                .event_format(format)
                .with_span_events(span_events);

            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .with(file_layer);

            tracing::subscriber::set_global_default(subscriber)?;
        }
        (true, None) => {
            // Only stderr logging
            let stderr_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .event_format(format)
                .with_span_events(span_events);

            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer);

            tracing::subscriber::set_global_default(subscriber)?;
        }
        (false, Some(file_path)) => {
            // Only file logging
            let file_layer = fmt::layer()
                .with_writer(rolling_appender(&file_path)?)
                .with_ansi(false)
                .event_format(format)
                .with_span_events(span_events);

            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer);

            tracing::subscriber::set_global_default(subscriber)?;
        }
        (false, None) => {
            // No output logging configured, just filter
            let subscriber = tracing_subscriber::registry().with(env_filter);

            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}

/// Performance logging utilities
pub struct PerfLogger;

impl PerfLogger {
    /// Log slow operations
    pub fn log_if_slow(operation: &str, duration_ms: u64, threshold_ms: u64) {
        if duration_ms > threshold_ms {
            tracing::warn!(
                operation = operation,
                duration_ms = duration_ms,
                threshold_ms = threshold_ms,
                "Slow operation detected"
            );
        }
    }
}
