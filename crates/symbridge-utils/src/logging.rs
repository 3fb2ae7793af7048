//! # Logging Utilities
//!
//! Logging infrastructure for symbridge using `tracing`.
//!
//! This module provides structured logging with support for:
//! - Pretty (development) and JSON (machine-readable) output
//! - Environment variable configuration
//! - An optional daily-rolling log file next to the console output
//! - A file-only mode for interactive use, where log lines must not mix
//!   with command output
//!
//! Console output goes to stderr; stdout belongs to the command being run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use symbridge_utils::init_logging;
//!
//! // Initialize with default settings (reads from RUST_LOG env var)
//! init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=symbridge_core=trace`)
//! - `SYMBRIDGE_LOG_FORMAT`: Set output format (`json` or `pretty`, default: `pretty`)
//! - `SYMBRIDGE_LOG_FILE`: Optional path to an additional, daily-rolling log file

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::NonBlocking;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    Error,
    Warn,
    /// Default
    Info,
    Debug,
    /// Most verbose; every lookup decision of the bridge is logged here
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Initialize logging with default settings
///
/// Reads configuration from environment variables:
/// - `RUST_LOG`: Log level filter (e.g., `debug`, `symbridge_core=trace`)
/// - `SYMBRIDGE_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
/// - `SYMBRIDGE_LOG_FILE`: Optional path to log file
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `SYMBRIDGE_LOG_FILE` names a file whose directory cannot be created
pub fn init_logging() -> Result<(), LoggingError>
{
    let format = env::var("SYMBRIDGE_LOG_FORMAT")
        .ok()
        .and_then(|s| LogFormat::from_str(&s).ok())
        .unwrap_or(LogFormat::Pretty);

    let default_level = env::var("RUST_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .parse::<LogLevel>()
        .map(Into::into)
        .unwrap_or(Level::INFO);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));
    let log_file = env::var("SYMBRIDGE_LOG_FILE").ok().map(PathBuf::from);
    init_layers(format, filter, log_file.as_deref())
}

/// Initialize console logging with an explicit level and format
///
/// `SYMBRIDGE_LOG_FILE` is still honoured.
///
/// ## Example
///
/// ```rust,no_run
/// use symbridge_utils::{LogFormat, LogLevel, init_logging_with_level};
///
/// init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
///     .expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized or file logging fails.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<(), LoggingError>
{
    let filter = EnvFilter::new(Level::from(level).to_string());
    let log_file = env::var("SYMBRIDGE_LOG_FILE").ok().map(PathBuf::from);
    init_layers(format, filter, log_file.as_deref())
}

/// Initialize file-only logging
///
/// Nothing is written to the console. The log file is
/// `~/.symbridge/YYYY-MM-DD-symbridge.log`, or the same name under `/tmp` when
/// `HOME` is not set. Returns the path of the file.
///
/// An explicit `level` wins over `RUST_LOG`; without either, `INFO` is used.
///
/// ## Errors
///
/// Returns an error if logging is already initialized or the log directory
/// cannot be created.
pub fn init_logging_to_file(level: Option<LogLevel>) -> Result<PathBuf, LoggingError>
{
    let today = Utc::now().format("%Y-%m-%d").to_string();
    let home = env::var("HOME").ok().map(PathBuf::from);
    let log_file = log_file_path(home.as_deref(), &today);
    if let Some(dir) = log_file.parent() {
        std::fs::create_dir_all(dir).map_err(LoggingError::FileError)?;
    }

    let filter = match level {
        Some(level) => EnvFilter::new(Level::from(level).to_string()),
        None => env::var("RUST_LOG")
            .ok()
            .and_then(|rust_log| EnvFilter::try_new(rust_log).ok())
            .unwrap_or_else(|| EnvFilter::new(Level::INFO.to_string())),
    };

    // The date is already part of the file name, so the file never rolls.
    let writer = non_blocking_writer(tracing_appender::rolling::never(
        log_file.parent().unwrap_or(Path::new(".")),
        log_file.file_name().unwrap_or_default(),
    ));

    Registry::default()
        .with(vec![file_layer(LogFormat::Pretty, filter, writer)])
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;
    Ok(log_file)
}

/// Where file-only logging writes for `today` (`YYYY-MM-DD`).
pub fn log_file_path(home: Option<&Path>, today: &str) -> PathBuf
{
    let file_name = format!("{today}-symbridge.log");
    match home {
        Some(home) => home.join(".symbridge").join(file_name),
        None => PathBuf::from("/tmp").join(file_name),
    }
}

fn init_layers(format: LogFormat, filter: EnvFilter, log_file: Option<&Path>) -> Result<(), LoggingError>
{
    let mut layers = vec![console_layer(format, filter.clone())];

    if let Some(file_path) = log_file {
        if let Some(dir) = file_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(LoggingError::FileError)?;
        }
        let writer = non_blocking_writer(tracing_appender::rolling::daily(
            file_path.parent().unwrap_or(Path::new(".")),
            file_path.file_name().unwrap_or_default(),
        ));
        layers.push(file_layer(format, filter, writer));
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))
}

/// Wrap an appender in a background writer that lives for the rest of the
/// process.
fn non_blocking_writer(appender: tracing_appender::rolling::RollingFileAppender) -> NonBlocking
{
    let (writer, guard) = tracing_appender::non_blocking(appender);
    // Dropping the guard would stop the worker and lose buffered lines.
    std::mem::forget(guard);
    writer
}

fn console_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
    }
}

fn file_layer(format: LogFormat, filter: EnvFilter, writer: NonBlocking) -> BoxedLayer
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(false)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// A global subscriber was already installed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
