//! # Logging Utilities
//!
//! Logging infrastructure for kmeta using `tracing`.
//!
//! This module provides structured logging with support for:
//! - Pretty (development) and JSON (machine-readable) output
//! - Environment variable configuration
//! - Log level filtering
//! - An optional log file next to the console output
//!
//! Console output goes to **stderr**: `kmeta generate` without `-o` writes
//! the generated header to stdout and the two must not mix.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kmeta_utils::init_logging;
//!
//! // Reads RUST_LOG, KMETA_LOG_FORMAT and KMETA_LOG_FILE
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=kmeta_core=trace`)
//! - `KMETA_LOG_FORMAT`: Set output format (`json` or `pretty`, default: `pretty`)
//! - `KMETA_LOG_FILE`: Optional path to a log file (if not set, logs only to the console)
//!
//! ## Examples
//!
//! ```rust,no_run
//! use kmeta_utils::{init_logging_with_level, LogFormat, LogLevel};
//!
//! // Debug output, pretty format, plus a dated log file in ./logs
//! let guard = init_logging_with_level(Some(LogLevel::Debug), LogFormat::Pretty, Some("logs".as_ref()))
//!     .expect("Failed to initialize logging");
//! println!("logging to {:?}", guard.log_file());
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, fs, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    Pretty,
    /// JSON format, one object per line
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

impl LogFormat
{
    /// Format from `KMETA_LOG_FORMAT`, defaulting to pretty
    pub fn from_env() -> Self
    {
        env::var("KMETA_LOG_FORMAT")
            .ok()
            .and_then(|s| LogFormat::from_str(&s).ok())
            .unwrap_or(LogFormat::Pretty)
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
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

/// Keeps the log file writer alive
///
/// Buffered file output is flushed when the guard is dropped, so hold it
/// until the program exits.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct LoggingGuard
{
    _worker: Option<WorkerGuard>,
    log_file: Option<PathBuf>,
}

impl LoggingGuard
{
    /// Path of the log file, if file logging is active
    pub fn log_file(&self) -> Option<&Path>
    {
        self.log_file.as_deref()
    }
}

/// Initialize logging with default settings
///
/// Reads configuration from environment variables:
/// - `RUST_LOG`: Log level filter (e.g., `debug`, `kmeta_core=debug`)
/// - `KMETA_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
/// - `KMETA_LOG_FILE`: Optional path to log file
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - File logging fails (if `KMETA_LOG_FILE` is set)
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    init_logging_with_level(None, LogFormat::from_env(), None)
}

/// Initialize logging with an explicit level and format
///
/// ## Arguments
///
/// * `level` - Explicit level (from `--log-level`). If `None`, `RUST_LOG` is
///   used, falling back to `INFO`.
/// * `format` - Console and file output format.
/// * `log_dir` - If set, also log to `<log_dir>/YYYY-MM-DD-kmeta.log`. Takes
///   precedence over `KMETA_LOG_FILE`.
///
/// ## Errors
///
/// Returns an error if logging is already initialized or the log directory
/// cannot be created.
pub fn init_logging_with_level(
    level: Option<LogLevel>,
    format: LogFormat,
    log_dir: Option<&Path>,
) -> Result<LoggingGuard, LoggingError>
{
    let explicit_level = level.map(Level::from);

    let log_file = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            Some(dated_log_file(dir))
        }
        None => env::var("KMETA_LOG_FILE").ok().map(PathBuf::from),
    };

    let mut layers: Vec<BoxedLayer> = vec![format_layer(format, io::stderr, true, env_filter(explicit_level))];

    let mut worker = None;
    if let Some(path) = &log_file {
        // The date is already part of dated file names, so never roll
        let file_appender = tracing_appender::rolling::never(
            path.parent().unwrap_or_else(|| Path::new(".")),
            path.file_name().unwrap_or_default(),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // No ANSI in files
        layers.push(format_layer(format, non_blocking, false, env_filter(explicit_level)));
        worker = Some(guard);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;

    Ok(LoggingGuard {
        _worker: worker,
        log_file,
    })
}

/// `<dir>/YYYY-MM-DD-kmeta.log` for today's date (UTC)
pub fn dated_log_file(dir: &Path) -> PathBuf
{
    let today = Utc::now().format("%Y-%m-%d");
    dir.join(format!("{today}-kmeta.log"))
}

/// Build the level filter
///
/// Priority:
/// 1. If explicit_level is Some (from --log-level CLI flag), use it
/// 2. If RUST_LOG is set, use it (allows module-specific filters like "kmeta_core=debug")
/// 3. Otherwise, use INFO as default
fn env_filter(explicit_level: Option<Level>) -> EnvFilter
{
    if let Some(level) = explicit_level {
        EnvFilter::new(level.to_string())
    } else if let Ok(rust_log) = env::var("RUST_LOG") {
        EnvFilter::try_new(&rust_log).unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()))
    } else {
        EnvFilter::new(Level::INFO.to_string())
    }
}

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(ansi)
            .with_writer(writer)
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
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
    }
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("dev").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("prod").unwrap(), LogFormat::Json);
        assert!(LogFormat::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::from_str("warn").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("debug").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert!(LogLevel::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_level_to_tracing_level()
    {
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(LogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(LogLevel::Info), Level::INFO);
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }

    #[test]
    fn test_dated_log_file_name()
    {
        let path = dated_log_file(Path::new("/var/log/kmeta"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("-kmeta.log"));
        // YYYY-MM-DD-kmeta.log
        assert_eq!(name.len(), "2025-01-01-kmeta.log".len());
        assert_eq!(path.parent(), Some(Path::new("/var/log/kmeta")));
    }
}
