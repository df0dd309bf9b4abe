//! `tracing` subscriber setup.
//!
//! Library code only emits events; binaries and tests pick a subscriber here.
//! Only one global subscriber can be installed per process, so binaries call
//! [`init_logging_or_minimal`] once the configuration is loaded and use
//! [`init_minimal_logging`] alone only when there is no configuration.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::io::stdout;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;
use crate::error::LoggingError;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Keeps the non-blocking file writer alive so buffered lines get flushed.
static LOG_WORKER_GUARD: Lazy<Mutex<Option<WorkerGuard>>> = Lazy::new(|| Mutex::new(None));

/// Logs to stderr, filtered by `RUST_LOG` (default `info`). Does nothing if a
/// global subscriber is already installed.
pub fn init_minimal_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    let _ = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .try_init();
}

fn level_filter(level: &str) -> Result<Level, LoggingError> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(LoggingError::InitializationFailure(format!(
            "Invalid log level in config: {}",
            other
        ))),
    }
}

fn create_file_layer(log_path: &Path, format: &str) -> Result<(BoxedLayer, WorkerGuard), LoggingError> {
    let directory = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(directory)?;

    let file_name = log_path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("dispmanx.log"));
    let appender = tracing_appender::rolling::daily(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = if format.eq_ignore_ascii_case("json") {
        fmt::layer().json().with_writer(writer).with_ansi(false).boxed()
    } else {
        fmt::layer().with_writer(writer).with_ansi(false).boxed()
    };
    Ok((layer, guard))
}

/// Installs the global subscriber described by `config`: a stdout layer in
/// the configured format and, if `file_path` is set, a daily-rolling file.
///
/// Fails if the level is unknown, the log directory cannot be created, or a
/// global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let level = level_filter(&config.level)?;

    let stdout_layer = if config.format.eq_ignore_ascii_case("json") {
        fmt::layer()
            .json()
            .with_writer(stdout)
            .with_ansi(false)
            .with_filter(EnvFilter::new(level.to_string()))
            .boxed()
    } else {
        fmt::layer()
            .with_writer(stdout)
            .with_ansi(atty::is(atty::Stream::Stdout))
            .with_filter(EnvFilter::new(level.to_string()))
            .boxed()
    };

    let mut layers: Vec<BoxedLayer> = vec![stdout_layer];
    let mut file_guard = None;
    if let Some(path) = &config.file_path {
        let (file_layer, guard) = create_file_layer(path, &config.format)?;
        layers.push(file_layer.with_filter(EnvFilter::new(level.to_string())).boxed());
        file_guard = Some(guard);
    }

    Registry::default().with(layers).try_init().map_err(|e| {
        LoggingError::InitializationFailure(format!(
            "Failed to set global tracing subscriber: {}",
            e
        ))
    })?;

    *LOG_WORKER_GUARD.lock() = file_guard;
    Ok(())
}

/// Installs the configured subscriber. If that fails, minimal stderr logging
/// is installed instead and the error is returned for the caller to report.
pub fn init_logging_or_minimal(config: &LoggingConfig) -> Result<(), LoggingError> {
    init_logging(config).map_err(|e| {
        init_minimal_logging();
        e
    })
}

/// Drops the file writer guard, flushing buffered lines to the log file.
/// File logging stops afterwards.
pub fn flush_file_logging() {
    LOG_WORKER_GUARD.lock().take();
}
