//! Logging setup for hazardwatch binaries.
//!
//! Structured tracing output to a session log file plus the terminal.
//! The file is truncated at session start so each run reads from the
//! top. Verbosity is controlled through `RUST_LOG`; without it the
//! filter defaults to `info`.

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default directory for session log files.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Default session log file name.
pub const DEFAULT_LOG_FILE: &str = "hazardwatch.log";

/// Keeps the non-blocking file writer alive.
///
/// Dropping the guard flushes and closes the log file, so hold it for
/// the lifetime of the process.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the global tracing subscriber.
///
/// Writes compact single-line events to stderr (with ANSI colors) and
/// the same events without colors to `<log_dir>/<log_file>`. The global
/// subscriber can only be installed once per process.
///
/// # Errors
///
/// Returns an error when the log directory cannot be created or the
/// previous session file cannot be truncated.
pub fn init(log_dir: &str, log_file: &str) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;

    // Truncate the previous session's file
    let log_path = Path::new(log_dir).join(log_file);
    fs::write(&log_path, "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(true);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
