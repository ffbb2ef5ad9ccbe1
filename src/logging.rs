//! File logging. The terminal belongs to the UI, so everything goes to a log file.

use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "SCRATCHPAD_LOG";
pub const LOG_FILE: &str = "scratchpad.log";

/// Install a subscriber writing to `<dir>/scratchpad.log`. Returns the guard that flushes the
/// writer on drop, or `None` if logging could not be set up (which is not fatal).
pub fn init(dir: &Path, level: &str) -> Option<WorkerGuard> {
    fs::create_dir_all(dir).ok()?;
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;
    Some(guard)
}
