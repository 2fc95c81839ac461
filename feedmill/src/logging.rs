//! Logging infrastructure for feedmill.
//!
//! Structured logging with dual output:
//! - Writes to `<dir>/<file>` (cleared on session start)
//! - Also prints to stdout for CLI tailing
//! - Configurable via the RUST_LOG environment variable

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard flushes and closes the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the logging system.
///
/// Creates the log directory if needed, clears the previous log file, and
/// sets up output to both file and stdout. Defaults to INFO when RUST_LOG
/// is not set.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the log file
/// cannot be cleared.
pub fn init_logging(settings: &LoggingSettings) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(&settings.dir)?;

    // Clear the previous session's log; handles both existing and missing
    // files.
    let log_path = Path::new(&settings.dir).join(&settings.file);
    fs::write(&log_path, "")?;

    let file_appender = tracing_appender::rolling::never(&settings.dir, &settings.file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(false);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .with_target(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // init_logging installs a global subscriber and can only run once per
    // process, so only the filesystem side effects are covered here.

    #[test]
    fn test_log_file_is_cleared_on_init() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dir = temp_dir.path().join("logs");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("feedmill.log");
        fs::write(&path, "stale content").unwrap();

        let settings = LoggingSettings {
            dir: dir.to_string_lossy().to_string(),
            file: "feedmill.log".to_string(),
        };
        let guard = init_logging(&settings).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        drop(guard);
    }
}
