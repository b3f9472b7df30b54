//! Tracing setup for the CLI and for tests
//!
//! The CLI writes plain-text records to a daily file under
//! [`Config::state_dir`]; nothing goes to the terminal. Tests log through the
//! libtest capture instead.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "getgoing.log";

/// Filter used by [`init_test`] when `RUST_LOG` is unset.
const TEST_FILTER: &str = "getgoing_core=debug";

/// Keeps the background writer alive. Pending records are flushed on drop.
pub struct LoggingGuard {
    _worker: WorkerGuard,
}

/// Install the global subscriber for a CLI run.
///
/// `RUST_LOG` takes precedence over `config.level`.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let dir = Config::state_dir();
    let appender = daily_appender(&dir, config.max_files)?;
    let (writer, worker) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter_for(&config.level))
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!(dir = %dir.display(), level = %config.level, "Logging to file");
    Ok(LoggingGuard { _worker: worker })
}

/// Route records into the test harness output. Safe to call from every test.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(TEST_FILTER))
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// Current log file, before the date suffix the appender adds.
pub fn log_file_path() -> PathBuf {
    Config::log_path()
}

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn daily_appender(dir: &Path, max_files: usize) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .max_log_files(max_files.max(1))
        .build(dir)
        .map_err(|e| Error::Config(format!("cannot open log file in {}: {}", dir.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path() {
        assert!(log_file_path().ends_with("getgoing/getgoing.log"));
    }

    #[test]
    fn test_daily_appender_creates_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let logs = dir.path().join("state").join("getgoing");

        daily_appender(&logs, 0).unwrap();
        assert!(logs.is_dir());
    }

    #[test]
    fn test_daily_appender_blocked_by_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        assert!(daily_appender(&blocker.join("logs"), 3).is_err());
    }
}
