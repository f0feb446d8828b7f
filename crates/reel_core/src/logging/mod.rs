//! Logging infrastructure for Reelsmith.
//!
//! This module provides:
//! - Per-batch loggers with file, tracing and event output
//! - Compact mode with progress filtering
//! - Tail buffer for error diagnosis
//! - Application-wide `tracing` setup with an optional daily log file
//!
//! # Example
//!
//! ```no_run
//! use reel_core::events::EventHub;
//! use reel_core::logging::{LogConfig, RunLogger};
//!
//! let logger = RunLogger::new(
//!     "product",
//!     Some(std::path::Path::new("/path/to/logs")),
//!     LogConfig::default(),
//!     EventHub::new(),
//! ).unwrap();
//!
//! logger.phase("Concatenate scenes");
//! logger.command("ffmpeg -f concat ...");
//! logger.progress("Concatenate scenes", 50);
//! logger.success("Output written");
//! ```

mod run_logger;
mod types;

use std::path::Path;

pub use run_logger::RunLogger;
pub use types::{LogConfig, LogLevel, MessagePrefix};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize global tracing subscriber for application-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr with timestamps
/// - Optionally appends to a daily rolling file in `log_dir`
///
/// The returned guard must be held until shutdown so buffered file
/// output is flushed. Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "reelsmith.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .with(filter)
        .try_init();

    guard
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

/// Convert LogLevel to filter string.
fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_to_filter_works() {
        assert_eq!(level_to_filter_str(LogLevel::Debug), "debug");
        assert_eq!(level_to_filter_str(LogLevel::Warn), "warn");
    }
}
