//! Logging Infrastructure
//!
//! Structured logging setup with support for both development and production environments.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger
pub fn init_logger() {
    init_logger_with_file(None, None, None);
}

/// Initialize the logger with optional file output
///
/// `RUST_LOG` takes precedence over `log_level` when set.
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    // Add file output if log_dir is provided
    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.exists()
            && let Some(dir_str) = log_path.to_str()
        {
            let file_appender = tracing_appender::rolling::daily(dir_str, "front-desk");
            let result = if json.unwrap_or(false) {
                builder
                    .json()
                    .with_ansi(false)
                    .with_writer(file_appender)
                    .try_init()
            } else {
                builder
                    .with_ansi(false)
                    .with_writer(file_appender)
                    .try_init()
            };
            if let Err(e) = result {
                eprintln!("Logger already initialized: {}", e);
            }
            return;
        }
    }

    if let Err(e) = builder.try_init() {
        eprintln!("Logger already initialized: {}", e);
    }
}

/// Initialize a test logger, ignoring repeated calls
#[cfg(test)]
pub fn init_test_logger() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
