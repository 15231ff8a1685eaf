// ============================================================================
// cutlist-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console or file logging for one CLI invocation
//
// Console logging uses `env_logger` and honours RUST_LOG:
// - RUST_LOG=info (default): Normal operation logs
// - RUST_LOG=debug (or --verbose): Built ffmpeg command lines and diagnostics
// - RUST_LOG=trace: Every ffmpeg output line
//
// With --log-dir, records go to `cutlist_<command>_<YYYYMMDD_HHMMSS>.log`
// through the log4rs setup in cutlist-core.

use crate::error::CliResult;
use cutlist_core::CoreError;
use log::LevelFilter;
use std::path::{Path, PathBuf};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Log file name for a command run at `timestamp`.
#[must_use]
pub fn log_file_name(command: &str, timestamp: &str) -> String {
    format!("cutlist_{command}_{timestamp}.log")
}

#[must_use]
pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose { LevelFilter::Debug } else { LevelFilter::Info }
}

/// Installs the global logger. Returns the log file when logging to disk.
pub fn init_logging(command: &str, verbose: bool, log_dir: Option<&Path>) -> CliResult<Option<PathBuf>> {
    let level = level_for(verbose);
    match log_dir {
        Some(dir) => {
            let path = dir.join(log_file_name(command, &get_timestamp()));
            cutlist_core::logging::setup_file_logging(&path, level)
                .map_err(|e| CoreError::Config(format!("Failed to set up file logging: {e:#}")))?;
            Ok(Some(path))
        }
        None => {
            env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(level.as_str().to_lowercase()),
            )
            .format_timestamp(None)
            .format_target(false)
            .init();
            Ok(None)
        }
    }
}
