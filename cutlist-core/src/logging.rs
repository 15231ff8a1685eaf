//! File logging setup.
//!
//! Routes the `log` facade into a log4rs file appender. Engine diagnostics are
//! emitted under the `ffmpeg_log` target, so they land in the same file.

use anyhow::{Context, Result};
use log::LevelFilter;
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Logger, Root},
    encode::pattern::PatternEncoder,
};
use std::path::Path;

/// Pattern shared by every file appender.
pub const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}";

/// Installs a global file logger writing to `log_file` at `log_level`.
///
/// Engine diagnostics are capped at `Warn` unless the level is `Debug` or
/// more verbose.
pub fn setup_file_logging(log_file: &Path, log_level: LevelFilter) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(log_file)
        .with_context(|| format!("opening log file {}", log_file.display()))?;

    let ffmpeg_level = if log_level >= LevelFilter::Debug {
        log_level
    } else {
        log_level.min(LevelFilter::Warn)
    };

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .logger(Logger::builder().build("ffmpeg_log", ffmpeg_level))
        .build(Root::builder().appender("file").build(log_level))?;

    log4rs::init_config(config)?;
    Ok(())
}
