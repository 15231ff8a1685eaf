// ============================================================================
// cutlist-core/src/config.rs
// ============================================================================
//
// CONFIGURATION: Core Configuration Structures and Constants
//
// This module defines the configuration consumed by the pipeline: where
// renders and intermediates are written, how every executor re-encodes, the
// silence-analysis defaults and the limits applied to incoming plans.
//
// KEY COMPONENTS:
// - CoreConfig: Main configuration structure for the library
// - EncodeSettings: Codec options shared by every re-encoding executor
// - SilenceDefaults: Thresholds used when an operation omits them
// - Default constants: Predefined values for common settings
//
// USAGE:
// Instances of CoreConfig are created by consumers of the library (like
// cutlist-cli) and handed to `Pipeline::new`.

use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// DEFAULT CONSTANTS
// ============================================================================

/// Default x264 preset for every re-encode.
pub const DEFAULT_PRESET: &str = "veryfast";

/// Default CRF for every re-encode. Range 0-51, lower is higher quality.
pub const DEFAULT_CRF: u8 = 23;

/// Minimum silence length, in seconds, that counts as a removable gap.
pub const DEFAULT_MIN_SILENCE_SEC: f64 = 0.6;

/// Level below which audio is treated as silent.
pub const DEFAULT_SILENCE_THRESHOLD_DB: f64 = -30.0;

/// Upper bound on the number of operations in one plan.
pub const DEFAULT_MAX_PLAN_OPERATIONS: usize = 50;

/// Timeout applied to remote asset downloads.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Container extension for renders and intermediates.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "mp4";

// ============================================================================
// ENCODE SETTINGS
// ============================================================================

/// Encoder options applied by every executor that re-encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSettings {
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub pixel_format: String,
    pub audio_codec: String,
    /// Passed to `-movflags`; `+faststart` moves the index to the front.
    pub movflags: Option<String>,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            pixel_format: "yuv420p".to_string(),
            audio_codec: "aac".to_string(),
            movflags: Some("+faststart".to_string()),
        }
    }
}

/// Silence analysis thresholds used when a remove_silence operation omits them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceDefaults {
    pub min_silence_sec: f64,
    pub threshold_db: f64,
}

impl Default for SilenceDefaults {
    fn default() -> Self {
        Self {
            min_silence_sec: DEFAULT_MIN_SILENCE_SEC,
            threshold_db: DEFAULT_SILENCE_THRESHOLD_DB,
        }
    }
}

// ============================================================================
// CORE CONFIGURATION
// ============================================================================

/// Main configuration structure for the cutlist-core library.
///
/// # Examples
///
/// ```rust,no_run
/// use cutlist_core::CoreConfig;
/// use std::path::PathBuf;
///
/// let mut config = CoreConfig::new(PathBuf::from("/srv/renders"));
/// config.work_dir = Some(PathBuf::from("/tmp/cutlist"));
/// config.encode.crf = 20;
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    // ---- Path Configuration ----

    /// Directory where final renders are written
    pub output_dir: PathBuf,

    /// Directory for intermediate artifacts and decoded assets.
    /// Falls back to `output_dir` when unset.
    pub work_dir: Option<PathBuf>,

    // ---- Encoder Settings ----

    pub encode: EncodeSettings,

    /// Extension used for renders and intermediates
    pub output_extension: String,

    // ---- Analysis and Limits ----

    pub silence: SilenceDefaults,

    pub download_timeout: Duration,

    pub max_plan_operations: usize,
}

impl CoreConfig {
    /// Creates a configuration with default settings writing into `output_dir`.
    #[must_use]
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            work_dir: None,
            encode: EncodeSettings::default(),
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            silence: SilenceDefaults::default(),
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            max_plan_operations: DEFAULT_MAX_PLAN_OPERATIONS,
        }
    }

    /// Directory used for intermediates.
    #[must_use]
    pub fn effective_work_dir(&self) -> &Path {
        self.work_dir.as_deref().unwrap_or(&self.output_dir)
    }

    /// Checks the settings for values ffmpeg or the pipeline would reject.
    pub fn validate(&self) -> CoreResult<()> {
        if self.encode.crf > 51 {
            return Err(CoreError::Config(format!(
                "CRF must be between 0 and 51, got {}",
                self.encode.crf
            )));
        }
        if self.encode.preset.trim().is_empty() {
            return Err(CoreError::Config("Encoder preset must not be empty".to_string()));
        }
        if self.download_timeout.is_zero() {
            return Err(CoreError::Config(
                "Download timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_plan_operations == 0 {
            return Err(CoreError::Config(
                "Plan operation limit must be at least 1".to_string(),
            ));
        }
        if self.output_extension.is_empty() || self.output_extension.contains('.') {
            return Err(CoreError::Config(format!(
                "Invalid output extension '{}'",
                self.output_extension
            )));
        }
        Ok(())
    }
}
