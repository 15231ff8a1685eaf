//! FFprobe integration for media metadata
//!
//! The pipeline needs three facts about a file: its duration (for keep
//! intervals, speed windows and progress), its frame size (for effects that
//! crop and scale back) and whether it carries an audio stream.

use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};
use ffprobe::{FfProbeError, ffprobe};
use serde::Serialize;
use std::path::Path;

/// One stream of a probed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    pub index: usize,
    pub codec_type: String,
    pub codec_name: Option<String>,
}

/// Struct containing media information.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub duration_sec: f64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub streams: Vec<StreamInfo>,
}

impl MediaInfo {
    #[must_use]
    pub fn has_audio(&self) -> bool {
        self.streams.iter().any(|s| s.codec_type == "audio")
    }

    #[must_use]
    pub fn has_video(&self) -> bool {
        self.streams.iter().any(|s| s.codec_type == "video")
    }

    /// Frame size, when a video stream reported one.
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}

/// Capability for reading media metadata.
pub trait MediaProbe {
    fn probe(&self, path: &Path) -> CoreResult<MediaInfo>;
}

/// `MediaProbe` backed by the `ffprobe` crate.
#[derive(Debug, Clone, Default)]
pub struct FfprobeMediaProbe;

impl MediaProbe for FfprobeMediaProbe {
    fn probe(&self, path: &Path) -> CoreResult<MediaInfo> {
        log::debug!("Running ffprobe (via crate) on: {}", path.display());
        let metadata = ffprobe(path).map_err(|err| {
            log::error!("ffprobe failed on {}: {:?}", path.display(), err);
            map_ffprobe_error(err)
        })?;

        let duration_sec = metadata
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .ok_or_else(|| {
                CoreError::FfprobeParse(format!(
                    "Failed to parse duration from format for {}",
                    path.display()
                ))
            })?;

        let streams: Vec<StreamInfo> = metadata
            .streams
            .iter()
            .map(|s| StreamInfo {
                index: usize::try_from(s.index).unwrap_or_default(),
                codec_type: s.codec_type.clone().unwrap_or_else(|| "unknown".to_string()),
                codec_name: s.codec_name.clone(),
            })
            .collect();

        let video = metadata
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"));
        let width = video
            .and_then(|s| s.width)
            .and_then(|w| u32::try_from(w).ok());
        let height = video
            .and_then(|s| s.height)
            .and_then(|h| u32::try_from(h).ok());

        Ok(MediaInfo {
            duration_sec,
            width,
            height,
            streams,
        })
    }
}

fn map_ffprobe_error(err: FfProbeError) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => command_start_error("ffprobe", io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            command_failed_error("ffprobe", output.status, stderr)
        }
        FfProbeError::Deserialize(err) => {
            CoreError::FfprobeParse(format!("ffprobe output deserialization: {err}"))
        }
        _ => CoreError::FfprobeParse(format!("Unknown ffprobe error: {err:?}")),
    }
}
