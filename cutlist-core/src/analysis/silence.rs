// ============================================================================
// cutlist-core/src/analysis/silence.rs
// ============================================================================
//
// SILENCE DETECTION: Finding silent intervals with ffmpeg's silencedetect
//
// Runs ffmpeg over the audio stream with the output discarded and parses the
// `silence_start:` / `silence_end:` markers that silencedetect writes to the
// diagnostic stream.
//
// KEY COMPONENTS:
// - SilenceRange: One silent interval
// - SilenceParser: Pairs start and end markers into ranges
// - detect_silence: Runs the analysis and returns the ranges

use crate::engine::{EngineProgressHandler, FfmpegInvocation, FfmpegSpawner, run_invocation};
use crate::error::CoreResult;
use crate::utils::fmt_num;
use serde::{Deserialize, Serialize};
use std::path::Path;

const START_MARKER: &str = "silence_start:";
const END_MARKER: &str = "silence_end:";

/// A silent interval, `start < end`, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SilenceRange {
    pub start: f64,
    pub end: f64,
}

impl SilenceRange {
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Pairs silencedetect markers into ranges.
///
/// A start marker opens an interval (replacing one still open); an end
/// marker closes the open interval. End markers with nothing open and
/// intervals that would be empty are ignored. An interval still open when
/// the stream ends is dropped.
#[derive(Debug, Default)]
pub struct SilenceParser {
    open_start: Option<f64>,
    ranges: Vec<SilenceRange>,
}

impl SilenceParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one diagnostic line.
    pub fn feed_line(&mut self, line: &str) {
        if let Some(start) = marker_value(line, START_MARKER) {
            if let Some(previous) = self.open_start.replace(start.max(0.0)) {
                log::debug!("silence_start at {previous} was never closed, replacing it");
            }
        } else if let Some(end) = marker_value(line, END_MARKER) {
            match self.open_start.take() {
                Some(start) if end > start => self.ranges.push(SilenceRange { start, end }),
                Some(start) => log::debug!("Ignoring empty silence interval {start}-{end}"),
                None => log::debug!("Ignoring silence_end at {end} without a start"),
            }
        }
    }

    /// Returns the closed ranges in stream order.
    #[must_use]
    pub fn finish(self) -> Vec<SilenceRange> {
        if let Some(start) = self.open_start {
            log::debug!("Dropping unterminated silence interval starting at {start}");
        }
        self.ranges
    }
}

/// Parses the number that follows `marker` in `line`.
fn marker_value(line: &str, marker: &str) -> Option<f64> {
    let index = line.find(marker)?;
    let rest = line[index + marker.len()..].trim_start();
    let token: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        .collect();
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Builds the analysis invocation: audio only, output discarded.
#[must_use]
pub fn silence_detect_invocation(path: &Path, min_silence_sec: f64, threshold_db: f64) -> FfmpegInvocation {
    FfmpegInvocation::new("ffmpeg (silence detection)")
        .input(path)
        .arg("-vn")
        .audio_filter(format!(
            "silencedetect=n={}dB:d={}",
            fmt_num(threshold_db),
            fmt_num(min_silence_sec)
        ))
        .null_output()
}

/// Detects silent intervals in `path`.
///
/// `expected_duration` is the input length, used only for progress.
pub fn detect_silence<S: FfmpegSpawner>(
    spawner: &S,
    path: &Path,
    min_silence_sec: f64,
    threshold_db: f64,
    expected_duration: Option<f64>,
    on_progress: &mut dyn FnMut(f64),
) -> CoreResult<Vec<SilenceRange>> {
    log::info!(
        "Detecting silence in {} (min {}s, threshold {}dB)",
        path.display(),
        min_silence_sec,
        threshold_db
    );
    let invocation = silence_detect_invocation(path, min_silence_sec, threshold_db);
    let mut parser = SilenceParser::new();
    let mut observe = |line: &str| parser.feed_line(line);
    let handler = EngineProgressHandler::new(expected_duration)
        .with_progress(on_progress)
        .with_line_observer(&mut observe);
    run_invocation(spawner, &invocation, handler)?;

    let ranges = parser.finish();
    log::info!("Found {} silent interval(s)", ranges.len());
    Ok(ranges)
}
