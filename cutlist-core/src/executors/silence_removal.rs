//! Remove-silence executor.
//!
//! Detects silent intervals, keeps their complement over `[0, duration]` and
//! rebuilds the clip from the kept pieces. Video and audio of every piece are
//! trimmed independently with timestamps reset, then each track is
//! concatenated in order.

use super::{ExecutorOutcome, passthrough_copy, render, scaled_progress};
use crate::analysis::{SilenceRange, detect_silence};
use crate::config::EncodeSettings;
use crate::engine::{FfmpegInvocation, FfmpegSpawner, FilterGraph, MediaInfo};
use crate::error::{CoreError, CoreResult};
use crate::utils::fmt_num;
use std::path::Path;

/// Kept pieces shorter than this are dropped.
const MIN_KEEP_SEC: f64 = 0.001;

/// Share of the operation's progress spent on analysis.
const ANALYSIS_SHARE: f64 = 30.0;

/// Complement of `silences` over `[0, duration]`.
#[must_use]
pub fn keep_intervals(silences: &[SilenceRange], duration: f64) -> Vec<(f64, f64)> {
    let mut sorted = silences.to_vec();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut keep = Vec::new();
    let mut last_end = 0.0_f64;
    for silence in &sorted {
        let start = silence.start.min(duration);
        if start > last_end {
            keep.push((last_end, start));
        }
        last_end = last_end.max(silence.end.min(duration));
    }
    if last_end < duration {
        keep.push((last_end, duration));
    }
    keep.retain(|(a, b)| b - a >= MIN_KEEP_SEC);
    keep
}

/// Builds the trim-and-concat graph for the kept pieces.
///
/// Audio is always cut. Video is cut alongside it only when `with_video`
/// is set; audio-only sources produce just `[outa]`.
#[must_use]
pub fn build_filter_graph(keep: &[(f64, f64)], with_video: bool) -> String {
    let mut graph = FilterGraph::new();
    for (i, (start, end)) in keep.iter().enumerate() {
        let (s, e) = (fmt_num(*start), fmt_num(*end));
        if with_video {
            graph.push(format!("[0:v]trim=start={s}:end={e},setpts=PTS-STARTPTS[v{i}]"));
        }
        graph.push(format!("[0:a]atrim=start={s}:end={e},asetpts=PTS-STARTPTS[a{i}]"));
    }
    let n = keep.len();
    if with_video {
        let video_inputs: String = (0..n).map(|i| format!("[v{i}]")).collect();
        graph.push(format!("{video_inputs}concat=n={n}:v=1:a=0[outv]"));
    }
    let audio_inputs: String = (0..n).map(|i| format!("[a{i}]")).collect();
    graph.push(format!("{audio_inputs}concat=n={n}:v=0:a=1[outa]"));
    graph.build()
}

#[must_use]
pub fn build_invocation(
    input: &Path,
    output: &Path,
    keep: &[(f64, f64)],
    with_video: bool,
    encode: &EncodeSettings,
) -> FfmpegInvocation {
    let invocation = FfmpegInvocation::new("ffmpeg (remove silence)")
        .input(input)
        .filter_complex(build_filter_graph(keep, with_video));
    let invocation = if with_video {
        invocation.map("[outv]").map("[outa]").encode_video(encode)
    } else {
        invocation.map("[outa]")
    };
    invocation.encode_audio(encode).container_flags(encode).output(output)
}

#[allow(clippy::too_many_arguments)]
pub fn execute<S: FfmpegSpawner>(
    spawner: &S,
    input: &Path,
    output: &Path,
    media: &MediaInfo,
    min_silence_sec: f64,
    threshold_db: f64,
    encode: &EncodeSettings,
    on_progress: &mut dyn FnMut(f64),
) -> CoreResult<ExecutorOutcome> {
    if !media.has_audio() {
        return Ok(ExecutorOutcome::passthrough("source has no audio stream to analyse"));
    }

    let silences = {
        let mut analysis_progress = scaled_progress(on_progress, 0.0, ANALYSIS_SHARE);
        detect_silence(
            spawner,
            input,
            min_silence_sec,
            threshold_db,
            Some(media.duration_sec),
            &mut analysis_progress,
        )?
    };

    if silences.is_empty() {
        log::info!("No silence found, copying input unchanged");
        passthrough_copy(input, output)?;
        return Ok(ExecutorOutcome::passthrough("no silence detected"));
    }

    let keep = keep_intervals(&silences, media.duration_sec);
    if keep.is_empty() {
        log::error!("Silence removal would remove all {}s of input", media.duration_sec);
        return Err(CoreError::ExhaustiveRemoval);
    }

    let kept: f64 = keep.iter().map(|(a, b)| b - a).sum();
    log::info!(
        "Keeping {} segment(s), {:.2}s of {:.2}s",
        keep.len(),
        kept,
        media.duration_sec
    );
    let invocation = build_invocation(input, output, &keep, media.has_video(), encode);
    let mut render_progress = scaled_progress(on_progress, ANALYSIS_SHARE, 100.0);
    render(spawner, &invocation, kept, &mut render_progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: f64, end: f64) -> SilenceRange {
        SilenceRange { start, end }
    }

    #[test]
    fn keeps_complement_of_silence() {
        let keep = keep_intervals(&[range(12.0, 14.0)], 30.0);
        assert_eq!(keep, vec![(0.0, 12.0), (14.0, 30.0)]);
    }

    #[test]
    fn leading_and_trailing_silence_are_cut() {
        let keep = keep_intervals(&[range(0.0, 2.0), range(10.0, 12.0), range(28.0, 31.0)], 30.0);
        assert_eq!(keep, vec![(2.0, 10.0), (12.0, 28.0)]);
    }

    #[test]
    fn full_silence_keeps_nothing() {
        assert!(keep_intervals(&[range(0.0, 30.0)], 30.0).is_empty());
        assert!(keep_intervals(&[range(0.0, 10.0), range(9.0, 30.5)], 30.0).is_empty());
    }

    #[test]
    fn overlapping_ranges_merge() {
        let keep = keep_intervals(&[range(5.0, 8.0), range(6.0, 7.0), range(7.5, 9.0)], 20.0);
        assert_eq!(keep, vec![(0.0, 5.0), (9.0, 20.0)]);
    }

    #[test]
    fn graph_concats_each_track_in_order() {
        let graph = build_filter_graph(&[(0.0, 12.0), (14.0, 30.0)], true);
        assert_eq!(
            graph,
            "[0:v]trim=start=0:end=12,setpts=PTS-STARTPTS[v0];\
             [0:a]atrim=start=0:end=12,asetpts=PTS-STARTPTS[a0];\
             [0:v]trim=start=14:end=30,setpts=PTS-STARTPTS[v1];\
             [0:a]atrim=start=14:end=30,asetpts=PTS-STARTPTS[a1];\
             [v0][v1]concat=n=2:v=1:a=0[outv];\
             [a0][a1]concat=n=2:v=0:a=1[outa]"
        );
    }

    #[test]
    fn audio_only_graph_skips_video_track() {
        let graph = build_filter_graph(&[(0.0, 12.0), (14.0, 30.0)], false);
        assert_eq!(
            graph,
            "[0:a]atrim=start=0:end=12,asetpts=PTS-STARTPTS[a0];\
             [0:a]atrim=start=14:end=30,asetpts=PTS-STARTPTS[a1];\
             [a0][a1]concat=n=2:v=0:a=1[outa]"
        );

        let invocation = build_invocation(
            Path::new("in.m4a"),
            Path::new("out.m4a"),
            &[(0.0, 12.0)],
            false,
            &EncodeSettings::default(),
        );
        let args = invocation.args();
        assert!(!args.iter().any(|a| a == "[outv]"));
        assert!(args.iter().any(|a| a == "[outa]"));
    }
}
