// ============================================================================
// cutlist-core/src/executors/speed.rs
// ============================================================================
//
// SPEED CHANGE: Re-timing the whole clip or a window of it
//
// Video is re-timed with `setpts`. Audio uses `atempo`, which only accepts
// factors in [0.5, 2.0]; other factors are reached by chaining several
// filters whose product is the requested factor.
//
// KEY COMPONENTS:
// - tempo_chain: Factor decomposition into valid atempo steps
// - speed_segments: Up to three pieces (before, inside, after the window)
// - whole_clip_graph / segmented_graph: Graphs ending in [vout] and/or [aout]

use super::{ExecutorOutcome, render};
use crate::config::EncodeSettings;
use crate::engine::{FfmpegInvocation, FfmpegSpawner, FilterGraph, MediaInfo};
use crate::error::{CoreError, CoreResult};
use crate::utils::fmt_num;
use std::path::Path;

const ATEMPO_MIN: f64 = 0.5;
const ATEMPO_MAX: f64 = 2.0;

/// Window edges closer than this to the clip edges count as touching them.
const EDGE_TOLERANCE_SEC: f64 = 1e-3;

/// Decomposes `factor` into atempo steps within [0.5, 2.0].
///
/// Fast factors use `ceil(log2 factor)` steps of 2.0 followed by the
/// remainder; slow factors use steps of 0.5 until the remainder is in range.
#[must_use]
pub fn tempo_chain(factor: f64) -> Vec<f64> {
    if !factor.is_finite() || factor <= 0.0 {
        return Vec::new();
    }
    if (ATEMPO_MIN..=ATEMPO_MAX).contains(&factor) {
        return vec![factor];
    }

    let mut chain = Vec::new();
    if factor > ATEMPO_MAX {
        let mut doublings = 0_u32;
        let mut reached = 1.0_f64;
        while reached < factor {
            reached *= ATEMPO_MAX;
            doublings += 1;
        }
        chain.extend(std::iter::repeat_n(ATEMPO_MAX, doublings as usize));
        let remainder = factor / reached;
        if (remainder - 1.0).abs() > 1e-9 {
            chain.push(remainder);
        }
    } else {
        let mut remainder = factor;
        while remainder < ATEMPO_MIN {
            chain.push(ATEMPO_MIN);
            remainder /= ATEMPO_MIN;
        }
        if (remainder - 1.0).abs() > 1e-9 {
            chain.push(remainder);
        }
    }
    chain
}

/// The atempo chain as a filter string.
#[must_use]
pub fn tempo_filters(factor: f64) -> String {
    tempo_chain(factor)
        .into_iter()
        .map(|step| format!("atempo={}", fmt_num(step)))
        .collect::<Vec<_>>()
        .join(",")
}

/// One piece of a segmented speed change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSegment {
    pub start: f64,
    pub end: f64,
    /// 1.0 outside the window.
    pub factor: f64,
}

impl SpeedSegment {
    /// Length of the piece after re-timing.
    #[must_use]
    pub fn output_duration(&self) -> f64 {
        (self.end - self.start) / self.factor
    }
}

/// True when the window covers the whole clip.
#[must_use]
pub fn is_whole_clip(start: f64, end: f64, duration: f64) -> bool {
    start <= EDGE_TOLERANCE_SEC && end >= duration - EDGE_TOLERANCE_SEC
}

/// Splits the clip around the window; empty pieces are omitted.
#[must_use]
pub fn speed_segments(factor: f64, start: f64, end: f64, duration: f64) -> Vec<SpeedSegment> {
    let start = start.clamp(0.0, duration);
    let end = end.clamp(start, duration);
    let mut segments = Vec::with_capacity(3);
    if start > EDGE_TOLERANCE_SEC {
        segments.push(SpeedSegment { start: 0.0, end: start, factor: 1.0 });
    }
    if end - start > EDGE_TOLERANCE_SEC {
        segments.push(SpeedSegment { start, end, factor });
    }
    if duration - end > EDGE_TOLERANCE_SEC {
        segments.push(SpeedSegment { start: end, end: duration, factor: 1.0 });
    }
    segments
}

fn pts_expression(factor: f64) -> String {
    if factor == 1.0 {
        "PTS-STARTPTS".to_string()
    } else {
        format!("{}*(PTS-STARTPTS)", fmt_num(1.0 / factor))
    }
}

/// Streams present in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tracks {
    pub video: bool,
    pub audio: bool,
}

impl Tracks {
    #[must_use]
    pub fn of(media: &MediaInfo) -> Self {
        Self {
            video: media.has_video(),
            audio: media.has_audio(),
        }
    }
}

/// Graph re-timing the whole clip.
#[must_use]
pub fn whole_clip_graph(factor: f64, tracks: Tracks) -> String {
    let mut graph = FilterGraph::new();
    if tracks.video {
        graph.push(format!("[0:v]setpts={}*PTS[vout]", fmt_num(1.0 / factor)));
    }
    if tracks.audio {
        graph.push(format!("[0:a]{}[aout]", tempo_filters(factor)));
    }
    graph.build()
}

/// Graph re-timing only the window; concat arity always equals the segment count.
#[must_use]
pub fn segmented_graph(segments: &[SpeedSegment], tracks: Tracks) -> String {
    let mut graph = FilterGraph::new();
    for (i, segment) in segments.iter().enumerate() {
        let (s, e) = (fmt_num(segment.start), fmt_num(segment.end));
        if tracks.video {
            graph.push(format!(
                "[0:v]trim=start={s}:end={e},setpts={}[v{i}]",
                pts_expression(segment.factor)
            ));
        }
        if tracks.audio {
            let mut chain = format!("[0:a]atrim=start={s}:end={e},asetpts=PTS-STARTPTS");
            if segment.factor != 1.0 {
                chain.push(',');
                chain.push_str(&tempo_filters(segment.factor));
            }
            chain.push_str(&format!("[a{i}]"));
            graph.push(chain);
        }
    }
    let n = segments.len();
    if tracks.video {
        let video_inputs: String = (0..n).map(|i| format!("[v{i}]")).collect();
        graph.push(format!("{video_inputs}concat=n={n}:v=1:a=0[vout]"));
    }
    if tracks.audio {
        let audio_inputs: String = (0..n).map(|i| format!("[a{i}]")).collect();
        graph.push(format!("{audio_inputs}concat=n={n}:v=0:a=1[aout]"));
    }
    graph.build()
}

/// Maps the graph outputs and picks encoders for the tracks present.
#[must_use]
pub fn build_invocation(
    input: &Path,
    output: &Path,
    graph: String,
    tracks: Tracks,
    encode: &EncodeSettings,
) -> FfmpegInvocation {
    let mut invocation = FfmpegInvocation::new("ffmpeg (speed)")
        .input(input)
        .filter_complex(graph);
    if tracks.video {
        invocation = invocation.map("[vout]").encode_video(encode);
    }
    if tracks.audio {
        invocation = invocation.map("[aout]").encode_audio(encode);
    }
    invocation.container_flags(encode).output(output)
}

#[allow(clippy::too_many_arguments)]
pub fn execute<S: FfmpegSpawner>(
    spawner: &S,
    input: &Path,
    output: &Path,
    factor: f64,
    start: f64,
    end: f64,
    media: &MediaInfo,
    encode: &EncodeSettings,
    on_progress: &mut dyn FnMut(f64),
) -> CoreResult<ExecutorOutcome> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(CoreError::parameter("speed", format!("invalid speed factor {factor}")));
    }
    if (factor - 1.0).abs() < 1e-9 {
        return Ok(ExecutorOutcome::passthrough("speed factor is 1.0"));
    }

    let tracks = Tracks::of(media);
    if !tracks.video && !tracks.audio {
        return Ok(ExecutorOutcome::passthrough("source has no audio or video stream"));
    }
    let duration = media.duration_sec;
    let (graph, expected) = if is_whole_clip(start, end, duration) {
        (whole_clip_graph(factor, tracks), duration / factor)
    } else {
        let segments = speed_segments(factor, start, end, duration);
        if !segments.iter().any(|s| s.factor != 1.0) {
            return Ok(ExecutorOutcome::passthrough("speed window is empty"));
        }
        let expected = segments.iter().map(SpeedSegment::output_duration).sum();
        (segmented_graph(&segments, tracks), expected)
    };
    log::info!("Changing speed by {factor}x, output {expected:.2}s");

    let invocation = build_invocation(input, output, graph, tracks, encode);
    render(spawner, &invocation, expected, on_progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AV: Tracks = Tracks { video: true, audio: true };

    fn product(chain: &[f64]) -> f64 {
        chain.iter().product()
    }

    #[test]
    fn in_range_factor_uses_one_filter() {
        assert_eq!(tempo_chain(1.5), vec![1.5]);
        assert_eq!(tempo_filters(1.5), "atempo=1.5");
    }

    #[test]
    fn quarter_speed_chains_two_halves() {
        let chain = tempo_chain(0.25);
        assert_eq!(chain.len(), 2);
        assert!((product(&chain) - 0.25).abs() < 1e-6);
        assert!(chain.iter().all(|s| (ATEMPO_MIN..=ATEMPO_MAX).contains(s)));
    }

    #[test]
    fn five_x_chains_doublings_and_remainder() {
        let chain = tempo_chain(5.0);
        let doublings = 5.0_f64.log2().ceil() as usize;
        assert_eq!(chain.len(), doublings + 1);
        assert!(chain[..doublings].iter().all(|s| *s == 2.0));
        assert!((product(&chain) - 5.0).abs() < 1e-6);
        assert!(chain.iter().all(|s| (ATEMPO_MIN..=ATEMPO_MAX).contains(s)));
    }

    #[test]
    fn extreme_factors_stay_in_range() {
        for factor in [0.1, 0.3, 2.5, 4.0, 16.0, 100.0] {
            let chain = tempo_chain(factor);
            assert!((product(&chain) - factor).abs() < 1e-6, "factor {factor}");
            assert!(chain.iter().all(|s| (ATEMPO_MIN..=ATEMPO_MAX).contains(s)), "factor {factor}");
        }
        assert_eq!(tempo_chain(4.0), vec![2.0, 2.0]);
    }

    #[test]
    fn segments_skip_empty_pieces() {
        let segments = speed_segments(2.0, 10.0, 20.0, 30.0);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1], SpeedSegment { start: 10.0, end: 20.0, factor: 2.0 });

        let segments = speed_segments(2.0, 0.0, 20.0, 30.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].factor, 2.0);

        let segments = speed_segments(2.0, 10.0, 30.0, 30.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].factor, 2.0);
    }

    #[test]
    fn segmented_graph_concat_arity_matches() {
        let segments = speed_segments(0.5, 0.0, 10.0, 30.0);
        let graph = segmented_graph(&segments, AV);
        assert!(graph.contains("[0:v]trim=start=0:end=10,setpts=2*(PTS-STARTPTS)[v0]"));
        assert!(graph.contains("[0:a]atrim=start=0:end=10,asetpts=PTS-STARTPTS,atempo=0.5[a0]"));
        assert!(graph.contains("[v0][v1]concat=n=2:v=1:a=0[vout]"));
        assert!(graph.contains("[a0][a1]concat=n=2:v=0:a=1[aout]"));
    }

    #[test]
    fn whole_clip_without_audio_is_video_only() {
        let video_only = Tracks { video: true, audio: false };
        assert_eq!(whole_clip_graph(2.0, video_only), "[0:v]setpts=0.5*PTS[vout]");
        assert!(is_whole_clip(0.0, 30.0, 30.0));
        assert!(!is_whole_clip(0.0, 20.0, 30.0));
    }

    #[test]
    fn output_duration_accounts_for_factor() {
        let total: f64 = speed_segments(2.0, 10.0, 20.0, 30.0)
            .iter()
            .map(SpeedSegment::output_duration)
            .sum();
        assert!((total - 25.0).abs() < 1e-9);
    }

    #[test]
    fn audio_only_source_has_no_video_chains() {
        let audio_only = Tracks { video: false, audio: true };
        assert_eq!(whole_clip_graph(2.0, audio_only), "[0:a]atempo=2[aout]");

        let graph = segmented_graph(&speed_segments(2.0, 10.0, 20.0, 30.0), audio_only);
        assert!(!graph.contains("[0:v]"));
        assert!(graph.contains("[a0][a1][a2]concat=n=3:v=0:a=1[aout]"));

        let invocation = build_invocation(
            Path::new("in.m4a"),
            Path::new("out.m4a"),
            graph,
            audio_only,
            &EncodeSettings::default(),
        );
        let args = invocation.args();
        assert!(!args.iter().any(|a| a == "[vout]" || a == "-c:v"));
        assert!(args.iter().any(|a| a == "[aout]"));
    }
}
