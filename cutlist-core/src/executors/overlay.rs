//! Image and video overlay executors.
//!
//! The overlay asset is resolved to a local file, scaled by `scale`, placed at
//! one of five positions and shown only inside the operation window. Temp
//! files created for the asset are removed when the resolved asset drops, on
//! success and on failure alike.

use super::{ExecutionEnv, ExecutorOutcome, render};
use crate::assets::{AssetFetcher, AssetRole, resolve_asset};
use crate::config::EncodeSettings;
use crate::engine::{FfmpegInvocation, FfmpegSpawner, FilterGraph, MediaInfo, MediaProbe, enable_between};
use crate::error::CoreResult;
use crate::plan::{EditAction, OverlayPosition};
use crate::utils::fmt_num;
use std::path::Path;

/// Distance from the frame edge for corner positions, in pixels.
const EDGE_MARGIN: u32 = 10;

/// `x:y` overlay coordinates for a position.
#[must_use]
pub fn position_xy(position: OverlayPosition) -> String {
    let m = EDGE_MARGIN;
    match position {
        OverlayPosition::TopLeft => format!("{m}:{m}"),
        OverlayPosition::TopRight => format!("W-w-{m}:{m}"),
        OverlayPosition::BottomLeft => format!("{m}:H-h-{m}"),
        OverlayPosition::BottomRight => format!("W-w-{m}:H-h-{m}"),
        OverlayPosition::Center => "(W-w)/2:(H-h)/2".to_string(),
    }
}

/// Scales the overlay input, never below one pixel.
fn scale_filter(scale: f64) -> String {
    let s = fmt_num(scale);
    format!("scale=w='max(1,iw*{s})':h='max(1,ih*{s})'")
}

/// Graph placing a scaled image over the source inside `[start, end]`.
#[must_use]
pub fn image_filter_graph(position: OverlayPosition, scale: f64, start: f64, end: f64) -> String {
    FilterGraph::new()
        .chain(format!("[1:v]{}[ovl]", scale_filter(scale)))
        .chain(format!(
            "[0:v][ovl]overlay={}:{}[vout]",
            position_xy(position),
            enable_between(start, end)
        ))
        .build()
}

/// Graph placing a scaled clip over the source, starting at `start`.
///
/// The clip is shifted so its first frame lands at `start`; it disappears at
/// `end`, or when it runs out if the window is empty.
#[must_use]
pub fn video_filter_graph(position: OverlayPosition, scale: f64, start: f64, end: f64) -> String {
    let enable = if end > start {
        enable_between(start, end)
    } else {
        format!("enable='gte(t,{})'", fmt_num(start))
    };
    FilterGraph::new()
        .chain(format!(
            "[1:v]{},setpts=PTS-STARTPTS+{}/TB[ovl]",
            scale_filter(scale),
            fmt_num(start)
        ))
        .chain(format!(
            "[0:v][ovl]overlay={}:eof_action=pass:{enable}[vout]",
            position_xy(position)
        ))
        .build()
}

#[must_use]
pub fn build_image_invocation(
    input: &Path,
    asset: &Path,
    output: &Path,
    graph: String,
    encode: &EncodeSettings,
) -> FfmpegInvocation {
    FfmpegInvocation::new("ffmpeg (image overlay)")
        .input(input)
        .input(asset)
        .filter_complex(graph)
        .map("[vout]")
        .map("0:a?")
        .encode_video(encode)
        .copy_audio()
        .container_flags(encode)
        .output(output)
}

#[must_use]
pub fn build_video_invocation(
    input: &Path,
    asset: &Path,
    output: &Path,
    graph: String,
    encode: &EncodeSettings,
) -> FfmpegInvocation {
    FfmpegInvocation::new("ffmpeg (video overlay)")
        .input(input)
        .input(asset)
        .filter_complex(graph)
        .map("[vout]")
        .map("0:a?")
        .encode_video(encode)
        .copy_audio()
        .shortest()
        .container_flags(encode)
        .output(output)
}

#[allow(clippy::too_many_arguments)]
pub fn execute<S, P, F>(
    env: &ExecutionEnv<'_, S, P, F>,
    action: &EditAction,
    input: &Path,
    output: &Path,
    start: f64,
    end: f64,
    media: &MediaInfo,
    on_progress: &mut dyn FnMut(f64),
) -> CoreResult<ExecutorOutcome>
where
    S: FfmpegSpawner,
    P: MediaProbe,
    F: AssetFetcher + ?Sized,
{
    let (asset, position, scale, role) = match action {
        EditAction::OverlayImage { asset, position, scale } => (asset, *position, *scale, AssetRole::Image),
        EditAction::OverlayVideo { asset, position, scale } => (asset, *position, *scale, AssetRole::Video),
        _ => return Ok(ExecutorOutcome::passthrough("not an overlay operation")),
    };

    let resolved = resolve_asset(asset, role, env.config.effective_work_dir(), env.fetcher)?;
    log::info!(
        "Overlaying {} at {} (scale {}) for {}-{}s",
        asset,
        position.as_str(),
        scale,
        start,
        end
    );

    let encode = &env.config.encode;
    let invocation = match role {
        AssetRole::Video => build_video_invocation(
            input,
            resolved.path(),
            output,
            video_filter_graph(position, scale, start, end),
            encode,
        ),
        _ => build_image_invocation(
            input,
            resolved.path(),
            output,
            image_filter_graph(position, scale, start, end),
            encode,
        ),
    };
    let result = render(env.spawner, &invocation, media.duration_sec, on_progress);
    drop(resolved);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_use_fixed_margins() {
        assert_eq!(position_xy(OverlayPosition::TopLeft), "10:10");
        assert_eq!(position_xy(OverlayPosition::TopRight), "W-w-10:10");
        assert_eq!(position_xy(OverlayPosition::BottomLeft), "10:H-h-10");
        assert_eq!(position_xy(OverlayPosition::BottomRight), "W-w-10:H-h-10");
        assert_eq!(position_xy(OverlayPosition::Center), "(W-w)/2:(H-h)/2");
    }

    #[test]
    fn image_graph_scales_and_gates() {
        assert_eq!(
            image_filter_graph(OverlayPosition::Center, 0.5, 0.0, 3.0),
            "[1:v]scale=w='max(1,iw*0.5)':h='max(1,ih*0.5)'[ovl];\
             [0:v][ovl]overlay=(W-w)/2:(H-h)/2:enable='between(t,0,3)'[vout]"
        );
    }

    #[test]
    fn video_graph_shifts_overlay_to_window() {
        let graph = video_filter_graph(OverlayPosition::BottomRight, 0.3, 4.0, 9.0);
        assert!(graph.contains("setpts=PTS-STARTPTS+4/TB[ovl]"));
        assert!(graph.contains("overlay=W-w-10:H-h-10:eof_action=pass:enable='between(t,4,9)'"));

        let open_ended = video_filter_graph(OverlayPosition::BottomRight, 0.3, 4.0, 4.0);
        assert!(open_ended.contains("enable='gte(t,4)'"));
    }

    #[test]
    fn video_overlay_is_bounded_by_source() {
        let inv = build_video_invocation(
            Path::new("in.mp4"),
            Path::new("pip.mp4"),
            Path::new("out.mp4"),
            video_filter_graph(OverlayPosition::TopLeft, 0.3, 0.0, 2.0),
            &EncodeSettings::default(),
        );
        assert!(inv.contains("-shortest"));
        assert!(inv.contains("0:a?"));
    }
}
