//! Audio overlay executor.
//!
//! The overlay track is cut to the window length, delayed to the window
//! start and volume-scaled. When the source has audio the two are mixed with
//! the source setting the length; otherwise the overlay becomes the only
//! track, padded with silence so the video is never cut short. Video is
//! stream-copied.

use super::{ExecutionEnv, ExecutorOutcome, render};
use crate::assets::{AssetFetcher, AssetReference, AssetRole, resolve_asset};
use crate::config::EncodeSettings;
use crate::engine::{FfmpegInvocation, FfmpegSpawner, FilterChain, FilterGraph, MediaInfo, MediaProbe};
use crate::error::CoreResult;
use crate::utils::fmt_num;
use std::path::Path;

/// Timing and level of an audio overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioOverlaySettings {
    pub volume: f64,
    pub loop_audio: bool,
    pub start: f64,
    pub end: f64,
}

/// Builds the mixing graph ending in `[aout]`.
#[must_use]
pub fn build_filter_graph(settings: &AudioOverlaySettings, source_has_audio: bool) -> String {
    let delay_ms = (settings.start.max(0.0) * 1000.0).round() as u64;
    let window = settings.end - settings.start;

    let mut overlay = FilterChain::new();
    if window > 0.0 {
        overlay = overlay
            .add(format!("atrim=duration={}", fmt_num(window)))
            .add("asetpts=PTS-STARTPTS");
    }
    overlay = overlay
        .add(format!("adelay={delay_ms}|{delay_ms}"))
        .add(format!("volume={}", fmt_num(settings.volume)));

    if source_has_audio {
        let chain = overlay.build().unwrap_or_default();
        FilterGraph::new()
            .chain(format!("[1:a]{chain}[ovl]"))
            .chain("[0:a][ovl]amix=inputs=2:duration=first[aout]")
            .build()
    } else {
        let chain = overlay.add("apad").build().unwrap_or_default();
        format!("[1:a]{chain}[aout]")
    }
}

#[must_use]
pub fn build_invocation(
    input: &Path,
    asset: &Path,
    output: &Path,
    settings: &AudioOverlaySettings,
    source_has_audio: bool,
    encode: &EncodeSettings,
) -> FfmpegInvocation {
    let loop_options: &[&str] = if settings.loop_audio {
        &["-stream_loop", "-1"]
    } else {
        &[]
    };
    FfmpegInvocation::new("ffmpeg (audio overlay)")
        .input(input)
        .input_with(loop_options, asset)
        .filter_complex(build_filter_graph(settings, source_has_audio))
        .map("0:v")
        .map("[aout]")
        .copy_video()
        .encode_audio(encode)
        .shortest()
        .container_flags(encode)
        .output(output)
}

#[allow(clippy::too_many_arguments)]
pub fn execute<S, P, F>(
    env: &ExecutionEnv<'_, S, P, F>,
    asset: &AssetReference,
    settings: AudioOverlaySettings,
    input: &Path,
    output: &Path,
    media: &MediaInfo,
    on_progress: &mut dyn FnMut(f64),
) -> CoreResult<ExecutorOutcome>
where
    S: FfmpegSpawner,
    P: MediaProbe,
    F: AssetFetcher + ?Sized,
{
    let resolved = resolve_asset(asset, AssetRole::Audio, env.config.effective_work_dir(), env.fetcher)?;
    let source_has_audio = media.has_audio();
    log::info!(
        "Adding audio {} at {}s (volume {}, loop {}, {})",
        asset,
        settings.start,
        settings.volume,
        settings.loop_audio,
        if source_has_audio { "mixed" } else { "sole track" }
    );

    let invocation = build_invocation(
        input,
        resolved.path(),
        output,
        &settings,
        source_has_audio,
        &env.config.encode,
    );
    let result = render(env.spawner, &invocation, media.duration_sec, on_progress);
    drop(resolved);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(loop_audio: bool) -> AudioOverlaySettings {
        AudioOverlaySettings {
            volume: 0.8,
            loop_audio,
            start: 2.5,
            end: 7.5,
        }
    }

    #[test]
    fn mixes_with_existing_audio() {
        assert_eq!(
            build_filter_graph(&settings(false), true),
            "[1:a]atrim=duration=5,asetpts=PTS-STARTPTS,adelay=2500|2500,volume=0.8[ovl];\
             [0:a][ovl]amix=inputs=2:duration=first[aout]"
        );
    }

    #[test]
    fn becomes_sole_track_without_source_audio() {
        assert_eq!(
            build_filter_graph(&settings(false), false),
            "[1:a]atrim=duration=5,asetpts=PTS-STARTPTS,adelay=2500|2500,volume=0.8,apad[aout]"
        );
    }

    #[test]
    fn looping_repeats_the_overlay_input() {
        let inv = build_invocation(
            Path::new("in.mp4"),
            Path::new("music.mp3"),
            Path::new("out.mp4"),
            &settings(true),
            true,
            &EncodeSettings::default(),
        );
        let args = inv.args();
        let loop_pos = args.iter().position(|a| a == "-stream_loop").unwrap();
        assert_eq!(args[loop_pos + 1], "-1");
        assert_eq!(args[loop_pos + 3], "music.mp3");
        assert!(inv.contains("-shortest"));
    }
}
