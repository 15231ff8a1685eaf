//! Visual effect executor.
//!
//! Every effect is gated to the operation window with a timeline predicate.
//! Filters that can be switched on and off in place (`gblur`, `eq`) are
//! applied directly. Effects that change geometry (punch-in, shake) cannot be
//! gated, so they render on a split branch that is scaled back to the frame
//! size and overlaid on the original only inside the window.

use crate::config::EncodeSettings;
use crate::engine::{FfmpegInvocation, MediaInfo, enable_between, gate};
use crate::utils::fmt_num;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualEffect {
    Blur,
    Glitch,
    PunchIn,
    Shake,
}

impl VisualEffect {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "blur" | "gaussian-blur" => Some(VisualEffect::Blur),
            "glitch" => Some(VisualEffect::Glitch),
            "punch-in" | "punch" | "zoom" | "zoom-in" => Some(VisualEffect::PunchIn),
            "shake" | "camera-shake" => Some(VisualEffect::Shake),
            _ => None,
        }
    }
}

/// `gblur` sigma for a 0-100 strength, capped at 10.
#[must_use]
pub fn blur_sigma(strength: f64) -> f64 {
    (strength / 5.0).min(10.0)
}

/// Zoom factor for punch-in: 1.0 at strength 0, 2.0 at strength 100.
#[must_use]
pub fn punch_in_zoom(strength: f64) -> f64 {
    1.0 + strength / 100.0
}

/// Jitter amplitude in pixels for shake.
#[must_use]
pub fn shake_amplitude(strength: f64) -> f64 {
    (strength / 10.0).max(2.0).round()
}

/// Scale back to the probed frame size, or undo the crop when it is unknown.
fn restore_size(media: &MediaInfo, fallback: &str) -> String {
    match media.dimensions() {
        Some((w, h)) => format!("scale={w}:{h},setsar=1"),
        None => format!("scale={fallback},setsar=1"),
    }
}

/// Filter graph for an effect, ending in `[vout]` or a plain `-vf` chain.
#[must_use]
pub fn build_filter(effect: VisualEffect, strength: f64, start: f64, end: f64, media: &MediaInfo) -> EffectFilter {
    match effect {
        VisualEffect::Blur => EffectFilter::Simple(gate(
            &format!("gblur=sigma={}", fmt_num(blur_sigma(strength))),
            start,
            end,
        )),
        VisualEffect::Glitch => EffectFilter::Simple(gate(
            &format!("eq=saturation={}", fmt_num(1.0 - strength / 100.0)),
            start,
            end,
        )),
        VisualEffect::PunchIn => {
            let z = fmt_num(punch_in_zoom(strength));
            let branch = format!(
                "crop=iw/{z}:ih/{z},{}",
                restore_size(media, &format!("iw*{z}:ih*{z}"))
            );
            EffectFilter::Complex(split_overlay(&branch, start, end))
        }
        VisualEffect::Shake => {
            let a = fmt_num(shake_amplitude(strength));
            let branch = format!(
                "crop=iw-2*{a}:ih-2*{a}:x='{a}+{a}*sin(n*1.7)':y='{a}+{a}*cos(n*2.3)',{}",
                restore_size(media, &format!("iw+2*{a}:ih+2*{a}"))
            );
            EffectFilter::Complex(split_overlay(&branch, start, end))
        }
    }
}

fn split_overlay(branch: &str, start: f64, end: f64) -> String {
    format!(
        "[0:v]split=2[base][fx];[fx]{branch}[styled];[base][styled]overlay=0:0:{}[vout]",
        enable_between(start, end)
    )
}

/// Either a single `-vf` chain or a `-filter_complex` graph producing `[vout]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectFilter {
    Simple(String),
    Complex(String),
}

#[allow(clippy::too_many_arguments)]
#[must_use]
pub fn build_invocation(
    input: &Path,
    output: &Path,
    effect: VisualEffect,
    strength: f64,
    start: f64,
    end: f64,
    media: &MediaInfo,
    encode: &EncodeSettings,
) -> FfmpegInvocation {
    let invocation = FfmpegInvocation::new("ffmpeg (effect)").input(input);
    let invocation = match build_filter(effect, strength, start, end, media) {
        EffectFilter::Simple(filter) => invocation.video_filter(filter),
        EffectFilter::Complex(graph) => invocation.filter_complex(graph).map("[vout]").map("0:a?"),
    };
    invocation
        .encode_video(encode)
        .copy_audio()
        .container_flags(encode)
        .output(output)
}
