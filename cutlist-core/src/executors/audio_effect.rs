//! Audio effect executor.
//!
//! Effects addressed by name like the visual ones but applied to the audio
//! track; video is stream-copied.

use crate::config::EncodeSettings;
use crate::engine::{FfmpegInvocation, gate};
use crate::utils::fmt_num;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEffect {
    BassBoost,
}

impl AudioEffect {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bass-boost" | "bassboost" | "bass" => Some(AudioEffect::BassBoost),
            _ => None,
        }
    }
}

/// Gated audio filter for an effect at a 0-100 strength.
#[must_use]
pub fn build_filter(effect: AudioEffect, strength: f64, start: f64, end: f64) -> String {
    match effect {
        AudioEffect::BassBoost => gate(
            &format!("equalizer=f=100:t=h:width=200:g={}", fmt_num(strength / 10.0)),
            start,
            end,
        ),
    }
}

#[must_use]
pub fn build_invocation(
    input: &Path,
    output: &Path,
    effect: AudioEffect,
    strength: f64,
    start: f64,
    end: f64,
    encode: &EncodeSettings,
) -> FfmpegInvocation {
    FfmpegInvocation::new("ffmpeg (audio effect)")
        .input(input)
        .audio_filter(build_filter(effect, strength, start, end))
        .copy_video()
        .encode_audio(encode)
        .container_flags(encode)
        .output(output)
}
