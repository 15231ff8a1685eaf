//! Color grade executor.
//!
//! Presets are tables of `eq`, `colorbalance`, `curves` and `hue` settings.
//! Settings marked [`Level::Scaled`] are multiplied by `intensity / 100`;
//! the rest are applied as written at any intensity.

use crate::config::EncodeSettings;
use crate::engine::{FfmpegInvocation, FilterChain, gate};
use crate::utils::fmt_num;
use std::path::Path;

#[derive(Clone, Copy)]
enum Level {
    Fixed(f64),
    Scaled(f64),
}

impl Level {
    fn at(self, factor: f64) -> f64 {
        match self {
            Level::Fixed(value) => value,
            Level::Scaled(value) => value * factor,
        }
    }
}

/// One filter of a preset with its `(option, level)` pairs.
struct GradeStep {
    filter: &'static str,
    options: &'static [(&'static str, Level)],
}

struct Preset {
    names: &'static [&'static str],
    steps: &'static [GradeStep],
    /// `curves` preset appended after the numeric steps.
    curves: Option<&'static str>,
}

use Level::{Fixed, Scaled};

const PRESETS: &[Preset] = &[
    Preset {
        names: &["warm", "warmer"],
        steps: &[
            GradeStep { filter: "eq", options: &[("saturation", Fixed(1.2)), ("contrast", Fixed(1.1))] },
            GradeStep {
                filter: "colorbalance",
                options: &[("rs", Scaled(0.1)), ("gs", Scaled(0.05)), ("bs", Scaled(-0.1))],
            },
        ],
        curves: None,
    },
    Preset {
        names: &["cool", "cooler"],
        steps: &[
            GradeStep { filter: "eq", options: &[("saturation", Fixed(1.1))] },
            GradeStep {
                filter: "colorbalance",
                options: &[("rs", Scaled(-0.1)), ("gs", Scaled(0.05)), ("bs", Scaled(0.15))],
            },
        ],
        curves: None,
    },
    Preset {
        names: &["vintage", "retro"],
        steps: &[GradeStep { filter: "eq", options: &[("saturation", Fixed(0.7)), ("contrast", Fixed(0.9))] }],
        curves: Some("vintage"),
    },
    Preset {
        names: &["cinematic", "filmic"],
        steps: &[GradeStep {
            filter: "eq",
            options: &[("contrast", Fixed(1.3)), ("brightness", Fixed(-0.05)), ("saturation", Fixed(0.85))],
        }],
        curves: Some("strong_contrast"),
    },
    Preset {
        names: &["vibrant", "saturated"],
        steps: &[GradeStep { filter: "eq", options: &[("saturation", Scaled(1.5)), ("contrast", Scaled(1.2))] }],
        curves: None,
    },
    Preset {
        names: &["faded", "washed"],
        steps: &[GradeStep {
            filter: "eq",
            options: &[("contrast", Scaled(0.7)), ("saturation", Scaled(0.6)), ("brightness", Fixed(0.05))],
        }],
        curves: None,
    },
    Preset {
        names: &["high-contrast", "dramatic"],
        steps: &[GradeStep { filter: "eq", options: &[("contrast", Scaled(1.5)), ("saturation", Fixed(1.1))] }],
        curves: None,
    },
    Preset {
        names: &["black-and-white", "bw", "grayscale", "greyscale"],
        steps: &[GradeStep { filter: "hue", options: &[("s", Fixed(0.0))] }],
        curves: None,
    },
];

/// True when `preset` names a known grade.
#[must_use]
pub fn is_known_preset(preset: &str) -> bool {
    find(preset).is_some()
}

fn find(preset: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.names.contains(&preset))
}

/// Gated filter chain for a preset, or `None` for unknown names.
#[must_use]
pub fn build_filter(preset: &str, intensity: f64, start: f64, end: f64) -> Option<String> {
    let preset = find(preset)?;
    let factor = (intensity / 100.0).clamp(0.0, 1.0);

    let mut chain = FilterChain::new();
    for step in preset.steps {
        let options = step
            .options
            .iter()
            .map(|(name, level)| format!("{name}={}", fmt_num(level.at(factor))))
            .collect::<Vec<_>>()
            .join(":");
        chain = chain.add(gate(&format!("{}={options}", step.filter), start, end));
    }
    if let Some(curves) = preset.curves {
        chain = chain.add(gate(&format!("curves=preset={curves}"), start, end));
    }
    chain.build()
}

#[must_use]
pub fn build_invocation(
    input: &Path,
    output: &Path,
    preset: &str,
    intensity: f64,
    start: f64,
    end: f64,
    encode: &EncodeSettings,
) -> Option<FfmpegInvocation> {
    let filter = build_filter(preset, intensity, start, end)?;
    Some(
        FfmpegInvocation::new("ffmpeg (color grade)")
            .input(input)
            .video_filter(filter)
            .encode_video(encode)
            .copy_audio()
            .container_flags(encode)
            .output(output),
    )
}
