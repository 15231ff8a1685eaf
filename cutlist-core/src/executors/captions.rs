//! Caption executor.
//!
//! Burns text into the frame with `drawtext`, centred horizontally, boxed,
//! and visible only inside the operation window. With the fade animation the
//! text ramps in and out over `fade_duration` at both window edges, provided
//! the window is longer than two fades.

use crate::config::EncodeSettings;
use crate::engine::{FfmpegInvocation, enable_between};
use crate::plan::{CaptionAnimation, CaptionPosition, CaptionStyle};
use crate::utils::fmt_num;
use std::path::Path;

const BORDER_WIDTH: u32 = 3;
const BOX_BORDER_WIDTH: u32 = 20;

/// Escapes text for a single-quoted drawtext value.
#[must_use]
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '\'' | ':' | '%' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Piecewise-linear alpha ramping in after `start` and out before `end`.
///
/// `None` when the window is too short to reach full opacity or the fade is zero.
#[must_use]
pub fn fade_alpha(start: f64, end: f64, fade: f64) -> Option<String> {
    if fade <= 0.0 || end - start <= 2.0 * fade {
        return None;
    }
    let (s, e, f) = (fmt_num(start), fmt_num(end), fmt_num(fade));
    Some(format!(
        "if(lt(t,{}),(t-{s})/{f},if(gt(t,{}),({e}-t)/{f},1))",
        fmt_num(start + fade),
        fmt_num(end - fade)
    ))
}

fn y_expression(position: CaptionPosition) -> &'static str {
    match position {
        CaptionPosition::Top => "100",
        CaptionPosition::Center => "(h-text_h)/2",
        CaptionPosition::Bottom => "h-200",
    }
}

/// The drawtext filter for a caption.
#[must_use]
pub fn build_filter(style: &CaptionStyle, start: f64, end: f64) -> String {
    let mut options = vec![
        format!("text='{}'", escape_text(&style.text)),
        format!("fontsize={}", style.font_size),
        format!("fontcolor={}", style.font_color),
        "x=(w-text_w)/2".to_string(),
        format!("y={}", y_expression(style.position)),
        format!("borderw={BORDER_WIDTH}"),
        "bordercolor=black".to_string(),
        "box=1".to_string(),
        format!("boxcolor={}", style.bg_color),
        format!("boxborderw={BOX_BORDER_WIDTH}"),
    ];
    if style.animation == CaptionAnimation::Fade {
        if let Some(alpha) = fade_alpha(start, end, style.fade_duration) {
            options.push(format!("alpha='{alpha}'"));
        }
    }
    options.push(enable_between(start, end));
    format!("drawtext={}", options.join(":"))
}

#[must_use]
pub fn build_invocation(
    input: &Path,
    output: &Path,
    style: &CaptionStyle,
    start: f64,
    end: f64,
    encode: &EncodeSettings,
) -> FfmpegInvocation {
    FfmpegInvocation::new("ffmpeg (captions)")
        .input(input)
        .video_filter(build_filter(style, start, end))
        .encode_video(encode)
        .copy_audio()
        .container_flags(encode)
        .output(output)
}
