//! Trim executor: keeps `[start, end]` of the input.

use crate::config::EncodeSettings;
use crate::engine::FfmpegInvocation;
use crate::error::{CoreError, CoreResult};
use std::path::Path;

/// Seeks to `start` on the input and limits the output to `end - start`.
pub fn build_invocation(
    input: &Path,
    output: &Path,
    start: f64,
    end: f64,
    encode: &EncodeSettings,
) -> CoreResult<FfmpegInvocation> {
    let duration = end - start;
    if !duration.is_finite() || duration <= 0.0 {
        return Err(CoreError::parameter(
            "trim",
            format!("window {start}-{end} is empty"),
        ));
    }
    Ok(FfmpegInvocation::new("ffmpeg (trim)")
        .seek(start)
        .input(input)
        .duration(duration)
        .encode_video(encode)
        .encode_audio(encode)
        .container_flags(encode)
        .output(output))
}
