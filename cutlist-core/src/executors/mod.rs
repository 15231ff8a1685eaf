// ============================================================================
// cutlist-core/src/executors/mod.rs
// ============================================================================
//
// OPERATION EXECUTORS: One strategy per operation kind
//
// Each executor reads the current artifact, synthesizes an ffmpeg invocation
// from its typed parameters and writes the next artifact. Executors never
// delete their input; the sequencer owns artifact lifetime.
//
// KEY COMPONENTS:
// - ExecutionEnv: Spawner, probe, fetcher and configuration for one run
// - ExecutorOutcome: Whether the step rendered or copied its input through
// - execute_operation: Dispatch from an EditAction to its executor
// - passthrough_copy: Byte-for-byte copy used for degraded steps

pub mod audio_effect;
pub mod audio_overlay;
pub mod captions;
pub mod color_grade;
pub mod effect;
pub mod overlay;
pub mod silence_removal;
pub mod speed;
pub mod trim;

use crate::assets::AssetFetcher;
use crate::config::CoreConfig;
use crate::engine::{
    EngineProgressHandler, FfmpegInvocation, FfmpegSpawner, MediaInfo, MediaProbe, run_invocation,
};
use crate::error::{CoreError, CoreResult};
use crate::plan::{EditAction, EditOperation};
use std::path::Path;

/// Collaborators shared by every executor in a run.
pub struct ExecutionEnv<'a, S, P, F: ?Sized> {
    pub spawner: &'a S,
    pub probe: &'a P,
    pub fetcher: &'a F,
    pub config: &'a CoreConfig,
}

/// Result of one executed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorOutcome {
    /// The engine produced the output.
    Rendered,
    /// The input was copied unchanged.
    PassedThrough { reason: String },
}

impl ExecutorOutcome {
    pub(crate) fn passthrough(reason: impl Into<String>) -> Self {
        ExecutorOutcome::PassedThrough {
            reason: reason.into(),
        }
    }
}

/// Copies `input` to `output` without re-encoding.
pub fn passthrough_copy(input: &Path, output: &Path) -> CoreResult<()> {
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(input, output)?;
    Ok(())
}

/// Maps a child's 0-100 progress into `[low, high]` of the parent's.
pub(crate) fn scaled_progress(
    on_progress: &mut dyn FnMut(f64),
    low: f64,
    high: f64,
) -> impl FnMut(f64) + '_ {
    move |percent: f64| on_progress(low + (high - low) * percent.clamp(0.0, 100.0) / 100.0)
}

/// Runs an invocation, reporting progress against `expected_duration`.
pub(crate) fn render<S: FfmpegSpawner>(
    spawner: &S,
    invocation: &FfmpegInvocation,
    expected_duration: f64,
    on_progress: &mut dyn FnMut(f64),
) -> CoreResult<ExecutorOutcome> {
    let handler = EngineProgressHandler::new(Some(expected_duration)).with_progress(on_progress);
    run_invocation(spawner, invocation, handler)?;
    Ok(ExecutorOutcome::Rendered)
}

/// Executes one operation from `input` into `output`.
///
/// Unsupported kinds and unknown effect or preset names copy the input
/// through. Invalid parameters are reported as `CoreError::Parameter` so the
/// caller can decide how to degrade.
pub fn execute_operation<S, P, F>(
    env: &ExecutionEnv<'_, S, P, F>,
    op: &EditOperation,
    input: &Path,
    output: &Path,
    on_progress: &mut dyn FnMut(f64),
) -> CoreResult<ExecutorOutcome>
where
    S: FfmpegSpawner,
    P: MediaProbe,
    F: AssetFetcher + ?Sized,
{
    let outcome = match &op.action {
        EditAction::Unsupported { kind, .. } => {
            let reason = format!("unsupported operation kind '{kind}'");
            passthrough_copy(input, output)?;
            return Ok(ExecutorOutcome::passthrough(reason));
        }
        EditAction::Invalid { kind, reason, .. } => {
            return Err(CoreError::parameter(kind.as_str(), reason.clone()));
        }
        action => {
            let media = env.probe.probe(input)?;
            dispatch(env, op, action, &media, input, output, on_progress)?
        }
    };

    if let ExecutorOutcome::PassedThrough { reason } = &outcome {
        if !output.exists() {
            log::debug!("Copying input through for '{}': {reason}", op.id);
            passthrough_copy(input, output)?;
        }
    }
    Ok(outcome)
}

fn dispatch<S, P, F>(
    env: &ExecutionEnv<'_, S, P, F>,
    op: &EditOperation,
    action: &EditAction,
    media: &MediaInfo,
    input: &Path,
    output: &Path,
    on_progress: &mut dyn FnMut(f64),
) -> CoreResult<ExecutorOutcome>
where
    S: FfmpegSpawner,
    P: MediaProbe,
    F: AssetFetcher + ?Sized,
{
    let encode = &env.config.encode;
    let (start, end) = (op.start_sec, op.end_sec);
    match action {
        EditAction::RemoveSilence {
            min_silence_sec,
            threshold_db,
        } => silence_removal::execute(
            env.spawner,
            input,
            output,
            media,
            min_silence_sec.unwrap_or(env.config.silence.min_silence_sec),
            threshold_db.unwrap_or(env.config.silence.threshold_db),
            encode,
            on_progress,
        ),
        EditAction::Effect { name, strength } => {
            if let Some(effect) = effect::VisualEffect::from_name(name) {
                let invocation = effect::build_invocation(input, output, effect, *strength, start, end, media, encode);
                render(env.spawner, &invocation, media.duration_sec, on_progress)
            } else if let Some(effect) = audio_effect::AudioEffect::from_name(name) {
                if !media.has_audio() {
                    return Ok(ExecutorOutcome::passthrough(format!(
                        "audio effect '{name}' on a source without audio"
                    )));
                }
                let invocation = audio_effect::build_invocation(input, output, effect, *strength, start, end, encode);
                render(env.spawner, &invocation, media.duration_sec, on_progress)
            } else {
                Ok(ExecutorOutcome::passthrough(format!("unknown effect '{name}'")))
            }
        }
        EditAction::ColorGrade { preset, intensity } => {
            match color_grade::build_invocation(input, output, preset, *intensity, start, end, encode) {
                Some(invocation) => render(env.spawner, &invocation, media.duration_sec, on_progress),
                None => Ok(ExecutorOutcome::passthrough(format!("unknown color preset '{preset}'"))),
            }
        }
        EditAction::Captions(style) => {
            let invocation = captions::build_invocation(input, output, style, start, end, encode);
            render(env.spawner, &invocation, media.duration_sec, on_progress)
        }
        EditAction::OverlayImage { .. } | EditAction::OverlayVideo { .. } => {
            overlay::execute(env, action, input, output, start, end, media, on_progress)
        }
        EditAction::OverlayAudio {
            asset,
            volume,
            loop_audio,
        } => audio_overlay::execute(
            env,
            asset,
            audio_overlay::AudioOverlaySettings {
                volume: *volume,
                loop_audio: *loop_audio,
                start,
                end,
            },
            input,
            output,
            media,
            on_progress,
        ),
        EditAction::Trim => {
            let invocation = trim::build_invocation(input, output, start, end, encode)?;
            render(env.spawner, &invocation, end - start, on_progress)
        }
        EditAction::Speed { factor } => speed::execute(env.spawner, input, output, *factor, start, end, media, encode, on_progress),
        EditAction::Unsupported { .. } | EditAction::Invalid { .. } => {
            Ok(ExecutorOutcome::passthrough("operation cannot be executed"))
        }
    }
}
