// ============================================================================
// cutlist-core/src/pipeline/mod.rs
// ============================================================================
//
// PIPELINE: Sequential execution of an edit plan
//
// The pipeline orders a plan (silence removal first, everything else in plan
// order), then runs each operation against the previous operation's output.
// Intermediates live in a `RunScope` and are deleted as soon as the next
// artifact exists, or when the run ends for any reason.
//
// KEY COMPONENTS:
// - Pipeline: Spawner, probe, fetcher and configuration bundled for runs
// - PipelineOutput: Final path plus a per-operation report
// - order_operations: Stable ordering with silence removal first
// - RunScope / ProgressAggregator: Artifact ownership and run progress
//
// ERROR HANDLING:
// Parameter errors degrade the offending operation to a copy of its input.
// Every other error aborts the run; the scope removes all artifacts it
// created before the error reaches the caller.

pub mod progress;
pub mod run_scope;

pub use progress::{
    COMPLETE_LABEL, PipelineProgress, ProgressAggregator, ProgressSink, ProgressState,
};
pub use run_scope::{RunScope, run_stamp};

use crate::analysis::{SilenceRange, detect_silence};
use crate::assets::{AssetFetcher, HttpAssetFetcher};
use crate::config::CoreConfig;
use crate::engine::{FfmpegSpawner, FfprobeMediaProbe, MediaInfo, MediaProbe, SidecarSpawner};
use crate::error::{CoreError, CoreResult};
use crate::executors::{ExecutionEnv, ExecutorOutcome, execute_operation, passthrough_copy};
use crate::plan::{EditOperation, OperationStatus};
use std::path::{Path, PathBuf};

/// What happened to one operation of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub id: String,
    pub kind: String,
    pub label: String,
    pub status: OperationStatus,
    pub outcome: ExecutorOutcome,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub output_path: PathBuf,
    pub steps: Vec<StepReport>,
}

impl PipelineOutput {
    /// Operations that were copied through instead of rendered.
    pub fn passthroughs(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|step| matches!(step.outcome, ExecutorOutcome::PassedThrough { .. }))
    }
}

/// Orders a plan for execution: silence removal first, the rest in plan order.
#[must_use]
pub fn order_operations(plan: &[EditOperation]) -> Vec<&EditOperation> {
    let (mut ordered, rest): (Vec<&EditOperation>, Vec<&EditOperation>) =
        plan.iter().partition(|op| op.action.is_remove_silence());
    ordered.extend(rest);
    ordered
}

/// Runs edit plans against source files.
pub struct Pipeline<S = SidecarSpawner, P = FfprobeMediaProbe, F = HttpAssetFetcher> {
    spawner: S,
    probe: P,
    fetcher: F,
    config: CoreConfig,
}

impl Pipeline {
    /// Creates a pipeline backed by ffmpeg, ffprobe and an HTTP fetcher.
    pub fn new(config: CoreConfig) -> CoreResult<Self> {
        let fetcher = HttpAssetFetcher::new(config.download_timeout)?;
        Self::with_components(config, SidecarSpawner, FfprobeMediaProbe, fetcher)
    }
}

impl<S, P, F> Pipeline<S, P, F>
where
    S: FfmpegSpawner,
    P: MediaProbe,
    F: AssetFetcher,
{
    /// Creates a pipeline from explicit collaborators.
    pub fn with_components(config: CoreConfig, spawner: S, probe: P, fetcher: F) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            spawner,
            probe,
            fetcher,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn probe_media(&self, path: &Path) -> CoreResult<MediaInfo> {
        self.probe.probe(path)
    }

    /// Detects silent intervals in `path`.
    pub fn detect_silence(
        &self,
        path: &Path,
        min_silence_sec: f64,
        threshold_db: f64,
    ) -> CoreResult<Vec<SilenceRange>> {
        let expected = self.probe.probe(path).ok().map(|info| info.duration_sec);
        detect_silence(
            &self.spawner,
            path,
            min_silence_sec,
            threshold_db,
            expected,
            &mut |_| {},
        )
    }

    /// Runs `plan` against `source` and returns the committed output.
    ///
    /// Progress reports go to `sink`. On success the last report is 100 with
    /// the label `Complete`. On failure no file created by the run remains.
    pub fn run<K: ProgressSink>(
        &self,
        source: &Path,
        plan: &[EditOperation],
        mut sink: K,
    ) -> CoreResult<PipelineOutput> {
        if !source.is_file() {
            return Err(CoreError::PathError(format!(
                "Source file not found: {}",
                source.display()
            )));
        }

        let ordered = order_operations(plan);
        let total = ordered.len();
        let mut scope = RunScope::new(
            self.config.effective_work_dir(),
            &self.config.output_dir,
            &self.config.output_extension,
        )?;
        let mut aggregator = ProgressAggregator::new(total);
        log::info!(
            "Starting run {} on {} with {} operation(s)",
            scope.stamp(),
            source.display(),
            total
        );

        if total == 0 {
            passthrough_copy(source, scope.final_path())?;
            aggregator.complete(&mut sink);
            let output_path = scope.commit();
            log::info!("Empty plan, copied source to {}", output_path.display());
            return Ok(PipelineOutput {
                output_path,
                steps: Vec::new(),
            });
        }

        let env = ExecutionEnv {
            spawner: &self.spawner,
            probe: &self.probe,
            fetcher: &self.fetcher,
            config: &self.config,
        };
        let mut current = source.to_path_buf();
        let mut steps = Vec::with_capacity(total);

        for (index, op) in ordered.into_iter().enumerate() {
            let label = op.display_label();
            let output = if index + 1 == total {
                scope.final_path().to_path_buf()
            } else {
                scope.next_intermediate()
            };
            log::info!(
                "[{}/{}] {} ({})",
                index + 1,
                total,
                label,
                op.action.kind_name()
            );
            aggregator.report(index, 0.0, label, &mut sink);

            let result = {
                let mut on_progress =
                    |percent: f64| aggregator.report(index, percent, label, &mut sink);
                execute_operation(&env, op, &current, &output, &mut on_progress)
            };
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) if e.is_recoverable() => {
                    log::warn!("Operation '{}' copied through: {e}", op.id);
                    discard_partial(&output);
                    passthrough_copy(&current, &output)?;
                    ExecutorOutcome::PassedThrough {
                        reason: e.to_string(),
                    }
                }
                Err(e) => {
                    log::error!("Operation '{}' ({}) failed: {e}", op.id, label);
                    return Err(e);
                }
            };

            if !output.is_file() {
                return Err(CoreError::OperationFailed(format!(
                    "Operation '{}' produced no output at {}",
                    op.id,
                    output.display()
                )));
            }
            if let ExecutorOutcome::PassedThrough { reason } = &outcome {
                log::info!("Operation '{}' passed through: {reason}", op.id);
            }

            scope.release(&current);
            current = output;
            aggregator.report(index, 100.0, label, &mut sink);
            steps.push(StepReport {
                id: op.id.clone(),
                kind: op.action.kind_name().to_string(),
                label: label.to_string(),
                status: OperationStatus::Rendered,
                outcome,
            });
        }

        aggregator.complete(&mut sink);
        let output_path = scope.commit();
        log::info!("Run finished: {}", output_path.display());
        Ok(PipelineOutput { output_path, steps })
    }
}

fn discard_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("Failed to remove partial output {}: {e}", path.display());
        }
    }
}
