//! Background execution of pipeline runs.
//!
//! `submit` returns a job id immediately and runs the pipeline on its own
//! thread, feeding progress and the terminal state into the `JobStore`.
//! Runs are independent; there is no cancellation.

use super::store::JobStore;
use crate::assets::AssetFetcher;
use crate::engine::{FfmpegSpawner, MediaProbe};
use crate::error::{CoreError, CoreResult};
use crate::pipeline::{Pipeline, PipelineOutput, PipelineProgress};
use crate::plan::EditOperation;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

type Worker = JoinHandle<CoreResult<PipelineOutput>>;

/// Runs pipelines on background threads.
pub struct JobRunner<S, P, F> {
    pipeline: Arc<Pipeline<S, P, F>>,
    store: JobStore,
    workers: Mutex<HashMap<String, Worker>>,
}

impl<S, P, F> JobRunner<S, P, F>
where
    S: FfmpegSpawner + Send + Sync + 'static,
    P: MediaProbe + Send + Sync + 'static,
    F: AssetFetcher + Send + Sync + 'static,
{
    pub fn new(pipeline: Pipeline<S, P, F>, store: JobStore) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            store,
            workers: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Starts a run and returns its job id.
    pub fn submit(&self, source: PathBuf, plan: Vec<EditOperation>) -> CoreResult<String> {
        let id = self.store.create();
        let pipeline = Arc::clone(&self.pipeline);
        let store = self.store.clone();
        let job_id = id.clone();

        let spawned = thread::Builder::new()
            .name(format!("job-{id}"))
            .spawn(move || {
                let sink = |progress: PipelineProgress| {
                    let _ = store.update(&job_id, |status| {
                        status.progress = progress.percent;
                        status.current_label = progress.label;
                    });
                };
                let result = pipeline.run(&source, &plan, sink);
                let recorded = match &result {
                    Ok(output) => {
                        log::info!("Job {job_id} completed: {}", output.output_path.display());
                        let path = output.output_path.clone();
                        store.update(&job_id, |status| status.complete(path))
                    }
                    Err(e) => {
                        log::error!("Job {job_id} failed: {e}");
                        let message = e.to_string();
                        store.update(&job_id, |status| status.fail(message))
                    }
                };
                if let Err(e) = recorded {
                    log::warn!("Could not record final state of job {job_id}: {e}");
                }
                result
            });

        match spawned {
            Ok(handle) => {
                self.workers
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(id.clone(), handle);
                log::info!("Submitted job {id}");
                Ok(id)
            }
            Err(e) => {
                let message = format!("failed to start worker: {e}");
                let _ = self.store.update(&id, |status| status.fail(message.clone()));
                Err(CoreError::OperationFailed(message))
            }
        }
    }

    /// Blocks until the job's worker finishes and returns its result.
    pub fn wait(&self, id: &str) -> CoreResult<PipelineOutput> {
        let handle = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .ok_or_else(|| CoreError::JobNotFound(id.to_string()))?;
        match handle.join() {
            Ok(result) => result,
            Err(_) => {
                let message = "job worker panicked".to_string();
                let _ = self.store.update(id, |status| status.fail(message.clone()));
                Err(CoreError::OperationFailed(message))
            }
        }
    }

    /// Whether the worker for `id` is still running.
    #[must_use]
    pub fn is_running(&self, id: &str) -> bool {
        self.workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .is_some_and(|handle| !handle.is_finished())
    }
}
