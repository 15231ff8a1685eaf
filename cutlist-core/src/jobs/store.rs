//! Concurrency-safe job status map.
//!
//! The map itself sits behind an `RwLock` and each entry has its own
//! `Mutex`, so progress updates for one job never block readers of another.

use crate::error::{CoreError, CoreResult};
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

const JOB_ID_SUFFIX_LEN: usize = 7;

/// Lifecycle state of a render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Processing,
    Completed,
    Error,
}

impl JobState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Processing)
    }
}

/// Snapshot of one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub state: JobState,
    pub progress: f64,
    pub current_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self {
            state: JobState::Processing,
            progress: 0.0,
            current_label: "Starting".to_string(),
            output_path: None,
            error: None,
        }
    }
}

impl JobStatus {
    /// Marks the job completed with its output.
    pub fn complete(&mut self, output_path: PathBuf) {
        self.state = JobState::Completed;
        self.progress = 100.0;
        self.current_label = "Complete".to_string();
        self.output_path = Some(output_path);
        self.error = None;
    }

    /// Marks the job failed.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = JobState::Error;
        self.current_label = "Error".to_string();
        self.error = Some(message.into());
    }
}

/// Builds a job id: `render_<unix millis>_<7 lowercase alphanumerics>`.
#[must_use]
pub fn new_job_id() -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(JOB_ID_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("render_{}_{}", chrono::Utc::now().timestamp_millis(), suffix)
}

type Entry = Arc<Mutex<JobStatus>>;

/// Shared map of job id to status. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<String, Entry>>>,
}

fn lock_entry(entry: &Entry) -> MutexGuard<'_, JobStatus> {
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl JobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new processing job and returns its id.
    pub fn create(&self) -> String {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let mut id = new_job_id();
        while jobs.contains_key(&id) {
            id = new_job_id();
        }
        jobs.insert(id.clone(), Arc::new(Mutex::new(JobStatus::default())));
        log::debug!("Created job {id}");
        id
    }

    fn entry(&self, id: &str) -> CoreResult<Entry> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.get(id)
            .cloned()
            .ok_or_else(|| CoreError::JobNotFound(id.to_string()))
    }

    /// Applies `f` to the status of `id`.
    pub fn update<F>(&self, id: &str, f: F) -> CoreResult<()>
    where
        F: FnOnce(&mut JobStatus),
    {
        let entry = self.entry(id)?;
        f(&mut lock_entry(&entry));
        Ok(())
    }

    /// Returns a copy of the status of `id`.
    pub fn get(&self, id: &str) -> CoreResult<JobStatus> {
        let entry = self.entry(id)?;
        let status = lock_entry(&entry).clone();
        Ok(status)
    }

    pub fn remove(&self, id: &str) -> Option<JobStatus> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        jobs.remove(id).map(|entry| lock_entry(&entry).clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn job_ids_have_expected_shape() {
        let id = new_job_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "render");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 7);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn status_serializes_in_camel_case() {
        let mut status = JobStatus::default();
        status.complete(PathBuf::from("/out/processed.mp4"));
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "completed");
        assert_eq!(json["currentLabel"], "Complete");
        assert_eq!(json["outputPath"], "/out/processed.mp4");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn unknown_ids_are_reported() {
        let store = JobStore::new();
        assert!(matches!(store.get("nope"), Err(CoreError::JobNotFound(_))));
        assert!(store.update("nope", |_| {}).is_err());
        assert!(store.remove("nope").is_none());
    }

    #[test]
    fn concurrent_updates_land_on_their_own_jobs() {
        let store = JobStore::new();
        let ids: Vec<String> = (0..8).map(|_| store.create()).collect();
        let handles: Vec<_> = ids
            .iter()
            .cloned()
            .map(|id| {
                let store = store.clone();
                thread::spawn(move || {
                    for step in 1..=100 {
                        store
                            .update(&id, |status| status.progress = f64::from(step))
                            .unwrap();
                    }
                    store.update(&id, |status| status.fail("boom")).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        for id in &ids {
            let status = store.get(id).unwrap();
            assert_eq!(status.state, JobState::Error);
            assert_eq!(status.progress, 100.0);
            assert_eq!(status.error.as_deref(), Some("boom"));
        }
        assert_eq!(store.len(), 8);
    }
}
