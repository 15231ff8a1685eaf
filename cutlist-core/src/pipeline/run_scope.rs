//! Artifact ownership for one pipeline run.
//!
//! A `RunScope` names every file a run creates and deletes them when it is
//! dropped, so early returns, errors and unwinding panics all leave the work
//! directory clean. Only the final output survives, and only after
//! `commit()`.

use crate::error::CoreResult;
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use std::path::{Path, PathBuf};

/// Random characters appended to the millisecond timestamp of a run stamp.
const STAMP_SUFFIX_LEN: usize = 6;

/// Builds a run stamp: `<unix millis>_<random alphanumerics>`.
#[must_use]
pub fn run_stamp() -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STAMP_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{}_{}", chrono::Utc::now().timestamp_millis(), suffix)
}

/// Owner of the intermediate and final artifacts of one run.
#[derive(Debug)]
pub struct RunScope {
    stamp: String,
    work_dir: PathBuf,
    extension: String,
    final_path: PathBuf,
    counter: usize,
    intermediates: Vec<PathBuf>,
    committed: bool,
}

impl RunScope {
    /// Creates the scope and the directories it writes into.
    pub fn new(work_dir: &Path, output_dir: &Path, extension: &str) -> CoreResult<Self> {
        std::fs::create_dir_all(work_dir)?;
        std::fs::create_dir_all(output_dir)?;
        let stamp = run_stamp();
        let final_path = output_dir.join(format!("processed_{stamp}.{extension}"));
        Ok(Self {
            stamp,
            work_dir: work_dir.to_path_buf(),
            extension: extension.to_string(),
            final_path,
            counter: 0,
            intermediates: Vec::new(),
            committed: false,
        })
    }

    #[must_use]
    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    /// Where the committed output will live.
    #[must_use]
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Reserves the next intermediate path. The file is not created.
    pub fn next_intermediate(&mut self) -> PathBuf {
        let path = self
            .work_dir
            .join(format!("temp_{}_{}.{}", self.stamp, self.counter, self.extension));
        self.counter += 1;
        self.intermediates.push(path.clone());
        path
    }

    /// Deletes an intermediate that is no longer needed. Paths the scope does
    /// not own are left alone.
    pub fn release(&mut self, path: &Path) {
        if let Some(index) = self.intermediates.iter().position(|p| p == path) {
            let path = self.intermediates.remove(index);
            remove_quietly(&path);
        }
    }

    /// Intermediates reserved and not yet released.
    #[must_use]
    pub fn live_intermediates(&self) -> &[PathBuf] {
        &self.intermediates
    }

    /// Keeps the final output and returns its path. Intermediates are still
    /// deleted when the scope drops.
    pub fn commit(mut self) -> PathBuf {
        self.committed = true;
        self.final_path.clone()
    }
}

impl Drop for RunScope {
    fn drop(&mut self) {
        for path in self.intermediates.drain(..) {
            remove_quietly(&path);
        }
        if !self.committed {
            remove_quietly(&self.final_path);
        }
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => log::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove {}: {e}", path.display()),
    }
}
