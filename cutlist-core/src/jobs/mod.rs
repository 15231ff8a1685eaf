//! Render jobs: a shared status store and a background runner.

pub mod runner;
pub mod store;

pub use runner::JobRunner;
pub use store::{JobState, JobStatus, JobStore, new_job_id};
