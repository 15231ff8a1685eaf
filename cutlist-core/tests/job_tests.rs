// cutlist-core/tests/job_tests.rs

mod common;

use common::Workspace;
use cutlist_core::engine::mocks::MockFfmpegSpawner;
use cutlist_core::jobs::{JobRunner, JobState, JobStore};
use cutlist_core::plan::parse_plan;

#[test]
fn completed_job_records_output_and_full_progress() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    spawner.set_fallback_success();
    let runner = JobRunner::new(ws.pipeline(&spawner, 30.0, true), JobStore::new());

    let plan = parse_plan(r#"[{"id": "1", "op": "trim", "startSec": 10, "endSec": 20, "label": "Cut"}]"#)?;
    let id = runner.submit(ws.source.clone(), plan)?;
    assert!(id.starts_with("render_"));

    let output = runner.wait(&id)?;
    let status = runner.store().get(&id)?;
    assert_eq!(status.state, JobState::Completed);
    assert_eq!(status.progress, 100.0);
    assert_eq!(status.current_label, "Complete");
    assert_eq!(status.output_path.as_deref(), Some(output.output_path.as_path()));
    assert!(status.error.is_none());
    Ok(())
}

#[test]
fn failed_job_records_error_message() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    spawner.add_spawn_error_expectation("-ss", "ffmpeg: not found");
    let runner = JobRunner::new(ws.pipeline(&spawner, 30.0, true), JobStore::new());

    let plan = parse_plan(r#"[{"id": "1", "op": "trim", "startSec": 10, "endSec": 20}]"#)?;
    let id = runner.submit(ws.source.clone(), plan)?;

    assert!(runner.wait(&id).is_err());
    let status = runner.store().get(&id)?;
    assert_eq!(status.state, JobState::Error);
    assert_eq!(status.current_label, "Error");
    let message = status.error.unwrap_or_default();
    assert!(message.contains("ffmpeg: not found"), "{message}");
    assert!(status.output_path.is_none());
    assert!(ws.output_files().is_empty());
    Ok(())
}

#[test]
fn concurrent_jobs_reach_terminal_states_independently() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    spawner.set_fallback_success();
    let store = JobStore::new();
    let runner = JobRunner::new(ws.pipeline(&spawner, 30.0, true), store.clone());

    let plan = parse_plan(
        r#"[
            {"id": "1", "op": "trim", "startSec": 0, "endSec": 20},
            {"id": "2", "op": "color_grade", "startSec": 0, "endSec": 20, "params": {"preset": "vintage"}}
        ]"#,
    )?;
    let ids: Vec<String> = (0..5)
        .map(|_| runner.submit(ws.source.clone(), plan.clone()))
        .collect::<Result<_, _>>()?;

    for id in &ids {
        runner.wait(id)?;
    }
    for id in &ids {
        let status = store.get(id)?;
        assert_eq!(status.state, JobState::Completed, "{id}");
        assert!(status.state.is_terminal());
    }
    assert_eq!(ws.output_files().len(), 5);
    assert!(ws.work_files().is_empty());
    Ok(())
}

#[test]
fn waiting_on_an_unknown_job_fails() {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    let runner = JobRunner::new(ws.pipeline(&spawner, 30.0, true), JobStore::new());
    assert!(runner.wait("render_0_missing").is_err());
}
