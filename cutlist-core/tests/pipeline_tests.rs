// cutlist-core/tests/pipeline_tests.rs

mod common;

use common::{PIXEL_PNG_BASE64, SOURCE_BYTES, Workspace};
use cutlist_core::CoreError;
use cutlist_core::engine::EngineEvent;
use cutlist_core::engine::mocks::MockFfmpegSpawner;
use cutlist_core::executors::ExecutorOutcome;
use cutlist_core::pipeline::{COMPLETE_LABEL, PipelineProgress, ProgressState};
use cutlist_core::plan::{EditOperation, parse_plan};

fn plan(json: &str) -> Vec<EditOperation> {
    parse_plan(json).expect("valid plan json")
}

fn silence_events(ranges: &[(f64, f64)]) -> Vec<EngineEvent> {
    ranges
        .iter()
        .flat_map(|(start, end)| {
            [
                EngineEvent::info(format!("[silencedetect @ 0x5580] silence_start: {start}")),
                EngineEvent::info(format!(
                    "[silencedetect @ 0x5580] silence_end: {end} | silence_duration: {}",
                    end - start
                )),
            ]
        })
        .collect()
}

#[test]
fn successful_run_keeps_only_the_final_output() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    spawner.set_fallback_success();
    let pipeline = ws.pipeline(&spawner, 30.0, true);

    let ops = plan(
        r#"[
            {"id": "1", "op": "trim", "startSec": 0, "endSec": 20, "label": "Cut"},
            {"id": "2", "op": "effect", "startSec": 0, "endSec": 5, "params": {"effect": "blur", "strength": 50}},
            {"id": "3", "op": "color_grade", "startSec": 0, "endSec": 20, "params": {"preset": "warm"}}
        ]"#,
    );
    let output = pipeline.run(&ws.source, &ops, |_: PipelineProgress| {})?;

    assert!(output.output_path.exists());
    assert!(output.output_path.starts_with(ws.output_dir.path()));
    let name = output.output_path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("processed_") && name.ends_with(".mp4"), "{name}");
    assert!(ws.work_files().is_empty(), "left behind: {:?}", ws.work_files());
    assert_eq!(ws.output_files(), vec![output.output_path.clone()]);
    assert_eq!(std::fs::read(&ws.source)?, SOURCE_BYTES);
    assert_eq!(spawner.get_received_calls().len(), 3);
    assert!(output.steps.iter().all(|s| s.outcome == ExecutorOutcome::Rendered));
    Ok(())
}

#[test]
fn engine_failure_removes_every_artifact() {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    spawner.add_exit_error_expectation(
        "gblur",
        vec![EngineEvent::Log {
            level: log::Level::Error,
            line: "Error while filtering".to_string(),
        }],
        1,
    );
    spawner.set_fallback_success();
    let pipeline = ws.pipeline(&spawner, 30.0, true);

    let ops = plan(
        r#"[
            {"id": "1", "op": "trim", "startSec": 0, "endSec": 20},
            {"id": "2", "op": "effect", "startSec": 0, "endSec": 5, "params": {"effect": "blur"}},
            {"id": "3", "op": "color_grade", "startSec": 0, "endSec": 20, "params": {"preset": "cool"}}
        ]"#,
    );
    let result = pipeline.run(&ws.source, &ops, |_: PipelineProgress| {});

    match result {
        Err(CoreError::CommandFailed { stderr, .. }) => {
            assert!(stderr.contains("Error while filtering"));
        }
        other => panic!("expected an engine failure, got {other:?}"),
    }
    assert!(ws.work_files().is_empty(), "left behind: {:?}", ws.work_files());
    assert!(ws.output_files().is_empty(), "left behind: {:?}", ws.output_files());
    assert!(ws.source.exists());
    // The failing step aborts before color grading is attempted.
    assert_eq!(spawner.get_received_calls().len(), 2);
}

#[test]
fn exhaustive_silence_removal_aborts_after_analysis() {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("silencedetect", silence_events(&[(0.0, 30.0)]), false);
    let pipeline = ws.pipeline(&spawner, 30.0, true);

    let ops = plan(r#"[{"id": "s", "op": "remove_silence", "startSec": 0, "endSec": 30}]"#);
    let result = pipeline.run(&ws.source, &ops, |_: PipelineProgress| {});

    assert!(matches!(result, Err(CoreError::ExhaustiveRemoval)));
    assert_eq!(spawner.get_received_calls().len(), 1);
    assert!(ws.work_files().is_empty());
    assert!(ws.output_files().is_empty());
}

#[test]
fn silence_removal_without_silence_copies_source_bytes() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("silencedetect", vec![], false);
    let pipeline = ws.pipeline(&spawner, 30.0, true);

    let ops = plan(r#"[{"id": "s", "op": "remove_silence", "startSec": 0, "endSec": 30}]"#);
    let output = pipeline.run(&ws.source, &ops, |_: PipelineProgress| {})?;

    assert_eq!(std::fs::read(&output.output_path)?, SOURCE_BYTES);
    assert_eq!(spawner.get_received_calls().len(), 1);
    assert_eq!(output.passthroughs().count(), 1);
    Ok(())
}

#[test]
fn silence_removal_runs_first_and_later_windows_use_the_new_timeline() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("silencedetect", silence_events(&[(12.0, 14.0)]), false);
    spawner.set_fallback_success();
    let pipeline = ws.pipeline(&spawner, 30.0, true);

    let ops = plan(
        r#"[
            {"id": "b", "op": "effect", "startSec": 0, "endSec": 5, "params": {"effect": "blur", "strength": 50}},
            {"id": "s", "op": "remove_silence", "startSec": 0, "endSec": 30}
        ]"#,
    );
    let output = pipeline.run(&ws.source, &ops, |_: PipelineProgress| {})?;

    let calls = spawner.get_received_calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].iter().any(|a| a.contains("silencedetect")));
    let removal = calls[1].join(" ");
    assert!(removal.contains("trim=start=0:end=12"), "{removal}");
    assert!(removal.contains("trim=start=14:end=30"), "{removal}");
    assert!(removal.contains("concat=n=2:v=1:a=0"), "{removal}");
    let blur = calls[2].join(" ");
    assert!(blur.contains("gblur=sigma=10:enable='between(t,0,5)'"), "{blur}");
    let ids: Vec<&str> = output.steps.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["s", "b"]);
    Ok(())
}

#[test]
fn audio_only_source_renders_audio_graphs() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("silencedetect", silence_events(&[(12.0, 14.0)]), false);
    spawner.set_fallback_success();
    let pipeline = ws.audio_pipeline(&spawner, 30.0);

    let ops = plan(
        r#"[
            {"id": "s", "op": "remove_silence", "startSec": 0, "endSec": 30},
            {"id": "f", "op": "speed", "startSec": 0, "endSec": 10, "params": {"speed": 2}}
        ]"#,
    );
    let output = pipeline.run(&ws.source, &ops, |_: PipelineProgress| {})?;

    let calls = spawner.get_received_calls();
    assert_eq!(calls.len(), 3);
    for call in &calls[1..] {
        let line = call.join(" ");
        assert!(!line.contains("[0:v]"), "{line}");
        assert!(!line.contains("-c:v"), "{line}");
    }
    let removal = calls[1].join(" ");
    assert!(removal.contains("concat=n=2:v=0:a=1[outa]"), "{removal}");
    assert!(calls[1].iter().any(|a| a == "[outa]"));
    let speed = calls[2].join(" ");
    assert!(speed.contains("atempo=2[a0]"), "{speed}");
    assert!(calls[2].iter().any(|a| a == "[aout]"));
    assert_eq!(output.passthroughs().count(), 0);
    assert!(output.output_path.exists());
    Ok(())
}

#[test]
fn unknown_kind_and_invalid_params_pass_through() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    spawner.set_fallback_success();
    let pipeline = ws.pipeline(&spawner, 30.0, true);

    let ops = plan(
        r#"[
            {"id": "x", "op": "sparkle", "startSec": 0, "endSec": 5},
            {"id": "o", "op": "overlay_image", "startSec": 0, "endSec": 5, "params": {"position": "center"}}
        ]"#,
    );
    let output = pipeline.run(&ws.source, &ops, |_: PipelineProgress| {})?;

    assert!(spawner.get_received_calls().is_empty());
    assert_eq!(std::fs::read(&output.output_path)?, SOURCE_BYTES);
    assert_eq!(output.passthroughs().count(), 2);
    assert!(ws.work_files().is_empty());
    Ok(())
}

#[test]
fn progress_is_monotonic_and_ends_at_exactly_100() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation(
        "gblur",
        vec![
            EngineEvent::Progress { time_sec: 15.0 },
            EngineEvent::Progress { time_sec: 6.0 },
            EngineEvent::Progress { time_sec: 27.0 },
        ],
        true,
    );
    spawner.set_fallback_success();
    let pipeline = ws.pipeline(&spawner, 30.0, true);

    let ops = plan(
        r#"[
            {"id": "1", "op": "effect", "startSec": 0, "endSec": 5, "params": {"effect": "blur"}},
            {"id": "2", "op": "captions", "startSec": 1, "endSec": 4, "label": "Hello there"},
            {"id": "3", "op": "speed", "startSec": 0, "endSec": 30, "params": {"speed": 1.5}}
        ]"#,
    );
    let mut reports = Vec::new();
    pipeline.run(&ws.source, &ops, |p: PipelineProgress| reports.push(p))?;

    assert!(reports.len() > 6);
    for pair in reports.windows(2) {
        assert!(pair[1].percent >= pair[0].percent, "{} then {}", pair[0].percent, pair[1].percent);
    }
    let last = reports.last().unwrap();
    assert_eq!(last.percent, 100.0);
    assert_eq!(last.label, COMPLETE_LABEL);
    assert_eq!(last.state, ProgressState::Completed);
    assert_eq!(reports.iter().filter(|p| p.state == ProgressState::Completed).count(), 1);
    assert!(reports.iter().any(|p| p.label == "Hello there"));
    Ok(())
}

#[test]
fn progress_can_be_sent_over_a_channel() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    spawner.set_fallback_success();
    let pipeline = ws.pipeline(&spawner, 30.0, true);

    let (tx, rx) = std::sync::mpsc::channel();
    let ops = plan(r#"[{"id": "1", "op": "trim", "startSec": 10, "endSec": 20}]"#);
    pipeline.run(&ws.source, &ops, tx)?;

    let reports: Vec<PipelineProgress> = rx.iter().collect();
    assert_eq!(reports.last().map(|p| p.percent), Some(100.0));
    Ok(())
}

#[test]
fn embedded_image_overlay_leaves_no_decoded_file() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    spawner.set_fallback_success();
    let pipeline = ws.pipeline(&spawner, 30.0, true);

    let ops = vec![EditOperation::from_wire(
        "ov",
        "overlay_image",
        0.0,
        3.0,
        "Logo",
        serde_json::json!({
            "imagePath": format!("data:image/png;base64,{PIXEL_PNG_BASE64}"),
            "position": "center",
            "scale": 0.5
        })
        .as_object()
        .cloned()
        .unwrap(),
    )];
    let output = pipeline.run(&ws.source, &ops, |_: PipelineProgress| {})?;

    let calls = spawner.get_received_calls();
    assert_eq!(calls.len(), 1);
    let decoded_input = calls[0]
        .iter()
        .find(|a| a.ends_with(".png"))
        .expect("decoded image is passed to ffmpeg");
    assert!(!std::path::Path::new(decoded_input).exists());
    assert!(calls[0].join(" ").contains("between(t,0,3)"));
    assert!(ws.work_files().is_empty(), "left behind: {:?}", ws.work_files());
    assert_eq!(output.steps[0].outcome, ExecutorOutcome::Rendered);
    Ok(())
}

#[test]
fn unreachable_remote_asset_aborts_the_run() {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    spawner.set_fallback_success();
    let pipeline = ws.pipeline(&spawner, 30.0, true);

    let ops = plan(
        r#"[
            {"id": "1", "op": "trim", "startSec": 0, "endSec": 20},
            {"id": "2", "op": "overlay_audio", "startSec": 0, "endSec": 10, "params": {"audioPath": "https://assets.invalid/music.mp3"}}
        ]"#,
    );
    let result = pipeline.run(&ws.source, &ops, |_: PipelineProgress| {});

    assert!(matches!(result, Err(CoreError::AssetResolution { .. })));
    assert!(ws.work_files().is_empty());
    assert!(ws.output_files().is_empty());
}

#[test]
fn empty_plan_copies_the_source() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    let pipeline = ws.pipeline(&spawner, 30.0, true);

    let mut reports = Vec::new();
    let output = pipeline.run(&ws.source, &[], |p: PipelineProgress| reports.push(p))?;

    assert_eq!(std::fs::read(&output.output_path)?, SOURCE_BYTES);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].percent, 100.0);
    assert!(spawner.get_received_calls().is_empty());
    Ok(())
}

#[test]
fn missing_source_is_a_path_error() {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    let pipeline = ws.pipeline(&spawner, 30.0, true);
    let missing = ws.source_dir.path().join("missing.mp4");

    let result = pipeline.run(&missing, &[], |_: PipelineProgress| {});
    assert!(matches!(result, Err(CoreError::PathError(_))));
}

#[test]
fn concurrent_runs_do_not_share_artifact_names() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::new();
    let spawner = MockFfmpegSpawner::new();
    spawner.set_fallback_success();
    let pipeline = ws.pipeline(&spawner, 30.0, true);
    let ops = plan(
        r#"[
            {"id": "1", "op": "trim", "startSec": 0, "endSec": 20},
            {"id": "2", "op": "effect", "startSec": 0, "endSec": 5, "params": {"effect": "glitch"}}
        ]"#,
    );

    let outputs = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| pipeline.run(&ws.source, &ops, |_: PipelineProgress| {})))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("run thread"))
            .collect::<Result<Vec<_>, _>>()
    })?;

    let mut paths: Vec<_> = outputs.into_iter().map(|o| o.output_path).collect();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 4);
    assert!(ws.work_files().is_empty());
    Ok(())
}
