//! Implementation of the 'render' subcommand.
//!
//! Builds a `CoreConfig` from the arguments, normalizes the plan against the
//! probed input and runs it as a background job while a progress bar follows
//! the job store.

use crate::cli::RenderArgs;
use crate::error::{ActionContext, CliResult};
use crate::output;

use cutlist_core::utils::file_size;
use cutlist_core::{
    CoreConfig, CoreError, ExecutorOutcome, JobRunner, JobState, JobStore, Pipeline, PipelineOutput,
    format_bytes, format_duration, load_plan, normalize_plan,
};

use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Creates and configures CoreConfig from CLI arguments.
pub fn create_core_config(args: &RenderArgs) -> CliResult<CoreConfig> {
    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => default_output_dir(&args.input),
    };
    let mut config = CoreConfig::new(output_dir);
    config.work_dir.clone_from(&args.work_dir);
    if let Some(preset) = &args.preset {
        config.encode.preset.clone_from(preset);
    }
    if let Some(crf) = args.crf {
        config.encode.crf = crf;
    }
    config.validate()?;
    Ok(config)
}

fn default_output_dir(input: &Path) -> PathBuf {
    input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Runs the render command. Returns the path of the committed output.
pub fn run_render(args: RenderArgs) -> CliResult<PathBuf> {
    let start = Instant::now();
    if !args.input.is_file() {
        return Err(CoreError::PathError(format!(
            "Invalid input path '{}': not a file",
            args.input.display()
        )));
    }

    let config = create_core_config(&args)?;
    output::print_section("Render");
    output::print_status("Input", &args.input.display().to_string(), true);
    output::print_status("Output dir", &config.output_dir.display().to_string(), false);
    output::print_status(
        "Encoder",
        &format!("{} {} crf {}", config.encode.video_codec, config.encode.preset, config.encode.crf),
        false,
    );

    let pipeline = Pipeline::new(config)?;
    let media = pipeline
        .probe_media(&args.input)
        .during(|| format!("Probing {}", args.input.display()))?;
    output::print_status("Duration", &format_duration(media.duration_sec), false);

    let plan = load_plan(&args.plan)?;
    let plan = if args.no_normalize {
        debug!("Using plan windows as given");
        plan
    } else {
        normalize_plan(plan, media.duration_sec, pipeline.config().max_plan_operations)?
    };
    output::print_status("Operations", &plan.len().to_string(), false);
    info!("Rendering {} with {} operation(s)", args.input.display(), plan.len());

    let store = JobStore::new();
    let runner = JobRunner::new(pipeline, store.clone());
    let job_id = runner.submit(args.input.clone(), plan)?;
    debug!("Job id {job_id}");

    let bar = output::create_progress_bar("Starting");
    while runner.is_running(&job_id) {
        if let Ok(status) = store.get(&job_id) {
            bar.set_position(status.progress.clamp(0.0, 100.0) as u64);
            bar.set_message(status.current_label);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    let result = runner.wait(&job_id);
    let status = store.get(&job_id)?;

    match (result, status.state) {
        (Ok(rendered), JobState::Completed) => {
            bar.set_position(100);
            bar.finish_with_message("Complete");
            print_summary(&rendered, start.elapsed());
            Ok(rendered.output_path)
        }
        (Ok(_), state) => {
            bar.abandon_with_message("Failed");
            Err(CoreError::OperationFailed(format!(
                "Job {job_id} finished in unexpected state {state:?}"
            )))
        }
        (Err(e), _) => {
            bar.abandon_with_message("Failed");
            Err(e)
        }
    }
}

fn print_summary(rendered: &PipelineOutput, elapsed: Duration) {
    for step in rendered.passthroughs() {
        if let ExecutorOutcome::PassedThrough { reason } = &step.outcome {
            warn!("{} ({}) copied through: {reason}", step.label, step.kind);
            output::print_warning(&format!("{} was skipped: {reason}", step.label));
        }
    }
    output::print_success("Render complete");
    output::print_status("Output", &rendered.output_path.display().to_string(), true);
    output::print_status("Size", &format_bytes(file_size(&rendered.output_path)), false);
    output::print_status("Time", &format_duration(elapsed.as_secs_f64()), false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn render_args(argv: &[&str]) -> RenderArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Render(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn output_dir_defaults_to_input_directory() {
        let args = render_args(&["cutlist", "render", "/videos/in.mp4", "-p", "plan.json"]);
        if std::env::var_os("CUTLIST_OUTPUT_DIR").is_none() {
            let config = create_core_config(&args).unwrap();
            assert_eq!(config.output_dir, PathBuf::from("/videos"));
        }
        assert_eq!(default_output_dir(Path::new("in.mp4")), PathBuf::from("."));
    }

    #[test]
    fn flags_override_encode_settings() {
        let args = render_args(&[
            "cutlist", "render", "in.mp4", "-p", "plan.json", "-o", "/out", "--work-dir", "/scratch",
            "--preset", "slow", "--crf", "18",
        ]);
        let config = create_core_config(&args).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/out"));
        assert_eq!(config.effective_work_dir(), Path::new("/scratch"));
        assert_eq!(config.encode.preset, "slow");
        assert_eq!(config.encode.crf, 18);
    }

    #[test]
    fn missing_input_is_rejected_before_probing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mp4");
        let args = render_args(&["cutlist", "render", missing.to_str().unwrap(), "-p", "plan.json"]);
        let err = run_render(args).unwrap_err();
        assert!(err.to_string().contains("Invalid input path"));
    }
}
