//! Implementation of the 'silence', 'normalize' and 'probe' subcommands.
//!
//! Each prints a JSON document on stdout so the output can be piped into
//! other tools.

use crate::cli::{NormalizeArgs, ProbeArgs, SilenceArgs};
use crate::error::{ActionContext, CliResult};

use cutlist_core::config::DEFAULT_MAX_PLAN_OPERATIONS;
use cutlist_core::engine::{FfprobeMediaProbe, MediaProbe};
use cutlist_core::{CoreConfig, CoreError, Pipeline, load_plan, normalize_plan};

use serde::Serialize;
use std::path::{Path, PathBuf};

fn require_file(path: &Path) -> CliResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CoreError::PathError(format!(
            "Invalid input path '{}': not a file",
            path.display()
        )))
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Detects silence and returns the ranges as JSON.
pub fn run_silence(args: &SilenceArgs) -> CliResult<String> {
    require_file(&args.input)?;
    let pipeline = Pipeline::new(CoreConfig::new(PathBuf::from(".")))?;
    let ranges = pipeline
        .detect_silence(&args.input, args.min_silence, args.threshold_db)
        .during(|| format!("Detecting silence in {}", args.input.display()))?;
    log::info!("{} silent interval(s) in {}", ranges.len(), args.input.display());
    to_json(&ranges)
}

/// Normalizes a plan against a duration and returns it as JSON.
pub fn run_normalize(args: &NormalizeArgs) -> CliResult<String> {
    let total = match (&args.input, args.duration) {
        (Some(input), _) => {
            require_file(input)?;
            FfprobeMediaProbe.probe(input)?.duration_sec
        }
        (None, Some(duration)) => duration,
        (None, None) => {
            return Err(CoreError::OperationFailed(
                "Either --duration or --input is required".to_string(),
            ));
        }
    };
    if !total.is_finite() || total < 0.0 {
        return Err(CoreError::InvalidPlan(format!("Invalid duration {total}")));
    }
    let plan = load_plan(&args.plan)?;
    let plan = normalize_plan(plan, total, DEFAULT_MAX_PLAN_OPERATIONS)?;
    to_json(&plan)
}

/// Probes a file and returns its metadata as JSON.
pub fn run_probe(args: &ProbeArgs) -> CliResult<String> {
    require_file(&args.input)?;
    let info = FfprobeMediaProbe
        .probe(&args.input)
        .during(|| format!("Probing {}", args.input.display()))?;
    to_json(&info)
}
