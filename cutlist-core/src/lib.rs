//! Core library for running declarative edit plans against video files using
//! ffmpeg and ffprobe.
//!
//! An edit plan is an ordered list of operations (silence removal, effects,
//! color grades, captions, overlays, trims and speed changes), each with a
//! time window. The pipeline runs them one after another, every step reading
//! the previous step's output, and commits a single final render.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use cutlist_core::{CoreConfig, Pipeline, normalize_plan, parse_plan};
//! use cutlist_core::pipeline::PipelineProgress;
//! use std::path::{Path, PathBuf};
//!
//! let mut config = CoreConfig::new(PathBuf::from("/srv/renders"));
//! config.encode.crf = 20;
//!
//! let pipeline = Pipeline::new(config).unwrap();
//! let source = Path::new("/srv/uploads/interview.mp4");
//! let info = pipeline.probe_media(source).unwrap();
//!
//! let plan = parse_plan(r#"[
//!     {"id": "1", "op": "remove_silence", "startSec": 0, "endSec": 0},
//!     {"id": "2", "op": "effect", "startSec": 0, "endSec": 5,
//!      "params": {"effect": "blur", "strength": 50}}
//! ]"#).unwrap();
//! let plan = normalize_plan(plan, info.duration_sec, 50).unwrap();
//!
//! let output = pipeline
//!     .run(source, &plan, |p: PipelineProgress| println!("{:.0}% {}", p.percent, p.label))
//!     .unwrap();
//! println!("{}", output.output_path.display());
//! ```

pub mod analysis;
pub mod assets;
pub mod config;
pub mod engine;
pub mod error;
pub mod executors;
pub mod jobs;
pub mod logging;
pub mod pipeline;
pub mod plan;
pub mod utils;

// Re-exports for public API
pub use analysis::SilenceRange;
pub use assets::{AssetReference, AssetRole};
pub use config::{CoreConfig, EncodeSettings, SilenceDefaults};
pub use engine::{MediaInfo, MediaProbe};
pub use error::{CoreError, CoreResult};
pub use executors::ExecutorOutcome;
pub use jobs::{JobRunner, JobState, JobStatus, JobStore};
pub use pipeline::{Pipeline, PipelineOutput, PipelineProgress, ProgressSink};
pub use plan::{EditAction, EditOperation, OperationKind, Plan, load_plan, normalize_plan, parse_plan};
pub use utils::{format_bytes, format_duration, parse_ffmpeg_time};
