//! Engine adapter: everything that talks to ffmpeg and ffprobe.
//!
//! Executors only build `FfmpegInvocation`s; spawning, event streaming,
//! progress measurement and probing live behind the `FfmpegSpawner` and
//! `MediaProbe` traits so pipelines can run against the doubles in `mocks`.

pub mod invocation;
pub mod mocks;
pub mod probe;
pub mod process;
pub mod progress;

pub use invocation::{FfmpegInvocation, FilterChain, FilterGraph, enable_between, gate};
pub use probe::{FfprobeMediaProbe, MediaInfo, MediaProbe, StreamInfo};
pub use process::{EngineEvent, FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner};
pub use progress::{EngineProgressHandler, run_invocation};
