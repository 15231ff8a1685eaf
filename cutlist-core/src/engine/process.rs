// ============================================================================
// cutlist-core/src/engine/process.rs
// ============================================================================
//
// FFMPEG PROCESS: Process spawning and event streaming
//
// This module provides the seam between executors and the ffmpeg binary.
// Executors hand an `FfmpegInvocation` to an `FfmpegSpawner`; the resulting
// `FfmpegProcess` streams `EngineEvent`s until the process exits.
//
// KEY COMPONENTS:
// - EngineEvent: Progress, diagnostic and error events from a running process
// - FfmpegProcess: Trait representing an active FFmpeg process
// - FfmpegSpawner: Trait for creating new FFmpeg processes
// - SidecarSpawner: Concrete implementation using ffmpeg-sidecar

use super::invocation::FfmpegInvocation;
use crate::error::{CoreResult, command_start_error, command_wait_error};
use crate::utils::parse_ffmpeg_time;
use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel as FfmpegLogLevel};
use std::process::ExitStatus;

/// An event observed while an ffmpeg process runs.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Output timestamp reached so far, in seconds.
    Progress { time_sec: f64 },
    /// One diagnostic line from stderr.
    Log { level: log::Level, line: String },
    /// An error reported by the process or by event parsing.
    Error(String),
}

impl EngineEvent {
    /// Shorthand for a diagnostic line at info level.
    pub fn info(line: impl Into<String>) -> Self {
        EngineEvent::Log {
            level: log::Level::Info,
            line: line.into(),
        }
    }

    /// Converts a sidecar event; events the pipeline does not consume map to `None`.
    #[must_use]
    pub fn from_sidecar(event: FfmpegEvent) -> Option<Self> {
        match event {
            FfmpegEvent::Progress(progress) => {
                parse_ffmpeg_time(&progress.time).map(|time_sec| EngineEvent::Progress { time_sec })
            }
            FfmpegEvent::Log(level, line) => Some(EngineEvent::Log {
                level: map_ffmpeg_log_level(&level),
                line,
            }),
            FfmpegEvent::Error(error) => Some(EngineEvent::Error(error)),
            _ => None,
        }
    }
}

/// Maps `FFmpeg` log level to Rust log level
fn map_ffmpeg_log_level(level: &FfmpegLogLevel) -> log::Level {
    match level {
        FfmpegLogLevel::Fatal | FfmpegLogLevel::Error => log::Level::Error,
        FfmpegLogLevel::Warning => log::Level::Warn,
        FfmpegLogLevel::Info => log::Level::Info,
        _ => log::Level::Trace,
    }
}

// --- FFmpeg Execution Abstraction ---

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Processes events from the running command using a provided handler closure.
    fn handle_events<F>(&mut self, handler: F) -> CoreResult<()>
    where
        F: FnMut(EngineEvent) -> CoreResult<()>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> CoreResult<ExitStatus>;
}

/// Trait representing something that can spawn an FfmpegProcess.
pub trait FfmpegSpawner {
    type Process: FfmpegProcess;

    /// Spawns ffmpeg for the given invocation.
    fn spawn(&self, invocation: &FfmpegInvocation) -> CoreResult<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
pub struct SidecarProcess {
    child: FfmpegChild,
    purpose: String,
}

impl FfmpegProcess for SidecarProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(EngineEvent) -> CoreResult<()>,
    {
        let iterator = self.child.iter().map_err(|e| {
            log::error!("Failed to get ffmpeg event iterator: {e}");
            command_start_error(format!("{} (event stream)", self.purpose), e)
        })?;
        for event in iterator {
            if let Some(event) = EngineEvent::from_sidecar(event) {
                handler(event)?;
            }
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        self.child
            .wait()
            .map_err(|e| command_wait_error(self.purpose.clone(), e))
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, invocation: &FfmpegInvocation) -> CoreResult<Self::Process> {
        let mut cmd = FfmpegCommand::new();
        cmd.args(invocation.args());
        log::debug!("Spawning {}: {}", invocation.purpose(), invocation.command_line());
        cmd.spawn()
            .map(|child| SidecarProcess {
                child,
                purpose: invocation.purpose().to_string(),
            })
            .map_err(|e| command_start_error(invocation.purpose(), e))
    }
}
