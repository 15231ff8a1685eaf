//! Engine progress handling
//!
//! `EngineProgressHandler` turns the raw event stream of one ffmpeg run into
//! an operation percent, forwards diagnostic lines to an optional observer
//! and keeps the tail of stderr so failures carry context.

use super::invocation::FfmpegInvocation;
use super::process::{EngineEvent, FfmpegProcess, FfmpegSpawner};
use crate::error::{CoreResult, command_failed_error};
use std::collections::VecDeque;

/// Number of diagnostic lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Percent reported while the process is still running never exceeds this.
const RUNNING_PERCENT_CAP: f64 = 99.0;

/// Handler for the events of a single engine run.
pub struct EngineProgressHandler<'a> {
    expected_duration: Option<f64>,
    last_percent: f64,
    stderr_tail: VecDeque<String>,
    error_events: usize,
    on_progress: Option<&'a mut dyn FnMut(f64)>,
    on_line: Option<&'a mut dyn FnMut(&str)>,
}

impl<'a> EngineProgressHandler<'a> {
    /// Creates a handler measuring progress against `expected_duration` seconds of output.
    #[must_use]
    pub fn new(expected_duration: Option<f64>) -> Self {
        Self {
            expected_duration: expected_duration.filter(|d| d.is_finite() && *d > 0.0),
            last_percent: 0.0,
            stderr_tail: VecDeque::with_capacity(STDERR_TAIL_LINES),
            error_events: 0,
            on_progress: None,
            on_line: None,
        }
    }

    /// Receives the operation percent, 0-100, non-decreasing.
    #[must_use]
    pub fn with_progress(mut self, callback: &'a mut dyn FnMut(f64)) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Receives every diagnostic line, in stream order.
    #[must_use]
    pub fn with_line_observer(mut self, observer: &'a mut dyn FnMut(&str)) -> Self {
        self.on_line = Some(observer);
        self
    }

    /// Handles an engine event.
    pub fn handle_event(&mut self, event: EngineEvent) -> CoreResult<()> {
        match event {
            EngineEvent::Progress { time_sec } => self.handle_progress(time_sec),
            EngineEvent::Log { level, line } => self.handle_log(level, &line),
            EngineEvent::Error(error) => self.handle_error(&error),
        }
        Ok(())
    }

    /// Last few diagnostic lines, newline-joined.
    #[must_use]
    pub fn stderr_tail(&self) -> String {
        self.stderr_tail.iter().cloned().collect::<Vec<_>>().join("\n")
    }

    /// Number of error events seen so far.
    #[must_use]
    pub fn error_events(&self) -> usize {
        self.error_events
    }

    #[must_use]
    pub fn last_percent(&self) -> f64 {
        self.last_percent
    }

    /// Reports completion after a successful exit.
    pub fn finish(&mut self) {
        self.emit(100.0);
    }

    fn handle_progress(&mut self, time_sec: f64) {
        let Some(total) = self.expected_duration else {
            return;
        };
        let percent = (time_sec / total * 100.0).clamp(0.0, RUNNING_PERCENT_CAP);
        if percent > self.last_percent {
            self.emit(percent);
        }
    }

    fn handle_log(&mut self, level: log::Level, line: &str) {
        if let Some(observer) = self.on_line.as_mut() {
            observer(line);
        }
        if level == log::Level::Info || level == log::Level::Trace {
            log::trace!(target: "ffmpeg_log", "{line}");
        } else {
            log::log!(target: "ffmpeg_log", level, "{line}");
        }
        self.remember(line);
    }

    fn handle_error(&mut self, error: &str) {
        log::warn!(target: "ffmpeg_log", "ffmpeg error event: {error}");
        self.error_events += 1;
        self.remember(error);
    }

    fn remember(&mut self, line: &str) {
        if self.stderr_tail.len() == STDERR_TAIL_LINES {
            self.stderr_tail.pop_front();
        }
        self.stderr_tail.push_back(line.to_string());
    }

    fn emit(&mut self, percent: f64) {
        if percent < self.last_percent {
            return;
        }
        self.last_percent = percent;
        if let Some(callback) = self.on_progress.as_mut() {
            callback(percent);
        }
    }
}

/// Runs one invocation to completion through `handler`.
///
/// The exit status is the failure signal. A non-zero exit fails with
/// `CommandFailed` carrying the tail of the diagnostic stream, error events
/// included. Error events followed by a successful exit are logged and the
/// output is kept.
pub fn run_invocation<S: FfmpegSpawner>(
    spawner: &S,
    invocation: &FfmpegInvocation,
    mut handler: EngineProgressHandler<'_>,
) -> CoreResult<()> {
    log::debug!("Running {}: {}", invocation.purpose(), invocation.command_line());
    let mut process = spawner.spawn(invocation)?;
    process.handle_events(|event| handler.handle_event(event))?;
    let status = process.wait()?;
    if !status.success() {
        log::error!("{} exited with {}", invocation.purpose(), status);
        return Err(command_failed_error(
            invocation.purpose(),
            status,
            handler.stderr_tail(),
        ));
    }
    if handler.error_events() > 0 {
        log::warn!(
            "{} exited successfully after {} error event(s)",
            invocation.purpose(),
            handler.error_events()
        );
    }
    handler.finish();
    Ok(())
}
