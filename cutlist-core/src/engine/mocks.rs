//! Scripted engine doubles.
//!
//! `MockFfmpegSpawner` matches each invocation against registered argument
//! patterns, replays scripted events and exit codes, records the argument
//! lists it received and can write a dummy file at the output path (the last
//! argument). `MockMediaProbe` returns canned `MediaInfo` and
//! `MockAssetFetcher` serves canned bytes for remote URLs. All of them are
//! `Send + Sync` so they can drive pipelines running on background job
//! threads.

use super::invocation::FfmpegInvocation;
use super::probe::{MediaInfo, MediaProbe, StreamInfo};
use super::process::{EngineEvent, FfmpegProcess, FfmpegSpawner};
use crate::assets::AssetFetcher;
use crate::error::{CoreError, CoreResult, command_start_error};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(unix)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code as u32)
}

/// Mock implementation of FfmpegProcess.
#[derive(Debug, Clone)]
pub struct MockFfmpegProcess {
    events: Vec<EngineEvent>,
    exit_status: ExitStatus,
}

impl FfmpegProcess for MockFfmpegProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(EngineEvent) -> CoreResult<()>,
    {
        for event in self.events.drain(..) {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.exit_status)
    }
}

/// What a matched expectation does.
#[derive(Debug, Clone)]
enum MockOutcome {
    Run {
        events: Vec<EngineEvent>,
        exit_code: i32,
        output_bytes: Option<Vec<u8>>,
    },
    SpawnError(String),
}

#[derive(Debug, Clone)]
struct MockExpectation {
    arg_pattern: String,
    outcome: MockOutcome,
}

#[derive(Debug, Default)]
struct SpawnerState {
    expectations: Vec<MockExpectation>,
    fallback: Option<MockOutcome>,
    received_calls: Vec<Vec<String>>,
}

/// Mock implementation of FfmpegSpawner supporting multiple expectations.
///
/// Expectations are consumed in registration order; the first whose pattern
/// is contained in any argument wins. Unmatched invocations use the fallback
/// if one is set and fail to spawn otherwise.
#[derive(Debug, Clone, Default)]
pub struct MockFfmpegSpawner {
    state: Arc<Mutex<SpawnerState>>,
}

impl MockFfmpegSpawner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeeds, replaying `events`, optionally writing a dummy output file.
    pub fn add_success_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<EngineEvent>,
        create_dummy_output: bool,
    ) {
        self.push(
            arg_pattern,
            MockOutcome::Run {
                events,
                exit_code: 0,
                output_bytes: create_dummy_output.then(|| b"mock output".to_vec()),
            },
        );
    }

    /// Succeeds and writes `bytes` to the output path.
    pub fn add_output_expectation(&self, arg_pattern: &str, events: Vec<EngineEvent>, bytes: &[u8]) {
        self.push(
            arg_pattern,
            MockOutcome::Run {
                events,
                exit_code: 0,
                output_bytes: Some(bytes.to_vec()),
            },
        );
    }

    /// Runs, replays `events` and exits with `exit_code`.
    pub fn add_exit_error_expectation(&self, arg_pattern: &str, events: Vec<EngineEvent>, exit_code: i32) {
        self.push(
            arg_pattern,
            MockOutcome::Run {
                events,
                exit_code,
                output_bytes: None,
            },
        );
    }

    /// Fails to spawn with the given message.
    pub fn add_spawn_error_expectation(&self, arg_pattern: &str, message: &str) {
        self.push(arg_pattern, MockOutcome::SpawnError(message.to_string()));
    }

    /// Every unmatched invocation succeeds and writes a dummy output.
    pub fn set_fallback_success(&self) {
        lock(&self.state).fallback = Some(MockOutcome::Run {
            events: Vec::new(),
            exit_code: 0,
            output_bytes: Some(b"mock output".to_vec()),
        });
    }

    /// Argument lists received so far, in call order.
    #[must_use]
    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        lock(&self.state).received_calls.clone()
    }

    /// Number of expectations not yet consumed.
    #[must_use]
    pub fn pending_expectations(&self) -> usize {
        lock(&self.state).expectations.len()
    }

    fn push(&self, arg_pattern: &str, outcome: MockOutcome) {
        lock(&self.state).expectations.push(MockExpectation {
            arg_pattern: arg_pattern.to_string(),
            outcome,
        });
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, invocation: &FfmpegInvocation) -> CoreResult<Self::Process> {
        let args = invocation.args().to_vec();
        let outcome = {
            let mut state = lock(&self.state);
            state.received_calls.push(args.clone());
            let found = state
                .expectations
                .iter()
                .position(|exp| args.iter().any(|arg| arg.contains(&exp.arg_pattern)));
            match found {
                Some(index) => {
                    let expectation = state.expectations.remove(index);
                    log::debug!(
                        "MockFfmpegSpawner: matched expectation '{}'",
                        expectation.arg_pattern
                    );
                    Some(expectation.outcome)
                }
                None => state.fallback.clone(),
            }
        };

        match outcome {
            Some(MockOutcome::Run {
                events,
                exit_code,
                output_bytes,
            }) => {
                if let Some(bytes) = output_bytes {
                    write_dummy_output(&args, &bytes);
                }
                Ok(MockFfmpegProcess {
                    events,
                    exit_status: exit_status(exit_code),
                })
            }
            Some(MockOutcome::SpawnError(message)) => {
                Err(command_start_error(invocation.purpose(), message))
            }
            None => {
                log::error!("MockFfmpegSpawner: no expectation for {:?}", args);
                Err(command_start_error(
                    invocation.purpose(),
                    "MockFfmpegSpawner: no expectation matched",
                ))
            }
        }
    }
}

fn write_dummy_output(args: &[String], bytes: &[u8]) {
    let Some(output) = args.last().filter(|a| a.as_str() != "-") else {
        log::warn!("MockFfmpegSpawner couldn't find an output path in args");
        return;
    };
    let output_path = PathBuf::from(output);
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            log::error!("MockFfmpegSpawner failed to create {}: {e}", parent.display());
        }
    }
    if let Err(e) = std::fs::write(&output_path, bytes) {
        log::error!(
            "MockFfmpegSpawner failed to create dummy output {}: {e}",
            output_path.display()
        );
    }
}

/// Mock implementation of MediaProbe.
#[derive(Debug, Clone, Default)]
pub struct MockMediaProbe {
    default_info: Arc<Mutex<Option<MediaInfo>>>,
    per_path: Arc<Mutex<HashMap<PathBuf, MediaInfo>>>,
    calls: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockMediaProbe {
    /// Probe answering every path with `info`.
    #[must_use]
    pub fn with_default(info: MediaInfo) -> Self {
        let probe = Self::default();
        *lock(&probe.default_info) = Some(info);
        probe
    }

    /// Overrides the answer for one path.
    pub fn expect(&self, path: &Path, info: MediaInfo) {
        lock(&self.per_path).insert(path.to_path_buf(), info);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<PathBuf> {
        lock(&self.calls).clone()
    }
}

impl MediaProbe for MockMediaProbe {
    fn probe(&self, path: &Path) -> CoreResult<MediaInfo> {
        lock(&self.calls).push(path.to_path_buf());
        if let Some(info) = lock(&self.per_path).get(path) {
            return Ok(info.clone());
        }
        lock(&self.default_info).clone().ok_or_else(|| {
            CoreError::FfprobeParse(format!(
                "MockMediaProbe: no expectation set for {}",
                path.display()
            ))
        })
    }
}

/// Mock implementation of AssetFetcher. Unknown URLs fail like an
/// unreachable host.
#[derive(Debug, Clone, Default)]
pub struct MockAssetFetcher {
    responses: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockAssetFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `bytes` for `url`.
    pub fn serve(&self, url: &str, bytes: &[u8]) {
        lock(&self.responses).insert(url.to_string(), bytes.to_vec());
    }

    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }
}

impl AssetFetcher for MockAssetFetcher {
    fn fetch(&self, url: &str) -> CoreResult<Vec<u8>> {
        lock(&self.requests).push(url.to_string());
        lock(&self.responses)
            .get(url)
            .cloned()
            .ok_or_else(|| CoreError::asset(url, "connection refused"))
    }
}

/// Builds `MediaInfo` for a clip with one video stream and, optionally, one audio stream.
#[must_use]
pub fn sample_media_info(duration_sec: f64, with_audio: bool) -> MediaInfo {
    let mut streams = vec![StreamInfo {
        index: 0,
        codec_type: "video".to_string(),
        codec_name: Some("h264".to_string()),
    }];
    if with_audio {
        streams.push(StreamInfo {
            index: 1,
            codec_type: "audio".to_string(),
            codec_name: Some("aac".to_string()),
        });
    }
    MediaInfo {
        duration_sec,
        width: Some(1280),
        height: Some(720),
        streams,
    }
}

/// Builds `MediaInfo` for an audio-only file.
#[must_use]
pub fn sample_audio_info(duration_sec: f64) -> MediaInfo {
    MediaInfo {
        duration_sec,
        width: None,
        height: None,
        streams: vec![StreamInfo {
            index: 0,
            codec_type: "audio".to_string(),
            codec_name: Some("aac".to_string()),
        }],
    }
}
