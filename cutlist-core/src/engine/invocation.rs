//! FFmpeg invocation builder utilities
//!
//! Executors describe the engine run they need as an `FfmpegInvocation`: an
//! ordered argument list that stays inspectable until a spawner turns it into
//! a real process. Filter expressions are assembled with `FilterChain`
//! (comma-joined) and `FilterGraph` (semicolon-joined).

use crate::config::EncodeSettings;
use crate::utils::fmt_num;
use std::path::Path;

/// A fully described ffmpeg run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegInvocation {
    purpose: String,
    args: Vec<String>,
}

impl FfmpegInvocation {
    /// Starts an invocation that overwrites its output and hides the banner.
    #[must_use]
    pub fn new(purpose: impl Into<String>) -> Self {
        Self {
            purpose: purpose.into(),
            args: vec!["-hide_banner".to_string(), "-y".to_string()],
        }
    }

    /// Short description used in logs and error messages, e.g. `ffmpeg (trim)`.
    #[must_use]
    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The argument list joined for logging.
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut line = String::from("ffmpeg");
        for arg in &self.args {
            line.push(' ');
            if arg.contains(' ') || arg.contains(';') || arg.is_empty() {
                line.push('"');
                line.push_str(arg);
                line.push('"');
            } else {
                line.push_str(arg);
            }
        }
        line
    }

    /// True when any argument contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.args.iter().any(|a| a.contains(needle))
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args_from<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds `-i path`.
    #[must_use]
    pub fn input(self, path: &Path) -> Self {
        self.input_with(&[], path)
    }

    /// Adds input options followed by `-i path`, e.g. `-ss 10 -i in.mp4`.
    #[must_use]
    pub fn input_with(mut self, options: &[&str], path: &Path) -> Self {
        self.args.extend(options.iter().map(|o| (*o).to_string()));
        self.args.push("-i".to_string());
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Adds `-ss` before the next input.
    #[must_use]
    pub fn seek(self, seconds: f64) -> Self {
        self.arg("-ss").arg(fmt_num(seconds))
    }

    /// Adds an output duration limit.
    #[must_use]
    pub fn duration(self, seconds: f64) -> Self {
        self.arg("-t").arg(fmt_num(seconds))
    }

    #[must_use]
    pub fn filter_complex(self, graph: impl Into<String>) -> Self {
        self.arg("-filter_complex").arg(graph)
    }

    #[must_use]
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.arg("-vf").arg(filter)
    }

    #[must_use]
    pub fn audio_filter(self, filter: impl Into<String>) -> Self {
        self.arg("-af").arg(filter)
    }

    #[must_use]
    pub fn map(self, spec: impl Into<String>) -> Self {
        self.arg("-map").arg(spec)
    }

    /// Re-encodes video with the configured codec, preset, CRF and pixel format.
    #[must_use]
    pub fn encode_video(self, settings: &EncodeSettings) -> Self {
        self.arg("-c:v")
            .arg(settings.video_codec.clone())
            .arg("-preset")
            .arg(settings.preset.clone())
            .arg("-crf")
            .arg(settings.crf.to_string())
            .arg("-pix_fmt")
            .arg(settings.pixel_format.clone())
    }

    #[must_use]
    pub fn encode_audio(self, settings: &EncodeSettings) -> Self {
        self.arg("-c:a").arg(settings.audio_codec.clone())
    }

    #[must_use]
    pub fn copy_video(self) -> Self {
        self.arg("-c:v").arg("copy")
    }

    #[must_use]
    pub fn copy_audio(self) -> Self {
        self.arg("-c:a").arg("copy")
    }

    /// Drops audio from the output.
    #[must_use]
    pub fn no_audio(self) -> Self {
        self.arg("-an")
    }

    /// Truncates the output to the shortest mapped stream.
    #[must_use]
    pub fn shortest(self) -> Self {
        self.arg("-shortest")
    }

    /// Adds container flags from the encode settings.
    #[must_use]
    pub fn container_flags(self, settings: &EncodeSettings) -> Self {
        match &settings.movflags {
            Some(flags) => self.arg("-movflags").arg(flags.clone()),
            None => self,
        }
    }

    /// Finishes with the output path. The output path is always the last argument.
    #[must_use]
    pub fn output(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Finishes with a discarding muxer, for analysis runs.
    #[must_use]
    pub fn null_output(self) -> Self {
        self.arg("-f").arg("null").arg("-")
    }
}

/// Builder for comma-separated filter chains.
#[derive(Debug, Default, Clone)]
pub struct FilterChain {
    filters: Vec<String>,
}

impl FilterChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter; empty strings are ignored.
    #[must_use]
    pub fn add(mut self, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        if !filter.is_empty() {
            self.filters.push(filter);
        }
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Builds the chain, or `None` when nothing was added.
    #[must_use]
    pub fn build(self) -> Option<String> {
        if self.filters.is_empty() {
            None
        } else {
            Some(self.filters.join(","))
        }
    }
}

/// Builder for semicolon-separated filter graphs.
#[derive(Debug, Default, Clone)]
pub struct FilterGraph {
    chains: Vec<String>,
}

impl FilterGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a labelled chain, e.g. `[0:v]trim=start=0:end=5[v0]`.
    #[must_use]
    pub fn chain(mut self, chain: impl Into<String>) -> Self {
        self.chains.push(chain.into());
        self
    }

    pub fn push(&mut self, chain: impl Into<String>) {
        self.chains.push(chain.into());
    }

    #[must_use]
    pub fn build(self) -> String {
        self.chains.join(";")
    }
}

/// Timeline predicate that keeps a filter active only inside `[start, end]`.
#[must_use]
pub fn enable_between(start: f64, end: f64) -> String {
    format!("enable='between(t,{},{})'", fmt_num(start), fmt_num(end))
}

/// Appends the timeline predicate to a filter as its last option.
#[must_use]
pub fn gate(filter: &str, start: f64, end: f64) -> String {
    let separator = if filter.contains('=') { ':' } else { '=' };
    format!("{filter}{separator}{}", enable_between(start, end))
}
