// cutlist-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use cutlist_core::config::{DEFAULT_MIN_SILENCE_SEC, DEFAULT_SILENCE_THRESHOLD_DB};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Cutlist: Apply edit plans to video files",
    long_about = "Runs declarative edit plans (silence removal, effects, captions, overlays, trims and speed changes) through ffmpeg via the cutlist-core library."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Write logs to a file in this directory instead of the terminal.
    #[arg(long, global = true, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Renders an edit plan against an input video
    Render(RenderArgs),
    /// Prints the silent intervals of a file as JSON
    Silence(SilenceArgs),
    /// Clamps a plan to a duration and prints it as JSON
    Normalize(NormalizeArgs),
    /// Prints ffprobe metadata of a file as JSON
    Probe(ProbeArgs),
}

impl Commands {
    /// Short name used in log file names.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Render(_) => "render",
            Commands::Silence(_) => "silence",
            Commands::Normalize(_) => "normalize",
            Commands::Probe(_) => "probe",
        }
    }
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Source video
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Edit plan JSON: an array of operations or {"operations": [...]}
    #[arg(short, long, value_name = "PLAN_JSON")]
    pub plan: PathBuf,

    /// Directory for the final render (defaults to the input's directory)
    #[arg(short, long, value_name = "OUTPUT_DIR", env = "CUTLIST_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory for intermediate files (defaults to OUTPUT_DIR)
    #[arg(long, value_name = "WORK_DIR", env = "CUTLIST_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// x264 preset used for every re-encode
    #[arg(long, value_name = "PRESET", env = "CUTLIST_PRESET")]
    pub preset: Option<String>,

    /// CRF used for every re-encode (0-51, lower is higher quality)
    #[arg(long, value_name = "CRF", env = "CUTLIST_CRF", value_parser = clap::value_parser!(u8).range(0..=51))]
    pub crf: Option<u8>,

    /// Use the plan's time windows as given instead of clamping them to the input
    #[arg(long, default_value_t = false)]
    pub no_normalize: bool,
}

#[derive(Args, Debug)]
pub struct SilenceArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Shortest gap, in seconds, reported as silence
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_MIN_SILENCE_SEC)]
    pub min_silence: f64,

    /// Level in dB below which audio counts as silent
    #[arg(long, value_name = "DB", default_value_t = DEFAULT_SILENCE_THRESHOLD_DB, allow_negative_numbers = true)]
    pub threshold_db: f64,
}

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    #[arg(short, long, value_name = "PLAN_JSON")]
    pub plan: PathBuf,

    /// Total duration in seconds to clamp against
    #[arg(long, value_name = "SECONDS", conflicts_with = "input", required_unless_present = "input")]
    pub duration: Option<f64>,

    /// Probe this file for the duration instead
    #[arg(short, long, value_name = "INPUT")]
    pub input: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_takes_input_and_plan() {
        let cli = Cli::try_parse_from([
            "cutlist", "render", "in.mp4", "--plan", "plan.json", "--crf", "20", "--no-normalize",
        ])
        .unwrap();
        match cli.command {
            Commands::Render(args) => {
                assert_eq!(args.input, PathBuf::from("in.mp4"));
                assert_eq!(args.plan, PathBuf::from("plan.json"));
                assert_eq!(args.crf, Some(20));
                assert!(args.no_normalize);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn render_requires_a_plan() {
        assert!(Cli::try_parse_from(["cutlist", "render", "in.mp4"]).is_err());
    }

    #[test]
    fn crf_is_range_checked() {
        assert!(Cli::try_parse_from(["cutlist", "render", "in.mp4", "-p", "p.json", "--crf", "60"]).is_err());
    }

    #[test]
    fn silence_defaults_and_negative_threshold() {
        let cli = Cli::try_parse_from(["cutlist", "silence", "a.mp4"]).unwrap();
        let Commands::Silence(args) = cli.command else {
            panic!("expected silence");
        };
        assert_eq!(args.min_silence, 0.6);
        assert_eq!(args.threshold_db, -30.0);

        let cli = Cli::try_parse_from(["cutlist", "silence", "a.mp4", "--threshold-db", "-45"]).unwrap();
        let Commands::Silence(args) = cli.command else {
            panic!("expected silence");
        };
        assert_eq!(args.threshold_db, -45.0);
    }

    #[test]
    fn normalize_needs_exactly_one_duration_source() {
        assert!(Cli::try_parse_from(["cutlist", "normalize", "-p", "p.json"]).is_err());
        assert!(
            Cli::try_parse_from([
                "cutlist", "normalize", "-p", "p.json", "--duration", "30", "--input", "a.mp4"
            ])
            .is_err()
        );
        let cli = Cli::try_parse_from(["cutlist", "normalize", "-p", "p.json", "--duration", "30"]).unwrap();
        assert_eq!(cli.command.name(), "normalize");
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["cutlist", "probe", "a.mp4", "--verbose", "--log-dir", "logs"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.log_dir, Some(PathBuf::from("logs")));
    }
}
