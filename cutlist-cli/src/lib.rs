// cutlist-cli/src/lib.rs
//
// Library portion of the Cutlist CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, NormalizeArgs, ProbeArgs, RenderArgs, SilenceArgs};
pub use commands::inspect::{run_normalize, run_probe, run_silence};
pub use commands::render::run_render;
