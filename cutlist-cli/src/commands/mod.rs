//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Renders an edit plan through a background job.
pub mod render;

/// Prints detected silence, probe data and normalized plans as JSON.
pub mod inspect;
