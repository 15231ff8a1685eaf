//! Media analysis passes.

pub mod silence;

pub use silence::{SilenceParser, SilenceRange, detect_silence, silence_detect_invocation};
