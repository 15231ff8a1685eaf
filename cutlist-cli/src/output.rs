// ============================================================================
// cutlist-cli/src/output.rs
// ============================================================================
//
// TERMINAL OUTPUT: Styled status lines and the render progress bar
//
// Human-facing lines go to stderr so that commands printing JSON keep stdout
// machine-readable.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Print a section header
pub fn print_section(title: &str) {
    eprintln!();
    eprintln!("===== {} =====", style(title.to_uppercase()).cyan().bold());
}

/// Print a status line (key-value pair)
pub fn print_status(label: &str, value: &str, highlight: bool) {
    let padding = 15usize.saturating_sub(label.len()).max(1);
    let value = if highlight {
        style(value).bold().to_string()
    } else {
        value.to_string()
    };
    eprintln!("  {label}:{} {value}", " ".repeat(padding));
}

pub fn print_success(message: &str) {
    eprintln!("{} {}", style("✓").green(), message);
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", style("⚠").yellow(), style(message).yellow());
}

/// Print an error message with red styling
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), message);
}

/// Progress bar for a render, measured in whole percent.
pub fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    let bar_style = ProgressStyle::default_bar()
        .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos:>3}% ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    pb.set_style(bar_style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
