//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress spinners,
//! status-prefixed messages, and error chains to the user. The global
//! `--quiet` and `--json` flags are applied once at startup and consulted
//! by the print helpers, so command code never threads them through.

use std::sync::atomic::{AtomicBool, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

static QUIET: AtomicBool = AtomicBool::new(false);
static JSON: AtomicBool = AtomicBool::new(false);

/// Output preferences taken from the global CLI flags
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    /// Suppress informational output
    pub quiet: bool,
    /// Machine-readable problem output
    pub json: bool,
    /// Verbosity level from repeated `-v` flags
    pub verbose: u8,
}

impl OutputConfig {
    /// Create a configuration from the parsed CLI flags
    #[must_use]
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    /// Publish this configuration for the print helpers
    pub fn apply_global(&self) {
        QUIET.store(self.quiet, Ordering::Relaxed);
        JSON.store(self.json, Ordering::Relaxed);
    }
}

/// Whether `--quiet` is in effect
#[must_use]
pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Whether `--json` is in effect
#[must_use]
pub fn is_json() -> bool {
    JSON.load(Ordering::Relaxed)
}

/// Create a spinner for operations with unknown duration
///
/// Returns a hidden bar under `--quiet` or `--json` so callers can drive
/// it unconditionally.
pub fn create_spinner(message: &str) -> ProgressBar {
    if is_quiet() || is_json() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.blue} {msg}")
            .expect("Invalid spinner template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Print a success line with the `✓` prefix
pub fn print_success(message: &str) {
    if !is_quiet() {
        println!("{} {message}", status::SUCCESS);
    }
}

/// Print an indented detail line under a status message
pub fn print_detail(message: &str) {
    if !is_quiet() {
        println!("  {message}");
    }
}

/// Print a warning line with the `⚠` prefix
pub fn print_warning(message: &str) {
    if !is_quiet() {
        println!("{} {message}", status::WARNING);
    }
}

/// Print an error and its cause chain to stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_error_walks_the_chain() {
        // Smoke check that chained context does not panic the formatter.
        let error = anyhow::anyhow!("root cause").context("outer layer");
        display_error(&error);
    }

    #[test]
    fn test_output_config_round_trips_flags() {
        let config = OutputConfig::new(false, false, 2);
        config.apply_global();
        assert!(!is_quiet());
        assert!(!is_json());
        assert_eq!(config.verbose, 2);
    }
}
