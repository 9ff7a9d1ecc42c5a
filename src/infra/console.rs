//! Console output sink
//!
//! Compiler output and build-pass commentary go through a [`Console`] so
//! a build can print to stdout under the CLI and into a buffer under
//! tests or an embedding tool.

use std::sync::{Arc, Mutex};

/// Line-oriented output sink for build passes
pub trait Console {
    /// Write one line of output
    fn println(&mut self, line: &str);
}

/// Console that prints to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn println(&mut self, line: &str) {
        println!("{line}");
    }
}

/// Console that prints to stderr
///
/// Used under `--json`, where stdout carries one JSON object per line
/// and commentary must stay off it.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrConsole;

impl Console for StderrConsole {
    fn println(&mut self, line: &str) {
        eprintln!("{line}");
    }
}

/// Console that appends lines to a shared buffer
///
/// Clones share the same buffer, so a caller can keep one clone for
/// reading while a build owns another.
#[derive(Debug, Clone, Default)]
pub struct BufferConsole {
    lines: Arc<Mutex<Vec<String>>>,
}

impl BufferConsole {
    /// Create an empty buffer console
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines captured so far
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
    }

    /// Whether any captured line contains the given text
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl Console for BufferConsole {
    fn println(&mut self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}
