//! Compiler option strings
//!
//! Parses the flat switch string stored in a configuration file into typed
//! fields and serializes it back to a normalized string or an argument
//! vector for process invocation. Unrecognized tokens are preserved
//! verbatim and passed through to the compiler.

use std::iter::Peekable;
use std::str::SplitWhitespace;

/// Typed view of a compiler option string
///
/// The recognized switches mirror the external compiler's surface:
/// `--debug`, `--optimize <n>`, `--out <path>`, `--searchpath <path>`,
/// `--standard`, `--strict`, `--verbose`, `--warn <n>`. Everything else
/// lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerOptions {
    /// `--debug`: emit symbolic debug information
    pub debug: bool,
    /// `--optimize <n>`: optimization level
    pub optimize: Option<String>,
    /// `--out <path>`: output module path
    pub out: Option<String>,
    /// `--searchpath <path>`: module search path
    pub searchpath: Option<String>,
    /// `--standard`: compile in standard mode
    pub standard: bool,
    /// `--strict`: compile in strict mode
    pub strict: bool,
    /// `--verbose`: verbose compiler output
    pub verbose: bool,
    /// `--warn <n>`: warning level
    pub warn: Option<String>,
    /// Unrecognized tokens, preserved in input order
    pub extra: Vec<String>,
}

impl CompilerOptions {
    /// Parse an options string
    ///
    /// Tokenizes on whitespace. A value-taking switch at the end of the
    /// input with no following token is dropped with a warning rather
    /// than failing the parse.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut options = Self::default();
        let mut tokens = input.split_whitespace().peekable();

        while let Some(token) = tokens.next() {
            match token {
                "--debug" => options.debug = true,
                "--standard" => options.standard = true,
                "--strict" => options.strict = true,
                "--verbose" => options.verbose = true,
                "--optimize" => {
                    if let Some(value) = take_value(token, &mut tokens) {
                        options.optimize = Some(value);
                    }
                }
                "--out" => {
                    if let Some(value) = take_value(token, &mut tokens) {
                        options.out = Some(value);
                    }
                }
                "--searchpath" => {
                    if let Some(value) = take_value(token, &mut tokens) {
                        options.searchpath = Some(value);
                    }
                }
                "--warn" => {
                    if let Some(value) = take_value(token, &mut tokens) {
                        options.warn = Some(value);
                    }
                }
                other => options.extra.push(other.to_string()),
            }
        }

        options
    }

    /// Serialize to discrete process arguments
    ///
    /// Switches are emitted in a fixed order; extra tokens follow as
    /// independent arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.debug {
            args.push("--debug".to_string());
        }
        if let Some(level) = &self.optimize {
            args.push("--optimize".to_string());
            args.push(level.clone());
        }
        if let Some(path) = &self.out {
            args.push("--out".to_string());
            args.push(path.clone());
        }
        if let Some(path) = &self.searchpath {
            args.push("--searchpath".to_string());
            args.push(path.clone());
        }
        if self.standard {
            args.push("--standard".to_string());
        }
        if self.strict {
            args.push("--strict".to_string());
        }
        if self.verbose {
            args.push("--verbose".to_string());
        }
        if let Some(level) = &self.warn {
            args.push("--warn".to_string());
            args.push(level.clone());
        }
        args.extend(self.extra.iter().cloned());

        args
    }

    /// Serialize to a normalized options string
    ///
    /// Not byte-identical to the parsed input in general (switch order is
    /// normalized), but guaranteed to re-parse to an equal value.
    #[must_use]
    pub fn to_command_string(&self) -> String {
        self.to_args().join(" ")
    }

    /// Whether no switch is enabled and no extra token is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Consume the value token following a switch, warning when it is missing
fn take_value(switch: &str, tokens: &mut Peekable<SplitWhitespace<'_>>) -> Option<String> {
    match tokens.next() {
        Some(value) => Some(value.to_string()),
        None => {
            tracing::warn!("ignoring '{switch}': no value follows it");
            None
        }
    }
}
