//! Error types for esmake
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration file (`.bc`) errors
#[derive(Error, Debug)]
pub enum ConfigFileError {
    /// Failed to read the document
    #[error("Failed to read configuration file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Document is not well-formed XML
    #[error("Malformed configuration file '{path}': {error}")]
    Xml { path: PathBuf, error: String },

    /// Failed to serialize the document
    #[error("Failed to serialize configuration: {error}")]
    Serialize { error: String },

    /// Failed to write the document
    #[error("Failed to write configuration file '{path}': {error}")]
    Write { path: PathBuf, error: String },
}

/// Compiler subprocess errors
#[derive(Error, Debug)]
pub enum CompilerError {
    /// Executable path does not exist
    #[error("Compiler not found: {path}")]
    MissingExecutable { path: PathBuf },

    /// Failed to spawn the subprocess
    #[error("Failed to launch '{program}': {error}")]
    Launch { program: String, error: String },

    /// I/O failure while talking to the subprocess
    #[error("Compiler I/O error: {error}")]
    Io { error: String },

    /// A stream-reader thread failed
    #[error("Failed to capture compiler {stream} output")]
    StreamCapture { stream: &'static str },

    /// The subprocess outlived the configured timeout
    #[error("Compiler timed out after {seconds}s and was killed")]
    Timeout { seconds: u64 },

    /// The invocation was cancelled and the subprocess killed
    #[error("Compilation cancelled")]
    Cancelled,
}

/// Project state persistence errors
#[derive(Error, Debug)]
pub enum StateError {
    /// Failed to read the state file
    #[error("Failed to read state file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// State file contains invalid TOML
    #[error("Failed to parse state file '{path}': {error}")]
    Parse { path: PathBuf, error: String },

    /// Failed to write the state file
    #[error("Failed to write state file '{path}': {error}")]
    Write { path: PathBuf, error: String },
}

/// Project tree traversal errors
#[derive(Error, Debug)]
pub enum ScanError {
    /// Project root does not exist or is not a directory
    #[error("Project root not found: {path}")]
    RootNotFound { path: PathBuf },

    /// Directory walk failed
    #[error("Failed to walk '{path}': {error}")]
    Walk { path: PathBuf, error: String },

    /// Failed to stat or read a file during fingerprinting
    #[error("Failed to fingerprint '{path}': {error}")]
    Fingerprint { path: PathBuf, error: String },
}

/// Settings (project manifest and global config) errors
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to read a settings file
    #[error("Failed to read settings file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Settings file contains invalid TOML
    #[error("Failed to parse settings file '{path}': {error}")]
    Parse { path: PathBuf, error: String },

    /// Failed to write a settings file
    #[error("Failed to write settings file '{path}': {error}")]
    Write { path: PathBuf, error: String },
}

/// Build pass errors
///
/// Per-item failures (one malformed configuration file, one unresolvable
/// resource) are logged and skipped inside the pass; these variants cover
/// the conditions that abort a pass as a whole.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Tree walk of the project root failed
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Build state could not be loaded or persisted
    #[error(transparent)]
    State(#[from] StateError),

    /// The pass was cancelled
    #[error("Build cancelled")]
    Cancelled,
}
