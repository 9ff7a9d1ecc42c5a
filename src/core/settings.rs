//! Project and global settings
//!
//! esmake reads settings from two places: the project manifest
//! (`esmake.toml` at the project root) and the per-user global settings
//! (`config.toml` in the esmake config directory). Values resolve with
//! priority: CLI flag > project manifest > global settings > built-in
//! default. The built-in default for the compiler executable is a `PATH`
//! lookup of `ec`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::defaults::{DEFAULT_COMPILER, DEFAULT_COMPILER_OPTIONS};
use crate::error::SettingsError;
use crate::infra::dirs::EsmakeDirs;

/// The project manifest (esmake.toml)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSettings {
    /// Project identity
    pub project: ProjectSection,

    /// Compiler overrides for this project
    #[serde(default)]
    pub compiler: CompilerSection,
}

/// Project-level identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSection {
    /// Project name
    pub name: String,

    /// Project description
    #[serde(default)]
    pub description: Option<String>,
}

/// Compiler settings shared by the manifest and the global file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompilerSection {
    /// Compiler executable path
    pub path: Option<PathBuf>,

    /// Options string applied to newly created configurations
    pub options: Option<String>,

    /// Subprocess timeout in seconds
    pub timeout: Option<u64>,
}

/// Per-user global settings (config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GlobalSettings {
    /// Compiler defaults applying across projects
    #[serde(default)]
    pub compiler: CompilerSection,
}

impl ProjectSettings {
    /// Create a manifest for a new project
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            project: ProjectSection {
                name: name.into(),
                description: None,
            },
            compiler: CompilerSection::default(),
        }
    }

    /// Load the manifest from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid
    /// TOML. A missing manifest is an error here; callers that treat it
    /// as "not a project" check for existence first.
    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Save the manifest to a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_to_path(&self, path: &Path) -> Result<(), SettingsError> {
        let content = toml::to_string_pretty(self).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        fs::write(path, content).map_err(|e| SettingsError::Write {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }
}

impl GlobalSettings {
    /// Load global settings from the config directory
    ///
    /// If the settings file doesn't exist, returns defaults. If it exists
    /// but is invalid, returns an error.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Parse` if the file exists but contains
    /// invalid TOML.
    pub fn load(dirs: &EsmakeDirs) -> Result<Self, SettingsError> {
        Self::load_from_path(&dirs.global_settings_path())
    }

    /// Load global settings from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Save global settings to a specific path
    ///
    /// Creates parent directories if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation, serialization, or the
    /// write fails.
    pub fn save_to_path(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SettingsError::Write {
                path: parent.to_path_buf(),
                error: e.to_string(),
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        fs::write(path, content).map_err(|e| SettingsError::Write {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }
}

/// Where a resolved setting value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingSource {
    /// Value from a CLI argument (highest priority)
    Cli,
    /// Value from the project manifest
    Project,
    /// Value from the global settings file
    Global,
    /// Built-in default (lowest priority)
    Default,
}

impl SettingSource {
    /// Human-readable label for console output
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cli => "command line",
            Self::Project => "project manifest",
            Self::Global => "global settings",
            Self::Default => "default",
        }
    }
}

/// A resolved compiler executable and where it came from
#[derive(Debug, Clone)]
pub struct ResolvedCompiler {
    /// Executable path to invoke
    pub path: PathBuf,
    /// Where the path came from
    pub source: SettingSource,
}

/// Resolve the compiler executable with priority: CLI > Project > Global >
/// `PATH` lookup
///
/// When nothing is configured and the `PATH` lookup fails, the bare
/// executable name is returned; the runner's existence check turns that
/// into a proper missing-compiler error at invocation time.
#[must_use]
pub fn resolve_compiler(
    cli_path: Option<&Path>,
    project: Option<&ProjectSettings>,
    global: &GlobalSettings,
) -> ResolvedCompiler {
    if let Some(path) = cli_path {
        ResolvedCompiler {
            path: path.to_path_buf(),
            source: SettingSource::Cli,
        }
    } else if let Some(path) = project.and_then(|p| p.compiler.path.as_ref()) {
        ResolvedCompiler {
            path: path.clone(),
            source: SettingSource::Project,
        }
    } else if let Some(path) = &global.compiler.path {
        ResolvedCompiler {
            path: path.clone(),
            source: SettingSource::Global,
        }
    } else {
        ResolvedCompiler {
            path: which::which(DEFAULT_COMPILER)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_COMPILER)),
            source: SettingSource::Default,
        }
    }
}

/// Resolve the subprocess timeout with priority: CLI > Project > Global
///
/// There is no built-in timeout; an unconfigured value means the runner
/// waits as long as the compiler runs.
#[must_use]
pub fn resolve_timeout(
    cli_seconds: Option<u64>,
    project: Option<&ProjectSettings>,
    global: &GlobalSettings,
) -> Option<Duration> {
    cli_seconds
        .or_else(|| project.and_then(|p| p.compiler.timeout))
        .or(global.compiler.timeout)
        .map(Duration::from_secs)
}

/// Resolve the options string applied to newly created configurations
#[must_use]
pub fn resolve_default_options(
    project: Option<&ProjectSettings>,
    global: &GlobalSettings,
) -> String {
    project
        .and_then(|p| p.compiler.options.clone())
        .or_else(|| global.compiler.options.clone())
        .unwrap_or_else(|| DEFAULT_COMPILER_OPTIONS.to_string())
}
