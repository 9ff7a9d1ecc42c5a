//! Platform-specific directory management
//!
//! Provides the per-user configuration directory following platform
//! conventions (XDG on Linux, Library on macOS).
//!
//! The `ESMAKE_CONFIG_DIR` environment variable overrides the default
//! location, which tests rely on to keep global settings hermetic.

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the config directory
pub const ENV_CONFIG_DIR: &str = "ESMAKE_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "esmake";

/// Global settings file name inside the config directory
const GLOBAL_SETTINGS_FILE: &str = "config.toml";

/// Platform-specific directory provider for esmake
#[derive(Debug, Clone)]
pub struct EsmakeDirs {
    config_dir: PathBuf,
}

impl EsmakeDirs {
    /// Create a new `EsmakeDirs` instance
    ///
    /// Checks the environment override first, then falls back to the
    /// platform default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve_config_dir(),
        }
    }

    /// Get the config directory path
    ///
    /// - Linux: `$XDG_CONFIG_HOME/esmake` or `~/.config/esmake`
    /// - macOS: `~/Library/Application Support/esmake`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Get the global settings file path
    ///
    /// Returns the path to `config.toml` in the config directory.
    #[must_use]
    pub fn global_settings_path(&self) -> PathBuf {
        self.config_dir.join(GLOBAL_SETTINGS_FILE)
    }

    /// Resolve config directory from environment or platform default
    fn resolve_config_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_CONFIG_DIR) {
            return PathBuf::from(path);
        }

        Self::platform_config_dir()
    }

    /// Get platform-specific config directory
    fn platform_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                // Fallback to home directory
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }
}

impl Default for EsmakeDirs {
    fn default() -> Self {
        Self::new()
    }
}
