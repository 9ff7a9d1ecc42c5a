//! CLI implementation for `esmake init` command
//!
//! This module handles the CLI interface for project initialization.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::cli::output::{print_detail, print_success};
use crate::config::defaults::{MANIFEST_FILE, STARTER_CONFIG_FILE};
use crate::core::config_file::{ConfigBlock, ConfigFile};
use crate::core::settings::{resolve_default_options, GlobalSettings, ProjectSettings};
use crate::infra::dirs::EsmakeDirs;

/// Execute the init command
pub fn execute(path: &Path, name: Option<String>, force: bool) -> Result<()> {
    let manifest_path = path.join(MANIFEST_FILE);
    if manifest_path.exists() && !force {
        bail!(
            "{} already exists in {}. Use --force to overwrite it.",
            MANIFEST_FILE,
            path.display()
        );
    }

    let project_name = name.unwrap_or_else(|| derive_project_name(path));
    let manifest = ProjectSettings::new(&project_name);
    manifest
        .save_to_path(&manifest_path)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    // The starter configuration compiles every source file with the
    // resolved default options.
    let starter_path = path.join(STARTER_CONFIG_FILE);
    let starter_written = if starter_path.exists() && !force {
        tracing::debug!("Keeping existing {}", starter_path.display());
        false
    } else {
        let global = GlobalSettings::load(&EsmakeDirs::new())
            .with_context(|| "Failed to load global settings")?;

        let mut block = ConfigBlock::new(&project_name);
        block.include_all = true;
        block.options = resolve_default_options(Some(&manifest), &global);

        let starter = ConfigFile {
            blocks: vec![block],
        };
        starter
            .save(&starter_path)
            .with_context(|| format!("Failed to write {}", starter_path.display()))?;
        true
    };

    print_success(&format!(
        "Initialized esmake project '{project_name}' in {}",
        path.display()
    ));
    print_detail(&format!("Created {MANIFEST_FILE}"));
    if starter_written {
        print_detail(&format!("Created {STARTER_CONFIG_FILE}"));
    } else {
        print_detail(&format!("Kept existing {STARTER_CONFIG_FILE}"));
    }

    Ok(())
}

/// Derive a project name from the directory name
fn derive_project_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or_else(|| "project".to_string(), ToString::to_string)
}
