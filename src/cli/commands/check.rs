//! Check command implementation
//!
//! Implements `esmake check` to validate configuration files and resolved
//! settings without invoking the compiler.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::cli::output::{self, status};
use crate::config::defaults::MANIFEST_FILE;
use crate::core::config_file::ConfigFile;
use crate::core::resource::ResourceId;
use crate::core::settings::{self, GlobalSettings, ProjectSettings};
use crate::infra::dirs::EsmakeDirs;
use crate::infra::scan::ProjectTree;

/// Execute the check command
pub fn execute(project_dir: &Path) -> Result<()> {
    let manifest_path = project_dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        bail!("No {MANIFEST_FILE} found. Run 'esmake init' to create a project.");
    }

    let manifest = ProjectSettings::load_from_path(&manifest_path)
        .with_context(|| format!("Failed to load {}", manifest_path.display()))?;

    tracing::info!("Checking project: {}", manifest.project.name);

    let global = GlobalSettings::load(&EsmakeDirs::new())
        .with_context(|| "Failed to load global settings")?;
    let compiler = settings::resolve_compiler(None, Some(&manifest), &global);

    let tree = ProjectTree::new(project_dir);
    let spinner = output::create_spinner("Scanning project");
    let files = tree
        .configuration_files()
        .with_context(|| "Failed to scan the project tree")?;
    spinner.finish_and_clear();

    println!("Checking project '{}'...\n", manifest.project.name);

    let mut errors = 0usize;
    let mut warnings = 0usize;

    if files.is_empty() {
        println!("{} No build configuration file (.bc) found in this project.", status::WARNING);
        println!("  Create one with 'esmake init' before building.");
        warnings += 1;
    }

    // Configuration names seen so far, mapped to the file that declared them
    let mut seen: BTreeMap<String, ResourceId> = BTreeMap::new();

    for file in &files {
        match ConfigFile::load(&tree.os_path(file)) {
            Err(e) => {
                println!("{} {file}: {e}", status::ERROR);
                errors += 1;
            }
            Ok(parsed) => {
                println!(
                    "{} {file}: {} configuration(s)",
                    status::SUCCESS,
                    parsed.blocks.len()
                );
                for block in &parsed.blocks {
                    if let Some(previous) = seen.insert(block.name.clone(), file.clone()) {
                        if previous == *file {
                            println!(
                                "  {} '{}' appears more than once in {file}",
                                status::WARNING,
                                block.name
                            );
                        } else {
                            println!(
                                "  {} '{}' is also defined in {previous}",
                                status::WARNING,
                                block.name
                            );
                        }
                        warnings += 1;
                    }

                    if block.include_all {
                        println!("  • {}: all source files", block.name);
                    } else {
                        println!("  • {}: {} file(s)", block.name, block.resources.len());
                        for raw in &block.resources {
                            let member = ResourceId::new(raw);
                            if !tree.exists(&member) {
                                println!(
                                    "    {} member {member} does not exist",
                                    status::WARNING
                                );
                                warnings += 1;
                            }
                        }
                    }
                }
            }
        }
    }

    println!();
    if compiler_available(&compiler.path) {
        println!(
            "{} Compiler: {} (from {})",
            status::SUCCESS,
            compiler.path.display(),
            compiler.source.label()
        );
    } else {
        println!(
            "{} Compiler not found: {} (from {})",
            status::WARNING,
            compiler.path.display(),
            compiler.source.label()
        );
        warnings += 1;
    }

    println!();
    if errors > 0 {
        bail!("Check failed: {errors} error(s), {warnings} warning(s)");
    }
    if warnings > 0 {
        println!("{} Check passed with {warnings} warning(s)", status::SUCCESS);
    } else {
        println!("{} Check passed", status::SUCCESS);
    }
    Ok(())
}

/// Whether the resolved compiler can actually be launched
///
/// A bare name is resolved through `PATH`; anything with a directory
/// component must exist as given.
fn compiler_available(path: &Path) -> bool {
    if path.parent().is_some_and(|p| !p.as_os_str().is_empty()) {
        path.exists()
    } else {
        which::which(path).is_ok()
    }
}
