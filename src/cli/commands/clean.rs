//! CLI implementation for `esmake clean` command
//!
//! This module handles the CLI interface for discarding build records.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::cli::output::{self, print_detail, print_success};
use crate::config::defaults::{DEFAULT_COMPILER, MANIFEST_FILE};
use crate::core::builder::BuildOrchestrator;
use crate::infra::compiler::CompilerRunner;
use crate::infra::console::StderrConsole;
use crate::infra::problems::JsonProblemSink;
use crate::infra::scan::ProjectTree;
use crate::infra::state::ProjectState;

/// Execute the clean command
pub fn execute(project_dir: &Path) -> Result<()> {
    let manifest_path = project_dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        bail!(
            "No {MANIFEST_FILE} found in {}. Run 'esmake init' to create a project.",
            project_dir.display()
        );
    }

    let tree = ProjectTree::new(project_dir);
    let state = ProjectState::open(project_dir).with_context(|| "Failed to open build state")?;

    // Clean never launches the compiler; the executable name is a placeholder.
    let runner = CompilerRunner::new(DEFAULT_COMPILER);
    let mut orchestrator = BuildOrchestrator::new(tree, state, runner);
    if output::is_json() {
        orchestrator = orchestrator
            .with_console(Box::new(StderrConsole))
            .with_problem_sink(Box::new(JsonProblemSink));
    }

    orchestrator
        .clean()
        .with_context(|| "Failed to clean build records")?;

    print_success("Cleaned build records");
    print_detail("The next build will compile every configuration.");

    Ok(())
}
