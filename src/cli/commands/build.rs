//! Build command implementation
//!
//! Implements `esmake build`: resolve the compiler, diff the project tree
//! against the snapshot taken at the end of the previous pass, and hand
//! the resulting change set to the orchestrator. With `--full`, or when
//! no snapshot exists yet, the whole tree is rebuilt instead.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::cli::output::{self, print_detail, print_success};
use crate::config::defaults::MANIFEST_FILE;
use crate::core::builder::{BuildOrchestrator, BuildSummary};
use crate::core::settings::{self, GlobalSettings, ProjectSettings};
use crate::infra::compiler::CompilerRunner;
use crate::infra::console::StderrConsole;
use crate::infra::dirs::EsmakeDirs;
use crate::infra::problems::JsonProblemSink;
use crate::infra::scan::{compute_changes, ProjectTree};
use crate::infra::state::ProjectState;

/// Build options
pub struct BuildOptions {
    /// Rebuild every configuration regardless of recorded changes
    pub full: bool,
    /// Compiler executable override
    pub compiler: Option<PathBuf>,
    /// Subprocess timeout override in seconds
    pub timeout: Option<u64>,
}

/// Execute the build command
pub fn execute(project_dir: &Path, options: BuildOptions) -> Result<()> {
    let manifest_path = project_dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        bail!("No {MANIFEST_FILE} found. Run 'esmake init' to create a project.");
    }

    let manifest = ProjectSettings::load_from_path(&manifest_path)
        .with_context(|| format!("Failed to load {}", manifest_path.display()))?;

    tracing::info!("Building project: {}", manifest.project.name);

    let global = GlobalSettings::load(&EsmakeDirs::new())
        .with_context(|| "Failed to load global settings")?;

    let compiler =
        settings::resolve_compiler(options.compiler.as_deref(), Some(&manifest), &global);
    tracing::debug!(
        "Compiler: {} (from {})",
        compiler.path.display(),
        compiler.source.label()
    );
    let timeout = settings::resolve_timeout(options.timeout, Some(&manifest), &global);

    let tree = ProjectTree::new(project_dir);
    let state = ProjectState::open(project_dir).with_context(|| "Failed to open build state")?;

    let spinner = output::create_spinner("Scanning project");
    let current = tree
        .fingerprints()
        .with_context(|| "Failed to scan the project tree")?;
    spinner.finish_and_clear();

    // No snapshot means this is the first pass over the project.
    let changes = if options.full || state.snapshot().is_empty() {
        None
    } else {
        Some(compute_changes(state.snapshot(), &current))
    };

    match &changes {
        None => tracing::info!("Full build"),
        Some(changes) => tracing::info!("Incremental build, {} change(s)", changes.len()),
    }

    let runner = CompilerRunner::new(&compiler.path).with_timeout(timeout);
    let mut orchestrator = BuildOrchestrator::new(tree, state, runner);
    if output::is_json() {
        orchestrator = orchestrator
            .with_console(Box::new(StderrConsole))
            .with_problem_sink(Box::new(JsonProblemSink));
    }

    let summary = orchestrator
        .run_build(changes.as_deref())
        .with_context(|| "Build pass failed")?;

    // Individual problems were already streamed by the sink.
    if summary.errors > 0 {
        bail!("Build finished with {} error(s)", summary.errors);
    }

    report(&summary);
    Ok(())
}

/// Print the pass summary
fn report(summary: &BuildSummary) {
    if summary.configurations_built == 0 {
        print_success("Nothing to build");
        return;
    }

    print_success("Build complete");
    print_detail(&format!(
        "Configurations built: {}",
        summary.configurations_built
    ));
    print_detail(&format!("Compiler invocations: {}", summary.invocations));
    if summary.problems > 0 {
        print_detail(&format!(
            "Problems: {} ({} error(s))",
            summary.problems, summary.errors
        ));
    }
}
