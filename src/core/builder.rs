//! Build orchestration
//!
//! [`BuildOrchestrator`] is the coordinator behind every build pass. It
//! owns the configuration table, the persisted reverse index from source
//! resources to the configurations that contain them, and the dirty set
//! of configuration names pending recompilation.
//!
//! A pass runs in two phases. First every configuration file touched by
//! the pass is parsed and reconciled into the table and the index, and
//! changed sources mark their owning configurations dirty. Only then is
//! the dirty set drained: each configuration compiles through
//! [`CompilerRunner`] and its diagnostics become problems attached to the
//! originating files.
//!
//! Per-item failures never abort a pass. A malformed configuration file,
//! a vanished member, or a failed compiler launch is logged and skipped;
//! the remaining work still runs. Only an inaccessible project root, a
//! state persistence failure, or cancellation aborts the pass.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::core::cancel::CancelToken;
use crate::core::config_file::{ConfigBlock, ConfigFile};
use crate::core::configuration::{BuildConfiguration, BuildMode};
use crate::core::diagnostic::{Problem, Severity};
use crate::core::options::CompilerOptions;
use crate::core::resource::{ChangeKind, ResourceChange, ResourceId, ResourceKind};
use crate::error::{BuildError, CompilerError};
use crate::infra::compiler::CompilerRunner;
use crate::infra::console::{Console, StdoutConsole};
use crate::infra::problems::{ProblemSink, TextProblemSink};
use crate::infra::scan::ProjectTree;
use crate::infra::state::ProjectState;

/// Totals of one build pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Configurations whose invocations all completed
    pub configurations_built: usize,
    /// Compiler invocations that ran to exit
    pub invocations: usize,
    /// Problems reported against resources
    pub problems: usize,
    /// Problems with error severity
    pub errors: usize,
}

impl BuildSummary {
    /// Whether the pass produced no error-severity problems
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.errors == 0
    }
}

/// Coordinates build passes over one project
///
/// All mutating operations take `&mut self`, which statically rules out
/// overlapping passes on one instance. Embedders sharing an orchestrator
/// across threads must wrap it in a mutex.
pub struct BuildOrchestrator {
    tree: ProjectTree,
    state: ProjectState,
    runner: CompilerRunner,
    console: Box<dyn Console>,
    problems: Box<dyn ProblemSink>,
    cancel: CancelToken,
    configurations: HashMap<String, BuildConfiguration>,
    dirty: BTreeSet<String>,
}

impl BuildOrchestrator {
    /// Create an orchestrator over a project tree and its persisted state
    ///
    /// Output goes to stdout/stderr until [`with_console`](Self::with_console)
    /// and [`with_problem_sink`](Self::with_problem_sink) replace the sinks.
    #[must_use]
    pub fn new(tree: ProjectTree, state: ProjectState, runner: CompilerRunner) -> Self {
        Self {
            tree,
            state,
            runner,
            console: Box::new(StdoutConsole),
            problems: Box::new(TextProblemSink),
            cancel: CancelToken::new(),
            configurations: HashMap::new(),
            dirty: BTreeSet::new(),
        }
    }

    /// Replace the console sink
    #[must_use]
    pub fn with_console(mut self, console: Box<dyn Console>) -> Self {
        self.console = console;
        self
    }

    /// Replace the problem sink
    #[must_use]
    pub fn with_problem_sink(mut self, problems: Box<dyn ProblemSink>) -> Self {
        self.problems = problems;
        self
    }

    /// Attach a cancellation token
    ///
    /// The token is polled between resources and configurations, and is
    /// passed through to the compiler runner so an in-flight subprocess
    /// is killed as well.
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.runner = self.runner.clone().with_cancel_token(cancel.clone());
        self.cancel = cancel;
        self
    }

    /// The project tree this orchestrator builds
    #[must_use]
    pub fn tree(&self) -> &ProjectTree {
        &self.tree
    }

    /// The persisted project state
    #[must_use]
    pub fn state(&self) -> &ProjectState {
        &self.state
    }

    /// A loaded configuration, if the table holds it
    #[must_use]
    pub fn configuration(&self, name: &str) -> Option<&BuildConfiguration> {
        self.configurations.get(name)
    }

    /// Names currently pending recompilation, sorted
    #[must_use]
    pub fn dirty_configurations(&self) -> Vec<String> {
        self.dirty.iter().cloned().collect()
    }

    /// Run one build pass
    ///
    /// `None` runs a full build over the whole tree; `Some` applies the
    /// given changes incrementally.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be walked, the state cannot be
    /// persisted, or the pass is cancelled.
    pub fn run_build(
        &mut self,
        changes: Option<&[ResourceChange]>,
    ) -> Result<BuildSummary, BuildError> {
        match changes {
            None => self.full_build(),
            Some(changes) => self.incremental_build(changes),
        }
    }

    /// Visit every resource in the tree, then drain the dirty set
    ///
    /// Every configuration declared by any configuration file is
    /// recompiled, whether or not anything about it changed.
    ///
    /// # Errors
    ///
    /// See [`run_build`](Self::run_build).
    pub fn full_build(&mut self) -> Result<BuildSummary, BuildError> {
        tracing::debug!("Full build of {}", self.tree.root().display());

        let resources = self.tree.scan()?;
        for resource in resources {
            self.check_cancelled()?;
            match resource.kind() {
                ResourceKind::Configuration => {
                    self.apply_configuration_file(&resource);
                    // A full pass recompiles everything the file declares.
                    for name in self.state.file_configurations(&resource) {
                        if let Some(config) = self.configurations.get_mut(&name) {
                            config.mark_dirty();
                        }
                        self.dirty.insert(name);
                    }
                }
                ResourceKind::Source => self.source_touched(&resource),
                ResourceKind::Other => {}
            }
        }

        self.finish_pass()
    }

    /// Apply a set of changes, then drain the dirty set
    ///
    /// # Errors
    ///
    /// See [`run_build`](Self::run_build).
    pub fn incremental_build(
        &mut self,
        changes: &[ResourceChange],
    ) -> Result<BuildSummary, BuildError> {
        tracing::debug!("Incremental build with {} change(s)", changes.len());

        for change in changes {
            self.check_cancelled()?;
            self.apply_change(change);
        }

        self.finish_pass()
    }

    /// Push path for editors that have just written a configuration file
    ///
    /// Reconciles the file into the table and index immediately instead
    /// of waiting for the next change notification.
    ///
    /// # Errors
    ///
    /// See [`run_build`](Self::run_build).
    pub fn configuration_file_saved(
        &mut self,
        file: &ResourceId,
    ) -> Result<BuildSummary, BuildError> {
        self.incremental_build(&[ResourceChange::new(file.clone(), ChangeKind::Changed)])
    }

    /// Discard everything the builds produced
    ///
    /// Clears the configuration table, the reverse index, the dirty set,
    /// the file registry, and the snapshot, and removes reported problems
    /// from every source file. Exclusion marks are user intent, not build
    /// products, and survive.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be walked or the emptied state
    /// cannot be persisted.
    pub fn clean(&mut self) -> Result<(), BuildError> {
        tracing::debug!("Cleaning {}", self.tree.root().display());

        for resource in self.tree.source_files()? {
            self.problems.clear(&resource);
        }
        self.configurations.clear();
        self.dirty.clear();
        self.state.reset_build_records();
        self.state.save()?;
        Ok(())
    }

    // ---- change dispatch ----

    fn apply_change(&mut self, change: &ResourceChange) {
        let resource = &change.resource;
        match (change.kind, resource.kind()) {
            (ChangeKind::Added | ChangeKind::Changed, ResourceKind::Configuration) => {
                self.apply_configuration_file(resource);
            }
            (ChangeKind::Removed, ResourceKind::Configuration) => {
                self.remove_configuration_file(resource);
            }
            (ChangeKind::Added | ChangeKind::Changed, ResourceKind::Source) => {
                self.source_touched(resource);
            }
            (ChangeKind::Removed, ResourceKind::Source) => {
                self.remove_source(resource);
            }
            (_, ResourceKind::Other) => {
                tracing::trace!("Ignoring change to '{}'", resource);
            }
        }
    }

    /// Mark the configurations affected by a source edit dirty
    ///
    /// Wildcard configurations contain every source file, so they are
    /// dirtied even when no index record links the resource yet (a file
    /// added since the last registration).
    fn source_touched(&mut self, resource: &ResourceId) {
        if self.state.is_excluded(resource) {
            tracing::debug!("'{}' is excluded from build; skipping", resource);
            return;
        }
        for name in self.state.configurations_for(resource) {
            self.dirty.insert(name);
        }
        for name in self.state.wildcard_configurations() {
            self.dirty.insert(name);
        }
    }

    /// Handle a source file deleted from the project
    ///
    /// The resource's index record dies with it and every configuration
    /// that contained it is rebuilt.
    fn remove_source(&mut self, resource: &ResourceId) {
        let owners = self.state.configurations_for(resource);
        for name in &owners {
            self.dirty.insert(name.clone());
            if let Some(config) = self.configurations.get_mut(name) {
                config.remove_resource(resource);
                config.clear_history();
                config.mark_dirty();
            }
        }
        for name in self.state.wildcard_configurations() {
            self.dirty.insert(name);
        }
        self.state.purge_resource(resource);

        if !owners.is_empty() {
            tracing::debug!(
                "'{}' removed; {} configuration(s) to rebuild",
                resource,
                owners.len()
            );
        }
    }

    // ---- configuration file reconciliation ----

    /// Parse a configuration file and reconcile every block it declares
    ///
    /// A file that cannot be read or parsed is reported and skipped; the
    /// previous registration stays in place. Names that vanished from the
    /// file are removed from the table and the index.
    fn apply_configuration_file(&mut self, file: &ResourceId) {
        let path = self.tree.os_path(file);
        let parsed = match ConfigFile::load(&path) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("{e}");
                self.console.println(&format!("Skipping '{file}': {e}"));
                return;
            }
        };

        let mut declared: Vec<String> = Vec::new();
        for block in parsed.blocks {
            if declared.contains(&block.name) {
                self.console.println(&format!(
                    "Configuration '{}' appears more than once in '{}'; the last definition wins",
                    block.name, file
                ));
            } else {
                declared.push(block.name.clone());
            }
            self.reconcile_block(block);
        }

        let vanished: Vec<String> = self
            .state
            .file_configurations(file)
            .into_iter()
            .filter(|name| !declared.contains(name))
            .collect();
        for name in vanished {
            self.remove_configuration(&name);
        }

        let wildcards: Vec<String> = declared
            .iter()
            .filter(|name| {
                self.configurations
                    .get(*name)
                    .is_some_and(BuildConfiguration::include_all)
            })
            .cloned()
            .collect();
        self.state.record_file(file, declared, wildcards);
    }

    /// Fold one parsed block into the table and the reverse index
    ///
    /// The membership baseline of a configuration first seen by this
    /// process is seeded from the persisted index, so the added/removed
    /// delta reflects what actually changed since the last pass, not a
    /// diff against the empty set.
    fn reconcile_block(&mut self, block: ConfigBlock) {
        let name = block.name.clone();
        let desired = match self.expanded_members(&block) {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!("Cannot resolve members of '{name}': {e}");
                return;
            }
        };

        let prior_members = self.state.members_of(&name);
        let (added, removed, dirtied) = {
            let config = self.configurations.entry(name.clone()).or_insert_with(|| {
                let mut config = BuildConfiguration::new(&name);
                config.record_resource_list_change(prior_members);
                config.clear_history();
                config
            });

            config.set_include_all(block.include_all);
            config.set_options(CompilerOptions::parse(&block.options));
            config.set_mode(block.mode);
            config.record_resource_list_change(desired);

            let added = config.added();
            let removed = config.removed();
            let dirtied =
                config.is_new() || config.is_dirty() || !added.is_empty() || !removed.is_empty();
            config.clear_history();
            config.mark_known();
            if dirtied {
                config.mark_dirty();
            }
            (added, removed, dirtied)
        };

        for resource in &added {
            self.state.link(resource, &name);
        }
        for resource in &removed {
            self.state.unlink(resource, &name);
        }
        if dirtied {
            tracing::debug!("Configuration '{name}' marked dirty");
            self.dirty.insert(name);
        }
    }

    /// Resolve a block's declared members to existing resources
    ///
    /// The include-all sentinel expands to every source file currently in
    /// the tree. Declared paths that do not exist are logged and dropped,
    /// matching the resolve-or-skip contract of resource lookup.
    fn expanded_members(&self, block: &ConfigBlock) -> Result<Vec<ResourceId>, BuildError> {
        if block.include_all {
            return Ok(self.tree.source_files()?);
        }
        Ok(block
            .resources
            .iter()
            .map(ResourceId::new)
            .filter(|resource| {
                let found = self.tree.exists(resource);
                if !found {
                    tracing::warn!(
                        "'{}' referenced by '{}' does not exist; skipping",
                        resource,
                        block.name
                    );
                }
                found
            })
            .collect())
    }

    fn remove_configuration_file(&mut self, file: &ResourceId) {
        let names = self.state.remove_file(file);
        for name in &names {
            self.remove_configuration(name);
        }
        if !names.is_empty() {
            tracing::debug!(
                "Removed {} configuration(s) declared by '{}'",
                names.len(),
                file
            );
        }
    }

    fn remove_configuration(&mut self, name: &str) {
        self.configurations.remove(name);
        self.state.unlink_configuration(name);
        self.dirty.remove(name);
        tracing::debug!("Configuration '{name}' removed");
    }

    // ---- dirty-set drain ----

    /// Drain the dirty set, then close out the pass
    ///
    /// Emits the missing-configuration advisory when nothing compiled and
    /// the project has no configuration file at all, refreshes the
    /// fingerprint snapshot, and persists the state.
    fn finish_pass(&mut self) -> Result<BuildSummary, BuildError> {
        let summary = self.drain_dirty()?;

        if summary.invocations == 0 && self.tree.configuration_files()?.is_empty() {
            self.console
                .println("No build configuration file (.bc) found in this project.");
            self.console
                .println("Create one with 'esmake init' before building.");
        }

        let snapshot = self.tree.fingerprints()?;
        self.state.set_snapshot(snapshot);
        self.state.save()?;

        tracing::debug!(
            "Pass complete: {} configuration(s), {} invocation(s), {} problem(s)",
            summary.configurations_built,
            summary.invocations,
            summary.problems
        );
        Ok(summary)
    }

    fn drain_dirty(&mut self) -> Result<BuildSummary, BuildError> {
        let mut summary = BuildSummary::default();
        let mut visited: BTreeSet<String> = BTreeSet::new();

        // Reconciling a lazily loaded file can re-dirty names mid-drain;
        // the visited set keeps each configuration to one compile per pass.
        while let Some(name) = self.dirty.pop_first() {
            self.check_cancelled()?;
            if !visited.insert(name.clone()) {
                continue;
            }
            if !self.configurations.contains_key(&name) && !self.load_configuration_by_name(&name)
            {
                self.console.println(&format!(
                    "Skipping configuration '{name}': no configuration file defines it"
                ));
                continue;
            }
            self.compile_configuration(&name, &mut summary)?;
        }

        Ok(summary)
    }

    /// Locate and parse the file that declares a dirty name
    ///
    /// Names usually reach the dirty set through the persisted index in a
    /// process whose table is still empty; the registry knows which file
    /// declared them last.
    fn load_configuration_by_name(&mut self, name: &str) -> bool {
        let Some(file) = self.state.owning_file(name) else {
            return false;
        };
        if !self.tree.exists(&file) {
            tracing::warn!("Configuration file '{file}' for '{name}' no longer exists");
            return false;
        }
        self.apply_configuration_file(&file);
        self.configurations.contains_key(name)
    }

    fn compile_configuration(
        &mut self,
        name: &str,
        summary: &mut BuildSummary,
    ) -> Result<(), BuildError> {
        // Copy the invocation inputs out of the table so the borrow does
        // not overlap the console and problem sinks.
        let Some(config) = self.configurations.get(name) else {
            return Ok(());
        };
        let include_all = config.include_all();
        let mode = config.mode();
        let options = config.options().clone();
        let mut members: Vec<ResourceId> = config.resources().to_vec();

        if include_all {
            match self.tree.source_files() {
                Ok(sources) => members = sources,
                Err(e) => tracing::warn!("Cannot refresh members of '{name}': {e}"),
            }
        }

        members.retain(|resource| {
            if self.state.is_excluded(resource) {
                tracing::debug!("'{resource}' is excluded from build; skipping");
                return false;
            }
            if !self.tree.exists(resource) {
                tracing::warn!("'{resource}' is gone; skipping");
                return false;
            }
            true
        });

        if members.is_empty() {
            self.console
                .println(&format!("Configuration '{name}' has no files to compile."));
            if let Some(config) = self.configurations.get_mut(name) {
                config.mark_clean();
            }
            return Ok(());
        }

        self.console.println(&format!(
            "Building configuration '{name}' ({} file(s))",
            members.len()
        ));

        for resource in &members {
            self.problems.clear(resource);
        }

        let batches: Vec<Vec<ResourceId>> = match mode {
            BuildMode::Whole => vec![members],
            BuildMode::PerFile => members.into_iter().map(|member| vec![member]).collect(),
        };

        let mut completed = true;
        for batch in batches {
            self.check_cancelled()?;
            if !self.invoke_compiler(&batch, &options, summary)? {
                completed = false;
            }
        }

        // The dirty entry is consumed either way; a failed launch was
        // reported and is not retried until another change arrives.
        if let Some(config) = self.configurations.get_mut(name) {
            config.mark_clean();
        }
        if completed {
            summary.configurations_built += 1;
        }
        Ok(())
    }

    /// Run the compiler once and report its diagnostics
    ///
    /// Returns `Ok(false)` when the invocation failed to run; the caller
    /// continues with the next batch or configuration.
    fn invoke_compiler(
        &mut self,
        batch: &[ResourceId],
        options: &CompilerOptions,
        summary: &mut BuildSummary,
    ) -> Result<bool, BuildError> {
        let paths: Vec<PathBuf> = batch
            .iter()
            .map(|resource| self.tree.os_path(resource))
            .collect();

        let outcome = match self.runner.compile(&paths, options, self.console.as_mut()) {
            Ok(outcome) => outcome,
            Err(CompilerError::Cancelled) => return Err(BuildError::Cancelled),
            Err(e) => {
                tracing::warn!("{e}");
                // The runner already echoed the missing-executable case.
                if !matches!(e, CompilerError::MissingExecutable { .. }) {
                    self.console.println(&e.to_string());
                }
                return Ok(false);
            }
        };

        summary.invocations += 1;
        for diagnostic in &outcome.diagnostics {
            let Some(resource) = resolve_diagnostic_target(batch, &paths, &diagnostic.file_name)
            else {
                tracing::warn!(
                    "Diagnostic for unknown file '{}' dropped: {}",
                    diagnostic.file_name,
                    diagnostic.message
                );
                continue;
            };
            let problem = Problem::from_diagnostic(resource, diagnostic);
            if problem.severity == Severity::Error {
                summary.errors += 1;
            }
            summary.problems += 1;
            self.problems.report(&problem);
        }
        Ok(true)
    }

    fn check_cancelled(&self) -> Result<(), BuildError> {
        if self.cancel.is_cancelled() {
            tracing::debug!("Build cancelled");
            return Err(BuildError::Cancelled);
        }
        Ok(())
    }
}

/// Resolve a diagnostic's file field to one of the invocation's inputs
///
/// The compiler may print the path exactly as passed, relative to its
/// working directory, or as a bare file name. Match the full OS path
/// first, then fall back to the file name.
fn resolve_diagnostic_target(
    batch: &[ResourceId],
    paths: &[PathBuf],
    file_name: &str,
) -> Option<ResourceId> {
    let reported = Path::new(file_name);
    if let Some(position) = paths.iter().position(|path| path == reported) {
        return Some(batch[position].clone());
    }

    let reported_name = reported.file_name().and_then(|name| name.to_str())?;
    batch
        .iter()
        .find(|resource| resource.file_name() == reported_name)
        .cloned()
}
