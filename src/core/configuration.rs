//! Build configurations
//!
//! A build configuration is one named compilation unit: an ordered set of
//! source resources, the compiler options to apply, and a build mode.
//! Between reconciles it tracks which members were added and removed so
//! the orchestrator can patch the reverse index from the delta instead of
//! re-deriving the world.

use std::collections::BTreeSet;

use crate::core::options::CompilerOptions;
use crate::core::resource::ResourceId;

/// How a configuration's members are handed to the compiler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildMode {
    /// One compiler invocation for the whole member list
    #[default]
    Whole,
    /// One compiler invocation per member resource
    PerFile,
}

impl BuildMode {
    /// Parse the `buildType` flag of a configuration file
    ///
    /// `enabled` selects per-file compilation; anything else (including a
    /// missing flag) selects whole-configuration compilation.
    #[must_use]
    pub fn from_flag(flag: &str) -> Self {
        if flag == "enabled" {
            Self::PerFile
        } else {
            Self::Whole
        }
    }

    /// The `buildType` flag value this mode serializes to
    #[must_use]
    pub fn as_flag(&self) -> &'static str {
        match self {
            Self::Whole => "disabled",
            Self::PerFile => "enabled",
        }
    }
}

/// One named compilation unit and its membership history
///
/// The membership delta is derived against a baseline snapshot taken at
/// the last [`clear_history`](Self::clear_history). A member that leaves
/// and returns between reconciles therefore nets out to no delta.
#[derive(Debug, Clone)]
pub struct BuildConfiguration {
    name: String,
    resources: Vec<ResourceId>,
    baseline: BTreeSet<ResourceId>,
    options: CompilerOptions,
    mode: BuildMode,
    include_all: bool,
    is_new: bool,
    dirty: bool,
}

impl BuildConfiguration {
    /// Create an empty configuration
    ///
    /// Fresh configurations start flagged `is_new`, which makes the first
    /// observing build pass treat them as dirty.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: Vec::new(),
            baseline: BTreeSet::new(),
            options: CompilerOptions::default(),
            mode: BuildMode::default(),
            include_all: false,
            is_new: true,
            dirty: false,
        }
    }

    /// Configuration name (the global dirty-tracking key)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current member resources, in persistence order
    #[must_use]
    pub fn resources(&self) -> &[ResourceId] {
        &self.resources
    }

    /// Compiler options
    #[must_use]
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Build mode
    #[must_use]
    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Whether this configuration carries the `ALL` sentinel
    #[must_use]
    pub fn include_all(&self) -> bool {
        self.include_all
    }

    /// Mark this configuration as wildcard ("every source file")
    pub fn set_include_all(&mut self, include_all: bool) {
        self.include_all = include_all;
    }

    /// Whether this configuration has never been incorporated into the index
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Clear the first-observation flag
    pub fn mark_known(&mut self) {
        self.is_new = false;
    }

    /// Whether this configuration needs recompilation
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Force the dirty flag
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Reset the dirty flag after a successful compile
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Replace the compiler options, marking dirty on value change
    pub fn set_options(&mut self, options: CompilerOptions) {
        if self.options != options {
            self.options = options;
            self.dirty = true;
        }
    }

    /// Replace the build mode, marking dirty on change
    pub fn set_mode(&mut self, mode: BuildMode) {
        if self.mode != mode {
            self.mode = mode;
            self.dirty = true;
        }
    }

    /// Append a member resource
    ///
    /// Membership is a set: a duplicate add is ignored. Order of first
    /// occurrence is kept for persistence stability.
    pub fn add_resource(&mut self, resource: ResourceId) {
        if self.resources.contains(&resource) {
            tracing::trace!("'{}' already a member of '{}'", resource, self.name);
            return;
        }
        self.resources.push(resource);
    }

    /// Drop a member directly
    pub fn remove_resource(&mut self, resource: &ResourceId) {
        if let Some(position) = self.resources.iter().position(|r| r == resource) {
            self.resources.remove(position);
        }
    }

    /// Replace the member list with the edited one
    ///
    /// The added/removed views then report the symmetric-difference
    /// partition of the new membership against the last-reconciled one.
    pub fn record_resource_list_change(&mut self, new_members: Vec<ResourceId>) {
        self.resources = dedup_in_order(new_members);
    }

    /// Members added since the last reconcile
    #[must_use]
    pub fn added(&self) -> BTreeSet<ResourceId> {
        let current = self.member_set();
        current.difference(&self.baseline).cloned().collect()
    }

    /// Members removed since the last reconcile
    #[must_use]
    pub fn removed(&self) -> BTreeSet<ResourceId> {
        let current = self.member_set();
        self.baseline.difference(&current).cloned().collect()
    }

    /// Whether any membership delta is pending
    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        self.member_set() != self.baseline
    }

    /// Snapshot the current membership as the new baseline
    ///
    /// Called once the pending delta has been applied to the reverse
    /// index, so repeated reconciles do not reapply it. Leaves the member
    /// list untouched.
    pub fn clear_history(&mut self) {
        self.baseline = self.member_set();
    }

    fn member_set(&self) -> BTreeSet<ResourceId> {
        self.resources.iter().cloned().collect()
    }
}

/// Keep the first occurrence of each resource, preserving order
fn dedup_in_order(members: Vec<ResourceId>) -> Vec<ResourceId> {
    let mut seen = BTreeSet::new();
    members
        .into_iter()
        .filter(|resource| seen.insert(resource.clone()))
        .collect()
}
