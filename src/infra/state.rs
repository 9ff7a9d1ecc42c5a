//! Persisted per-project build state
//!
//! Everything the build needs to remember between invocations lives in
//! `.esmake/state.toml` under the project root:
//!
//! - the reverse index from each source resource to the configurations
//!   that contain it, so one changed file maps straight to the
//!   configurations to rebuild;
//! - per-resource exclusion marks;
//! - which configuration names each `.bc` file declared last time, for
//!   reconciling renames and removals;
//! - the fingerprint snapshot the next change feed diffs against.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::defaults::{STATE_DIR, STATE_FILE};
use crate::core::resource::ResourceId;
use crate::error::StateError;
use crate::infra::scan::Fingerprint;

/// State file format version
const STATE_VERSION: u32 = 1;

fn default_version() -> u32 {
    STATE_VERSION
}

/// Explicit per-resource build exclusion mark
///
/// `Included` documents intent on a child of an excluded directory but
/// never overrides it: an excluded ancestor dominates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExclusionMark {
    /// Resource and everything under it are skipped by builds
    Excluded,
    /// Resource is explicitly marked as participating
    Included,
}

/// Per-resource record: index membership and exclusion mark
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Configurations that contain this resource
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub configurations: BTreeSet<String>,

    /// Explicit exclusion mark, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusion: Option<ExclusionMark>,
}

impl ResourceRecord {
    fn is_empty(&self) -> bool {
        self.configurations.is_empty() && self.exclusion.is_none()
    }
}

/// Per-configuration-file record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Configuration names the file declared, in document order
    #[serde(default)]
    pub configurations: Vec<String>,

    /// Subset of those names that carry the include-all sentinel
    ///
    /// Tracked so that a newly added source file can dirty wildcard
    /// configurations even though no index record links it yet.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wildcards: Vec<String>,
}

/// On-disk state file layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Per-resource records keyed by project-relative path
    #[serde(default)]
    pub resources: BTreeMap<ResourceId, ResourceRecord>,

    /// Per-configuration-file records
    #[serde(default)]
    pub files: BTreeMap<ResourceId, FileRecord>,

    /// Fingerprints of the project tree at the end of the last pass
    #[serde(default)]
    pub snapshot: BTreeMap<ResourceId, Fingerprint>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            resources: BTreeMap::new(),
            files: BTreeMap::new(),
            snapshot: BTreeMap::new(),
        }
    }
}

/// Build state of one project, loaded from and saved to disk
#[derive(Debug, Clone)]
pub struct ProjectState {
    path: PathBuf,
    data: StateFile,
}

impl ProjectState {
    /// Open the state of the project rooted at the given path
    ///
    /// A missing state file yields empty state; the file appears on the
    /// first save.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing state file cannot be read or
    /// parsed.
    pub fn open(project_root: &Path) -> Result<Self, StateError> {
        let path = project_root.join(STATE_DIR).join(STATE_FILE);
        let data = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| StateError::Read {
                path: path.clone(),
                error: e.to_string(),
            })?;
            toml::from_str(&content).map_err(|e| StateError::Parse {
                path: path.clone(),
                error: e.to_string(),
            })?
        } else {
            StateFile::default()
        };

        Ok(Self { path, data })
    }

    /// Persist the state to disk
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory cannot be created or the
    /// write fails.
    pub fn save(&self) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StateError::Write {
                path: parent.to_path_buf(),
                error: e.to_string(),
            })?;
        }

        let content = toml::to_string_pretty(&self.data).map_err(|e| StateError::Write {
            path: self.path.clone(),
            error: e.to_string(),
        })?;

        fs::write(&self.path, content).map_err(|e| StateError::Write {
            path: self.path.clone(),
            error: e.to_string(),
        })
    }

    // ---- reverse index ----

    /// Configurations that contain a resource, sorted by name
    #[must_use]
    pub fn configurations_for(&self, resource: &ResourceId) -> Vec<String> {
        self.data
            .resources
            .get(resource)
            .map(|record| record.configurations.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Record that a configuration contains a resource
    pub fn link(&mut self, resource: &ResourceId, configuration: &str) {
        self.data
            .resources
            .entry(resource.clone())
            .or_default()
            .configurations
            .insert(configuration.to_string());
    }

    /// Record that a configuration no longer contains a resource
    pub fn unlink(&mut self, resource: &ResourceId, configuration: &str) {
        if let Some(record) = self.data.resources.get_mut(resource) {
            record.configurations.remove(configuration);
            if record.is_empty() {
                self.data.resources.remove(resource);
            }
        }
    }

    /// Remove a configuration from every resource record
    ///
    /// Used when a configuration disappears from its file or the file
    /// itself goes away.
    pub fn unlink_configuration(&mut self, configuration: &str) {
        for record in self.data.resources.values_mut() {
            record.configurations.remove(configuration);
        }
        self.data.resources.retain(|_, record| !record.is_empty());
    }

    /// Drop everything recorded about a resource
    ///
    /// Used when the resource itself is deleted from the project; its
    /// index entries and exclusion mark die with it.
    pub fn purge_resource(&mut self, resource: &ResourceId) {
        self.data.resources.remove(resource);
    }

    /// Resources currently linked to a configuration, sorted by path
    ///
    /// This is the inverse of [`configurations_for`](Self::configurations_for)
    /// and seeds the membership baseline when a configuration is loaded in
    /// a fresh process.
    #[must_use]
    pub fn members_of(&self, configuration: &str) -> Vec<ResourceId> {
        self.data
            .resources
            .iter()
            .filter(|(_, record)| record.configurations.contains(configuration))
            .map(|(resource, _)| resource.clone())
            .collect()
    }

    // ---- exclusion marks ----

    /// The resource's own exclusion mark, if any
    #[must_use]
    pub fn exclusion(&self, resource: &ResourceId) -> Option<ExclusionMark> {
        self.data
            .resources
            .get(resource)
            .and_then(|record| record.exclusion)
    }

    /// Set or clear a resource's exclusion mark
    pub fn set_exclusion(&mut self, resource: &ResourceId, mark: Option<ExclusionMark>) {
        match mark {
            Some(mark) => {
                self.data
                    .resources
                    .entry(resource.clone())
                    .or_default()
                    .exclusion = Some(mark);
            }
            None => {
                if let Some(record) = self.data.resources.get_mut(resource) {
                    record.exclusion = None;
                    if record.is_empty() {
                        self.data.resources.remove(resource);
                    }
                }
            }
        }
    }

    /// Whether builds skip this resource
    ///
    /// True when the resource or any of its ancestors carries an
    /// `Excluded` mark. An `Included` mark never overrides an excluded
    /// ancestor.
    #[must_use]
    pub fn is_excluded(&self, resource: &ResourceId) -> bool {
        if self.exclusion(resource) == Some(ExclusionMark::Excluded) {
            return true;
        }
        resource
            .ancestors()
            .any(|ancestor| self.exclusion(&ancestor) == Some(ExclusionMark::Excluded))
    }

    // ---- configuration file registry ----

    /// Record the configuration names a file declares
    pub fn record_file(
        &mut self,
        file: &ResourceId,
        configurations: Vec<String>,
        wildcards: Vec<String>,
    ) {
        self.data.files.insert(
            file.clone(),
            FileRecord {
                configurations,
                wildcards,
            },
        );
    }

    /// Names a file declared last time it was read
    #[must_use]
    pub fn file_configurations(&self, file: &ResourceId) -> Vec<String> {
        self.data
            .files
            .get(file)
            .map(|record| record.configurations.clone())
            .unwrap_or_default()
    }

    /// Forget a configuration file, returning the names it declared
    pub fn remove_file(&mut self, file: &ResourceId) -> Vec<String> {
        self.data
            .files
            .remove(file)
            .map(|record| record.configurations)
            .unwrap_or_default()
    }

    /// The file that declares a configuration name, if any
    #[must_use]
    pub fn owning_file(&self, configuration: &str) -> Option<ResourceId> {
        self.data
            .files
            .iter()
            .find(|(_, record)| {
                record
                    .configurations
                    .iter()
                    .any(|name| name == configuration)
            })
            .map(|(file, _)| file.clone())
    }

    /// Configuration files known to the registry, sorted
    #[must_use]
    pub fn known_files(&self) -> Vec<ResourceId> {
        self.data.files.keys().cloned().collect()
    }

    /// All include-all configuration names across the registry, sorted
    #[must_use]
    pub fn wildcard_configurations(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self
            .data
            .files
            .values()
            .flat_map(|record| record.wildcards.iter())
            .collect();
        names.into_iter().cloned().collect()
    }

    // ---- snapshot ----

    /// Fingerprints at the end of the last pass
    #[must_use]
    pub fn snapshot(&self) -> &BTreeMap<ResourceId, Fingerprint> {
        &self.data.snapshot
    }

    /// Replace the stored snapshot
    pub fn set_snapshot(&mut self, snapshot: BTreeMap<ResourceId, Fingerprint>) {
        self.data.snapshot = snapshot;
    }

    // ---- lifecycle ----

    /// Drop build records while keeping exclusion marks
    ///
    /// A clean pass calls this before rebuilding from scratch; user
    /// exclusion preferences survive.
    pub fn reset_build_records(&mut self) {
        for record in self.data.resources.values_mut() {
            record.configurations.clear();
        }
        self.data.resources.retain(|_, record| !record.is_empty());
        self.data.files.clear();
        self.data.snapshot.clear();
    }
}
