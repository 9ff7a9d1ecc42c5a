//! Project tree traversal and fingerprinting
//!
//! Walks the project root for source (`.es`) and configuration (`.bc`)
//! files, snapshots per-file fingerprints, and diffs two snapshots into
//! the add/remove/change list that drives an incremental build.
//!
//! Dot-entries (`.esmake`, `.git`, editor droppings) are skipped at any
//! depth. Configuration files are fingerprinted by content hash so a
//! rewrite that restores identical bytes does not count as a change;
//! other files go by size and modification time.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::DirEntry;

use crate::core::resource::{ChangeKind, ResourceChange, ResourceId, ResourceKind};
use crate::error::ScanError;

/// A project directory tree rooted at one path
#[derive(Debug, Clone)]
pub struct ProjectTree {
    root: PathBuf,
}

impl ProjectTree {
    /// Create a tree over the given root directory
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The project root path
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List every file in the project, project-relative, in sorted order
    ///
    /// # Errors
    ///
    /// Returns an error if the root is missing or the walk fails.
    pub fn scan(&self) -> Result<Vec<ResourceId>, ScanError> {
        if !self.root.is_dir() {
            return Err(ScanError::RootNotFound {
                path: self.root.clone(),
            });
        }

        let mut resources = Vec::new();
        let walker = walkdir::WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry));

        for entry in walker {
            let entry = entry.map_err(|e| ScanError::Walk {
                path: e
                    .path()
                    .map_or_else(|| self.root.clone(), Path::to_path_buf),
                error: e.to_string(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(resource) = self.relativize(entry.path()) {
                resources.push(resource);
            }
        }

        Ok(resources)
    }

    /// List the project's compilable source files
    ///
    /// # Errors
    ///
    /// Returns an error if the walk fails.
    pub fn source_files(&self) -> Result<Vec<ResourceId>, ScanError> {
        Ok(self
            .scan()?
            .into_iter()
            .filter(|r| r.kind() == ResourceKind::Source)
            .collect())
    }

    /// List the project's build configuration files
    ///
    /// # Errors
    ///
    /// Returns an error if the walk fails.
    pub fn configuration_files(&self) -> Result<Vec<ResourceId>, ScanError> {
        Ok(self
            .scan()?
            .into_iter()
            .filter(|r| r.kind() == ResourceKind::Configuration)
            .collect())
    }

    /// Whether the resource currently exists as a file
    #[must_use]
    pub fn exists(&self, resource: &ResourceId) -> bool {
        self.os_path(resource).is_file()
    }

    /// Absolute filesystem path of a resource
    #[must_use]
    pub fn os_path(&self, resource: &ResourceId) -> PathBuf {
        resource.os_path(&self.root)
    }

    /// Map an absolute path back to a project-relative resource
    #[must_use]
    pub fn relativize(&self, path: &Path) -> Option<ResourceId> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let text = relative.to_string_lossy();
        if text.is_empty() {
            return None;
        }
        Some(ResourceId::new(text.as_ref()))
    }

    /// Fingerprint every file in the project
    ///
    /// # Errors
    ///
    /// Returns an error if the walk fails or a configuration file cannot
    /// be read for hashing.
    pub fn fingerprints(&self) -> Result<BTreeMap<ResourceId, Fingerprint>, ScanError> {
        let mut snapshot = BTreeMap::new();
        for resource in self.scan()? {
            let path = self.os_path(&resource);
            let fingerprint = Fingerprint::of(&path, resource.kind())?;
            snapshot.insert(resource, fingerprint);
        }
        Ok(snapshot)
    }
}

/// Change detection data for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// File size in bytes
    pub size: u64,
    /// Modification time in milliseconds since the epoch
    pub mtime_ms: u64,
    /// Content hash, present for configuration files only
    pub sha256: Option<String>,
}

impl Fingerprint {
    /// Fingerprint one file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be inspected or, for
    /// configuration files, read.
    pub fn of(path: &Path, kind: ResourceKind) -> Result<Self, ScanError> {
        let metadata = fs::metadata(path).map_err(|e| ScanError::Fingerprint {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let mtime_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));

        let sha256 = if kind == ResourceKind::Configuration {
            Some(hash_file(path)?)
        } else {
            None
        };

        Ok(Self {
            size: metadata.len(),
            mtime_ms,
            sha256,
        })
    }
}

/// Hex-encoded SHA-256 of a file's content
fn hash_file(path: &Path) -> Result<String, ScanError> {
    let bytes = fs::read(path).map_err(|e| ScanError::Fingerprint {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Diff two snapshots into per-resource changes
///
/// Removals come first so a rename is handled as remove-then-add, then
/// additions, then content changes. Within each group the snapshot's
/// sorted order holds.
#[must_use]
pub fn compute_changes(
    old: &BTreeMap<ResourceId, Fingerprint>,
    new: &BTreeMap<ResourceId, Fingerprint>,
) -> Vec<ResourceChange> {
    let mut changes = Vec::new();

    for resource in old.keys() {
        if !new.contains_key(resource) {
            changes.push(ResourceChange::new(resource.clone(), ChangeKind::Removed));
        }
    }
    for (resource, fingerprint) in new {
        match old.get(resource) {
            None => changes.push(ResourceChange::new(resource.clone(), ChangeKind::Added)),
            Some(previous) if differs(previous, fingerprint) => {
                changes.push(ResourceChange::new(resource.clone(), ChangeKind::Changed));
            }
            Some(_) => {}
        }
    }

    changes
}

/// Whether two fingerprints of the same resource disagree
///
/// When both sides carry a content hash the hash alone decides, so a
/// rewrite that restores identical bytes is not a change.
fn differs(old: &Fingerprint, new: &Fingerprint) -> bool {
    match (&old.sha256, &new.sha256) {
        (Some(a), Some(b)) => a != b,
        _ => old.size != new.size || old.mtime_ms != new.mtime_ms,
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}
