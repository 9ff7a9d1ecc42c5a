//! Resource identity and change events
//!
//! A resource is anything in the project tree the build cares about,
//! addressed by its project-relative path. The kind of a resource is
//! resolved once from its extension and drives all dispatch decisions.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::defaults::{CONFIG_EXTENSION, SOURCE_EXTENSION};

/// Project-relative resource path
///
/// Always stored with `/` separators regardless of platform, so the same
/// value round-trips through configuration files and the state file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Create a resource identity from a path string
    ///
    /// Backslashes are normalized to `/` and any leading `./` or `/` is
    /// stripped, so equivalent spellings compare equal.
    pub fn new(path: impl AsRef<str>) -> Self {
        let mut normalized = path.as_ref().replace('\\', "/");
        while let Some(rest) = normalized.strip_prefix("./") {
            normalized = rest.to_string();
        }
        let normalized = normalized.trim_start_matches('/').trim_end_matches('/');
        Self(normalized.to_string())
    }

    /// The project-relative path string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File extension, if any
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => Some(ext),
            _ => None,
        }
    }

    /// Final path segment
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Parent resource, or `None` at the project root
    #[must_use]
    pub fn parent(&self) -> Option<ResourceId> {
        self.0.rsplit_once('/').map(|(dir, _)| Self(dir.to_string()))
    }

    /// All ancestor resources, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = ResourceId> {
        std::iter::successors(self.parent(), ResourceId::parent)
    }

    /// Resource kind resolved from the extension
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        ResourceKind::of(self.extension())
    }

    /// Absolute OS path of this resource under the given project root
    #[must_use]
    pub fn os_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in self.0.split('/') {
            path.push(segment);
        }
        path
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// What a resource means to the build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Compilable source file (`.es`)
    Source,
    /// Build configuration file (`.bc`)
    Configuration,
    /// Anything else; ignored by the build
    Other,
}

impl ResourceKind {
    /// Resolve a kind from a file extension
    #[must_use]
    pub fn of(extension: Option<&str>) -> Self {
        match extension {
            Some(ext) if ext == SOURCE_EXTENSION => Self::Source,
            Some(ext) if ext == CONFIG_EXTENSION => Self::Configuration,
            _ => Self::Other,
        }
    }
}

/// Delta kind reported by the change feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Resource appeared since the last pass
    Added,
    /// Resource disappeared since the last pass
    Removed,
    /// Resource content changed since the last pass
    Changed,
}

/// One incremental change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceChange {
    /// The affected resource
    pub resource: ResourceId,
    /// What happened to it
    pub kind: ChangeKind,
}

impl ResourceChange {
    /// Convenience constructor
    pub fn new(resource: impl Into<ResourceId>, kind: ChangeKind) -> Self {
        Self {
            resource: resource.into(),
            kind,
        }
    }
}
