//! Change detection between the last rendered snapshot and the current
//! project.
//!
//! A [`Snapshot`] records one fingerprint per rendered class and per
//! function, the namespace list and a fingerprint of the render settings. It
//! is written to `<build>/renderer.index` after a successful render; deleting
//! the build directory therefore forces a full rebuild.
//!
//! A [`Diff`] compares a freshly captured snapshot against the stored one:
//! - a class is modified when it is new or its fingerprint changed
//! - a class is removed when only the stored snapshot knows it
//! - a namespace is modified when it is new, when a class or function it
//!   directly contains was added, modified or removed, or when a direct
//!   sub-namespace appeared or disappeared
//!
//! All result lists are sorted by qualified name.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::fsutil::atomic_write;
use crate::hash::ContentHash;
use crate::project::Project;
use crate::reflection::{parent_namespace, split_qualified, Reflection, ReflectionError};

/// File name of the committed snapshot inside the build directory.
pub const SNAPSHOT_FILE_NAME: &str = "renderer.index";

/// Snapshot format version; a stored snapshot with another version is
/// disregarded.
const SNAPSHOT_VERSION: u32 = 1;

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while fingerprinting or committing a snapshot.
#[derive(Debug, Error)]
pub enum DiffError {
    /// An entity could not be encoded for fingerprinting.
    #[error("failed to fingerprint entity: {0}")]
    Reflection(#[from] ReflectionError),

    /// The snapshot could not be written.
    #[error("failed to write snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for diff operations.
pub type DiffResult<T> = Result<T, DiffError>;

// ============================================================================
// Snapshot
// ============================================================================

/// Fingerprints of everything rendered by one build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    version: u32,
    /// When the snapshot was captured (not part of comparisons).
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    settings: Option<ContentHash>,
    #[serde(default)]
    classes: BTreeMap<String, ContentHash>,
    #[serde(default)]
    functions: BTreeMap<String, ContentHash>,
    #[serde(default)]
    namespaces: BTreeSet<String>,
}

impl Snapshot {
    /// Capture the current state of a project.
    ///
    /// A class fingerprint covers the class's own encoding and, when
    /// inherited members are merged into class pages, the encoding of every
    /// known ancestor and used trait, so a change to a parent re-renders its
    /// children.
    pub fn capture(project: &Project) -> DiffResult<Self> {
        let deep = project.config().include_parent_data;

        let mut classes = BTreeMap::new();
        for class in project.rendered_classes() {
            let mut encoded = Vec::new();
            for owner in project.lineage(class, deep) {
                encoded.push(owner.to_value()?);
            }
            classes.insert(class.name().to_string(), ContentHash::of_json(&encoded)?);
        }

        let mut functions = BTreeMap::new();
        for function in project.functions() {
            functions.insert(
                function.name().to_string(),
                ContentHash::of_json(&function.to_value()?)?,
            );
        }

        Ok(Snapshot {
            version: SNAPSHOT_VERSION,
            created_at: format_timestamp(SystemTime::now()),
            settings: Some(ContentHash::of_json(&project.config().render_settings())?),
            classes,
            functions,
            namespaces: project.namespaces().into_iter().collect(),
        })
    }

    /// Load a stored snapshot. A missing, unreadable or corrupt snapshot
    /// yields `None`.
    pub fn load(path: &Path) -> Option<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read snapshot, rebuilding everything");
                return None;
            }
        };
        match serde_json::from_str::<Snapshot>(&content) {
            Ok(snapshot) if snapshot.version == SNAPSHOT_VERSION => Some(snapshot),
            Ok(snapshot) => {
                warn!(
                    path = %path.display(),
                    version = snapshot.version,
                    "snapshot has unsupported version, rebuilding everything"
                );
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt snapshot, rebuilding everything");
                None
            }
        }
    }

    /// Write the snapshot atomically, creating the parent directory.
    pub fn save(&self, path: &Path) -> DiffResult<()> {
        let io_err = |source| DiffError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        atomic_write(path, content.as_bytes()).map_err(io_err)
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn class_fingerprint(&self, name: &str) -> Option<&ContentHash> {
        self.classes.get(name)
    }

    /// Same content, ignoring the capture time.
    fn same_content(&self, other: &Snapshot) -> bool {
        self.version == other.version
            && self.settings == other.settings
            && self.classes == other.classes
            && self.functions == other.functions
            && self.namespaces == other.namespaces
    }
}

fn format_timestamp(time: SystemTime) -> String {
    use chrono::{DateTime, Utc};

    let datetime: DateTime<Utc> = time.into();
    datetime.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// ============================================================================
// Diff
// ============================================================================

/// Counts of a diff, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub already_rendered: bool,
    pub modified_classes: usize,
    pub removed_classes: usize,
    pub modified_functions: usize,
    pub removed_functions: usize,
    pub modified_namespaces: usize,
    pub removed_namespaces: usize,
}

/// Classification of a project against the last committed snapshot.
#[derive(Debug, Clone)]
pub struct Diff {
    path: PathBuf,
    previous: Option<Snapshot>,
    current: Snapshot,
    modified_classes: Vec<String>,
    removed_classes: Vec<String>,
    modified_functions: Vec<String>,
    removed_functions: Vec<String>,
    modified_namespaces: Vec<String>,
    removed_namespaces: Vec<String>,
}

impl Diff {
    /// Diff a project against the snapshot in its build directory.
    pub fn compute(project: &Project) -> DiffResult<Self> {
        let path = project.config().build_dir.join(SNAPSHOT_FILE_NAME);
        Diff::against(project, path)
    }

    /// Diff a project against the snapshot stored at `path`.
    pub fn against(project: &Project, path: impl Into<PathBuf>) -> DiffResult<Self> {
        let path = path.into();
        let previous = Snapshot::load(&path);
        let current = Snapshot::capture(project)?;
        let diff = Diff::between(path, previous, current);
        debug!(
            modified_classes = diff.modified_classes.len(),
            removed_classes = diff.removed_classes.len(),
            modified_namespaces = diff.modified_namespaces.len(),
            "computed diff"
        );
        Ok(diff)
    }

    fn between(path: PathBuf, previous: Option<Snapshot>, current: Snapshot) -> Self {
        let empty = Snapshot::default();
        let stored = previous.as_ref().unwrap_or(&empty);

        // After a settings change every page is stale, but removals are still
        // computed against what was actually rendered.
        let settings_match = stored.settings == current.settings;
        let baseline = if settings_match { stored } else { &empty };

        let (modified_classes, removed_classes) =
            classify(&baseline.classes, &stored.classes, &current.classes);
        let (modified_functions, removed_functions) =
            classify(&baseline.functions, &stored.functions, &current.functions);

        let mut touched: BTreeSet<&str> = BTreeSet::new();
        for name in modified_classes
            .iter()
            .chain(&removed_classes)
            .chain(&modified_functions)
            .chain(&removed_functions)
        {
            touched.insert(split_qualified(name).0);
        }
        for namespace in current
            .namespaces
            .symmetric_difference(&stored.namespaces)
        {
            if let Some(parent) = parent_namespace(namespace) {
                touched.insert(parent);
            }
        }

        let modified_namespaces = current
            .namespaces
            .iter()
            .filter(|ns| {
                !baseline.namespaces.contains(*ns) || touched.contains(ns.as_str())
            })
            .cloned()
            .collect();
        let removed_namespaces = stored
            .namespaces
            .difference(&current.namespaces)
            .cloned()
            .collect();

        Diff {
            path,
            previous,
            current,
            modified_classes,
            removed_classes,
            modified_functions,
            removed_functions,
            modified_namespaces,
            removed_namespaces,
        }
    }

    /// True when nothing needs to be rendered or deleted.
    pub fn is_empty(&self) -> bool {
        self.modified_classes.is_empty()
            && self.removed_classes.is_empty()
            && self.modified_functions.is_empty()
            && self.removed_functions.is_empty()
            && self.modified_namespaces.is_empty()
            && self.removed_namespaces.is_empty()
    }

    /// True when a snapshot exists and matches the current state exactly.
    pub fn is_already_rendered(&self) -> bool {
        self.previous
            .as_ref()
            .is_some_and(|previous| previous.same_content(&self.current))
    }

    /// Added or changed classes, sorted.
    pub fn modified_classes(&self) -> &[String] {
        &self.modified_classes
    }

    /// Classes that were rendered before and no longer exist, sorted.
    pub fn removed_classes(&self) -> &[String] {
        &self.removed_classes
    }

    pub fn modified_functions(&self) -> &[String] {
        &self.modified_functions
    }

    pub fn removed_functions(&self) -> &[String] {
        &self.removed_functions
    }

    /// Namespaces whose pages must be rendered, sorted.
    pub fn modified_namespaces(&self) -> &[String] {
        &self.modified_namespaces
    }

    /// Namespaces that were rendered before and no longer exist, sorted.
    pub fn removed_namespaces(&self) -> &[String] {
        &self.removed_namespaces
    }

    /// Location of the snapshot this diff commits to.
    pub fn snapshot_path(&self) -> &Path {
        &self.path
    }

    pub fn summary(&self) -> DiffSummary {
        DiffSummary {
            already_rendered: self.is_already_rendered(),
            modified_classes: self.modified_classes.len(),
            removed_classes: self.removed_classes.len(),
            modified_functions: self.modified_functions.len(),
            removed_functions: self.removed_functions.len(),
            modified_namespaces: self.modified_namespaces.len(),
            removed_namespaces: self.removed_namespaces.len(),
        }
    }

    /// Commit the current state as the new snapshot.
    pub fn save(&self) -> DiffResult<()> {
        self.current.save(&self.path)?;
        info!(
            path = %self.path.display(),
            classes = self.current.classes.len(),
            "committed render snapshot"
        );
        Ok(())
    }
}

/// Split `current` into modified names (new or changed against `baseline`)
/// and removed names (in `stored` but not in `current`).
fn classify(
    baseline: &BTreeMap<String, ContentHash>,
    stored: &BTreeMap<String, ContentHash>,
    current: &BTreeMap<String, ContentHash>,
) -> (Vec<String>, Vec<String>) {
    let modified = current
        .iter()
        .filter(|(name, fingerprint)| baseline.get(*name) != Some(*fingerprint))
        .map(|(name, _)| name.clone())
        .collect();
    let removed = stored
        .keys()
        .filter(|name| !current.contains_key(*name))
        .cloned()
        .collect();
    (modified, removed)
}

// ============================================================================
// Tests
// ============================================================================
