//! Durable JSON store.
//!
//! Layout:
//!
//! ```text
//! <cache>/store/
//! ├── c_<sha256(name)>.json    # one file per class
//! └── f_<sha256(name)>.json    # one file per function
//! ```
//!
//! Records are written atomically. Enumeration skips records that are empty
//! or cannot be decoded, so one damaged file never blocks a project load.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{sort_entities, Store, StoreError, StoreResult};
use crate::fsutil::atomic_write;
use crate::hash::ContentHash;
use crate::reflection::{qualified_name, Entity, EntityKind};

const RECORD_EXTENSION: &str = "json";

/// Store keeping one JSON file per entity.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Store rooted at `dir` (typically `<cache>/store`). The directory is
    /// created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for an entity. A leading namespace separator in
    /// `name` is ignored.
    pub fn record_path(&self, kind: EntityKind, name: &str) -> PathBuf {
        let hash = ContentHash::compute(qualified_name(name).as_bytes());
        self.dir
            .join(format!("{}{}.{}", kind.prefix(), hash, RECORD_EXTENSION))
    }

    /// Kind encoded in a record file name, if the name follows the convention.
    fn record_kind(file_name: &str) -> Option<EntityKind> {
        let stem = file_name.strip_suffix(".json")?;
        let (kind, hash) = if let Some(hash) = stem.strip_prefix(EntityKind::Class.prefix()) {
            (EntityKind::Class, hash)
        } else if let Some(hash) = stem.strip_prefix(EntityKind::Function.prefix()) {
            (EntityKind::Function, hash)
        } else {
            return None;
        };
        let well_formed = hash.len() == 64 && hash.bytes().all(|b| b.is_ascii_hexdigit());
        well_formed.then_some(kind)
    }

    fn decode(kind: EntityKind, path: &Path, content: &str) -> StoreResult<Entity> {
        let malformed = |reason: String| StoreError::Malformed {
            path: path.to_path_buf(),
            reason,
        };
        if content.trim().is_empty() {
            return Err(malformed("empty record".to_string()));
        }
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| malformed(e.to_string()))?;
        Entity::from_value(kind, value).map_err(|e| malformed(e.to_string()))
    }
}

impl Store for JsonStore {
    fn write(&mut self, entity: &Entity) -> StoreResult<()> {
        entity.validate()?;
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let path = self.record_path(entity.kind(), entity.name());
        let content = serde_json::to_string_pretty(&entity.to_value()?)?;
        atomic_write(&path, content.as_bytes()).map_err(|e| StoreError::io(&path, e))?;
        debug!(kind = %entity.kind(), entity = entity.name(), "wrote store record");
        Ok(())
    }

    fn read(&self, kind: EntityKind, name: &str) -> StoreResult<Entity> {
        let path = self.record_path(kind, name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::not_found(kind, name));
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        Self::decode(kind, &path, &content)
    }

    fn remove(&mut self, kind: EntityKind, name: &str) -> StoreResult<()> {
        let path = self.record_path(kind, name);
        fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
        debug!(%kind, entity = name, "removed store record");
        Ok(())
    }

    fn list_all(&self) -> StoreResult<Vec<Entity>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut entities = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.dir.clone());
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other("directory walk failed"));
                StoreError::io(path, source)
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(kind) = Self::record_kind(&entry.file_name().to_string_lossy()) else {
                continue;
            };

            let path = entry.path();
            let decoded = fs::read_to_string(path)
                .map_err(|e| StoreError::io(path, e))
                .and_then(|content| Self::decode(kind, path, &content));
            match decoded {
                Ok(entity) => entities.push(entity),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable store record"),
            }
        }

        sort_entities(&mut entities);
        Ok(entities)
    }

    fn clear(&mut self) -> StoreResult<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&self.dir, e)),
        }
    }
}
