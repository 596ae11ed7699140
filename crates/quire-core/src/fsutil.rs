//! Small file system helpers shared by the store, the snapshot and the
//! renderer.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Write a file atomically through a temp file in the same directory.
///
/// Readers see either the old content or the new one, never a partial
/// record. The temp file is removed if the write fails.
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::Builder::new()
        .prefix(".quire-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Write `content`, creating parent directories as needed.
pub(crate) fn write_with_parents(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

/// Remove a file or directory tree. Missing paths are not an error.
pub(crate) fn remove_path(path: &Path) -> io::Result<()> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
