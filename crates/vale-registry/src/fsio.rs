//! Atomic file replacement.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};

/// Replace `path` with `bytes` without ever exposing a partial file.
///
/// The data is written to a temporary file in the same directory, synced,
/// and renamed over the target. A crash at any point leaves either the old
/// file or the new one.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> RegistryResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|source| persist_error(path, source))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|source| persist_error(path, source))?;
    tmp.write_all(bytes).map_err(|source| persist_error(path, source))?;
    tmp.as_file()
        .sync_all()
        .map_err(|source| persist_error(path, source))?;
    tmp.persist(path)
        .map_err(|e| persist_error(path, e.error))?;

    debug!(path = %path.display(), len = bytes.len(), "file replaced atomically");
    Ok(())
}

fn persist_error(path: &Path, source: std::io::Error) -> RegistryError {
    RegistryError::Persist {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        write_atomic(&path, b"[]").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"[]");
    }

    #[test]
    fn replaces_existing_file_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        write_atomic(&path, b"old").unwrap();
        write_atomic(&path, b"new contents").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new contents");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn creates_missing_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("a.json");
        write_atomic(&path, b"{}").unwrap();
        assert!(path.exists());
    }
}
