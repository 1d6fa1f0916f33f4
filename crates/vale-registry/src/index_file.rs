//! Reading and writing the registry index file.
//!
//! On-disk format: a pretty-printed JSON array of records, ascending by
//! number. Unknown fields are ignored on read.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::warn;
use vale_types::VoucherRecord;

use crate::error::{RegistryError, RegistryResult};
use crate::fsio::write_atomic;

/// Load the index at `path`.
///
/// Returns `Ok(None)` when the file does not exist and
/// [`RegistryError::CorruptIndex`] when it cannot be parsed. Duplicate
/// numbers keep their first occurrence.
pub fn load(path: &Path) -> RegistryResult<Option<BTreeMap<u64, VoucherRecord>>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let records: Vec<VoucherRecord> =
        serde_json::from_slice(&bytes).map_err(|e| RegistryError::CorruptIndex {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut map = BTreeMap::new();
    for record in records {
        if record.number() == 0 {
            warn!(path = %path.display(), "index entry with number 0; skipping");
            continue;
        }
        if map.contains_key(&record.number()) {
            warn!(number = record.number(), "duplicate number in index; keeping first entry");
            continue;
        }
        map.insert(record.number(), record);
    }
    Ok(Some(map))
}

/// Persist `records` to `path` atomically.
pub fn save(path: &Path, records: &BTreeMap<u64, VoucherRecord>) -> RegistryResult<()> {
    let list: Vec<&VoucherRecord> = records.values().collect();
    let bytes = serde_json::to_vec_pretty(&list)
        .map_err(|e| RegistryError::Serialization(e.to_string()))?;
    write_atomic(path, &bytes)
}

/// Move an unreadable index out of the way so it can be inspected later.
///
/// Returns the new location of the file.
pub fn quarantine(path: &Path) -> RegistryResult<PathBuf> {
    let stamp = Utc::now().format("%Y%m%d%H%M%S%3f");
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string());
    let mut backup = path.with_file_name(format!("{file_name}.corrupt-{stamp}"));
    let mut attempt = 1u32;
    while backup.exists() {
        backup = path.with_file_name(format!("{file_name}.corrupt-{stamp}-{attempt}"));
        attempt += 1;
    }
    fs::rename(path, &backup).map_err(|source| RegistryError::Persist {
        path: backup.clone(),
        source,
    })?;
    Ok(backup)
}
