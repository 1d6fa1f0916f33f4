use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default name of the index file inside the artifact directory.
pub const DEFAULT_INDEX_FILE: &str = "vales_index.json";

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Directory holding rendered artifacts, sidecars, and the index.
    pub root: PathBuf,
    /// Index filename, relative to `root`.
    pub index_file: String,
    /// Extensions (without the dot) of primary artifacts the reindexer picks up.
    pub artifact_extensions: Vec<String>,
    /// Resynchronize an existing index with orphan artifacts when opening.
    pub reindex_on_open: bool,
    /// Hold an advisory lock file for the registry's lifetime.
    pub exclusive_lock: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("vales"),
            index_file: DEFAULT_INDEX_FILE.to_string(),
            artifact_extensions: vec!["pdf".to_string()],
            reindex_on_open: true,
            exclusive_lock: true,
        }
    }
}

impl RegistryConfig {
    /// Default configuration rooted at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Absolute path of the index file.
    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index_file)
    }

    /// Path of the advisory lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.root.join(format!("{}.lock", self.index_file))
    }

    /// Returns `true` if `path` has one of the configured artifact extensions.
    pub fn is_artifact(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.artifact_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}
