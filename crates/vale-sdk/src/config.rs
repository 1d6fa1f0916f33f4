use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vale_merge::MergeConfig;
use vale_registry::RegistryConfig;

use crate::error::{SdkError, SdkResult};

/// Top-level configuration file.
///
/// ```toml
/// [registry]
/// root = "vales"
/// artifact_extensions = ["pdf"]
///
/// [[merge.backends]]
/// kind = "qpdf"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValeConfig {
    pub registry: RegistryConfig,
    pub merge: MergeConfig,
}

impl ValeConfig {
    /// Defaults, with the registry rooted at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            registry: RegistryConfig::for_root(root),
            merge: MergeConfig::default(),
        }
    }

    /// Load from a TOML file. A relative registry root is resolved against
    /// the file's directory.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| SdkError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut config: Self = toml::from_str(&text).map_err(|e| SdkError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if config.registry.root.is_relative() {
            if let Some(base) = path.parent() {
                config.registry.root = base.join(&config.registry.root);
            }
        }
        Ok(config)
    }
}
