use serde::{Deserialize, Serialize};

use crate::backends::concat::DEFAULT_CONCAT_EXTENSIONS;

/// One entry of the backend priority list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendSpec {
    Qpdf,
    Pdfunite,
    /// Any tool taking an argument template with `{inputs}` and `{output}`.
    Command {
        name: String,
        program: String,
        args: Vec<String>,
    },
    Concat {
        #[serde(default = "default_concat_extensions")]
        extensions: Vec<String>,
    },
}

fn default_concat_extensions() -> Vec<String> {
    DEFAULT_CONCAT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

/// Merge configuration: backends in the order they are tried.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub backends: Vec<BackendSpec>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            backends: vec![
                BackendSpec::Qpdf,
                BackendSpec::Pdfunite,
                BackendSpec::Concat {
                    extensions: default_concat_extensions(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order() {
        let cfg = MergeConfig::default();
        assert_eq!(cfg.backends[0], BackendSpec::Qpdf);
        assert_eq!(cfg.backends[1], BackendSpec::Pdfunite);
        assert!(matches!(cfg.backends[2], BackendSpec::Concat { .. }));
    }

    #[test]
    fn parses_from_toml() {
        let cfg: MergeConfig = toml::from_str(
            r#"
            [[backends]]
            kind = "pdfunite"

            [[backends]]
            kind = "command"
            name = "gs"
            program = "gs"
            args = ["-q", "-dBATCH", "-sDEVICE=pdfwrite", "-o", "{output}", "{inputs}"]

            [[backends]]
            kind = "concat"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.backends.len(), 3);
        assert_eq!(cfg.backends[0], BackendSpec::Pdfunite);
        assert!(matches!(&cfg.backends[1], BackendSpec::Command { name, .. } if name == "gs"));
        assert_eq!(
            cfg.backends[2],
            BackendSpec::Concat {
                extensions: vec!["txt".into(), "zpl".into()]
            }
        );
    }

    #[test]
    fn empty_table_uses_defaults() {
        let cfg: MergeConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, MergeConfig::default());
    }
}
