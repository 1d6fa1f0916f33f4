//! Byte concatenation for formats where that is a valid merge.
//!
//! Plain text and label languages such as ZPL can be joined by appending
//! files. PDF cannot, so this backend refuses any input whose extension is
//! not on its list.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::backend::MergeBackend;
use crate::error::MergeError;

/// Extensions accepted by default.
pub const DEFAULT_CONCAT_EXTENSIONS: &[&str] = &["txt", "zpl"];

#[derive(Clone, Debug)]
pub struct ConcatBackend {
    extensions: Vec<String>,
}

impl Default for ConcatBackend {
    fn default() -> Self {
        Self::new(DEFAULT_CONCAT_EXTENSIONS.iter().map(|e| e.to_string()).collect())
    }
}

impl ConcatBackend {
    pub fn new(extensions: Vec<String>) -> Self {
        Self {
            extensions: extensions.into_iter().map(|e| e.to_ascii_lowercase()).collect(),
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

impl MergeBackend for ConcatBackend {
    fn name(&self) -> &str {
        "concat"
    }

    fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<(), MergeError> {
        if let Some(rejected) = inputs.iter().find(|p| !self.accepts(p)) {
            return Err(MergeError::unavailable(
                "concat",
                format!("cannot concatenate {}", rejected.display()),
            ));
        }

        let mut writer = BufWriter::new(File::create(output)?);
        for input in inputs {
            let mut reader = File::open(input)?;
            io::copy(&mut reader, &mut writer)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn joins_text_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.zpl");
        let b = dir.path().join("b.ZPL");
        fs::write(&a, "^XA^FDone^XZ\n").unwrap();
        fs::write(&b, "^XA^FDtwo^XZ\n").unwrap();
        let out = dir.path().join("out.zpl");

        ConcatBackend::default().merge(&[a, b], &out).unwrap();
        assert_eq!(fs::read_to_string(out).unwrap(), "^XA^FDone^XZ\n^XA^FDtwo^XZ\n");
    }

    #[test]
    fn refuses_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.pdf");
        let err = ConcatBackend::default()
            .merge(&[dir.path().join("a.pdf")], &out)
            .unwrap_err();
        assert!(matches!(err, MergeError::Unavailable { .. }));
        assert!(!out.exists());
    }
}
