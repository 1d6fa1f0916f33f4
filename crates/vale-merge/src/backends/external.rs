//! Backends that shell out to an external tool.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::backend::MergeBackend;
use crate::error::{MergeError, MergeResult};

/// Placeholder expanded to every input path, in order.
pub const INPUTS_PLACEHOLDER: &str = "{inputs}";
/// Placeholder expanded to the output path.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

const MAX_STDERR: usize = 400;

/// Runs `program` with an argument template.
///
/// The template must contain both [`INPUTS_PLACEHOLDER`] and
/// [`OUTPUT_PLACEHOLDER`]; any other argument is passed through unchanged.
#[derive(Clone, Debug)]
pub struct ExternalToolBackend {
    name: String,
    program: String,
    args: Vec<String>,
}

impl ExternalToolBackend {
    /// A backend with a custom argument template.
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        args: Vec<String>,
    ) -> MergeResult<Self> {
        let name = name.into();
        for placeholder in [INPUTS_PLACEHOLDER, OUTPUT_PLACEHOLDER] {
            if !args.iter().any(|a| a == placeholder) {
                return Err(MergeError::Config(format!(
                    "backend '{name}': argument template lacks {placeholder}"
                )));
            }
        }
        Ok(Self {
            name,
            program: program.into(),
            args,
        })
    }

    /// `qpdf --empty --pages <inputs> -- <output>`
    pub fn qpdf() -> Self {
        Self {
            name: "qpdf".into(),
            program: "qpdf".into(),
            args: vec![
                "--empty".into(),
                "--pages".into(),
                INPUTS_PLACEHOLDER.into(),
                "--".into(),
                OUTPUT_PLACEHOLDER.into(),
            ],
        }
    }

    /// `pdfunite <inputs> <output>` (poppler-utils)
    pub fn pdfunite() -> Self {
        Self {
            name: "pdfunite".into(),
            program: "pdfunite".into(),
            args: vec![INPUTS_PLACEHOLDER.into(), OUTPUT_PLACEHOLDER.into()],
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Resolve the program to an executable path, searching `PATH` for bare
    /// names.
    pub fn locate(&self) -> Option<PathBuf> {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            return program.is_file().then(|| program.to_path_buf());
        }
        let path = std::env::var_os("PATH")?;
        std::env::split_paths(&path).find_map(|dir| {
            let candidate = dir.join(program);
            if candidate.is_file() {
                return Some(candidate);
            }
            if cfg!(windows) {
                let exe = candidate.with_extension("exe");
                if exe.is_file() {
                    return Some(exe);
                }
            }
            None
        })
    }

    fn expand_args(&self, inputs: &[PathBuf], output: &Path) -> Vec<OsString> {
        let mut expanded = Vec::with_capacity(self.args.len() + inputs.len());
        for arg in &self.args {
            match arg.as_str() {
                INPUTS_PLACEHOLDER => expanded.extend(inputs.iter().map(|p| p.as_os_str().to_owned())),
                OUTPUT_PLACEHOLDER => expanded.push(output.as_os_str().to_owned()),
                other => expanded.push(OsString::from(other)),
            }
        }
        expanded
    }
}

impl MergeBackend for ExternalToolBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<(), MergeError> {
        let executable = self
            .locate()
            .ok_or_else(|| MergeError::unavailable(&self.name, format!("'{}' not found on PATH", self.program)))?;

        let args = self.expand_args(inputs, output);
        debug!(backend = %self.name, program = %executable.display(), inputs = inputs.len(), "running merge tool");

        let out = Command::new(&executable)
            .args(&args)
            .output()
            .map_err(|e| MergeError::failed(&self.name, format!("could not start: {e}")))?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let mut reason = stderr.trim().to_string();
            if reason.len() > MAX_STDERR {
                let cut = (0..=MAX_STDERR).rev().find(|&i| reason.is_char_boundary(i)).unwrap_or(0);
                reason.truncate(cut);
                reason.push_str("...");
            }
            if reason.is_empty() {
                reason = format!("exited with {}", out.status);
            }
            return Err(MergeError::failed(&self.name, reason));
        }
        Ok(())
    }
}
