//! The seam through which artifacts are produced.
//!
//! Layout and printing live outside this workspace. Callers plug in a
//! [`Renderer`] that writes the human-readable document; the SDK takes care
//! of numbering, sidecars, and registration around it.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use thiserror::Error;
use vale_types::timestamp::{self, Timestamp};
use vale_types::{ConsolidatedLine, VoucherItem};

#[derive(Debug, Error)]
#[error("{0}")]
pub struct RenderError(pub String);

impl From<std::io::Error> for RenderError {
    fn from(e: std::io::Error) -> Self {
        Self(e.to_string())
    }
}

impl From<std::fmt::Error> for RenderError {
    fn from(e: std::fmt::Error) -> Self {
        Self(e.to_string())
    }
}

/// What a voucher document contains.
#[derive(Clone, Copy, Debug)]
pub enum DocumentBody<'a> {
    /// A freshly issued voucher.
    Items(&'a [VoucherItem]),
    /// A unified voucher built from earlier ones.
    Consolidated {
        lines: &'a [ConsolidatedLine],
        sources: &'a [u64],
    },
}

/// Everything a renderer needs to lay out one voucher.
#[derive(Clone, Copy, Debug)]
pub struct RenderRequest<'a> {
    pub number: u64,
    pub emitted_at: Timestamp,
    pub body: DocumentBody<'a>,
}

/// Writes the human-readable artifact of a voucher.
pub trait Renderer {
    /// Extension of the produced files, without the dot.
    fn extension(&self) -> &str;

    /// Write the document for `request` to `path`.
    fn render(&self, request: &RenderRequest<'_>, path: &Path) -> Result<(), RenderError>;
}

/// Plain-text renderer, one line per item.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn extension(&self) -> &str {
        "txt"
    }

    fn render(&self, request: &RenderRequest<'_>, path: &Path) -> Result<(), RenderError> {
        let mut out = String::new();
        writeln!(out, "VALE #{:06}", request.number)?;
        writeln!(out, "emitted: {}", timestamp::format(&request.emitted_at))?;
        match request.body {
            DocumentBody::Items(items) => {
                for item in items {
                    writeln!(out, "{}\t{}", item.key(), item.quantity)?;
                }
            }
            DocumentBody::Consolidated { lines, sources } => {
                let sources: Vec<String> = sources.iter().map(|n| format!("#{n}")).collect();
                writeln!(out, "consolidated from: {}", sources.join(", "))?;
                for line in lines {
                    writeln!(out, "{}\t{}\t{}", line.key, line.quantity, line.origins_label())?;
                }
            }
        }
        fs::write(path, out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vale_types::LineKey;

    #[test]
    fn text_renderer_lists_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v.txt");
        let items = vec![VoucherItem::new("GauzeA", "L1", "ShelfX", None, 3)];
        let request = RenderRequest {
            number: 7,
            emitted_at: Utc::now(),
            body: DocumentBody::Items(&items),
        };
        TextRenderer.render(&request, &path).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.starts_with("VALE #000007\n"));
        assert!(text.contains("GauzeA / L1 / ShelfX / -\t3"));
    }

    #[test]
    fn text_renderer_shows_origins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v.txt");
        let mut line = ConsolidatedLine::new(LineKey {
            product: "TapeB".into(),
            lot: "L2".into(),
            location: "ShelfY".into(),
            expiry: None,
        });
        line.quantity = 1;
        line.origin_numbers = vec![2];
        let request = RenderRequest {
            number: 9,
            emitted_at: Utc::now(),
            body: DocumentBody::Consolidated {
                lines: std::slice::from_ref(&line),
                sources: &[1, 2],
            },
        };
        TextRenderer.render(&request, &path).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("consolidated from: #1, #2"));
        assert!(text.contains("\t#2"));
    }
}
