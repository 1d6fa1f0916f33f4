//! The artifact filename convention.
//!
//! Rendered vouchers are stored as
//!
//! ```text
//! vale_{number:06}_{YYYYMMDD}_{HHMMSS}[_{label}].{ext}
//! ```
//!
//! and their sidecar shares the stem with a `.json` extension. The timestamp
//! segment is optional on read (`vale_000012.pdf` is accepted); the number
//! segment must be all digits and non-zero. This is the only metadata the
//! reindexer can recover from a bare directory listing, so the format is
//! frozen.

use std::fmt;

use chrono::NaiveDateTime;

/// Prefix shared by every artifact filename.
pub const ARTIFACT_PREFIX: &str = "vale_";

/// Extension of sidecar files.
pub const SIDECAR_EXTENSION: &str = "json";

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A parsed (or to-be-written) artifact filename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactName {
    /// Voucher number embedded in the name.
    pub number: u64,
    /// Local wall-clock time embedded in the name, if any.
    pub timestamp: Option<NaiveDateTime>,
    /// Optional free-form suffix (e.g. `consolidated`).
    pub label: Option<String>,
    /// File extension without the dot.
    pub extension: String,
}

impl ArtifactName {
    /// Build a name for a freshly issued voucher.
    pub fn new(number: u64, timestamp: NaiveDateTime, extension: impl Into<String>) -> Self {
        Self {
            number,
            timestamp: Some(timestamp),
            label: None,
            extension: extension.into(),
        }
    }

    /// Attach a suffix label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The filename stem (everything before the extension).
    pub fn stem(&self) -> String {
        let mut stem = format!("{ARTIFACT_PREFIX}{:06}", self.number);
        if let Some(ts) = self.timestamp {
            stem.push('_');
            stem.push_str(&ts.format(STAMP_FORMAT).to_string());
        }
        if let Some(label) = &self.label {
            stem.push('_');
            stem.push_str(label);
        }
        stem
    }

    /// The full artifact filename.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.stem(), self.extension)
    }

    /// The sidecar filename paired with this artifact.
    pub fn sidecar_name(&self) -> String {
        format!("{}.{SIDECAR_EXTENSION}", self.stem())
    }

    /// Parse a filename. Returns `None` when the name does not follow the
    /// convention or the number cannot be recovered unambiguously.
    pub fn parse(file_name: &str) -> Option<Self> {
        let (stem, extension) = file_name.rsplit_once('.')?;
        if extension.is_empty() {
            return None;
        }
        let rest = stem.strip_prefix(ARTIFACT_PREFIX)?;
        let mut segments = rest.split('_');

        let number_seg = segments.next()?;
        if number_seg.is_empty() || !number_seg.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let number: u64 = number_seg.parse().ok()?;
        if number == 0 {
            return None;
        }

        let remaining: Vec<&str> = segments.collect();
        let (timestamp, label_segments) = match remaining.as_slice() {
            [date, time, tail @ ..] if is_digits(date, 8) && is_digits(time, 6) => {
                let ts = NaiveDateTime::parse_from_str(&format!("{date}_{time}"), STAMP_FORMAT).ok()?;
                (Some(ts), tail)
            }
            other => (None, other),
        };

        let label = if label_segments.is_empty() {
            None
        } else {
            let joined = label_segments.join("_");
            if joined.is_empty() {
                return None;
            }
            Some(joined)
        };

        Some(Self {
            number,
            timestamp,
            label,
            extension: extension.to_string(),
        })
    }

    /// Sidecar filename for an arbitrary artifact filename (same stem).
    pub fn sidecar_for(artifact_file_name: &str) -> String {
        let stem = artifact_file_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(artifact_file_name);
        format!("{stem}.{SIDECAR_EXTENSION}")
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

fn is_digits(segment: &str, len: usize) -> bool {
    segment.len() == len && segment.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap()
    }

    #[test]
    fn format_zero_pads_number() {
        let name = ArtifactName::new(42, stamp(), "pdf");
        assert_eq!(name.file_name(), "vale_000042_20240601_140509.pdf");
        assert_eq!(name.sidecar_name(), "vale_000042_20240601_140509.json");
    }

    #[test]
    fn wide_numbers_are_not_truncated() {
        let name = ArtifactName::new(1_234_567, stamp(), "pdf");
        assert!(name.file_name().starts_with("vale_1234567_"));
        assert_eq!(ArtifactName::parse(&name.file_name()).unwrap().number, 1_234_567);
    }

    #[test]
    fn parse_full_name() {
        let parsed = ArtifactName::parse("vale_000042_20240601_140509.pdf").unwrap();
        assert_eq!(parsed, ArtifactName::new(42, stamp(), "pdf"));
    }

    #[test]
    fn parse_without_timestamp() {
        let parsed = ArtifactName::parse("vale_000012.pdf").unwrap();
        assert_eq!(parsed.number, 12);
        assert!(parsed.timestamp.is_none());
        assert!(parsed.label.is_none());
    }

    #[test]
    fn parse_with_label() {
        let name = ArtifactName::new(7, stamp(), "pdf").with_label("consolidado");
        let parsed = ArtifactName::parse(&name.file_name()).unwrap();
        assert_eq!(parsed, name);
    }

    #[test]
    fn parse_rejects_non_conforming_names() {
        for bad in [
            "vale_.pdf",
            "vale_abc_20240601_140509.pdf",
            "vale_000000_20240601_140509.pdf",
            "voucher_000001.pdf",
            "vale_000001",
            "vale_00x001.pdf",
            "vale_000001_.pdf",
            "vale_99999999999999999999999.pdf",
        ] {
            assert!(ArtifactName::parse(bad).is_none(), "{bad} should not parse");
        }
    }

    #[test]
    fn sidecar_for_arbitrary_name() {
        assert_eq!(ArtifactName::sidecar_for("vale_000001.pdf"), "vale_000001.json");
        assert_eq!(ArtifactName::sidecar_for("noext"), "noext.json");
    }
}
