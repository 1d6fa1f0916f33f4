//! Rebuilding the registry from the artifact directory.
//!
//! The directory listing is the ground truth: every file with a configured
//! artifact extension whose name follows the [`ArtifactName`] convention is
//! a voucher. Numbers are only ever taken from filenames, never minted, so a
//! reindex cannot collide with an existing record.

use std::collections::BTreeMap;
use std::io;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use vale_types::timestamp::from_local_naive;
use vale_types::{ArtifactName, VoucherRecord, SIDECAR_EXTENSION};
use walkdir::WalkDir;

use crate::error::{RegistryError, RegistryResult};
use crate::registry::Registry;
use crate::sidecar::read_sidecar;

/// Outcome of a [`Registry::reindex`] run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReindexReport {
    /// Records created by this run.
    pub added: usize,
    /// Artifacts not turned into records: already indexed, orphaned, or
    /// conflicting with another artifact of the same number.
    pub skipped: usize,
    /// Numbers of the created records, ascending.
    pub added_numbers: Vec<u64>,
    /// Artifacts with no recoverable voucher number in their filename.
    pub orphans: Vec<String>,
    /// Artifacts whose number was claimed by another artifact in this run.
    pub conflicts: Vec<String>,
}

impl ReindexReport {
    /// Returns `true` if the run changed nothing.
    pub fn is_noop(&self) -> bool {
        self.added == 0
    }
}

impl Registry {
    /// Add a `Pending` record for every conforming artifact that is not yet
    /// registered.
    ///
    /// Idempotent: a second run over an unchanged directory adds nothing.
    /// The true prior status of a rediscovered voucher cannot be recovered
    /// from its filename, so `Pending` is used as the conservative default.
    /// `created_at` comes from the sidecar's emission time, then the
    /// filename timestamp, then the file's modification time.
    pub fn reindex(&self) -> RegistryResult<ReindexReport> {
        let mut state = self.write_state()?;
        let mut report = ReindexReport::default();
        let mut discovered: BTreeMap<u64, VoucherRecord> = BTreeMap::new();

        let walker = WalkDir::new(self.root())
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| RegistryError::Io(io::Error::other(e)))?;
            let path = entry.path();
            if !entry.file_type().is_file() || !self.config().is_artifact(path) {
                continue;
            }
            if path == self.index_path() || has_extension(path, SIDECAR_EXTENSION) {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().into_owned();
            let parsed = entry
                .file_name()
                .to_str()
                .and_then(ArtifactName::parse);
            let Some(name) = parsed else {
                warn!(file = %file_name, "orphan artifact: no voucher number in filename; skipping");
                report.orphans.push(file_name);
                report.skipped += 1;
                continue;
            };

            if let Some(existing) = state.records.get(&name.number) {
                if existing.artifact_path() != file_name {
                    debug!(
                        number = name.number,
                        indexed = %existing.artifact_path(),
                        found = %file_name,
                        "artifact number already registered to another file"
                    );
                }
                report.skipped += 1;
                continue;
            }
            if discovered.contains_key(&name.number) {
                warn!(number = name.number, file = %file_name, "two artifacts share a voucher number; keeping the first");
                report.conflicts.push(file_name);
                report.skipped += 1;
                continue;
            }

            let sidecar_name = ArtifactName::sidecar_for(&file_name);
            let sidecar_file = self.root().join(&sidecar_name);
            let (sidecar_path, emission_time, item_count) = if sidecar_file.is_file() {
                match read_sidecar(&sidecar_file) {
                    Ok(sidecar) => (Some(sidecar_name), Some(sidecar.emission_time), sidecar.items.len()),
                    Err(issue) => {
                        warn!(file = %sidecar_name, %issue, "sidecar unusable; indexing artifact without item count");
                        (Some(sidecar_name), None, 0)
                    }
                }
            } else {
                (None, None, 0)
            };

            let modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from);
            let created_at = emission_time
                .or_else(|| name.timestamp.map(from_local_naive))
                .or(modified)
                .unwrap_or_else(Utc::now);

            debug!(number = name.number, file = %file_name, "artifact discovered");
            discovered.insert(
                name.number,
                VoucherRecord::new(name.number, created_at, file_name, sidecar_path, item_count),
            );
        }

        if discovered.is_empty() {
            debug!(skipped = report.skipped, "reindex found nothing new");
            return Ok(report);
        }

        let numbers: Vec<u64> = discovered.keys().copied().collect();
        state.records.extend(discovered);
        if let Err(e) = self.persist_locked(&state) {
            for number in &numbers {
                state.records.remove(number);
            }
            return Err(e);
        }

        report.added = numbers.len();
        report.added_numbers = numbers;
        info!(
            added = report.added,
            skipped = report.skipped,
            orphans = report.orphans.len(),
            "reindex complete"
        );
        Ok(report)
    }
}

fn has_extension(path: &std::path::Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::fs;
    use std::path::Path;

    use chrono::Utc;
    use vale_types::timestamp::parse_lenient;
    use vale_types::{Sidecar, Status, VoucherItem};

    use crate::config::RegistryConfig;
    use crate::registry::Registry;
    use crate::sidecar::save_sidecar;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"%PDF-1.4").unwrap();
    }

    fn open(dir: &Path) -> Registry {
        Registry::open(RegistryConfig::for_root(dir)).unwrap()
    }

    #[test]
    fn rebuilds_from_bare_directory() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "vale_000001_20240105_093000.pdf");
        touch(dir.path(), "vale_000003_20240107_100000.pdf");

        let reg = open(dir.path());
        let numbers: Vec<u64> = reg.list(None).unwrap().iter().map(|r| r.number()).collect();
        assert_eq!(numbers, vec![1, 3]);
        assert!(reg.list(None).unwrap().iter().all(|r| r.status() == Status::Pending));
        assert_eq!(reg.next_number().unwrap(), 4);
    }

    #[test]
    fn second_run_adds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "vale_000001.pdf");
        touch(dir.path(), "vale_000002.pdf");
        touch(dir.path(), "notes.pdf");

        let reg = open(dir.path());
        let first = reg.reindex().unwrap();
        assert_eq!(first.added, 0, "open already indexed everything");
        let second = reg.reindex().unwrap();
        assert!(second.is_noop());
        assert_eq!(second.skipped, 3);
        assert_eq!(second.orphans, vec!["notes.pdf".to_string()]);
    }

    #[test]
    fn picks_up_artifacts_added_after_open() {
        let dir = tempfile::tempdir().unwrap();
        let reg = open(dir.path());
        touch(dir.path(), "vale_000010.pdf");
        let report = reg.reindex().unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(report.added_numbers, vec![10]);
        assert!(reg.find_by_number(10).unwrap().is_some());
    }

    #[test]
    fn keeps_existing_status() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "vale_000001.pdf");
        let reg = open(dir.path());
        reg.update_status(&[1], Status::Deducted).unwrap();
        reg.reindex().unwrap();
        assert_eq!(reg.find_by_number(1).unwrap().unwrap().status(), Status::Deducted);
    }

    #[test]
    fn orphans_are_reported_not_guessed() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "vale_abc.pdf");
        touch(dir.path(), "scan 2024.pdf");
        touch(dir.path(), "vale_000000.pdf");
        let reg = open(dir.path());
        assert!(reg.is_empty().unwrap());

        let report = reg.reindex().unwrap();
        assert_eq!(report.orphans.len(), 3);
        assert_eq!(report.skipped, 3);
    }

    #[test]
    fn same_number_twice_keeps_first_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = RegistryConfig {
            reindex_on_open: false,
            ..RegistryConfig::for_root(dir.path())
        };
        let reg = Registry::open(config).unwrap();
        touch(dir.path(), "vale_000005_20240101_080000.pdf");
        touch(dir.path(), "vale_000005_20240102_080000.pdf");

        let report = reg.reindex().unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(report.conflicts, vec!["vale_000005_20240102_080000.pdf".to_string()]);

        let records = reg.list(None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].artifact_path(), "vale_000005_20240101_080000.pdf");
    }

    #[test]
    fn no_duplicate_numbers_after_reindex() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["vale_000001.pdf", "vale_1.pdf", "vale_000002_20240101_000000.pdf", "vale_02.pdf"] {
            touch(dir.path(), name);
        }
        let reg = open(dir.path());
        reg.reindex().unwrap();
        let records = reg.list(None).unwrap();
        let unique: HashSet<u64> = records.iter().map(|r| r.number()).collect();
        assert_eq!(unique.len(), records.len());
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn sidecar_supplies_items_and_time() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "vale_000002_20240101_080000.pdf");
        let emitted = parse_lenient("2023-12-31T23:00:00Z").unwrap();
        let sidecar = Sidecar::new(
            "vale_000002_20240101_080000.pdf",
            emitted,
            vec![
                VoucherItem::new("GauzeA", "L1", "ShelfX", None, 2),
                VoucherItem::new("TapeB", "L2", "ShelfY", None, 1),
            ],
        );
        save_sidecar(&dir.path().join("vale_000002_20240101_080000.json"), &sidecar).unwrap();

        let reg = open(dir.path());
        let rec = reg.find_by_number(2).unwrap().unwrap();
        assert_eq!(rec.item_count(), 2);
        assert_eq!(rec.created_at(), emitted);
        assert_eq!(rec.sidecar_path(), Some("vale_000002_20240101_080000.json"));
    }

    #[test]
    fn corrupt_sidecar_does_not_block_indexing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "vale_000004.pdf");
        fs::write(dir.path().join("vale_000004.json"), b"garbage").unwrap();

        let reg = open(dir.path());
        let rec = reg.find_by_number(4).unwrap().unwrap();
        assert_eq!(rec.item_count(), 0);
        assert_eq!(rec.sidecar_path(), Some("vale_000004.json"));
        assert!(rec.created_at() <= Utc::now());
    }

    #[test]
    fn removed_artifacts_keep_their_records() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "vale_000001.pdf");
        let reg = open(dir.path());
        fs::remove_file(dir.path().join("vale_000001.pdf")).unwrap();
        let report = reg.reindex().unwrap();
        assert!(report.is_noop());
        assert!(reg.find_by_number(1).unwrap().is_some());
        assert_eq!(reg.verify().unwrap().dangling, vec![1]);
    }
}
