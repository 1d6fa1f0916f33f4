//! The [`Registry`]: durable voucher records and sequential numbering.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::{debug, info, warn};
use vale_types::{Sidecar, Status, VoucherRecord};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::index_file;
use crate::lock::ProcessLock;
use crate::sidecar::{read_sidecar, SidecarIssue};
use crate::transition::{check_transition, Transition};

/// Mutable registry state, mirrored to the index file.
#[derive(Debug, Default)]
pub(crate) struct RegistryState {
    pub(crate) records: BTreeMap<u64, VoucherRecord>,
    /// Highest number handed out by [`Registry::next_number`] in this process.
    pub(crate) reserved: u64,
}

impl RegistryState {
    fn highest_number(&self) -> u64 {
        self.records.keys().next_back().copied().unwrap_or(0)
    }
}

/// What happened when an unreadable index was found at open time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoveryNotice {
    /// Parse error of the original index.
    pub reason: String,
    /// Where the unreadable index was moved.
    pub backup: PathBuf,
    /// Records recovered from the artifact directory.
    pub recovered: usize,
}

/// Result of [`Registry::verify`]: drift between the index and the disk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Records whose artifact file no longer exists.
    pub dangling: Vec<u64>,
    /// Records referencing a sidecar that is missing or unreadable.
    pub broken_sidecars: Vec<u64>,
    /// Records whose cached item count differs from their sidecar:
    /// `(number, cached, actual)`.
    pub item_count_drift: Vec<(u64, usize, usize)>,
}

impl VerifyReport {
    /// Returns `true` if nothing drifted.
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty() && self.broken_sidecars.is_empty() && self.item_count_drift.is_empty()
    }
}

/// The voucher registry.
///
/// Reads take a shared lock and return clones; writes take the exclusive
/// lock, persist the full index, and only then release it. A failed persist
/// rolls the in-memory change back, so memory never runs ahead of disk.
pub struct Registry {
    config: RegistryConfig,
    index_path: PathBuf,
    pub(crate) state: RwLock<RegistryState>,
    recovery: Option<RecoveryNotice>,
    _lock: Option<ProcessLock>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("index_path", &self.index_path)
            .field("recovery", &self.recovery)
            .finish()
    }
}

impl Registry {
    /// Open the registry described by `config`.
    ///
    /// - Missing index: rebuilt from the artifact directory.
    /// - Unreadable index: moved aside, rebuilt, and reported through
    ///   [`Registry::recovery`] instead of failing.
    /// - Readable index: loaded, then resynchronized with orphan artifacts
    ///   if `reindex_on_open` is set.
    ///
    /// Fails only when the directory cannot be created, read, or written, or
    /// when another process holds the registry lock.
    pub fn open(config: RegistryConfig) -> RegistryResult<Self> {
        fs::create_dir_all(&config.root)?;

        let lock = if config.exclusive_lock {
            Some(ProcessLock::acquire(&config.lock_path())?)
        } else {
            None
        };

        let index_path = config.index_path();
        let mut registry = Self {
            config,
            index_path,
            state: RwLock::new(RegistryState::default()),
            recovery: None,
            _lock: lock,
        };

        match index_file::load(&registry.index_path) {
            Ok(Some(records)) => {
                debug!(count = records.len(), path = %registry.index_path.display(), "index loaded");
                registry.write_state()?.records = records;
                if registry.config.reindex_on_open {
                    registry.reindex()?;
                }
            }
            Ok(None) => {
                info!(path = %registry.index_path.display(), "no index found; rebuilding from artifacts");
                registry.reindex()?;
                registry.persist_current()?;
            }
            Err(RegistryError::CorruptIndex { path, reason }) => {
                warn!(path = %path.display(), %reason, "index unreadable; rebuilding from artifacts");
                let backup = index_file::quarantine(&path)?;
                let report = registry.reindex()?;
                registry.persist_current()?;
                registry.recovery = Some(RecoveryNotice {
                    reason,
                    backup,
                    recovered: report.added,
                });
            }
            Err(e) => return Err(e),
        }

        Ok(registry)
    }

    /// The configuration this registry was opened with.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Directory holding artifacts, sidecars, and the index.
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Set when the index was unreadable at open time and had to be rebuilt.
    pub fn recovery(&self) -> Option<&RecoveryNotice> {
        self.recovery.as_ref()
    }

    // ---------------------------------------------------------------
    // Sequence allocation
    // ---------------------------------------------------------------

    /// Reserve the next voucher number.
    ///
    /// Returns one more than the highest number registered or reserved so
    /// far. Nothing is written: a caller that fails to register the number
    /// leaves a permanent gap, which is accepted. Numbers are unique and
    /// increasing, not contiguous.
    pub fn next_number(&self) -> RegistryResult<u64> {
        let mut state = self.write_state()?;
        let highest = state.highest_number().max(state.reserved);
        let next = highest
            .checked_add(1)
            .ok_or(RegistryError::NumbersExhausted(highest))?;
        state.reserved = next;
        debug!(number = next, "voucher number reserved");
        Ok(next)
    }

    // ---------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------

    /// Register a voucher under an explicit number.
    ///
    /// Fails with [`RegistryError::DuplicateNumber`] if the number is taken;
    /// an existing record is never overwritten.
    pub fn register_with_number(
        &self,
        number: u64,
        artifact_path: impl Into<String>,
        sidecar_path: Option<String>,
        item_count: usize,
    ) -> RegistryResult<VoucherRecord> {
        if number == 0 {
            return Err(RegistryError::InvalidNumber(number));
        }
        let artifact_path = artifact_path.into();
        if !self.config.root.join(&artifact_path).exists() {
            warn!(number, artifact = %artifact_path, "registering voucher whose artifact is not on disk");
        }

        let record = VoucherRecord::new(number, Utc::now(), artifact_path, sidecar_path, item_count);

        let mut state = self.write_state()?;
        if state.records.contains_key(&number) {
            return Err(RegistryError::DuplicateNumber(number));
        }
        state.records.insert(number, record.clone());
        if let Err(e) = index_file::save(&self.index_path, &state.records) {
            state.records.remove(&number);
            return Err(e);
        }
        state.reserved = state.reserved.max(number);

        info!(number, artifact = %record.artifact_path(), items = item_count, "voucher registered");
        Ok(record)
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// All records in ascending number order, optionally filtered by status.
    pub fn list(&self, status_filter: Option<Status>) -> RegistryResult<Vec<VoucherRecord>> {
        let state = self.read_state()?;
        Ok(state
            .records
            .values()
            .filter(|r| status_filter.map_or(true, |s| r.status() == s))
            .cloned()
            .collect())
    }

    /// Look up one record.
    pub fn find_by_number(&self, number: u64) -> RegistryResult<Option<VoucherRecord>> {
        Ok(self.read_state()?.records.get(&number).cloned())
    }

    /// Number of records.
    pub fn len(&self) -> RegistryResult<usize> {
        Ok(self.read_state()?.records.len())
    }

    /// Returns `true` if the registry holds no records.
    pub fn is_empty(&self) -> RegistryResult<bool> {
        Ok(self.read_state()?.records.is_empty())
    }

    /// Absolute path of a record's artifact.
    pub fn artifact_file(&self, record: &VoucherRecord) -> PathBuf {
        self.config.root.join(record.artifact_path())
    }

    /// Absolute path of a record's sidecar, if it has one.
    pub fn sidecar_file(&self, record: &VoucherRecord) -> Option<PathBuf> {
        record.sidecar_path().map(|s| self.config.root.join(s))
    }

    /// Load the structured line items of a record.
    pub fn load_sidecar(&self, record: &VoucherRecord) -> Result<Sidecar, SidecarIssue> {
        let path = self.sidecar_file(record).ok_or(SidecarIssue::NotRecorded)?;
        read_sidecar(&path)
    }

    // ---------------------------------------------------------------
    // Status changes
    // ---------------------------------------------------------------

    /// Move every listed voucher to `new_status` where the transition table
    /// allows it.
    ///
    /// Unknown numbers, disallowed transitions, and records already in
    /// `new_status` are skipped. Returns how many records actually changed.
    pub fn update_status(&self, numbers: &[u64], new_status: Status) -> RegistryResult<usize> {
        let mut state = self.write_state()?;
        let mut previous: Vec<(u64, Status)> = Vec::new();

        for &number in numbers {
            let Some(record) = state.records.get_mut(&number) else {
                debug!(number, "status update skipped: unknown voucher");
                continue;
            };
            match check_transition(record.status(), new_status) {
                Transition::Apply => {
                    previous.push((number, record.status()));
                    record.set_status(new_status);
                }
                Transition::NoOp => {}
                Transition::Rejected => {
                    debug!(number, from = %record.status(), to = %new_status, "status update rejected");
                }
            }
        }

        if previous.is_empty() {
            return Ok(0);
        }

        if let Err(e) = index_file::save(&self.index_path, &state.records) {
            for (number, status) in previous {
                if let Some(record) = state.records.get_mut(&number) {
                    record.set_status(status);
                }
            }
            return Err(e);
        }

        info!(changed = previous.len(), to = %new_status, "voucher statuses updated");
        Ok(previous.len())
    }

    // ---------------------------------------------------------------
    // Integrity
    // ---------------------------------------------------------------

    /// Compare the index against the files on disk. Read-only.
    pub fn verify(&self) -> RegistryResult<VerifyReport> {
        let records = self.list(None)?;
        let mut report = VerifyReport::default();

        for record in &records {
            if !self.artifact_file(record).exists() {
                report.dangling.push(record.number());
            }
            if record.sidecar_path().is_none() {
                continue;
            }
            match self.load_sidecar(record) {
                Ok(sidecar) if sidecar.items.len() != record.item_count() => {
                    report
                        .item_count_drift
                        .push((record.number(), record.item_count(), sidecar.items.len()));
                }
                Ok(_) => {}
                Err(_) => report.broken_sidecars.push(record.number()),
            }
        }
        Ok(report)
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    pub(crate) fn read_state(&self) -> RegistryResult<RwLockReadGuard<'_, RegistryState>> {
        self.state.read().map_err(|_| RegistryError::LockPoisoned)
    }

    pub(crate) fn write_state(&self) -> RegistryResult<RwLockWriteGuard<'_, RegistryState>> {
        self.state.write().map_err(|_| RegistryError::LockPoisoned)
    }

    pub(crate) fn persist_locked(&self, state: &RegistryState) -> RegistryResult<()> {
        index_file::save(&self.index_path, &state.records)
    }

    fn persist_current(&self) -> RegistryResult<()> {
        let state = self.read_state()?;
        self.persist_locked(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sidecar::save_sidecar;
    use vale_types::VoucherItem;

    fn open(dir: &Path) -> Registry {
        Registry::open(RegistryConfig::for_root(dir)).unwrap()
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"%PDF-1.4").unwrap();
    }

    fn register(reg: &Registry, n: u64) -> VoucherRecord {
        let name = format!("vale_{n:06}.pdf");
        touch(reg.root(), &name);
        reg.register_with_number(n, name, None, 0).unwrap()
    }

    #[test]
    fn open_empty_directory_creates_index() {
        let dir = tempfile::tempdir().unwrap();
        let reg = open(dir.path());
        assert!(reg.is_empty().unwrap());
        assert!(reg.index_path().exists());
        assert!(reg.recovery().is_none());
    }

    #[test]
    fn first_number_is_one() {
        let dir = tempfile::tempdir().unwrap();
        let reg = open(dir.path());
        assert_eq!(reg.next_number().unwrap(), 1);
    }

    #[test]
    fn exhausted_numbers_are_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &format!("vale_{}.pdf", u64::MAX));
        let reg = open(dir.path());
        assert_eq!(reg.len().unwrap(), 1);

        let err = reg.next_number().unwrap_err();
        assert!(matches!(err, RegistryError::NumbersExhausted(n) if n == u64::MAX));
        // The state lock is still usable afterwards.
        assert!(reg.find_by_number(u64::MAX).unwrap().is_some());
        assert!(reg.next_number().is_err());
    }

    #[test]
    fn next_number_follows_highest_record() {
        let dir = tempfile::tempdir().unwrap();
        let reg = open(dir.path());
        register(&reg, 7);
        assert_eq!(reg.next_number().unwrap(), 8);
    }

    #[test]
    fn reservations_never_repeat() {
        let dir = tempfile::tempdir().unwrap();
        let reg = open(dir.path());
        let a = reg.next_number().unwrap();
        let b = reg.next_number().unwrap();
        assert_eq!((a, b), (1, 2));
        // Number 1 is never registered: a gap, not a reuse.
        register(&reg, b);
        assert_eq!(reg.next_number().unwrap(), 3);
    }

    #[test]
    fn register_then_list_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let reg = open(dir.path());
        for n in [5, 1, 3] {
            register(&reg, n);
        }
        let numbers: Vec<u64> = reg.list(None).unwrap().iter().map(|r| r.number()).collect();
        assert_eq!(numbers, vec![1, 3, 5]);
    }

    #[test]
    fn duplicate_number_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let reg = open(dir.path());
        register(&reg, 1);
        let err = reg.register_with_number(1, "other.pdf", None, 0).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateNumber(1)));
        assert_eq!(reg.find_by_number(1).unwrap().unwrap().artifact_path(), "vale_000001.pdf");
    }

    #[test]
    fn zero_is_not_a_voucher_number() {
        let dir = tempfile::tempdir().unwrap();
        let reg = open(dir.path());
        assert!(matches!(
            reg.register_with_number(0, "x.pdf", None, 0),
            Err(RegistryError::InvalidNumber(0))
        ));
    }

    #[test]
    fn registration_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let reg = open(dir.path());
            register(&reg, 1);
            reg.update_status(&[1], Status::Deducted).unwrap();
        }
        let reg = open(dir.path());
        let rec = reg.find_by_number(1).unwrap().unwrap();
        assert_eq!(rec.status(), Status::Deducted);
    }

    #[test]
    fn update_status_counts_only_real_changes() {
        let dir = tempfile::tempdir().unwrap();
        let reg = open(dir.path());
        register(&reg, 1);
        register(&reg, 2);

        assert_eq!(reg.update_status(&[1, 99], Status::Deducted).unwrap(), 1);
        assert_eq!(reg.find_by_number(1).unwrap().unwrap().status(), Status::Deducted);
        assert_eq!(reg.find_by_number(2).unwrap().unwrap().status(), Status::Pending);

        // Self-transition: not counted.
        assert_eq!(reg.update_status(&[1], Status::Deducted).unwrap(), 0);
        // Back to pending: rejected.
        assert_eq!(reg.update_status(&[1], Status::Pending).unwrap(), 0);
        // Correction: allowed.
        assert_eq!(reg.update_status(&[1, 2], Status::Voided).unwrap(), 2);
        assert_eq!(reg.list(Some(Status::Voided)).unwrap().len(), 2);
    }

    #[test]
    fn update_status_on_unknown_number_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let reg = open(dir.path());
        assert_eq!(reg.update_status(&[42], Status::Deducted).unwrap(), 0);
        assert!(reg.find_by_number(42).unwrap().is_none());
    }

    #[test]
    fn list_filters_by_status() {
        let dir = tempfile::tempdir().unwrap();
        let reg = open(dir.path());
        for n in 1..=4 {
            register(&reg, n);
        }
        reg.update_status(&[2, 4], Status::Voided).unwrap();
        let voided: Vec<u64> = reg
            .list(Some(Status::Voided))
            .unwrap()
            .iter()
            .map(|r| r.number())
            .collect();
        assert_eq!(voided, vec![2, 4]);
        assert_eq!(reg.list(Some(Status::Pending)).unwrap().len(), 2);
    }

    #[test]
    fn corrupt_index_is_recovered_from_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "vale_000004_20240101_080000.pdf");
        fs::write(dir.path().join("vales_index.json"), b"{ this is not json").unwrap();

        let reg = open(dir.path());
        let notice = reg.recovery().expect("recovery notice");
        assert_eq!(notice.recovered, 1);
        assert!(notice.backup.exists());
        assert!(reg.find_by_number(4).unwrap().is_some());

        // The rebuilt index is valid on the next open.
        drop(reg);
        let reg = open(dir.path());
        assert!(reg.recovery().is_none());
        assert_eq!(reg.len().unwrap(), 1);
    }

    #[test]
    fn second_open_is_locked_out() {
        let dir = tempfile::tempdir().unwrap();
        let _reg = open(dir.path());
        let err = Registry::open(RegistryConfig::for_root(dir.path())).unwrap_err();
        assert!(matches!(err, RegistryError::Locked(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn verify_reports_drift_without_deleting() {
        let dir = tempfile::tempdir().unwrap();
        let reg = open(dir.path());
        register(&reg, 1);

        touch(dir.path(), "vale_000002.pdf");
        let sidecar = Sidecar::new(
            "vale_000002.pdf",
            Utc::now(),
            vec![VoucherItem::new("GauzeA", "L1", "ShelfX", None, 3)],
        );
        save_sidecar(&dir.path().join("vale_000002.json"), &sidecar).unwrap();
        reg.register_with_number(2, "vale_000002.pdf", Some("vale_000002.json".into()), 5)
            .unwrap();

        touch(dir.path(), "vale_000003.pdf");
        reg.register_with_number(3, "vale_000003.pdf", Some("vale_000003.json".into()), 1)
            .unwrap();

        fs::remove_file(dir.path().join("vale_000001.pdf")).unwrap();

        let report = reg.verify().unwrap();
        assert_eq!(report.dangling, vec![1]);
        assert_eq!(report.item_count_drift, vec![(2, 5, 1)]);
        assert_eq!(report.broken_sidecars, vec![3]);
        assert_eq!(reg.len().unwrap(), 3);
    }

    mod properties {
        use super::*;
        use proptest::collection::btree_set;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn list_returns_exactly_what_was_registered(numbers in btree_set(1u64..10_000, 0..20)) {
                let dir = tempfile::tempdir().unwrap();
                let reg = open(dir.path());
                // Register in reverse to make sure ordering comes from the registry.
                for &n in numbers.iter().rev() {
                    register(&reg, n);
                }
                let listed: Vec<u64> = reg.list(None).unwrap().iter().map(|r| r.number()).collect();
                prop_assert_eq!(listed, numbers.into_iter().collect::<Vec<_>>());
            }

            #[test]
            fn allocate_then_register_is_strictly_increasing(rounds in 1usize..30) {
                let dir = tempfile::tempdir().unwrap();
                let reg = open(dir.path());
                let mut last = 0;
                for _ in 0..rounds {
                    let n = reg.next_number().unwrap();
                    prop_assert!(n > last);
                    register(&reg, n);
                    last = n;
                }
            }
        }
    }

    #[test]
    fn concurrent_reservations_are_unique() {
        use std::collections::HashSet;
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let reg = Arc::new(open(dir.path()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = Arc::clone(&reg);
                std::thread::spawn(move || {
                    (0..25).map(|_| reg.next_number().unwrap()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for n in h.join().unwrap() {
                assert!(seen.insert(n), "number {n} handed out twice");
            }
        }
        assert_eq!(seen.len(), 200);
    }
}
