use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use tracing::{debug, info, warn};
use vale_consolidate::{Consolidation, ConsolidationEngine, ConsolidationError};
use vale_merge::{MergeChain, MergeOutcome};
use vale_registry::{
    save_sidecar, write_sidecar, Registry, ReindexReport, SidecarIssue, VerifyReport,
};
use vale_types::{
    ArtifactName, ConsolidatedSidecar, Sidecar, Status, VoucherItem, VoucherRecord,
};

use crate::config::ValeConfig;
use crate::error::{SdkError, SdkResult};
use crate::render::{DocumentBody, RenderRequest, Renderer};

/// Label appended to the filename of unified vouchers.
const CONSOLIDATED_LABEL: &str = "consolidated";

/// A unified voucher produced by [`Vales::consolidate_and_register`].
#[derive(Clone, Debug)]
pub struct UnifiedVoucher {
    /// The newly registered record.
    pub record: VoucherRecord,
    /// The aggregate, when any selected voucher had structured data.
    pub consolidation: Option<Consolidation>,
    /// The merge result, when the artifact was produced by merging the
    /// source documents instead of rendering.
    pub merge: Option<MergeOutcome>,
}

/// High-level voucher API.
pub struct Vales {
    registry: Registry,
    merger: MergeChain,
}

impl Vales {
    /// Open the registry and build the merge chain described by `config`.
    pub fn open(config: ValeConfig) -> SdkResult<Self> {
        let merger = MergeChain::from_config(&config.merge)?;
        let registry = Registry::open(config.registry)?;
        if let Some(notice) = registry.recovery() {
            warn!(
                backup = %notice.backup.display(),
                recovered = notice.recovered,
                "registry index was rebuilt from artifacts"
            );
        }
        Ok(Self { registry, merger })
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn root(&self) -> &Path {
        self.registry.root()
    }

    // ---- Registry operations ----

    pub fn next_number(&self) -> SdkResult<u64> {
        Ok(self.registry.next_number()?)
    }

    pub fn register_with_number(
        &self,
        number: u64,
        artifact_path: impl Into<String>,
        sidecar_path: Option<String>,
        item_count: usize,
    ) -> SdkResult<VoucherRecord> {
        Ok(self
            .registry
            .register_with_number(number, artifact_path, sidecar_path, item_count)?)
    }

    pub fn list(&self, status: Option<Status>) -> SdkResult<Vec<VoucherRecord>> {
        Ok(self.registry.list(status)?)
    }

    pub fn find_by_number(&self, number: u64) -> SdkResult<Option<VoucherRecord>> {
        Ok(self.registry.find_by_number(number)?)
    }

    pub fn update_status(&self, numbers: &[u64], status: Status) -> SdkResult<usize> {
        Ok(self.registry.update_status(numbers, status)?)
    }

    pub fn reindex(&self) -> SdkResult<ReindexReport> {
        Ok(self.registry.reindex()?)
    }

    pub fn verify(&self) -> SdkResult<VerifyReport> {
        Ok(self.registry.verify()?)
    }

    /// Structured items of one voucher, or why they cannot be read.
    ///
    /// Returns `Ok(None)` for an unknown number.
    pub fn items_of(&self, number: u64) -> SdkResult<Option<Result<Vec<VoucherItem>, SidecarIssue>>> {
        let Some(record) = self.registry.find_by_number(number)? else {
            return Ok(None);
        };
        Ok(Some(self.registry.load_sidecar(&record).map(|s| s.items)))
    }

    // ---- Consolidation and merging ----

    /// Aggregate the items of the selected vouchers.
    pub fn consolidate(&self, numbers: &[u64]) -> SdkResult<Consolidation> {
        Ok(ConsolidationEngine::new(&self.registry).consolidate(numbers)?)
    }

    /// Merge arbitrary documents with the configured backend chain.
    pub fn merge_with_fallback(&self, inputs: &[PathBuf], output: &Path) -> SdkResult<MergeOutcome> {
        Ok(self.merger.merge_with_fallback(inputs, output)?)
    }

    // ---- Issuance ----

    /// Issue a new voucher: reserve a number, render the artifact, write the
    /// sidecar, and register it.
    ///
    /// If rendering fails the reserved number is left unused.
    pub fn issue(&self, items: Vec<VoucherItem>, renderer: &dyn Renderer) -> SdkResult<VoucherRecord> {
        let now = Utc::now();
        let draft = Sidecar::new(String::new(), now, items);
        draft.validate()?;

        let number = self.registry.next_number()?;
        let name = ArtifactName::new(number, now.with_timezone(&Local).naive_local(), renderer.extension());
        self.warn_if_not_indexable(&name);

        let request = RenderRequest {
            number,
            emitted_at: now,
            body: DocumentBody::Items(&draft.items),
        };
        renderer
            .render(&request, &self.root().join(name.file_name()))
            .map_err(|e| SdkError::Render {
                number,
                reason: e.to_string(),
            })?;

        let sidecar = Sidecar {
            filename: name.file_name(),
            ..draft
        };
        save_sidecar(&self.root().join(name.sidecar_name()), &sidecar)?;

        let record = self.registry.register_with_number(
            number,
            name.file_name(),
            Some(name.sidecar_name()),
            sidecar.items.len(),
        )?;
        debug!(number, items = sidecar.items.len(), "voucher issued");
        Ok(record)
    }

    /// Build a unified voucher from `numbers` and register it as a new
    /// `Pending` entry.
    ///
    /// With structured data and a renderer, the aggregated lines are written
    /// to a consolidated sidecar and rendered. Otherwise the source artifacts
    /// are merged with the backend chain. The sources keep their status.
    pub fn consolidate_and_register(
        &self,
        numbers: &[u64],
        renderer: Option<&dyn Renderer>,
    ) -> SdkResult<UnifiedVoucher> {
        let consolidation = match self.consolidate(numbers) {
            Ok(c) => Some(c),
            Err(SdkError::Consolidation(ConsolidationError::NoStructuredData { missing, unknown })) => {
                warn!(
                    missing = missing.len(),
                    unknown = unknown.len(),
                    "no structured data in selection; merging rendered artifacts"
                );
                None
            }
            Err(e) => return Err(e),
        };

        let mut sources: Vec<u64> = Vec::with_capacity(numbers.len());
        for &n in numbers {
            if !sources.contains(&n) {
                sources.push(n);
            }
        }

        match (consolidation, renderer) {
            (Some(consolidation), Some(renderer)) => {
                sources.retain(|n| !consolidation.unknown.contains(n));
                self.render_unified(consolidation, sources, renderer)
            }
            (consolidation, _) => self.merge_unified(consolidation, sources),
        }
    }

    fn render_unified(
        &self,
        consolidation: Consolidation,
        sources: Vec<u64>,
        renderer: &dyn Renderer,
    ) -> SdkResult<UnifiedVoucher> {
        let now = Utc::now();
        let number = self.registry.next_number()?;
        let name = ArtifactName::new(number, now.with_timezone(&Local).naive_local(), renderer.extension())
            .with_label(CONSOLIDATED_LABEL);
        self.warn_if_not_indexable(&name);

        let request = RenderRequest {
            number,
            emitted_at: now,
            body: DocumentBody::Consolidated {
                lines: &consolidation.lines,
                sources: &sources,
            },
        };
        renderer
            .render(&request, &self.root().join(name.file_name()))
            .map_err(|e| SdkError::Render {
                number,
                reason: e.to_string(),
            })?;

        let sidecar = ConsolidatedSidecar {
            filename: name.file_name(),
            emission_time: now,
            consolidated_from: sources.clone(),
            items: consolidation.lines.clone(),
        };
        write_sidecar(&self.root().join(name.sidecar_name()), &sidecar.to_json()?)?;

        let record = self.registry.register_with_number(
            number,
            name.file_name(),
            Some(name.sidecar_name()),
            consolidation.lines.len(),
        )?;
        info!(number, sources = ?sources, lines = consolidation.lines.len(), "unified voucher rendered");
        Ok(UnifiedVoucher {
            record,
            consolidation: Some(consolidation),
            merge: None,
        })
    }

    fn merge_unified(&self, consolidation: Option<Consolidation>, selection: Vec<u64>) -> SdkResult<UnifiedVoucher> {
        let mut sources = Vec::with_capacity(selection.len());
        let mut inputs = Vec::with_capacity(selection.len());
        for n in selection {
            match self.registry.find_by_number(n)? {
                Some(record) => {
                    inputs.push(self.registry.artifact_file(&record));
                    sources.push(n);
                }
                None => warn!(number = n, "selected voucher not found; left out of the merge"),
            }
        }

        let extension = inputs
            .first()
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .unwrap_or("pdf")
            .to_string();

        let now = Utc::now();
        let number = self.registry.next_number()?;
        let name = ArtifactName::new(number, now.with_timezone(&Local).naive_local(), extension)
            .with_label(CONSOLIDATED_LABEL);
        self.warn_if_not_indexable(&name);

        let outcome = self
            .merger
            .merge_with_fallback(&inputs, &self.root().join(name.file_name()))?;

        let lines = consolidation.as_ref().map(|c| c.lines.clone()).unwrap_or_default();
        let sidecar = ConsolidatedSidecar {
            filename: name.file_name(),
            emission_time: now,
            consolidated_from: sources.clone(),
            items: lines,
        };
        write_sidecar(&self.root().join(name.sidecar_name()), &sidecar.to_json()?)?;

        let record = self.registry.register_with_number(
            number,
            name.file_name(),
            Some(name.sidecar_name()),
            sidecar.items.len(),
        )?;
        info!(number, sources = ?sources, backend = %outcome.backend, "unified voucher merged");
        Ok(UnifiedVoucher {
            record,
            consolidation,
            merge: Some(outcome),
        })
    }

    fn warn_if_not_indexable(&self, name: &ArtifactName) {
        if !self.registry.config().is_artifact(Path::new(&name.file_name())) {
            warn!(
                extension = %name.extension,
                "artifact extension is not configured; reindex will not rediscover this voucher"
            );
        }
    }
}
