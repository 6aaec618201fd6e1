//! Batch resolution over many ROMs.

use crate::cancel::CancellationToken;
use crate::config::{AdapterSourceConfig, BatchConfig};
use crate::models::{LookupParams, MediaType, PlatformId, RomFile, RomHash};
use crate::registry::{AdapterRegistry, FallbackHit, InitReport};
use crate::Result;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// One ROM to resolve.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub rom: RomFile,
    pub hash: Option<RomHash>,
}

impl From<RomFile> for BatchItem {
    fn from(rom: RomFile) -> Self {
        Self { rom, hash: None }
    }
}

/// Settings shared by every lookup in a batch.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub platform: PlatformId,
    pub media_type: MediaType,
    pub region_preference: Vec<String>,
    /// Lookups in flight at once, clamped to `1..=BatchConfig::MAX_CONCURRENCY`.
    pub concurrency: usize,
    /// Warm manifests before the first lookup; a failed warmup aborts the batch.
    pub prefetch: bool,
    pub cancel: Option<CancellationToken>,
}

impl BatchOptions {
    pub fn new(platform: PlatformId, media_type: MediaType) -> Self {
        Self {
            platform,
            media_type,
            region_preference: Vec::new(),
            concurrency: BatchConfig::DEFAULT_CONCURRENCY,
            prefetch: false,
            cancel: None,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(cancel) => Ok(cancel.check()?),
            None => Ok(()),
        }
    }

    fn effective_concurrency(&self) -> usize {
        self.concurrency.clamp(1, BatchConfig::MAX_CONCURRENCY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    Found,
    BestEffort,
    Missing,
    /// Not attempted because the batch was cancelled.
    Skipped,
}

/// Result for a single ROM.
#[derive(Debug, Clone, Serialize)]
pub struct RomOutcome {
    pub rom: RomFile,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hit: Option<FallbackHit>,
}

impl RomOutcome {
    fn skipped(rom: RomFile) -> Self {
        Self {
            rom,
            status: OutcomeStatus::Skipped,
            hit: None,
        }
    }

    fn from_hit(rom: RomFile, hit: Option<FallbackHit>) -> Self {
        let status = match &hit {
            Some(hit) if hit.result.best_effort => OutcomeStatus::BestEffort,
            Some(_) => OutcomeStatus::Found,
            None => OutcomeStatus::Missing,
        };
        Self { rom, status, hit }
    }
}

/// Outcomes in input order plus totals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<RomOutcome>,
    pub found: usize,
    pub best_effort: usize,
    pub missing: usize,
    pub skipped: usize,
}

impl BatchReport {
    fn from_outcomes(outcomes: Vec<RomOutcome>) -> Self {
        let count = |status: OutcomeStatus| outcomes.iter().filter(|o| o.status == status).count();
        Self {
            found: count(OutcomeStatus::Found),
            best_effort: count(OutcomeStatus::BestEffort),
            missing: count(OutcomeStatus::Missing),
            skipped: count(OutcomeStatus::Skipped),
            outcomes,
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Runs fallback lookups for many ROMs against one registry.
pub struct BatchResolver {
    registry: Arc<AdapterRegistry>,
    sources: Vec<AdapterSourceConfig>,
}

impl BatchResolver {
    pub fn new(registry: Arc<AdapterRegistry>, sources: Vec<AdapterSourceConfig>) -> Self {
        Self { registry, sources }
    }

    pub fn registry(&self) -> &Arc<AdapterRegistry> {
        &self.registry
    }

    /// Initialize every enabled source.
    pub async fn initialize(&self) -> InitReport {
        self.registry.initialize_all(&self.sources).await
    }

    /// Resolve `items`, returning outcomes in input order.
    pub async fn run(&self, items: Vec<BatchItem>, options: &BatchOptions) -> Result<BatchReport> {
        if options.prefetch {
            options.check_cancelled()?;
            if let Err(e) = self
                .registry
                .prefetch_all(&self.sources, options.platform, options.media_type)
                .await
            {
                // A warmup cut short by the caller is reported as cancellation.
                options.check_cancelled()?;
                return Err(e);
            }
        }

        let total = items.len();
        info!(
            "Resolving {} ROMs for platform {} ({}), concurrency {}",
            total,
            options.platform,
            options.media_type,
            options.effective_concurrency()
        );

        let mut outcomes: Vec<(usize, RomOutcome)> = stream::iter(items.into_iter().enumerate())
            .map(|(position, item)| async move { (position, self.resolve_one(item, options).await) })
            .buffer_unordered(options.effective_concurrency())
            .collect()
            .await;
        outcomes.sort_by_key(|(position, _)| *position);

        let report = BatchReport::from_outcomes(outcomes.into_iter().map(|(_, o)| o).collect());
        info!(
            "Batch finished: {} found, {} best-effort, {} missing, {} skipped",
            report.found, report.best_effort, report.missing, report.skipped
        );
        Ok(report)
    }

    async fn resolve_one(&self, item: BatchItem, options: &BatchOptions) -> RomOutcome {
        if options.is_cancelled() {
            return RomOutcome::skipped(item.rom);
        }

        let mut params = LookupParams::new(item.rom, options.platform, options.media_type)
            .with_regions(options.region_preference.iter().cloned());
        params.hash = item.hash;

        let hit = self
            .registry
            .lookup_with_fallback_paced(&params, &self.sources)
            .await;
        // Aborted fetches surface as misses; they say nothing about the ROM.
        if hit.is_none() && options.is_cancelled() {
            debug!("{}: cancelled", params.rom.filename);
            return RomOutcome::skipped(params.rom);
        }
        debug!(
            "{}: {}",
            params.rom.filename,
            hit.as_ref().map(|h| h.adapter_id.as_str()).unwrap_or("no artwork")
        );
        RomOutcome::from_hit(params.rom, hit)
    }
}
