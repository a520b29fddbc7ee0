//! Main harvester service that ties all components together.
//!
//! One registry runs fetch → parse → name → merge → emit. A failure aborts
//! only that registry; the destination file is never touched unless every
//! earlier stage succeeded.

use std::thread;

use crate::cache::CacheStore;
use crate::catalog::RegistrySpec;
use crate::config::Settings;
use crate::emit::{diff, Destination};
use crate::error::{HarvesterError, Result};
use crate::fetch::{FetchPolicy, RegistryFetcher};
use crate::http::Transport;
use crate::merge::merge;
use crate::naming::derive_all;
use crate::parser::{parse_registry, Document};
use crate::types::{Outcome, Provenance, RegistryReport, Warning};

/// Switches for one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Compute changes without writing any destination.
    pub dry_run: bool,
    /// Drop definitions no longer in the registry, for every registry.
    pub prune: bool,
    /// Ignore the cache TTL and revalidate every document.
    pub force_refresh: bool,
}

/// Runs registries against one cache, transport and output directory.
pub struct Harvester {
    transport: Box<dyn Transport>,
    cache: CacheStore,
    policy: FetchPolicy,
    output_dir: std::path::PathBuf,
    options: RunOptions,
}

impl Harvester {
    #[must_use]
    pub fn new(settings: &Settings, transport: Box<dyn Transport>, options: RunOptions) -> Self {
        Self {
            transport,
            cache: CacheStore::new(settings.cache_dir()),
            policy: FetchPolicy {
                ttl: settings.cache_ttl(),
                force_refresh: options.force_refresh,
            },
            output_dir: settings.output_dir(),
            options,
        }
    }

    /// Run one registry end to end.
    ///
    /// Never returns an error: a hard failure is reported as
    /// [`Outcome::Failed`] together with the warnings gathered so far.
    pub fn run_registry(&self, spec: &RegistrySpec) -> RegistryReport {
        let mut warnings = Vec::new();
        match self.try_run(spec, &mut warnings) {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(registry = %spec.id, error = %e, "Registry failed");
                RegistryReport::failed(spec.id.as_str(), e, warnings)
            }
        }
    }

    /// Run every registry concurrently, one thread each.
    ///
    /// Each registry owns a distinct destination file and cache slots, so the
    /// workers share nothing mutable. Reports come back in `specs` order.
    pub fn run_all(&self, specs: &[RegistrySpec]) -> Vec<RegistryReport> {
        thread::scope(|scope| {
            let handles: Vec<_> = specs
                .iter()
                .map(|spec| scope.spawn(move || self.run_registry(spec)))
                .collect();

            handles
                .into_iter()
                .zip(specs)
                .map(|(handle, spec)| {
                    handle.join().unwrap_or_else(|_| {
                        RegistryReport::failed(
                            spec.id.as_str(),
                            HarvesterError::WorkerPanicked(spec.id.to_string()),
                            Vec::new(),
                        )
                    })
                })
                .collect()
        })
    }

    fn try_run(&self, spec: &RegistrySpec, warnings: &mut Vec<Warning>) -> Result<RegistryReport> {
        // Region problems surface before any network traffic.
        let destination = Destination::read(self.output_dir.join(&spec.destination))?;
        let existing = destination.existing_definitions(&spec.section)?;

        let fetcher = RegistryFetcher::new(self.transport.as_ref(), &self.cache, self.policy);
        let mut fetched = Vec::with_capacity(spec.sources.len());
        for source in &spec.sources {
            let document = fetcher.fetch(source)?;
            tracing::debug!(registry = %spec.id, source = %source.key, origin = ?document.origin, "Fetched source");
            warnings.extend(document.warning.clone());
            fetched.push(document);
        }
        let documents: Vec<Document<'_>> = spec
            .sources
            .iter()
            .zip(&fetched)
            .map(|(source, document)| Document {
                source,
                bytes: &document.bytes,
            })
            .collect();

        let parsed = parse_registry(spec, &documents)?;
        warnings.extend(parsed.warnings);

        let derived = derive_all(spec, &parsed.entries);
        warnings.extend(derived.warnings);

        let prune = spec.prune || self.options.prune;
        let merged = merge(existing.clone(), derived.candidates, prune);
        warnings.extend(merged.warnings.iter().cloned());

        let rendered = destination.render(spec, &merged.definitions)?;
        let outcome = if self.options.dry_run {
            Outcome::DryRun {
                changes: diff(&existing, &merged.definitions),
                would_write: destination.would_change(&rendered),
            }
        } else if destination.write(&rendered)? {
            Outcome::Written
        } else {
            Outcome::Unchanged
        };

        let mut report = RegistryReport::new(spec.id.as_str());
        report.generated = merged.count(Provenance::Generated, false);
        report.preserved = merged.count(Provenance::Preserved, false);
        report.retained = merged.count(Provenance::Preserved, true);
        report.pruned = merged.pruned;
        report.warnings = std::mem::take(warnings);
        report.outcome = outcome;

        tracing::info!(
            registry = %spec.id,
            generated = report.generated,
            preserved = report.preserved,
            retained = report.retained,
            pruned = report.pruned,
            "Registry done"
        );
        Ok(report)
    }
}
