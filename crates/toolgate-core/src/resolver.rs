//! Stat requirement resolution: which stats a unit of work depends on.
//!
//! A work giver's own stat binding is preferred; when it has none, the
//! binding of the job it produces is used. Active compatibility modules
//! claiming the work's category add their stats on top, and stats owned by
//! an integration that is not active are stripped. The result is the full
//! superset, optional stats included. Deciding which of them block is the
//! gate's job.
//!
//! Results are memoized per [`WorkId`]. The memo is tagged with the catalog
//! version, the settings revision, and the registry revision; any change
//! clears it on the next lookup.

use std::collections::HashMap;

use toolgate_types::{StatId, WorkId};
use toolgate_world::Catalog;
use tracing::debug;

use crate::compat::CompatibilityRegistry;
use crate::view::WorldView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    catalog: u64,
    settings: u64,
    registry: u64,
}

/// Memoizing work → stats resolver.
#[derive(Debug, Default)]
pub struct StatRequirementResolver {
    key: Option<CacheKey>,
    cache: HashMap<WorkId, Vec<StatId>>,
    hits: u64,
    misses: u64,
}

impl StatRequirementResolver {
    /// An empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered, duplicate-free stats `work` depends on.
    ///
    /// Unknown work resolves to an empty list.
    pub fn requirements_for(
        &mut self,
        view: &WorldView<'_>,
        registry: &CompatibilityRegistry,
        work: WorkId,
    ) -> Vec<StatId> {
        let key = CacheKey {
            catalog: view.catalog.version(),
            settings: view.settings.revision,
            registry: registry.revision(),
        };
        if self.key != Some(key) {
            if self.key.is_some() {
                debug!(entries = self.cache.len(), "requirement cache invalidated");
            }
            self.cache.clear();
            self.key = Some(key);
        }

        if let Some(stats) = self.cache.get(&work) {
            self.hits = self.hits.saturating_add(1);
            return stats.clone();
        }
        self.misses = self.misses.saturating_add(1);
        let stats = resolve(view.catalog, registry, work);
        self.cache.insert(work, stats.clone());
        stats
    }

    /// Drop every memoized entry.
    pub fn invalidate(&mut self) {
        self.cache.clear();
        self.key = None;
    }

    /// Number of memoized entries.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether nothing is memoized.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Lookups answered from the memo.
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that had to resolve.
    pub const fn misses(&self) -> u64 {
        self.misses
    }
}

/// Giver binding, falling back to the job binding.
fn base_binding(catalog: &Catalog, work: WorkId) -> Option<&[StatId]> {
    match work {
        WorkId::Giver(id) => {
            let giver = catalog.work_giver(id)?;
            if giver.stats.is_empty() {
                giver.job.and_then(|job| catalog.job(job)).map(|j| j.stats.as_slice())
            } else {
                Some(giver.stats.as_slice())
            }
        }
        WorkId::Job(id) => catalog.job(id).map(|j| j.stats.as_slice()),
    }
}

fn resolve(catalog: &Catalog, registry: &CompatibilityRegistry, work: WorkId) -> Vec<StatId> {
    let Some(category) = catalog.work_category(work) else {
        debug!(%work, "unknown work, no requirements");
        return Vec::new();
    };
    let base = base_binding(catalog, work).unwrap_or_default();
    let contributed = registry.contributed_stats(category);

    let mut stats: Vec<StatId> = Vec::with_capacity(base.len().saturating_add(contributed.len()));
    for &stat in base.iter().chain(contributed.iter()) {
        if stats.contains(&stat) {
            continue;
        }
        let Some(def) = catalog.stat(stat) else {
            debug!(%work, %stat, "dropping undefined stat");
            continue;
        };
        if def
            .owner_module
            .as_deref()
            .is_some_and(|owner| !registry.is_active(owner))
        {
            continue;
        }
        stats.push(stat);
    }
    stats
}
