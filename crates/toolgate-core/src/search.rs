//! Assignment search: find a better tool on the map and queue its pickup.
//!
//! A request names an agent, a stat, and the search bounds. The search
//! walks ground items nearest first and keeps those that are tools, are
//! not forbidden, are not already promised to another agent, lie
//! within the radius and path budget, and would improve the agent's
//! current value for the stat by at least the requested percentage. The
//! best candidate (highest score, then cheapest path) becomes a
//! fetch-and-equip job.
//!
//! At most one acquisition is outstanding per (agent, stat). Pending state
//! is never cancelled explicitly: an entry whose job has left the queue is
//! stale. Lookups ignore stale entries and [`AssignmentSearch::prune`]
//! removes them; the gate prunes at the start of every evaluation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use toolgate_types::{
    AcquisitionSource, Agent, AgentId, CellPos, ItemId, JobId, JobPriority, StatId, ThingDefId,
};
use toolgate_world::{JobQueue, QueuedJob};
use tracing::{debug, info, warn};

use crate::config::GateSettings;
use crate::error::GateError;
use crate::scoring::{EPSILON, ToolScorer, beats_baseline};
use crate::view::WorldView;

/// A request to improve one agent's tool for one stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionRequest {
    /// Agent to equip.
    pub agent: AgentId,
    /// Stat to improve.
    pub stat: StatId,
    /// Minimum improvement over the current value, in percent.
    pub min_gain_pct: f32,
    /// Search radius, in cells.
    pub search_radius: u32,
    /// Maximum path cost to the item.
    pub path_cost_budget: u32,
    /// Queue lane for the fetch job.
    pub priority: JobPriority,
    /// Who asked.
    pub source: AcquisitionSource,
}

impl AcquisitionRequest {
    /// A request using the tunables of `settings`.
    pub const fn from_settings(
        agent: AgentId,
        stat: StatId,
        settings: &GateSettings,
        priority: JobPriority,
        source: AcquisitionSource,
    ) -> Self {
        Self {
            agent,
            stat,
            min_gain_pct: settings.min_gain_pct,
            search_radius: settings.search_radius,
            path_cost_budget: settings.path_cost_budget,
            priority,
            source,
        }
    }
}

/// A ground item worth fetching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpgradeCandidate {
    /// The item.
    pub item: ItemId,
    /// Its definition.
    pub def: ThingDefId,
    /// Where it lies.
    pub position: CellPos,
    /// Its projected score for the stat.
    pub score: f32,
    /// The agent's current value for the stat.
    pub current: f32,
    /// Path cost from the agent.
    pub path_cost: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingAcquisition {
    job: JobId,
    item: ItemId,
    source: AcquisitionSource,
}

/// Tracks outstanding acquisitions and runs the candidate search.
#[derive(Debug, Default)]
pub struct AssignmentSearch {
    pending: BTreeMap<(AgentId, StatId), PendingAcquisition>,
}

impl AssignmentSearch {
    /// No acquisitions outstanding.
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------
    // Pending state
    // -------------------------------------------------------------------

    fn live(
        &self,
        queue: &dyn JobQueue,
        agent: AgentId,
        stat: StatId,
    ) -> Option<&PendingAcquisition> {
        self.pending
            .get(&(agent, stat))
            .filter(|p| queue.is_queued(agent, p.job))
    }

    /// Whether a fetch for (agent, stat) is still running or queued.
    pub fn is_pending(&self, queue: &dyn JobQueue, agent: AgentId, stat: StatId) -> bool {
        self.live(queue, agent, stat).is_some()
    }

    /// The item a live acquisition for (agent, stat) is fetching.
    pub fn pending_item(&self, queue: &dyn JobQueue, agent: AgentId, stat: StatId) -> Option<ItemId> {
        self.live(queue, agent, stat).map(|p| p.item)
    }

    /// Whether `agent` has any live acquisition.
    pub fn has_acquisition_pending_or_queued(&self, queue: &dyn JobQueue, agent: AgentId) -> bool {
        self.pending
            .iter()
            .any(|(&(a, _), p)| a == agent && queue.is_queued(a, p.job))
    }

    /// Drop entries whose job has left the queue. Returns how many.
    pub fn prune(&mut self, queue: &dyn JobQueue) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|&(agent, _), p| queue.is_queued(agent, p.job));
        before.saturating_sub(self.pending.len())
    }

    /// Supersede every acquisition of a dead or captured agent.
    pub fn forget_agent(&mut self, agent: AgentId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|&(a, _), _| a != agent);
        let removed = before.saturating_sub(self.pending.len());
        if removed > 0 {
            debug!(%agent, removed, "acquisitions superseded");
        }
        removed
    }

    /// Number of tracked acquisitions, stale ones included.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Live acquisitions per source, for diagnostics.
    pub fn count_by_source(&self, queue: &dyn JobQueue, source: AcquisitionSource) -> usize {
        self.pending
            .iter()
            .filter(|&(&(agent, _), p)| p.source == source && queue.is_queued(agent, p.job))
            .count()
    }

    /// Whether another agent's live acquisition holds `item`.
    fn is_reserved(&self, queue: &dyn JobQueue, item: ItemId, agent: AgentId) -> bool {
        self.pending
            .iter()
            .any(|(&(a, _), p)| a != agent && p.item == item && queue.is_queued(a, p.job))
    }

    /// A live fetch of `item` the agent already queued for another stat.
    fn shared_fetch(&self, queue: &dyn JobQueue, agent: AgentId, item: ItemId) -> Option<JobId> {
        self.pending
            .iter()
            .find(|&(&(a, _), p)| a == agent && p.item == item && queue.is_queued(a, p.job))
            .map(|(_, p)| p.job)
    }

    // -------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------

    fn find_candidate(
        &self,
        scorer: &ToolScorer,
        view: &WorldView<'_>,
        queue: &dyn JobQueue,
        agent: &Agent,
        request: &AcquisitionRequest,
    ) -> Result<Option<UpgradeCandidate>, GateError> {
        let catalog = view.catalog;
        let stat = request.stat;
        let baseline = scorer.baseline(catalog, stat)?;
        let current = scorer.current_score(view, agent, stat)?;
        let threshold = current * (1.0 + request.min_gain_pct / 100.0);

        let mut best: Option<UpgradeCandidate> = None;
        for ground in view.map.items_within(agent.position, request.search_radius) {
            let item = &ground.item;
            if item.forbidden || !catalog.is_tool(item.def) {
                continue;
            }
            if self.is_reserved(queue, item.id, agent.id) {
                continue;
            }
            let Some(path_cost) = view.map.path_cost(agent.position, ground.position) else {
                continue;
            };
            if path_cost > request.path_cost_budget {
                continue;
            }
            let score = scorer.score(catalog, item, stat)?;
            if !beats_baseline(score, baseline) || score + EPSILON < threshold {
                continue;
            }
            let better = best.as_ref().is_none_or(|b| {
                score > b.score + EPSILON
                    || (score > b.score - EPSILON && path_cost < b.path_cost)
            });
            if better {
                best = Some(UpgradeCandidate {
                    item: item.id,
                    def: item.def,
                    position: ground.position,
                    score,
                    current,
                    path_cost,
                });
            }
        }
        Ok(best)
    }

    /// Run the search without queueing anything.
    ///
    /// Items reserved by other agents' acquisitions are skipped; items the
    /// agent is already fetching are not.
    pub fn preview_upgrade(
        &self,
        scorer: &ToolScorer,
        view: &WorldView<'_>,
        queue: &dyn JobQueue,
        agent: &Agent,
        request: &AcquisitionRequest,
    ) -> Result<Option<UpgradeCandidate>, GateError> {
        self.find_candidate(scorer, view, queue, agent, request)
    }

    /// Find a better tool and queue a fetch-and-equip job for it.
    ///
    /// Returns `true` if a fetch is now outstanding (including one queued
    /// by an earlier call) and `false` if nothing qualifies within budget.
    /// When the best item is already being fetched for another of the
    /// agent's stats, that fetch is shared instead of queueing a second one.
    pub fn try_upgrade_for(
        &mut self,
        scorer: &ToolScorer,
        view: &WorldView<'_>,
        queue: &mut dyn JobQueue,
        agent: &Agent,
        request: &AcquisitionRequest,
    ) -> Result<bool, GateError> {
        if request.agent != agent.id {
            warn!(expected = %request.agent, actual = %agent.id, "acquisition request for another agent");
            return Ok(false);
        }
        let stat = request.stat;
        if self.is_pending(&*queue, agent.id, stat) {
            return Ok(true);
        }

        let Some(candidate) = self.find_candidate(scorer, view, &*queue, agent, request)? else {
            debug!(agent = %agent.id, %stat, "no upgrade candidate within budget");
            return Ok(false);
        };

        let job = match self.shared_fetch(&*queue, agent.id, candidate.item) {
            Some(job) => job,
            None => queue.enqueue(
                agent.id,
                QueuedJob::FetchAndEquip {
                    item: candidate.item,
                    stat,
                },
                request.priority,
            ),
        };
        self.pending.insert(
            (agent.id, stat),
            PendingAcquisition {
                job,
                item: candidate.item,
                source: request.source,
            },
        );
        info!(
            agent = %agent.id,
            %stat,
            item = %candidate.item,
            score = candidate.score,
            current = candidate.current,
            path_cost = candidate.path_cost,
            source = ?request.source,
            "tool acquisition queued"
        );
        Ok(true)
    }
}
