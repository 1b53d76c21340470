//! Carry limit enforcement for the strictest mode.
//!
//! Only real tools count against the limit: the equipped tool plus every
//! inventory item whose definition is a tool. Virtual substitutes never
//! count. When enforcing around a job, one slot is held for the keeper (the
//! tool the job will use) and one for every tool about to be fetched, so
//! the other carried tools may number at most `limit - reserved`.
//!
//! Excess tools are dropped least useful first. Drop jobs go to the front
//! of the agent's queue and are tracked so a second enforcement never
//! queues the same drop twice. Callers queue no fetch while drops are
//! outstanding, so the carried count never passes the limit.

use std::collections::BTreeMap;

use toolgate_types::{AcquisitionSource, Agent, AgentId, Item, ItemId, JobId, StatId};
use toolgate_world::{Catalog, JobQueue, QueuedJob};
use tracing::{debug, info};

use crate::config::GateSettings;
use crate::error::GateError;
use crate::scoring::ToolScorer;
use crate::view::WorldView;

/// Tools an agent carries, in carry order.
pub fn carried_tools<'a>(catalog: &Catalog, agent: &'a Agent) -> Vec<&'a Item> {
    agent
        .carried_items()
        .filter(|item| catalog.is_tool(item.def))
        .collect()
}

/// Queues drop jobs until an agent is back under the carry limit.
#[derive(Debug, Default)]
pub struct CarryEnforcer {
    drops: BTreeMap<AgentId, BTreeMap<ItemId, JobId>>,
}

impl CarryEnforcer {
    /// No drops outstanding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the limit applies under `settings`.
    pub const fn is_active(settings: &GateSettings) -> bool {
        settings.carry_enforced()
    }

    /// Maximum number of tools an agent may carry.
    pub fn effective_limit(settings: &GateSettings) -> usize {
        usize::try_from(settings.carry_base_limit).unwrap_or(usize::MAX)
    }

    /// Non-keeper tools allowed while a job holds `reserved` slots for its
    /// keeper and incoming tools.
    pub fn allowed_around_job(settings: &GateSettings, reserved: usize) -> usize {
        Self::effective_limit(settings).saturating_sub(reserved)
    }

    /// The carried real tool to retain for work on `stat`: the best
    /// scorer, or `None` if no real tool beats the baseline.
    pub fn select_keeper_for_job(
        scorer: &ToolScorer,
        view: &WorldView<'_>,
        agent: &Agent,
        stat: StatId,
    ) -> Result<Option<ItemId>, GateError> {
        let real_only = GateSettings {
            virtual_tools_enabled: false,
            ..*view.settings
        };
        let real_view = WorldView {
            settings: &real_only,
            ..*view
        };
        Ok(scorer.best_tool(&real_view, agent, stat)?.map(|t| t.item))
    }

    /// Whether the carried tools other than `keeper` number at most
    /// `allowed`.
    pub fn is_compliant(
        catalog: &Catalog,
        agent: &Agent,
        keeper: Option<ItemId>,
        allowed: usize,
    ) -> bool {
        non_keepers(catalog, agent, keeper).len() <= allowed
    }

    /// Queue drops for every tool beyond `allowed`, excluding `keeper`.
    ///
    /// Returns the number of drops still outstanding: newly queued plus
    /// those queued earlier and not yet done. Zero means compliant.
    #[allow(clippy::too_many_arguments)]
    pub fn enforce_now(
        &mut self,
        scorer: &ToolScorer,
        view: &WorldView<'_>,
        queue: &mut dyn JobQueue,
        agent: &Agent,
        keeper: Option<ItemId>,
        allowed: usize,
        source: AcquisitionSource,
    ) -> Result<usize, GateError> {
        let records = self.drops.entry(agent.id).or_default();
        records.retain(|&item, &mut job| queue.is_queued(agent.id, job) && agent.carries(item));

        let tools = non_keepers(view.catalog, agent, keeper);
        if tools.len() <= allowed {
            return Ok(0);
        }

        let mut ranked = Vec::with_capacity(tools.len());
        for item in tools {
            ranked.push((item, scorer.usefulness(view.catalog, item)?));
        }
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut outstanding = 0_usize;
        let mut queued = 0_usize;
        for (item, _) in ranked.into_iter().skip(allowed) {
            outstanding = outstanding.saturating_add(1);
            if records.contains_key(&item.id) {
                continue;
            }
            let job = queue.enqueue_front(agent.id, QueuedJob::DropTool { item: item.id });
            records.insert(item.id, job);
            queued = queued.saturating_add(1);
            debug!(agent = %agent.id, item = %item.id, "drop queued");
        }
        info!(
            agent = %agent.id,
            keeper = ?keeper,
            allowed,
            queued,
            outstanding,
            source = ?source,
            "carry limit enforced"
        );
        Ok(outstanding)
    }

    /// Drops still queued for `agent`.
    pub fn pending_drops(&self, queue: &dyn JobQueue, agent: AgentId) -> usize {
        self.drops.get(&agent).map_or(0, |records| {
            records
                .values()
                .filter(|&&job| queue.is_queued(agent, job))
                .count()
        })
    }

    /// Forget every drop record of a dead or captured agent.
    pub fn forget_agent(&mut self, agent: AgentId) {
        self.drops.remove(&agent);
    }
}

fn non_keepers<'a>(catalog: &Catalog, agent: &'a Agent, keeper: Option<ItemId>) -> Vec<&'a Item> {
    carried_tools(catalog, agent)
        .into_iter()
        .filter(|item| Some(item.id) != keeper)
        .collect()
}
