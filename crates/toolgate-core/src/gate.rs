//! Job gate: decides whether an agent may start a unit of work now.
//!
//! The pipeline runs in a fixed order:
//!
//! 1. **Eligibility** -- non-colonists, animals, mechanoids, and dead,
//!    downed or imprisoned agents pass. So does structurally exempt work
//!    (eating, idling, hauling).
//! 2. **Requirement resolution** -- the work's stats; none means pass.
//! 3. **Mode filter** -- Normal mode never blocks. Otherwise keep the stats
//!    that hard-block in the current mode (module jurisdiction first, then
//!    the stat's own gating).
//! 4. **Score check** -- a stat is missing when no carried tool beats its
//!    baseline.
//! 5. **Rescue attempt** -- preview an acquisition for every missing stat
//!    first. A stat with no candidate blocks before anything is queued. In
//!    the strictest mode the carry limit is then enforced with room left
//!    for the keeper and every incoming tool; outstanding drops block and
//!    no fetch is queued behind them. Only then are the front-priority
//!    fetches committed, and the job is deferred.
//!
//! Stale acquisition records are pruned at the start of every evaluation.
//!
//! [`JobGate::assess`] runs steps 1-4 without side effects.
//! [`JobGate::evaluate`] runs everything and never fails: any error inside
//! the pipeline is logged and turned into an allow.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use toolgate_types::{
    AcquisitionSource, Agent, AgentId, ItemId, JobPriority, StatId, WorkCategory, WorkId,
};
use toolgate_world::{JobQueue, Message, MessageKey, Messenger};
use tracing::{debug, warn};

use crate::carry::CarryEnforcer;
use crate::compat::CompatibilityRegistry;
use crate::error::GateError;
use crate::resolver::StatRequirementResolver;
use crate::scoring::ToolScorer;
use crate::search::{AcquisitionRequest, AssignmentSearch};
use crate::view::WorldView;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of the side-effect-free part of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assessment {
    /// The agent is not subject to gating.
    Ineligible,
    /// The work never touches a gated stat.
    Exempt,
    /// The agent does not do this kind of work.
    WorkTypeDisabled,
    /// The work depends on no stat.
    NoRequirements,
    /// Nothing blocks in the current mode.
    NotGated,
    /// Every blocking stat has a tool.
    Satisfied,
    /// Some blocking stats lack a tool.
    MissingTools {
        /// Blocking stats with no adequate tool, in requirement order.
        missing: Vec<StatId>,
        /// Every blocking stat.
        required: Vec<StatId>,
    },
}

/// Why a job was allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowReason {
    /// The agent is not subject to gating.
    Ineligible,
    /// The work is structurally exempt.
    Exempt,
    /// The agent does not do this kind of work; not the gate's concern.
    WorkTypeDisabled,
    /// The work depends on no stat.
    NoRequirements,
    /// Nothing blocks in the current mode.
    NotGated,
    /// Every blocking stat has a tool.
    Satisfied,
    /// The pipeline failed and the gate let the job through.
    FailOpen,
}

/// Why a job was blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockReason {
    /// No tool for `stat` is carried or reachable.
    MissingTool {
        /// The stat lacking a tool.
        stat: StatId,
        /// The blocked work.
        work: WorkId,
    },
    /// The agent carries too many tools.
    CarryNonCompliant {
        /// Drop jobs still outstanding.
        pending_drops: usize,
    },
}

/// Final gate decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    /// Start the job now.
    Allow {
        /// Why.
        reason: AllowReason,
    },
    /// Start the job now; acquisitions for `stats` are in flight.
    AllowDeferred {
        /// Stats with an outstanding acquisition.
        stats: Vec<StatId>,
    },
    /// Do not start the job.
    Block {
        /// Why.
        reason: BlockReason,
    },
}

impl GateDecision {
    /// Shorthand for an allow.
    pub const fn allow(reason: AllowReason) -> Self {
        Self::Allow { reason }
    }

    /// Whether the job may start now.
    pub const fn is_allowed(&self) -> bool {
        !self.is_blocked()
    }

    /// Whether the job was blocked.
    pub const fn is_blocked(&self) -> bool {
        matches!(self, Self::Block { .. })
    }
}

impl Assessment {
    /// The allow reason for every outcome except missing tools.
    pub const fn allow_reason(&self) -> Option<AllowReason> {
        match self {
            Self::Ineligible => Some(AllowReason::Ineligible),
            Self::Exempt => Some(AllowReason::Exempt),
            Self::WorkTypeDisabled => Some(AllowReason::WorkTypeDisabled),
            Self::NoRequirements => Some(AllowReason::NoRequirements),
            Self::NotGated => Some(AllowReason::NotGated),
            Self::Satisfied => Some(AllowReason::Satisfied),
            Self::MissingTools { .. } => None,
        }
    }
}

/// Running decision counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateStats {
    /// Calls to [`JobGate::evaluate`].
    pub evaluations: u64,
    /// Plain allows, fail-open included.
    pub allowed: u64,
    /// Deferred allows.
    pub deferred: u64,
    /// Blocks.
    pub blocked: u64,
    /// Allows caused by an internal failure.
    pub fail_open: u64,
}

impl GateStats {
    fn record(&mut self, decision: &GateDecision) {
        match decision {
            GateDecision::Allow { reason } => {
                self.allowed = self.allowed.saturating_add(1);
                if *reason == AllowReason::FailOpen {
                    self.fail_open = self.fail_open.saturating_add(1);
                }
            }
            GateDecision::AllowDeferred { .. } => {
                self.deferred = self.deferred.saturating_add(1);
            }
            GateDecision::Block { .. } => self.blocked = self.blocked.saturating_add(1),
        }
    }
}

/// Acquisitions needed to cover a set of missing stats, found without
/// queueing anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AcquisitionPlan {
    /// Every stat has a live fetch or a candidate.
    Covered {
        /// Stats whose fetch still has to be queued.
        fetch: Vec<StatId>,
        /// Distinct tools that will arrive, live fetches included.
        incoming: usize,
    },
    /// Nothing reachable improves this stat.
    Unreachable(StatId),
}

// ---------------------------------------------------------------------------
// JobGate
// ---------------------------------------------------------------------------

type ThrottleKey = (AgentId, MessageKey, Option<StatId>);

/// The decision core. Owns the scorer, the resolver memo, the registry,
/// and the acquisition and carry state.
#[derive(Debug, Default)]
pub struct JobGate {
    scorer: ToolScorer,
    resolver: StatRequirementResolver,
    registry: CompatibilityRegistry,
    search: AssignmentSearch,
    carry: CarryEnforcer,
    last_message: HashMap<ThrottleKey, u64>,
    stats: GateStats,
}

impl JobGate {
    /// A gate with the given scorer and compatibility registry.
    pub fn new(scorer: ToolScorer, registry: CompatibilityRegistry) -> Self {
        Self {
            scorer,
            registry,
            ..Self::default()
        }
    }

    /// The tool scorer.
    pub const fn scorer(&self) -> &ToolScorer {
        &self.scorer
    }

    /// The compatibility registry.
    pub const fn registry(&self) -> &CompatibilityRegistry {
        &self.registry
    }

    /// Mutable access to the registry (late registration).
    pub const fn registry_mut(&mut self) -> &mut CompatibilityRegistry {
        &mut self.registry
    }

    /// The acquisition tracker.
    pub const fn search(&self) -> &AssignmentSearch {
        &self.search
    }

    /// The carry enforcer.
    pub const fn carry(&self) -> &CarryEnforcer {
        &self.carry
    }

    /// The requirement resolver.
    pub const fn resolver(&self) -> &StatRequirementResolver {
        &self.resolver
    }

    /// Decision counters so far.
    pub const fn stats(&self) -> GateStats {
        self.stats
    }

    /// Resolved stats for `work`, optional ones included.
    pub fn requirements_for(&mut self, view: &WorldView<'_>, work: WorkId) -> Vec<StatId> {
        self.resolver.requirements_for(view, &self.registry, work)
    }

    /// Supersede everything in flight for a dead or captured agent.
    pub fn forget_agent(&mut self, agent: AgentId) {
        self.search.forget_agent(agent);
        self.carry.forget_agent(agent);
        self.last_message.retain(|key, _| key.0 != agent);
    }

    // -------------------------------------------------------------------
    // Pipeline
    // -------------------------------------------------------------------

    /// Whether `stat` hard-blocks `category` work in the current mode.
    fn stat_blocks(
        &self,
        view: &WorldView<'_>,
        category: WorkCategory,
        stat: StatId,
    ) -> Result<bool, GateError> {
        let mode = view.settings.mode;
        if let Some(verdict) = self.registry.jurisdiction(category, stat, mode) {
            return Ok(verdict);
        }
        let def = view.catalog.stat(stat).ok_or(GateError::UnknownStat(stat))?;
        Ok(def.gating.blocks_in(mode))
    }

    /// Steps 1-4: everything short of queueing anything.
    pub fn assess(
        &mut self,
        view: &WorldView<'_>,
        agent: &Agent,
        work: WorkId,
    ) -> Result<Assessment, GateError> {
        if !agent.is_gating_eligible() {
            return Ok(Assessment::Ineligible);
        }
        let Some(category) = view.catalog.work_category(work) else {
            debug!(%work, "unknown work, treating as unrequired");
            return Ok(Assessment::NoRequirements);
        };
        if category.is_structurally_exempt() {
            return Ok(Assessment::Exempt);
        }
        if !agent.can_do(category) {
            return Ok(Assessment::WorkTypeDisabled);
        }

        let requirements = self.requirements_for(view, work);
        if requirements.is_empty() {
            return Ok(Assessment::NoRequirements);
        }
        if !view.settings.gating_active() {
            return Ok(Assessment::NotGated);
        }

        let mut required = Vec::with_capacity(requirements.len());
        for stat in requirements {
            if self.stat_blocks(view, category, stat)? {
                required.push(stat);
            }
        }
        if required.is_empty() {
            return Ok(Assessment::NotGated);
        }

        let mut missing = Vec::new();
        for &stat in &required {
            if self.scorer.best_tool(view, agent, stat)?.is_none() {
                missing.push(stat);
            }
        }
        if missing.is_empty() {
            Ok(Assessment::Satisfied)
        } else {
            Ok(Assessment::MissingTools { missing, required })
        }
    }

    /// The carried tool to protect from drops while working on `stats`:
    /// the best real tool for the first stat that has one.
    pub fn keeper_for(
        &self,
        view: &WorldView<'_>,
        agent: &Agent,
        stats: &[StatId],
    ) -> Result<Option<ItemId>, GateError> {
        for &stat in stats {
            if let Some(item) = CarryEnforcer::select_keeper_for_job(&self.scorer, view, agent, stat)? {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    /// Full decision. Never fails: internal errors allow the job.
    pub fn evaluate(
        &mut self,
        view: &WorldView<'_>,
        queue: &mut dyn JobQueue,
        messenger: &mut dyn Messenger,
        agent: &Agent,
        work: WorkId,
    ) -> GateDecision {
        self.stats.evaluations = self.stats.evaluations.saturating_add(1);
        if !agent.alive || agent.imprisoned {
            self.forget_agent(agent.id);
        }
        let pruned = self.search.prune(&*queue);
        if pruned > 0 {
            debug!(pruned, "stale acquisitions pruned");
        }

        let decision = match self.try_evaluate(view, queue, messenger, agent, work) {
            Ok(decision) => decision,
            Err(err) => {
                warn!(agent = %agent.id, %work, error = %err, "gate evaluation failed, allowing");
                GateDecision::allow(AllowReason::FailOpen)
            }
        };
        self.stats.record(&decision);
        debug!(agent = %agent.id, %work, ?decision, "gate evaluated");
        decision
    }

    fn try_evaluate(
        &mut self,
        view: &WorldView<'_>,
        queue: &mut dyn JobQueue,
        messenger: &mut dyn Messenger,
        agent: &Agent,
        work: WorkId,
    ) -> Result<GateDecision, GateError> {
        match self.assess(view, agent, work)? {
            Assessment::MissingTools { missing, required } => {
                self.rescue_attempt(view, queue, messenger, agent, work, &missing, &required)
            }
            other => Ok(other
                .allow_reason()
                .map_or(GateDecision::allow(AllowReason::Satisfied), GateDecision::allow)),
        }
    }

    /// Step 5: preview, carry compliance, then commit.
    #[allow(clippy::too_many_arguments)]
    fn rescue_attempt(
        &mut self,
        view: &WorldView<'_>,
        queue: &mut dyn JobQueue,
        messenger: &mut dyn Messenger,
        agent: &Agent,
        work: WorkId,
        missing: &[StatId],
        required: &[StatId],
    ) -> Result<GateDecision, GateError> {
        let source = AcquisitionSource::Gate;
        let (fetch, incoming) = match self.plan_acquisitions(view, &*queue, agent, missing, source)? {
            AcquisitionPlan::Covered { fetch, incoming } => (fetch, incoming),
            AcquisitionPlan::Unreachable(stat) => {
                return Ok(self.block_missing(view, messenger, agent, work, stat));
            }
        };

        let pending_drops = self.enforce_carry_around(view, queue, agent, required, incoming, source)?;
        if pending_drops > 0 {
            self.notify(
                view,
                messenger,
                agent.id,
                MessageKey::DropToolsFirst,
                None,
                vec![agent.name.clone()],
            );
            return Ok(GateDecision::Block {
                reason: BlockReason::CarryNonCompliant { pending_drops },
            });
        }

        if let Some(stat) = self.commit_acquisitions(view, queue, agent, &fetch, source)? {
            return Ok(self.block_missing(view, messenger, agent, work, stat));
        }
        Ok(GateDecision::AllowDeferred {
            stats: missing.to_vec(),
        })
    }

    fn block_missing(
        &mut self,
        view: &WorldView<'_>,
        messenger: &mut dyn Messenger,
        agent: &Agent,
        work: WorkId,
        stat: StatId,
    ) -> GateDecision {
        let args = vec![
            agent.name.clone(),
            view.catalog.work_verb(work),
            view.catalog.stat_label(stat),
        ];
        self.notify(view, messenger, agent.id, MessageKey::MissingTool, Some(stat), args);
        GateDecision::Block {
            reason: BlockReason::MissingTool { stat, work },
        }
    }

    // -------------------------------------------------------------------
    // Acquisition and carry steps, shared with the rescue menu
    // -------------------------------------------------------------------

    const fn front_request(
        view: &WorldView<'_>,
        agent: &Agent,
        stat: StatId,
        source: AcquisitionSource,
    ) -> AcquisitionRequest {
        AcquisitionRequest::from_settings(agent.id, stat, view.settings, JobPriority::Front, source)
    }

    /// Find a live fetch or a candidate for every missing stat. Queues
    /// nothing.
    pub(crate) fn plan_acquisitions(
        &self,
        view: &WorldView<'_>,
        queue: &dyn JobQueue,
        agent: &Agent,
        missing: &[StatId],
        source: AcquisitionSource,
    ) -> Result<AcquisitionPlan, GateError> {
        let mut fetch = Vec::with_capacity(missing.len());
        let mut incoming = BTreeSet::new();
        for &stat in missing {
            if let Some(item) = self.search.pending_item(queue, agent.id, stat) {
                incoming.insert(item);
                continue;
            }
            let request = Self::front_request(view, agent, stat, source);
            let Some(candidate) = self
                .search
                .preview_upgrade(&self.scorer, view, queue, agent, &request)?
            else {
                return Ok(AcquisitionPlan::Unreachable(stat));
            };
            incoming.insert(candidate.item);
            fetch.push(stat);
        }
        Ok(AcquisitionPlan::Covered {
            fetch,
            incoming: incoming.len(),
        })
    }

    /// Enforce the carry limit around a job on `required`, reserving one
    /// slot for the keeper and one per incoming tool. Returns the drops
    /// still outstanding; zero when the limit is off.
    pub(crate) fn enforce_carry_around(
        &mut self,
        view: &WorldView<'_>,
        queue: &mut dyn JobQueue,
        agent: &Agent,
        required: &[StatId],
        incoming: usize,
        source: AcquisitionSource,
    ) -> Result<usize, GateError> {
        if !CarryEnforcer::is_active(view.settings) {
            return Ok(0);
        }
        let keeper = self.keeper_for(view, agent, required)?;
        let reserved = usize::from(keeper.is_some()).saturating_add(incoming);
        let allowed = CarryEnforcer::allowed_around_job(view.settings, reserved);
        self.carry
            .enforce_now(&self.scorer, view, queue, agent, keeper, allowed, source)
    }

    /// Queue the fetches of a covered plan. Returns the first stat whose
    /// candidate is gone by now.
    pub(crate) fn commit_acquisitions(
        &mut self,
        view: &WorldView<'_>,
        queue: &mut dyn JobQueue,
        agent: &Agent,
        fetch: &[StatId],
        source: AcquisitionSource,
    ) -> Result<Option<StatId>, GateError> {
        for &stat in fetch {
            let request = Self::front_request(view, agent, stat, source);
            if !self
                .search
                .try_upgrade_for(&self.scorer, view, queue, agent, &request)?
            {
                return Ok(Some(stat));
            }
        }
        Ok(None)
    }

    /// Send a message unless the same one went out within the cooldown.
    /// Returns whether it was sent.
    fn notify(
        &mut self,
        view: &WorldView<'_>,
        messenger: &mut dyn Messenger,
        agent: AgentId,
        key: MessageKey,
        stat: Option<StatId>,
        args: Vec<String>,
    ) -> bool {
        let slot = (agent, key, stat);
        let cooldown = view.settings.message_cooldown_ticks;
        if self
            .last_message
            .get(&slot)
            .is_some_and(|&last| view.tick.saturating_sub(last) < cooldown)
        {
            return false;
        }
        self.last_message.insert(slot, view.tick);
        messenger.send(Message::about(agent, key, args));
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use toolgate_types::{AgentKind, CellPos, Item, MaterialId, Mode};
    use toolgate_world::{
        Catalog, GridMap, JobBoard, MessageLog, QueuedJob, StartingDefs, create_starting_catalog,
    };

    use super::*;
    use crate::carry::carried_tools;
    use crate::compat::StatBindingModule;
    use crate::config::GateSettings;

    struct Fixture {
        catalog: Catalog,
        defs: StartingDefs,
        map: GridMap,
        settings: GateSettings,
        board: JobBoard,
        log: MessageLog,
        gate: JobGate,
        tick: u64,
    }

    impl Fixture {
        fn new(mode: Mode) -> Self {
            let (catalog, defs) = create_starting_catalog().unwrap();
            Self {
                catalog,
                defs,
                map: GridMap::new(30, 30),
                settings: GateSettings::for_mode(mode),
                board: JobBoard::new(),
                log: MessageLog::new(),
                gate: JobGate::default(),
                tick: 0,
            }
        }

        fn evaluate(&mut self, agent: &Agent, work: WorkId) -> GateDecision {
            let view = WorldView::new(&self.settings, &self.catalog, &self.map, self.tick);
            self.gate
                .evaluate(&view, &mut self.board, &mut self.log, agent, work)
        }

        /// Carry out every queued job of `agent` in order.
        fn run_jobs(&mut self, agent: &mut Agent) {
            while let Some(entry) = self.board.start_next(agent.id).copied() {
                match entry.job {
                    QueuedJob::DropTool { item } => {
                        let tool = agent.take_item(item).unwrap();
                        self.map.place_item(tool, agent.position).unwrap();
                    }
                    QueuedJob::FetchAndEquip { item, .. } => {
                        let ground = self.map.take_item(item).unwrap();
                        agent.equip(ground.item);
                    }
                    QueuedJob::Work { .. } => {}
                }
                self.board.complete_current(agent.id);
                let carried = carried_tools(&self.catalog, agent).len();
                assert!(carried <= CarryEnforcer::effective_limit(&self.settings));
            }
        }

        fn assess(&mut self, agent: &Agent, work: WorkId) -> Assessment {
            let view = WorldView::new(&self.settings, &self.catalog, &self.map, self.tick);
            self.gate.assess(&view, agent, work).unwrap()
        }
    }

    fn colonist() -> Agent {
        Agent::colonist("Alder", CellPos::new(0, 0))
    }

    #[test]
    fn ineligible_agents_pass() {
        let mut fx = Fixture::new(Mode::Nightmare);
        let work = WorkId::Giver(fx.defs.mine);

        let mut animal = colonist();
        animal.kind = AgentKind::Animal;
        assert_eq!(fx.assess(&animal, work), Assessment::Ineligible);

        let mut downed = colonist();
        downed.downed = true;
        assert_eq!(
            fx.evaluate(&downed, work),
            GateDecision::allow(AllowReason::Ineligible)
        );
    }

    #[test]
    fn exempt_and_disabled_work_pass() {
        let mut fx = Fixture::new(Mode::Hardcore);
        let mut agent = colonist();
        assert_eq!(fx.assess(&agent, WorkId::Giver(fx.defs.haul)), Assessment::Exempt);
        assert_eq!(fx.assess(&agent, WorkId::Giver(fx.defs.eat)), Assessment::Exempt);

        agent.disabled_work.insert(WorkCategory::Mining);
        assert_eq!(
            fx.assess(&agent, WorkId::Giver(fx.defs.mine)),
            Assessment::WorkTypeDisabled
        );
    }

    #[test]
    fn optional_stats_only_block_in_nightmare() {
        let mut fx = Fixture::new(Mode::Hardcore);
        let agent = colonist();
        let sow = WorkId::Giver(fx.defs.sow);
        assert_eq!(fx.assess(&agent, sow), Assessment::NotGated);

        fx.settings.mode = Mode::Nightmare;
        assert_eq!(
            fx.assess(&agent, sow),
            Assessment::MissingTools {
                missing: vec![fx.defs.sowing_speed],
                required: vec![fx.defs.sowing_speed],
            }
        );
    }

    #[test]
    fn hardcore_mining_ignores_optional_yield() {
        let mut fx = Fixture::new(Mode::Hardcore);
        let agent = colonist();
        assert_eq!(
            fx.assess(&agent, WorkId::Giver(fx.defs.mine)),
            Assessment::MissingTools {
                missing: vec![fx.defs.digging_speed],
                required: vec![fx.defs.digging_speed],
            }
        );
    }

    #[test]
    fn module_jurisdiction_overrides_stat_gating() {
        let mut fx = Fixture::new(Mode::Hardcore);
        fx.gate
            .registry_mut()
            .register(Box::new(
                StatBindingModule::new("research_bench", true)
                    .claiming(WorkCategory::Research)
                    .contributing("research_speed")
                    .blocking_in(&[Mode::Nightmare]),
            ))
            .unwrap();
        fx.gate.registry_mut().initialize_all(&fx.catalog);
        let agent = colonist();
        let research = WorkId::Giver(fx.defs.research);

        assert_eq!(fx.assess(&agent, research), Assessment::NotGated);
        fx.settings.mode = Mode::Nightmare;
        assert!(matches!(
            fx.assess(&agent, research),
            Assessment::MissingTools { .. }
        ));
    }

    #[test]
    fn carried_tool_satisfies() {
        let mut fx = Fixture::new(Mode::Hardcore);
        let mut agent = colonist();
        agent.equip(Item::new(fx.defs.pickaxe, Some(fx.defs.steel)));
        assert_eq!(
            fx.evaluate(&agent, WorkId::Giver(fx.defs.mine)),
            GateDecision::allow(AllowReason::Satisfied)
        );
    }

    #[test]
    fn failure_inside_pipeline_fails_open() {
        let mut fx = Fixture::new(Mode::Hardcore);
        let mut agent = colonist();
        agent.equip(Item::new(fx.defs.pickaxe, Some(MaterialId(999))));
        let decision = fx.evaluate(&agent, WorkId::Giver(fx.defs.mine));
        assert_eq!(decision, GateDecision::allow(AllowReason::FailOpen));
        assert_eq!(fx.gate.stats().fail_open, 1);
        assert_eq!(fx.gate.stats().allowed, 1);
    }

    #[test]
    fn block_messages_are_throttled() {
        let mut fx = Fixture::new(Mode::Hardcore);
        let agent = colonist();
        let mine = WorkId::Giver(fx.defs.mine);

        assert!(fx.evaluate(&agent, mine).is_blocked());
        assert!(fx.evaluate(&agent, mine).is_blocked());
        assert_eq!(fx.log.count(MessageKey::MissingTool), 1);

        fx.tick = 600;
        assert!(fx.evaluate(&agent, mine).is_blocked());
        assert_eq!(fx.log.count(MessageKey::MissingTool), 2);

        let message = fx.log.messages().first().unwrap();
        assert_eq!(
            message.fallback_text(),
            "Alder cannot Mine: needs a tool for Digging speed"
        );
        assert_eq!(fx.gate.stats().blocked, 3);
        assert_eq!(fx.gate.stats().evaluations, 3);
    }

    #[test]
    fn dead_agent_supersedes_acquisitions() {
        let mut fx = Fixture::new(Mode::Hardcore);
        let mut agent = colonist();
        fx.map
            .place_item(
                Item::new(fx.defs.pickaxe, Some(fx.defs.steel)),
                CellPos::new(3, 3),
            )
            .unwrap();
        let mine = WorkId::Giver(fx.defs.mine);
        assert!(matches!(
            fx.evaluate(&agent, mine),
            GateDecision::AllowDeferred { .. }
        ));
        assert!(!fx.gate.search().is_empty());

        agent.alive = false;
        assert_eq!(
            fx.evaluate(&agent, mine),
            GateDecision::allow(AllowReason::Ineligible)
        );
        assert!(fx.gate.search().is_empty());
    }

    #[test]
    fn completed_fetches_are_pruned() {
        let mut fx = Fixture::new(Mode::Hardcore);
        let mut agent = colonist();
        fx.map
            .place_item(
                Item::new(fx.defs.pickaxe, Some(fx.defs.steel)),
                CellPos::new(3, 3),
            )
            .unwrap();
        let mine = WorkId::Giver(fx.defs.mine);
        assert!(matches!(
            fx.evaluate(&agent, mine),
            GateDecision::AllowDeferred { .. }
        ));
        assert_eq!(fx.gate.search().len(), 1);

        fx.run_jobs(&mut agent);
        assert_eq!(
            fx.evaluate(&agent, mine),
            GateDecision::allow(AllowReason::Satisfied)
        );
        assert!(fx.gate.search().is_empty());
    }

    #[test]
    fn unreachable_stat_queues_no_fetch_for_the_others() {
        let mut fx = Fixture::new(Mode::Hardcore);
        fx.gate
            .registry_mut()
            .register(Box::new(
                StatBindingModule::new("shoring", true)
                    .claiming(WorkCategory::Mining)
                    .contributing("construction_speed"),
            ))
            .unwrap();
        fx.gate.registry_mut().initialize_all(&fx.catalog);
        fx.map
            .place_item(
                Item::new(fx.defs.pickaxe, Some(fx.defs.steel)),
                CellPos::new(3, 3),
            )
            .unwrap();
        let agent = colonist();
        let mine = WorkId::Giver(fx.defs.mine);

        // A pickaxe is reachable but nothing helps construction.
        assert_eq!(
            fx.evaluate(&agent, mine),
            GateDecision::Block {
                reason: BlockReason::MissingTool {
                    stat: fx.defs.construction_speed,
                    work: mine,
                },
            }
        );
        assert!(fx.board.is_idle(agent.id));
        assert!(fx.gate.search().is_empty());

        fx.map
            .place_item(
                Item::new(fx.defs.hammer, Some(fx.defs.steel)),
                CellPos::new(5, 5),
            )
            .unwrap();
        assert_eq!(
            fx.evaluate(&agent, mine),
            GateDecision::AllowDeferred {
                stats: vec![fx.defs.digging_speed, fx.defs.construction_speed],
            }
        );
        assert_eq!(fx.board.len(agent.id), 2);
    }

    #[test]
    fn drops_run_before_any_fetch() {
        let mut fx = Fixture::new(Mode::Nightmare);
        let mut agent = colonist();
        for def in [fx.defs.axe, fx.defs.hammer, fx.defs.broom, fx.defs.chisel] {
            agent.inventory.push(Item::new(def, Some(fx.defs.steel)));
        }
        fx.map
            .place_item(
                Item::new(fx.defs.pickaxe, Some(fx.defs.steel)),
                CellPos::new(4, 4),
            )
            .unwrap();
        let mine = WorkId::Giver(fx.defs.mine);

        // Four carried plus the pickaxe: two must go, and nothing is fetched yet.
        assert_eq!(
            fx.evaluate(&agent, mine),
            GateDecision::Block {
                reason: BlockReason::CarryNonCompliant { pending_drops: 2 },
            }
        );
        assert!(
            fx.board
                .pending(agent.id)
                .all(|e| matches!(e.job, QueuedJob::DropTool { .. }))
        );
        assert!(fx.gate.search().is_empty());

        fx.run_jobs(&mut agent);
        assert!(matches!(
            fx.evaluate(&agent, mine),
            GateDecision::AllowDeferred { .. }
        ));
        fx.run_jobs(&mut agent);
        assert_eq!(carried_tools(&fx.catalog, &agent).len(), 3);
        assert_eq!(
            fx.evaluate(&agent, mine),
            GateDecision::allow(AllowReason::Satisfied)
        );
    }

    #[test]
    fn decisions_serialize_with_tags() {
        let decision = GateDecision::Block {
            reason: BlockReason::CarryNonCompliant { pending_drops: 2 },
        };
        let json = serde_json::to_string(&decision).unwrap();
        assert!(json.contains("\"decision\":\"block\""));
        assert!(json.contains("\"pending_drops\":2"));
    }
}
