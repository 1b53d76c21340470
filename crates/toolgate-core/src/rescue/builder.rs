//! Menu synthesis and execution for rescue options.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use toolgate_types::{
    AcquisitionSource, Agent, AgentId, CellPos, JobId, JobPriority, ScannerCategory, StatId,
    WorkId,
};
use toolgate_world::{Catalog, JobQueue, Message, MessageKey, Messenger, QueuedJob, render};
use tracing::{debug, info, warn};

use super::scanners::{CategoryScanner, ScanCandidate, ScanContext, Scanner, TargetDescription};
use crate::error::{GateError, RescueError};
use crate::gate::{AcquisitionPlan, Assessment, JobGate};
use crate::search::AcquisitionRequest;
use crate::view::WorldView;

/// Why a disabled feedback option was shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackReason {
    /// Tools are missing and none can be fetched.
    NoToolReachable,
    /// The agent does not do this kind of work.
    WorkTypeDisabled,
    /// Nothing is missing.
    AlreadySatisfied,
}

impl FeedbackReason {
    /// Tie-break order: lower wins.
    const fn rank(self) -> u8 {
        match self {
            Self::NoToolReachable => 0,
            Self::WorkTypeDisabled => 1,
            Self::AlreadySatisfied => 2,
        }
    }

    /// Localization key of the option label.
    pub const fn message_key(self) -> MessageKey {
        match self {
            Self::NoToolReachable => MessageKey::NoToolReachable,
            Self::WorkTypeDisabled => MessageKey::WorkTypeDisabled,
            Self::AlreadySatisfied => MessageKey::AlreadySatisfied,
        }
    }
}

/// Everything needed to run a rescue once the player picks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescueAction {
    /// Agent the option was built for.
    pub agent: AgentId,
    /// The scanned work.
    pub candidate: ScanCandidate,
    /// Stats to fetch tools for.
    pub missing: Vec<StatId>,
    /// Whether the queue modifier was held at click time.
    pub queue_modifier: bool,
}

/// One entry in the context menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    /// Display label (English fallback).
    pub label: String,
    /// Whether the option can be picked.
    pub enabled: bool,
    /// What picking it does; `None` for feedback options.
    pub action: Option<RescueAction>,
    /// Context hint score.
    pub hint_score: u32,
    /// Reason shown by a disabled option.
    pub reason: Option<FeedbackReason>,
}

/// Serializable summary of a menu option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOptionSummary {
    /// Display label.
    pub label: String,
    /// Whether the option can be picked.
    pub enabled: bool,
    /// Scanner category behind an enabled option.
    pub category: Option<ScannerCategory>,
    /// Work behind an enabled option.
    pub work: Option<WorkId>,
    /// Target cell of an enabled option.
    pub target: Option<CellPos>,
    /// Context hint score.
    pub hint_score: u32,
    /// Reason of a disabled option.
    pub reason: Option<FeedbackReason>,
}

impl MenuOption {
    /// A serializable view of this option.
    pub fn summary(&self) -> MenuOptionSummary {
        let candidate = self.action.as_ref().map(|a| &a.candidate);
        MenuOptionSummary {
            label: self.label.clone(),
            enabled: self.enabled,
            category: candidate.map(|c| c.category),
            work: candidate.map(|c| c.work),
            target: candidate.map(|c| c.target),
            hint_score: self.hint_score,
            reason: self.reason,
        }
    }
}

/// Result of executing a rescue action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescueOutcome {
    /// The queued work job.
    pub job: JobId,
    /// Acquisitions queued or already in flight for the action.
    pub acquisitions: usize,
    /// Whether the running job was interrupted.
    pub interrupted: bool,
}

enum ScanOutcome {
    Actionable(MenuOption),
    Feedback(FeedbackReason, Vec<String>),
    Skip,
}

/// Counts feedback reasons, remembering the first arguments of each.
#[derive(Default)]
struct FeedbackTally {
    seen: Vec<(FeedbackReason, usize, Vec<String>)>,
}

impl FeedbackTally {
    fn record(&mut self, reason: FeedbackReason, args: Vec<String>) {
        if let Some(entry) = self.seen.iter_mut().find(|e| e.0 == reason) {
            entry.1 = entry.1.saturating_add(1);
        } else {
            self.seen.push((reason, 1, args));
        }
    }

    /// Most frequent reason, ties broken by [`FeedbackReason::rank`].
    fn dominant(self) -> Option<(FeedbackReason, Vec<String>)> {
        self.seen
            .into_iter()
            .min_by(|a, b| b.1.cmp(&a.1).then(a.0.rank().cmp(&b.0.rank())))
            .map(|(reason, _, args)| (reason, args))
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds the rescue entry of a context menu and runs it when picked.
#[derive(Default)]
pub struct RescueOptionBuilder {
    scanners: Vec<Box<dyn Scanner>>,
    memo: HashMap<AgentId, (u64, Vec<MenuOption>)>,
}

impl fmt::Debug for RescueOptionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RescueOptionBuilder")
            .field("scanners", &self.scanner_names())
            .field("memoized", &self.memo.len())
            .finish()
    }
}

impl RescueOptionBuilder {
    /// A builder with no scanners.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder with the built-in scanner of every category.
    pub fn with_default_scanners(catalog: &Catalog) -> Self {
        let mut builder = Self::new();
        for scanner in CategoryScanner::defaults(catalog) {
            builder.register_scanner(Box::new(scanner));
        }
        builder
    }

    /// Append a scanner. Registration order breaks hint-score ties.
    pub fn register_scanner(&mut self, scanner: Box<dyn Scanner>) {
        self.scanners.push(scanner);
        self.memo.clear();
    }

    /// Names of registered scanners, in order.
    pub fn scanner_names(&self) -> Vec<&str> {
        self.scanners.iter().map(|s| s.name()).collect()
    }

    /// Forget the memoized menu of `agent`.
    pub fn invalidate(&mut self, agent: AgentId) {
        self.memo.remove(&agent);
    }

    /// Build the rescue entries for a click: at most one enabled option,
    /// or one disabled option explaining why nothing is actionable.
    ///
    /// Never fails. A scanner or candidate that errors is skipped.
    pub fn build_menu(
        &mut self,
        gate: &mut JobGate,
        view: &WorldView<'_>,
        queue: &dyn JobQueue,
        agent: &Agent,
        ctx: &ScanContext,
    ) -> Vec<MenuOption> {
        if !view.settings.rescue_enabled || !view.settings.gating_active() {
            return Vec::new();
        }
        if let Some((_, options)) = self
            .memo
            .get(&agent.id)
            .filter(|(click, _)| *click == ctx.click_id)
        {
            return options.clone();
        }

        let options = self.scan(gate, view, queue, agent, ctx);
        self.memo
            .insert(agent.id, (ctx.click_id, options.clone()));
        options
    }

    fn scan(
        &self,
        gate: &mut JobGate,
        view: &WorldView<'_>,
        queue: &dyn JobQueue,
        agent: &Agent,
        ctx: &ScanContext,
    ) -> Vec<MenuOption> {
        let primary = ctx.primary_category();
        let order = self
            .scanners
            .iter()
            .filter(|s| Some(s.category()) == primary)
            .chain(
                self.scanners
                    .iter()
                    .filter(|s| Some(s.category()) != primary),
            );

        let mut best: Option<MenuOption> = None;
        let mut feedback = FeedbackTally::default();
        for scanner in order {
            if !scanner.can_handle(ctx) {
                continue;
            }
            let description = match scanner.try_describe_target(view.catalog, agent, ctx) {
                Ok(Some(description)) => description,
                Ok(None) => continue,
                Err(err) => {
                    warn!(scanner = scanner.name(), error = %err, "scanner failed, skipping");
                    continue;
                }
            };
            let hint = scanner.hint_score(agent, ctx);
            match describe_option(gate, view, queue, agent, ctx, scanner.category(), description, hint)
            {
                Ok(ScanOutcome::Actionable(option)) => {
                    let short_circuit = primary == Some(scanner.category());
                    if best.as_ref().is_none_or(|b| option.hint_score > b.hint_score) {
                        best = Some(option);
                    }
                    if short_circuit {
                        break;
                    }
                }
                Ok(ScanOutcome::Feedback(reason, args)) => feedback.record(reason, args),
                Ok(ScanOutcome::Skip) => {}
                Err(err) => {
                    warn!(scanner = scanner.name(), error = %err, "rescue candidate failed, skipping");
                }
            }
        }

        if let Some(option) = best {
            debug!(agent = %agent.id, label = %option.label, "rescue option built");
            return vec![option];
        }
        feedback
            .dominant()
            .map(|(reason, args)| MenuOption {
                label: render(reason.message_key(), &args),
                enabled: false,
                action: None,
                hint_score: 0,
                reason: Some(reason),
            })
            .into_iter()
            .collect()
    }

    /// Run a picked rescue option.
    ///
    /// Previews an acquisition for every missing stat and aborts before
    /// queueing anything if one has no candidate. In the strictest mode
    /// the carry limit is then enforced; outstanding drops abort with only
    /// the drops queued. Otherwise the fetches and the work are queued.
    /// With the queue modifier held and an acquisition in flight the
    /// running job is interrupted and the work goes to the front;
    /// otherwise it goes to the tail.
    pub fn execute(
        &mut self,
        gate: &mut JobGate,
        view: &WorldView<'_>,
        queue: &mut dyn JobQueue,
        messenger: &mut dyn Messenger,
        agent: &Agent,
        action: &RescueAction,
    ) -> Result<RescueOutcome, RescueError> {
        if action.agent != agent.id {
            return Err(RescueError::AgentMismatch {
                expected: action.agent,
                actual: agent.id,
            });
        }
        self.invalidate(agent.id);

        let source = AcquisitionSource::Rescue;
        let no_candidate = |messenger: &mut dyn Messenger, stat: StatId| {
            messenger.send(Message::about(
                agent.id,
                MessageKey::NoToolReachable,
                vec![view.catalog.stat_label(stat)],
            ));
            RescueError::NoCandidateTool { stat }
        };
        let (fetch, incoming) =
            match gate.plan_acquisitions(view, &*queue, agent, &action.missing, source)? {
                AcquisitionPlan::Covered { fetch, incoming } => (fetch, incoming),
                AcquisitionPlan::Unreachable(stat) => return Err(no_candidate(messenger, stat)),
            };

        let required = &action.candidate.required_stats;
        let pending_drops = gate.enforce_carry_around(view, queue, agent, required, incoming, source)?;
        if pending_drops > 0 {
            messenger.send(Message::about(
                agent.id,
                MessageKey::DropToolsFirst,
                vec![agent.name.clone()],
            ));
            return Err(RescueError::CarryNonCompliant { pending_drops });
        }

        if let Some(stat) = gate.commit_acquisitions(view, queue, agent, &fetch, source)? {
            return Err(no_candidate(messenger, stat));
        }

        let work = QueuedJob::Work {
            work: action.candidate.work,
            target: action.candidate.target,
        };
        let interrupted = action.queue_modifier
            && gate
                .search()
                .has_acquisition_pending_or_queued(&*queue, agent.id);
        let job = if interrupted {
            queue.interrupt_current(agent.id);
            queue.enqueue_front(agent.id, work)
        } else {
            queue.enqueue_tail(agent.id, work)
        };
        info!(
            agent = %agent.id,
            work = %action.candidate.work,
            acquisitions = action.missing.len(),
            interrupted,
            "rescue executed"
        );
        Ok(RescueOutcome {
            job,
            acquisitions: action.missing.len(),
            interrupted,
        })
    }
}

/// Run one described target through the gate.
#[allow(clippy::too_many_arguments)]
fn describe_option(
    gate: &mut JobGate,
    view: &WorldView<'_>,
    queue: &dyn JobQueue,
    agent: &Agent,
    ctx: &ScanContext,
    category: ScannerCategory,
    description: TargetDescription,
    hint_score: u32,
) -> Result<ScanOutcome, GateError> {
    let TargetDescription { work, job, target } = description;
    let verb = view.catalog.work_verb(work);
    let missing = match gate.assess(view, agent, work)? {
        Assessment::MissingTools { missing, .. } => missing,
        Assessment::WorkTypeDisabled => {
            return Ok(ScanOutcome::Feedback(
                FeedbackReason::WorkTypeDisabled,
                vec![agent.name.clone(), verb],
            ));
        }
        Assessment::NoRequirements | Assessment::NotGated | Assessment::Satisfied => {
            return Ok(ScanOutcome::Feedback(
                FeedbackReason::AlreadySatisfied,
                vec![agent.name.clone(), verb],
            ));
        }
        Assessment::Ineligible | Assessment::Exempt => return Ok(ScanOutcome::Skip),
    };

    let mut tools = Vec::with_capacity(missing.len());
    for &stat in &missing {
        let request = AcquisitionRequest::from_settings(
            agent.id,
            stat,
            view.settings,
            JobPriority::Front,
            AcquisitionSource::Rescue,
        );
        match gate
            .search()
            .preview_upgrade(gate.scorer(), view, queue, agent, &request)?
        {
            Some(candidate) => {
                let label = view.catalog.thing_label(candidate.def);
                if !tools.contains(&label) {
                    tools.push(label);
                }
            }
            None => {
                return Ok(ScanOutcome::Feedback(
                    FeedbackReason::NoToolReachable,
                    vec![view.catalog.stat_label(stat)],
                ));
            }
        }
    }

    let required_stats = gate.requirements_for(view, work);
    let label = render(MessageKey::WillFetch, &[verb, tools.join(", ")]);
    Ok(ScanOutcome::Actionable(MenuOption {
        label,
        enabled: true,
        action: Some(RescueAction {
            agent: agent.id,
            candidate: ScanCandidate {
                category,
                work,
                job,
                required_stats,
                target,
            },
            missing,
            queue_modifier: ctx.queue_modifier,
        }),
        hint_score,
        reason: None,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use toolgate_types::{Designation, Item, Mode, WorkCategory, WorkGiverId};
    use toolgate_world::{GridMap, JobBoard, MessageLog, StartingDefs, create_starting_catalog};

    use super::*;
    use crate::carry::{CarryEnforcer, carried_tools};
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
        builder: RescueOptionBuilder,
        agent: Agent,
        rock: CellPos,
    }

    impl Fixture {
        fn new(mode: Mode) -> Self {
            let (catalog, defs) = create_starting_catalog().unwrap();
            let mut map = GridMap::new(20, 20);
            let rock = CellPos::new(6, 6);
            map.designate(rock, Designation::Mine).unwrap();
            let builder = RescueOptionBuilder::with_default_scanners(&catalog);
            Self {
                catalog,
                defs,
                map,
                settings: GateSettings::for_mode(mode),
                board: JobBoard::new(),
                log: MessageLog::new(),
                gate: JobGate::default(),
                builder,
                agent: Agent::colonist("Alder", CellPos::new(0, 0)),
                rock,
            }
        }

        fn drop_pickaxe(&mut self) -> toolgate_types::ItemId {
            let item = Item::new(self.defs.pickaxe, Some(self.defs.steel));
            self.map.place_item(item, CellPos::new(2, 2)).unwrap()
        }

        fn menu(&mut self, click_id: u64) -> Vec<MenuOption> {
            let ctx = ScanContext::at(click_id, &self.map, self.rock);
            let view = WorldView::new(&self.settings, &self.catalog, &self.map, 0);
            self.builder
                .build_menu(&mut self.gate, &view, &self.board, &self.agent, &ctx)
        }

        fn execute(&mut self, action: &RescueAction) -> Result<RescueOutcome, RescueError> {
            let view = WorldView::new(&self.settings, &self.catalog, &self.map, 0);
            self.builder.execute(
                &mut self.gate,
                &view,
                &mut self.board,
                &mut self.log,
                &self.agent,
                action,
            )
        }
    }

    #[test]
    fn offers_to_fetch_a_reachable_tool() {
        let mut fx = Fixture::new(Mode::Hardcore);
        fx.drop_pickaxe();
        let menu = fx.menu(1);
        assert_eq!(menu.len(), 1);

        let option = menu.first().unwrap();
        assert!(option.enabled);
        assert_eq!(option.label, "Mine (will fetch pickaxe)");
        let action = option.action.as_ref().unwrap();
        assert_eq!(action.candidate.category, ScannerCategory::Mine);
        assert_eq!(action.missing, vec![fx.defs.digging_speed]);
        assert_eq!(
            action.candidate.required_stats,
            vec![fx.defs.digging_speed, fx.defs.mining_yield]
        );
        // Building the menu queues nothing.
        assert!(fx.board.is_idle(fx.agent.id));
    }

    #[test]
    fn explains_when_nothing_is_reachable() {
        let mut fx = Fixture::new(Mode::Hardcore);
        let menu = fx.menu(1);
        let option = menu.first().unwrap();
        assert!(!option.enabled);
        assert_eq!(option.reason, Some(FeedbackReason::NoToolReachable));
        assert_eq!(option.label, "No tool for Digging speed within reach");
    }

    #[test]
    fn explains_disabled_work() {
        let mut fx = Fixture::new(Mode::Hardcore);
        fx.drop_pickaxe();
        fx.agent.disabled_work.insert(WorkCategory::Mining);
        let menu = fx.menu(1);
        let option = menu.first().unwrap();
        assert_eq!(option.reason, Some(FeedbackReason::WorkTypeDisabled));
        assert_eq!(option.label, "Alder does not do Mine work");
    }

    #[test]
    fn nothing_in_normal_mode_or_when_disabled() {
        let mut fx = Fixture::new(Mode::Normal);
        fx.drop_pickaxe();
        assert!(fx.menu(1).is_empty());

        fx.settings = GateSettings::for_mode(Mode::Hardcore);
        fx.settings.rescue_enabled = false;
        assert!(fx.menu(2).is_empty());
    }

    #[test]
    fn menus_are_memoized_per_click() {
        let mut fx = Fixture::new(Mode::Hardcore);
        let first = fx.menu(7);
        assert!(!first.first().unwrap().enabled);

        fx.drop_pickaxe();
        assert_eq!(fx.menu(7), first);
        assert!(fx.menu(8).first().unwrap().enabled);
    }

    #[test]
    fn failing_scanner_is_skipped() {
        let mut fx = Fixture::new(Mode::Hardcore);
        fx.drop_pickaxe();
        let mut builder = RescueOptionBuilder::new();
        builder.register_scanner(Box::new(CategoryScanner::new(
            ScannerCategory::Mine,
            WorkGiverId(999),
        )));
        builder.register_scanner(Box::new(CategoryScanner::new(
            ScannerCategory::Mine,
            fx.defs.mine,
        )));
        fx.builder = builder;
        let menu = fx.menu(1);
        assert!(menu.first().unwrap().enabled);
    }

    #[test]
    fn execute_queues_fetch_then_work() {
        let mut fx = Fixture::new(Mode::Hardcore);
        let pickaxe = fx.drop_pickaxe();
        let action = fx.menu(1).first().unwrap().action.clone().unwrap();

        let outcome = fx.execute(&action).unwrap();
        assert!(!outcome.interrupted);
        assert_eq!(outcome.acquisitions, 1);

        let jobs: Vec<QueuedJob> = fx.board.pending(fx.agent.id).map(|e| e.job).collect();
        assert_eq!(
            jobs,
            vec![
                QueuedJob::FetchAndEquip {
                    item: pickaxe,
                    stat: fx.defs.digging_speed,
                },
                QueuedJob::Work {
                    work: WorkId::Giver(fx.defs.mine),
                    target: fx.rock,
                },
            ]
        );
    }

    #[test]
    fn queue_modifier_interrupts_the_running_job() {
        let mut fx = Fixture::new(Mode::Hardcore);
        fx.drop_pickaxe();
        let chores = QueuedJob::Work {
            work: WorkId::Giver(fx.defs.clean),
            target: CellPos::new(1, 1),
        };
        fx.board.enqueue_tail(fx.agent.id, chores);
        fx.board.start_next(fx.agent.id);

        let ctx = ScanContext::at(1, &fx.map, fx.rock).with_queue_modifier(true);
        let view = WorldView::new(&fx.settings, &fx.catalog, &fx.map, 0);
        let menu = fx
            .builder
            .build_menu(&mut fx.gate, &view, &fx.board, &fx.agent, &ctx);
        let action = menu.first().unwrap().action.clone().unwrap();
        assert!(action.queue_modifier);

        let outcome = fx.execute(&action).unwrap();
        assert!(outcome.interrupted);
        assert!(fx.board.current(fx.agent.id).is_none());
        let order: Vec<QueuedJob> = fx.board.pending(fx.agent.id).map(|e| e.job).collect();
        assert!(matches!(order.first(), Some(QueuedJob::FetchAndEquip { .. })));
        assert!(matches!(order.get(1), Some(QueuedJob::Work { target, .. }) if *target == fx.rock));
        assert_eq!(order.get(2), Some(&chores));
    }

    #[test]
    fn vanished_tool_reports_no_candidate() {
        let mut fx = Fixture::new(Mode::Hardcore);
        let pickaxe = fx.drop_pickaxe();
        let action = fx.menu(1).first().unwrap().action.clone().unwrap();
        fx.map.take_item(pickaxe).unwrap();

        let err = fx.execute(&action).unwrap_err();
        assert!(matches!(err, RescueError::NoCandidateTool { .. }));
        assert_eq!(fx.log.count(MessageKey::NoToolReachable), 1);
        assert!(fx.board.is_idle(fx.agent.id));
    }

    #[test]
    fn carry_limit_aborts_in_nightmare() {
        let mut fx = Fixture::new(Mode::Nightmare);
        fx.drop_pickaxe();
        for def in [fx.defs.axe, fx.defs.hammer, fx.defs.broom] {
            fx.agent.inventory.push(Item::new(def, Some(fx.defs.steel)));
        }
        let action = fx.menu(1).first().unwrap().action.clone().unwrap();

        let err = fx.execute(&action).unwrap_err();
        assert!(matches!(err, RescueError::CarryNonCompliant { pending_drops: 1 }));
        assert_eq!(fx.log.count(MessageKey::DropToolsFirst), 1);
        // Only the drop is queued; the pickaxe waits for a retry.
        let jobs: Vec<QueuedJob> = fx.board.pending(fx.agent.id).map(|e| e.job).collect();
        assert_eq!(jobs.len(), 1);
        assert!(matches!(jobs.first(), Some(QueuedJob::DropTool { .. })));
        assert!(fx.gate.search().is_empty());
    }

    #[test]
    fn retry_after_drops_stays_within_the_limit() {
        let mut fx = Fixture::new(Mode::Nightmare);
        fx.drop_pickaxe();
        for def in [fx.defs.axe, fx.defs.hammer, fx.defs.broom] {
            fx.agent.inventory.push(Item::new(def, Some(fx.defs.steel)));
        }
        let action = fx.menu(1).first().unwrap().action.clone().unwrap();
        fx.execute(&action).unwrap_err();

        let limit = CarryEnforcer::effective_limit(&fx.settings);
        while let Some(entry) = fx.board.start_next(fx.agent.id).copied() {
            if let QueuedJob::DropTool { item } = entry.job {
                fx.agent.take_item(item).unwrap();
            }
            fx.board.complete_current(fx.agent.id);
        }
        let outcome = fx.execute(&action).unwrap();
        assert_eq!(outcome.acquisitions, action.missing.len());

        while let Some(entry) = fx.board.start_next(fx.agent.id).copied() {
            if let QueuedJob::FetchAndEquip { item, .. } = entry.job {
                let ground = fx.map.take_item(item).unwrap();
                fx.agent.equip(ground.item);
            }
            fx.board.complete_current(fx.agent.id);
            assert!(carried_tools(&fx.catalog, &fx.agent).len() <= limit);
        }
        assert_eq!(carried_tools(&fx.catalog, &fx.agent).len(), limit);
    }

    #[test]
    fn missing_second_tool_aborts_before_any_fetch() {
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
        fx.drop_pickaxe();
        let hammer = fx
            .map
            .place_item(
                Item::new(fx.defs.hammer, Some(fx.defs.steel)),
                CellPos::new(3, 3),
            )
            .unwrap();
        let action = fx.menu(1).first().unwrap().action.clone().unwrap();
        assert_eq!(
            action.missing,
            vec![fx.defs.digging_speed, fx.defs.construction_speed]
        );
        fx.map.take_item(hammer).unwrap();

        let err = fx.execute(&action).unwrap_err();
        assert!(matches!(
            err,
            RescueError::NoCandidateTool { stat } if stat == fx.defs.construction_speed
        ));
        assert!(fx.board.is_idle(fx.agent.id));
        assert!(fx.gate.search().is_empty());
    }

    #[test]
    fn mismatched_agent_is_rejected() {
        let mut fx = Fixture::new(Mode::Hardcore);
        fx.drop_pickaxe();
        let mut action = fx.menu(1).first().unwrap().action.clone().unwrap();
        action.agent = AgentId::new();
        assert!(matches!(
            fx.execute(&action),
            Err(RescueError::AgentMismatch { .. })
        ));
    }

    #[test]
    fn dominant_reason_prefers_count_then_rank() {
        let mut tally = FeedbackTally::default();
        tally.record(FeedbackReason::AlreadySatisfied, Vec::new());
        tally.record(FeedbackReason::AlreadySatisfied, Vec::new());
        tally.record(FeedbackReason::NoToolReachable, Vec::new());
        assert_eq!(
            tally.dominant().map(|d| d.0),
            Some(FeedbackReason::AlreadySatisfied)
        );

        let mut tally = FeedbackTally::default();
        tally.record(FeedbackReason::AlreadySatisfied, Vec::new());
        tally.record(FeedbackReason::WorkTypeDisabled, Vec::new());
        tally.record(FeedbackReason::NoToolReachable, Vec::new());
        assert_eq!(
            tally.dominant().map(|d| d.0),
            Some(FeedbackReason::NoToolReachable)
        );
    }
}
