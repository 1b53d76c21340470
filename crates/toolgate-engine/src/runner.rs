//! Tick loop driving colonists through the gate.
//!
//! Each tick has two phases. In the decision phase every idle colonist
//! asks the gate about its standing order; an allowed or deferred
//! decision appends the work at the tail, behind any fetch or drop the
//! gate queued at the front. In the action phase every colonist runs one
//! job from its queue to completion.

use serde::Serialize;
use toolgate_core::{GateSettings, JobGate, WorldView};
use toolgate_types::Agent;
use toolgate_world::{Catalog, GridMap, JobBoard, JobEntry, JobQueue, MessageLog, QueuedJob};
use tracing::{debug, info, warn};

use crate::colony::Colony;

/// Counters for one run of the tick loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Ticks simulated.
    pub ticks: u64,
    /// Gate evaluations requested.
    pub requests: u64,
    /// Requests the gate blocked.
    pub blocked: u64,
    /// Work jobs completed.
    pub work_done: u64,
    /// Tools picked up and equipped.
    pub fetched: u64,
    /// Tools dropped.
    pub dropped: u64,
    /// Fetches whose item had already gone.
    pub lost_fetches: u64,
}

/// Simulate `ticks` ticks of `colony`.
pub fn run(
    ticks: u64,
    settings: &GateSettings,
    catalog: &Catalog,
    colony: &mut Colony,
    gate: &mut JobGate,
    board: &mut JobBoard,
    log: &mut MessageLog,
) -> RunSummary {
    let mut summary = RunSummary::default();
    for tick in 0..ticks {
        request_work(tick, settings, catalog, colony, gate, board, log, &mut summary);
        for agent in &mut colony.agents {
            let Some(entry) = board.start_next(agent.id).copied() else {
                continue;
            };
            perform(entry, agent, &mut colony.map, &mut summary);
            board.complete_current(agent.id);
        }
        summary.ticks = summary.ticks.saturating_add(1);
    }
    info!(
        ticks = summary.ticks,
        requests = summary.requests,
        blocked = summary.blocked,
        work_done = summary.work_done,
        fetched = summary.fetched,
        dropped = summary.dropped,
        "run complete"
    );
    summary
}

#[allow(clippy::too_many_arguments)]
fn request_work(
    tick: u64,
    settings: &GateSettings,
    catalog: &Catalog,
    colony: &Colony,
    gate: &mut JobGate,
    board: &mut JobBoard,
    log: &mut MessageLog,
    summary: &mut RunSummary,
) {
    let view = WorldView::new(settings, catalog, &colony.map, tick);
    for agent in &colony.agents {
        if !board.is_idle(agent.id) {
            continue;
        }
        let Some(order) = colony.orders.get(&agent.id) else {
            continue;
        };
        summary.requests = summary.requests.saturating_add(1);
        if gate.evaluate(&view, board, log, agent, order.work).is_allowed() {
            board.enqueue_tail(
                agent.id,
                QueuedJob::Work {
                    work: order.work,
                    target: order.target,
                },
            );
        } else {
            summary.blocked = summary.blocked.saturating_add(1);
        }
    }
}

fn perform(entry: JobEntry, agent: &mut Agent, map: &mut GridMap, summary: &mut RunSummary) {
    match entry.job {
        QueuedJob::FetchAndEquip { item, stat } => match map.take_item(item) {
            Ok(ground) => {
                agent.position = ground.position;
                agent.equip(ground.item);
                summary.fetched = summary.fetched.saturating_add(1);
                debug!(agent = %agent.id, %item, %stat, "tool equipped");
            }
            Err(err) => {
                summary.lost_fetches = summary.lost_fetches.saturating_add(1);
                warn!(agent = %agent.id, %item, error = %err, "fetch target gone");
            }
        },
        QueuedJob::DropTool { item } => {
            let Some(tool) = agent.take_item(item) else {
                return;
            };
            match map.place_item(tool, agent.position) {
                Ok(_) => {
                    summary.dropped = summary.dropped.saturating_add(1);
                    debug!(agent = %agent.id, %item, "tool dropped");
                }
                Err(err) => warn!(agent = %agent.id, %item, error = %err, "drop failed"),
            }
        }
        QueuedJob::Work { work, target } => {
            agent.position = target;
            summary.work_done = summary.work_done.saturating_add(1);
            debug!(agent = %agent.id, %work, "work done");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use toolgate_core::{CompatibilityRegistry, GateConfig, ToolScorer};
    use toolgate_types::{CellPos, Item, Mode, WorkId};
    use toolgate_world::{MessageKey, StartingDefs, create_starting_catalog};

    use super::*;
    use crate::colony::WorkOrder;

    struct Harness {
        catalog: Catalog,
        defs: StartingDefs,
        settings: GateSettings,
        colony: Colony,
        gate: JobGate,
        board: JobBoard,
        log: MessageLog,
    }

    impl Harness {
        /// One miner at (1, 1) with no tools.
        fn miner(mode: Mode) -> Self {
            let (catalog, defs) = create_starting_catalog().unwrap();
            let config = GateConfig {
                mode,
                ..GateConfig::default()
            };
            let agent = Agent::colonist("Alder", CellPos::new(1, 1));
            let mut orders = BTreeMap::new();
            orders.insert(
                agent.id,
                WorkOrder {
                    work: WorkId::Giver(defs.mine),
                    target: CellPos::new(2, 2),
                },
            );
            Self {
                catalog,
                defs,
                settings: config.snapshot(0),
                colony: Colony {
                    map: GridMap::new(16, 16),
                    agents: vec![agent],
                    orders,
                    click: CellPos::new(2, 2),
                },
                gate: JobGate::new(ToolScorer::new(), CompatibilityRegistry::new()),
                board: JobBoard::new(),
                log: MessageLog::new(),
            }
        }

        fn run(&mut self, ticks: u64) -> RunSummary {
            run(
                ticks,
                &self.settings,
                &self.catalog,
                &mut self.colony,
                &mut self.gate,
                &mut self.board,
                &mut self.log,
            )
        }
    }

    #[test]
    fn miner_fetches_then_works() {
        let mut h = Harness::miner(Mode::Hardcore);
        let pickaxe = Item::new(h.defs.pickaxe, Some(h.defs.steel));
        h.colony.map.place_item(pickaxe, CellPos::new(3, 3)).unwrap();

        let summary = h.run(3);
        assert_eq!(summary.fetched, 1);
        assert_eq!(summary.work_done, 2);
        assert_eq!(summary.blocked, 0);
        assert_eq!(h.colony.map.item_count(), 0);
        assert!(h.colony.agents.first().unwrap().equipped.is_some());
    }

    #[test]
    fn miner_without_tools_stays_blocked() {
        let mut h = Harness::miner(Mode::Hardcore);
        let summary = h.run(5);
        assert_eq!(summary.requests, 5);
        assert_eq!(summary.blocked, 5);
        assert_eq!(summary.work_done, 0);
        // One message, then the cooldown holds.
        assert_eq!(h.log.count(MessageKey::MissingTool), 1);
    }

    #[test]
    fn normal_mode_just_works() {
        let mut h = Harness::miner(Mode::Normal);
        let summary = h.run(4);
        assert_eq!(summary.work_done, 4);
        assert_eq!(summary.fetched, 0);
    }

    #[test]
    fn overloaded_miner_drops_before_working() {
        let mut h = Harness::miner(Mode::Nightmare);
        let d = &h.defs;
        let tools: Vec<Item> = [d.axe, d.hammer, d.broom, d.chisel]
            .into_iter()
            .map(|def| Item::new(def, Some(d.steel)))
            .collect();
        let pickaxe = Item::new(d.pickaxe, Some(d.steel));
        h.colony.agents.first_mut().unwrap().inventory.extend(tools);
        h.colony.map.place_item(pickaxe, CellPos::new(4, 4)).unwrap();

        // Blocked once; two drops, then the fetch, run before the work resumes.
        let summary = h.run(6);
        assert_eq!(summary.blocked, 1);
        assert_eq!(summary.fetched, 1);
        assert_eq!(summary.dropped, 2);
        assert_eq!(summary.work_done, 3);
        assert_eq!(h.colony.map.item_count(), 2);
        assert_eq!(h.log.count(MessageKey::DropToolsFirst), 1);
    }
}
