//! Seeded demo colony for the host binary.
//!
//! The layout is fixed: a rock face marked for mining, a stand of trees
//! marked for felling, a growing zone with ripe and empty plots, a
//! blueprint, a research bench and some filth. Tools and colonists are
//! scattered by a seeded RNG so a given seed always produces the same
//! colony. Each colonist receives one standing work order.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use toolgate_types::{
    Agent, AgentId, CellPos, Designation, Item, QualityCategory, ThingDefId, ThingKind,
    WorkCategory, WorkId, ZoneKind,
};
use toolgate_world::{GridMap, StartingDefs};
use tracing::{debug, info};

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Demo colony parameters, read from the `demo` section of
/// `toolgate-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DemoConfig {
    /// RNG seed for tool and colonist placement.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of colonists to spawn.
    #[serde(default = "default_colonists")]
    pub colonists: usize,

    /// Side length of the square map.
    #[serde(default = "default_map_size")]
    pub map_size: i32,

    /// Number of tools scattered on the ground.
    #[serde(default = "default_scattered_tools")]
    pub scattered_tools: u32,

    /// Ticks to simulate.
    #[serde(default = "default_ticks")]
    pub ticks: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            colonists: default_colonists(),
            map_size: default_map_size(),
            scattered_tools: default_scattered_tools(),
            ticks: default_ticks(),
        }
    }
}

const fn default_seed() -> u64 {
    7
}

const fn default_colonists() -> usize {
    6
}

const fn default_map_size() -> i32 {
    32
}

const fn default_scattered_tools() -> u32 {
    10
}

const fn default_ticks() -> u64 {
    40
}

/// The fixed features need a 16 × 16 area.
const MIN_MAP_SIZE: i32 = 16;

const NAME_POOL: &[&str] = &[
    "Alder", "Birch", "Cedar", "Dusk", "Ember", "Fern", "Grove", "Haze", "Iris", "Juniper",
    "Kestrel", "Lark", "Moss", "Nettle", "Oak", "Pine",
];

const QUALITIES: &[QualityCategory] = &[
    QualityCategory::Poor,
    QualityCategory::Normal,
    QualityCategory::Normal,
    QualityCategory::Good,
    QualityCategory::Excellent,
];

// -----------------------------------------------------------------------
// Colony
// -----------------------------------------------------------------------

/// A colonist's standing order: the work to request and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkOrder {
    /// Work to request through the gate.
    pub work: WorkId,
    /// Target cell.
    pub target: CellPos,
}

/// Generated map, colonists and their orders.
#[derive(Debug)]
pub struct Colony {
    /// The map, owning every ground item.
    pub map: GridMap,
    /// Colonists in spawn order.
    pub agents: Vec<Agent>,
    /// One standing order per colonist.
    pub orders: BTreeMap<AgentId, WorkOrder>,
    /// Cell the demo right-click targets.
    pub click: CellPos,
}

/// Fixed feature cells.
#[derive(Debug, Clone, Copy)]
struct Landmarks {
    rock: CellPos,
    tree: CellPos,
    empty_plot: CellPos,
    ripe_plot: CellPos,
    blueprint: CellPos,
    bench: CellPos,
    filth: CellPos,
}

/// Generate the demo colony.
///
/// # Errors
///
/// Returns [`EngineError::Colony`] if the map is too small or more
/// colonists are requested than there are names, and
/// [`EngineError::World`] if a feature cannot be placed.
pub fn build_colony(config: &DemoConfig, defs: &StartingDefs) -> Result<Colony, EngineError> {
    if config.map_size < MIN_MAP_SIZE {
        return Err(EngineError::Colony {
            message: format!("map_size must be at least {MIN_MAP_SIZE}, got {}", config.map_size),
        });
    }
    if config.colonists > NAME_POOL.len() {
        return Err(EngineError::Colony {
            message: format!(
                "at most {} colonists are supported, got {}",
                NAME_POOL.len(),
                config.colonists
            ),
        });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut map = GridMap::new(config.map_size, config.map_size);
    let landmarks = lay_out_features(&mut map)?;
    scatter_tools(&mut rng, &mut map, defs, config)?;

    let orders_cycle = standing_orders(defs, &landmarks);
    let mut agents = Vec::with_capacity(config.colonists);
    let mut orders = BTreeMap::new();
    let names = NAME_POOL.choose_multiple(&mut rng, config.colonists);
    for (name, order) in names.zip(orders_cycle.iter().cycle()) {
        let position = random_cell(&mut rng, config.map_size);
        let mut agent = Agent::colonist(name, position);
        let starter = rng
            .random_bool(0.3)
            .then(|| TOOL_KINDS.choose(&mut rng))
            .flatten();
        if let Some(pick) = starter {
            agent.equip(Item::new(pick(defs), Some(defs.steel)));
        }
        if rng.random_bool(0.15) {
            agent.disabled_work.insert(WorkCategory::Cleaning);
        }
        debug!(agent = %agent.id, name, work = %order.work, "colonist spawned");
        orders.insert(agent.id, *order);
        agents.push(agent);
    }

    info!(
        colonists = agents.len(),
        ground_items = map.item_count(),
        seed = config.seed,
        "demo colony generated"
    );

    Ok(Colony {
        map,
        agents,
        orders,
        click: landmarks.rock,
    })
}

fn lay_out_features(map: &mut GridMap) -> Result<Landmarks, EngineError> {
    for x in 1..5 {
        for z in 1..5 {
            let cell = CellPos::new(x, z);
            map.add_thing(cell, ThingKind::Rock)?;
            map.designate(cell, Designation::Mine)?;
        }
    }
    for x in 8..12 {
        for z in 1..3 {
            let cell = CellPos::new(x, z);
            map.add_thing(cell, ThingKind::Tree)?;
            map.designate(cell, Designation::CutPlant)?;
        }
    }
    for x in 1..5 {
        for z in 8..12 {
            map.set_zone(CellPos::new(x, z), ZoneKind::Growing)?;
        }
    }
    for x in 1..5 {
        map.add_thing(CellPos::new(x, 8), ThingKind::Plant { harvestable: true })?;
    }

    let landmarks = Landmarks {
        rock: CellPos::new(2, 2),
        tree: CellPos::new(9, 1),
        empty_plot: CellPos::new(2, 10),
        ripe_plot: CellPos::new(2, 8),
        blueprint: CellPos::new(12, 8),
        bench: CellPos::new(8, 12),
        filth: CellPos::new(10, 10),
    };
    map.add_thing(landmarks.blueprint, ThingKind::Blueprint)?;
    map.add_thing(landmarks.bench, ThingKind::ResearchBench)?;
    map.add_thing(landmarks.filth, ThingKind::Filth)?;
    Ok(landmarks)
}

type ToolPick = fn(&StartingDefs) -> ThingDefId;

const TOOL_KINDS: &[ToolPick] = &[
    |d| d.pickaxe,
    |d| d.axe,
    |d| d.sickle,
    |d| d.hoe,
    |d| d.hammer,
    |d| d.chisel,
    |d| d.broom,
    |d| d.research_kit,
];

fn scatter_tools(
    rng: &mut StdRng,
    map: &mut GridMap,
    defs: &StartingDefs,
    config: &DemoConfig,
) -> Result<(), EngineError> {
    let materials = [defs.steel, defs.plasteel, defs.wood];
    for _ in 0..config.scattered_tools {
        let (Some(pick), Some(&material), Some(&quality)) = (
            TOOL_KINDS.choose(rng),
            materials.choose(rng),
            QUALITIES.choose(rng),
        ) else {
            continue;
        };
        let item = Item::new(pick(defs), Some(material)).with_quality(quality);
        let position = random_cell(rng, config.map_size);
        map.place_item(item, position)?;
    }
    Ok(())
}

fn standing_orders(defs: &StartingDefs, at: &Landmarks) -> [WorkOrder; 7] {
    let order = |giver, target| WorkOrder {
        work: WorkId::Giver(giver),
        target,
    };
    [
        order(defs.mine, at.rock),
        order(defs.fell_trees, at.tree),
        order(defs.sow, at.empty_plot),
        order(defs.harvest, at.ripe_plot),
        order(defs.construct, at.blueprint),
        order(defs.research, at.bench),
        order(defs.clean, at.filth),
    ]
}

fn random_cell(rng: &mut StdRng, size: i32) -> CellPos {
    CellPos::new(rng.random_range(0..size), rng.random_range(0..size))
}
