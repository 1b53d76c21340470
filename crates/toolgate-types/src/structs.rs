//! Core entity structs: map positions, items, agents, and work identifiers.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::enums::{AgentKind, QualityCategory, WorkCategory};
use crate::ids::{AgentId, ItemId, JobDefId, MaterialId, ThingDefId, WorkGiverId};

// ---------------------------------------------------------------------------
// CellPos
// ---------------------------------------------------------------------------

/// Integer cell coordinates on the map grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct CellPos {
    /// Column.
    pub x: i32,
    /// Row.
    pub z: i32,
}

impl CellPos {
    /// Create a position from its coordinates.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Manhattan (taxicab) distance to `other`.
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.z.abs_diff(other.z))
    }

    /// Squared Euclidean distance to `other`, saturating on overflow.
    pub fn distance_sq(self, other: Self) -> u64 {
        let dx = u64::from(self.x.abs_diff(other.x));
        let dz = u64::from(self.z.abs_diff(other.z));
        dx.saturating_mul(dx).saturating_add(dz.saturating_mul(dz))
    }
}

impl core::fmt::Display for CellPos {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// A physical item: a tool, a material stack, or anything else an agent
/// can pick up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique instance identifier.
    pub id: ItemId,
    /// Definition this item was made from.
    pub def: ThingDefId,
    /// Material the item is made of, if the def is made from stuff.
    pub material: Option<MaterialId>,
    /// Crafting quality.
    pub quality: QualityCategory,
    /// Current hit points.
    pub hit_points: u32,
    /// Maximum hit points.
    pub max_hit_points: u32,
    /// Number of units in the stack (1 for tools).
    pub stack_count: u32,
    /// Whether the player has forbidden agents from touching it.
    pub forbidden: bool,
}

impl Item {
    /// Create a fresh, undamaged, normal-quality single item.
    pub fn new(def: ThingDefId, material: Option<MaterialId>) -> Self {
        Self {
            id: ItemId::new(),
            def,
            material,
            quality: QualityCategory::Normal,
            hit_points: 100,
            max_hit_points: 100,
            stack_count: 1,
            forbidden: false,
        }
    }

    /// Set the quality, builder-style.
    #[must_use]
    pub const fn with_quality(mut self, quality: QualityCategory) -> Self {
        self.quality = quality;
        self
    }

    /// Set current hit points, builder-style. Clamped to the maximum.
    #[must_use]
    pub fn with_hit_points(mut self, hit_points: u32) -> Self {
        self.hit_points = hit_points.min(self.max_hit_points);
        self
    }

    /// Set the stack count, builder-style.
    #[must_use]
    pub const fn with_stack(mut self, count: u32) -> Self {
        self.stack_count = count;
        self
    }

    /// Fraction of hit points remaining, in `0.0..=1.0`.
    pub fn condition(&self) -> f32 {
        if self.max_hit_points == 0 {
            return 1.0;
        }
        (self.hit_points as f32 / self.max_hit_points as f32).clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// An autonomous agent whose job starts are gated.
///
/// Inventory and queue state are private to the agent; nothing here is
/// shared between agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Broad kind.
    pub kind: AgentKind,
    /// Whether the player controls this agent.
    pub player_controlled: bool,
    /// Whether the agent is alive.
    pub alive: bool,
    /// Whether the agent is downed (incapacitated).
    pub downed: bool,
    /// Whether the agent is held prisoner.
    pub imprisoned: bool,
    /// Current map cell.
    pub position: CellPos,
    /// The primary tool currently held, if any.
    pub equipped: Option<Item>,
    /// Carried items in pickup order.
    pub inventory: Vec<Item>,
    /// Work categories the agent is incapable of or has switched off.
    pub disabled_work: BTreeSet<WorkCategory>,
}

impl Agent {
    /// Create a healthy, player-controlled humanlike agent at `position`.
    pub fn colonist(name: &str, position: CellPos) -> Self {
        Self {
            id: AgentId::new(),
            name: String::from(name),
            kind: AgentKind::Humanlike,
            player_controlled: true,
            alive: true,
            downed: false,
            imprisoned: false,
            position,
            equipped: None,
            inventory: Vec::new(),
            disabled_work: BTreeSet::new(),
        }
    }

    /// Whether this agent is subject to tool gating at all.
    ///
    /// Animals, mechanoids, non-player agents, and dead, downed or
    /// imprisoned agents are never gated.
    pub const fn is_gating_eligible(&self) -> bool {
        matches!(self.kind, AgentKind::Humanlike)
            && self.player_controlled
            && self.alive
            && !self.downed
            && !self.imprisoned
    }

    /// Iterate over every carried item: the equipped tool first, then the
    /// inventory in order.
    pub fn carried_items(&self) -> impl Iterator<Item = &Item> {
        self.equipped.iter().chain(self.inventory.iter())
    }

    /// Whether the agent carries the item with `id`.
    pub fn carries(&self, id: ItemId) -> bool {
        self.carried_items().any(|item| item.id == id)
    }

    /// Whether the agent can do work in `category`.
    pub fn can_do(&self, category: WorkCategory) -> bool {
        !self.disabled_work.contains(&category)
    }

    /// Remove a carried item, returning it. Checks the equipped slot first.
    pub fn take_item(&mut self, id: ItemId) -> Option<Item> {
        if self.equipped.as_ref().is_some_and(|item| item.id == id) {
            return self.equipped.take();
        }
        let index = self.inventory.iter().position(|item| item.id == id)?;
        Some(self.inventory.remove(index))
    }

    /// Equip `item`, moving any previously equipped tool into the inventory.
    pub fn equip(&mut self, item: Item) {
        if let Some(previous) = self.equipped.replace(item) {
            self.inventory.push(previous);
        }
    }
}

// ---------------------------------------------------------------------------
// WorkId
// ---------------------------------------------------------------------------

/// Identifier of a unit of work: either a work giver or a job definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkId {
    /// A work-giver-level identifier (preferred binding).
    Giver(WorkGiverId),
    /// A job-level identifier.
    Job(JobDefId),
}

impl core::fmt::Display for WorkId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Giver(id) => write!(f, "{id}"),
            Self::Job(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance() {
        let a = CellPos::new(0, 0);
        let b = CellPos::new(3, -4);
        assert_eq!(a.manhattan(b), 7);
        assert_eq!(a.distance_sq(b), 25);
    }

    #[test]
    fn colonist_is_eligible() {
        let mut agent = Agent::colonist("Alder", CellPos::default());
        assert!(agent.is_gating_eligible());
        agent.downed = true;
        assert!(!agent.is_gating_eligible());
        agent.downed = false;
        agent.kind = AgentKind::Animal;
        assert!(!agent.is_gating_eligible());
    }

    #[test]
    fn equip_moves_previous_into_inventory() {
        let mut agent = Agent::colonist("Birch", CellPos::default());
        let first = Item::new(ThingDefId(0), None);
        let second = Item::new(ThingDefId(1), None);
        let first_id = first.id;
        agent.equip(first);
        agent.equip(second);
        assert_eq!(agent.inventory.len(), 1);
        assert!(agent.carries(first_id));
        assert_eq!(agent.carried_items().count(), 2);
    }

    #[test]
    fn take_item_from_equipped_and_inventory() {
        let mut agent = Agent::colonist("Cedar", CellPos::default());
        let tool = Item::new(ThingDefId(0), None);
        let stack = Item::new(ThingDefId(1), None).with_stack(20);
        let (tool_id, stack_id) = (tool.id, stack.id);
        agent.equip(tool);
        agent.inventory.push(stack);
        assert!(agent.take_item(tool_id).is_some());
        assert!(agent.equipped.is_none());
        assert!(agent.take_item(stack_id).is_some());
        assert!(agent.take_item(stack_id).is_none());
    }

    #[test]
    fn condition_is_clamped() {
        let item = Item::new(ThingDefId(0), None).with_hit_points(50);
        assert!((item.condition() - 0.5).abs() < 1e-6);
        let broken = Item {
            max_hit_points: 0,
            ..Item::new(ThingDefId(0), None)
        };
        assert!((broken.condition() - 1.0).abs() < 1e-6);
    }
}
