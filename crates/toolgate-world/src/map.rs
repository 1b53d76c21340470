//! Spatial index: ground items, reachability, and per-cell annotations.
//!
//! The gating engine only needs three questions answered about the map:
//! which items lie near a point, what it costs to walk somewhere, and what
//! the player has marked on a clicked cell. [`SpatialIndex`] captures
//! exactly those. [`GridMap`] is the in-memory implementation used by the
//! engine binary and by tests.
//!
//! Reachability in [`GridMap`] is region based: cells carry a region label
//! (default `0`) and two cells are connected iff they share a label. Path
//! cost is the Manhattan distance times a flat move cost. Real pathfinding
//! belongs to the host.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use toolgate_types::{CellPos, Designation, Item, ItemId, ThingKind, ZoneKind};

use crate::error::WorldError;

/// An item lying on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundItem {
    /// The item itself.
    pub item: Item,
    /// Where it lies.
    pub position: CellPos,
}

/// Everything a click on a cell can reveal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellInfo {
    /// Player designations on the cell.
    pub designations: BTreeSet<Designation>,
    /// Zone covering the cell, if any.
    pub zone: Option<ZoneKind>,
    /// Things occupying the cell, topmost first.
    pub things: Vec<ThingKind>,
}

impl CellInfo {
    /// Whether `designation` is present.
    pub fn has(&self, designation: Designation) -> bool {
        self.designations.contains(&designation)
    }

    /// Whether any thing on the cell matches `pred`.
    pub fn any_thing(&self, pred: impl Fn(ThingKind) -> bool) -> bool {
        self.things.iter().copied().any(pred)
    }
}

/// Read-only spatial queries the gating engine relies on.
pub trait SpatialIndex {
    /// Ground items within `radius` cells of `center`, nearest first.
    fn items_within(&self, center: CellPos, radius: u32) -> Vec<&GroundItem>;

    /// Cost of walking from `from` to `to`, or `None` if unreachable.
    fn path_cost(&self, from: CellPos, to: CellPos) -> Option<u32>;

    /// Designations, zone, and things on `cell`.
    fn cell_info(&self, cell: CellPos) -> CellInfo;
}

/// Rectangular grid map with region-based reachability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridMap {
    width: i32,
    height: i32,
    move_cost: u32,
    regions: BTreeMap<CellPos, u32>,
    items: Vec<GroundItem>,
    cells: BTreeMap<CellPos, CellInfo>,
}

impl GridMap {
    /// Default cost of moving one cell.
    pub const DEFAULT_MOVE_COST: u32 = 1;

    /// Create an empty map of `width` × `height` cells, all in region 0.
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            move_cost: Self::DEFAULT_MOVE_COST,
            regions: BTreeMap::new(),
            items: Vec::new(),
            cells: BTreeMap::new(),
        }
    }

    /// Set the flat per-cell move cost, builder-style.
    #[must_use]
    pub const fn with_move_cost(mut self, move_cost: u32) -> Self {
        self.move_cost = move_cost;
        self
    }

    /// Whether `cell` lies inside the map.
    pub const fn in_bounds(&self, cell: CellPos) -> bool {
        cell.x >= 0 && cell.z >= 0 && cell.x < self.width && cell.z < self.height
    }

    fn check_bounds(&self, cell: CellPos) -> Result<(), WorldError> {
        if self.in_bounds(cell) {
            Ok(())
        } else {
            Err(WorldError::OutOfBounds(cell))
        }
    }

    // -------------------------------------------------------------------
    // Regions
    // -------------------------------------------------------------------

    /// Region label of `cell`.
    pub fn region_of(&self, cell: CellPos) -> u32 {
        self.regions.get(&cell).copied().unwrap_or(0)
    }

    /// Assign every cell of the inclusive rectangle `min..=max` to `region`.
    pub fn fill_region(&mut self, min: CellPos, max: CellPos, region: u32) -> Result<(), WorldError> {
        self.check_bounds(min)?;
        self.check_bounds(max)?;
        for x in min.x..=max.x {
            for z in min.z..=max.z {
                self.regions.insert(CellPos::new(x, z), region);
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------

    /// Place an item on the ground.
    pub fn place_item(&mut self, item: Item, position: CellPos) -> Result<ItemId, WorldError> {
        self.check_bounds(position)?;
        if self.items.iter().any(|g| g.item.id == item.id) {
            return Err(WorldError::DuplicateItem(item.id));
        }
        let id = item.id;
        self.items.push(GroundItem { item, position });
        Ok(id)
    }

    /// Look up a ground item.
    pub fn item(&self, id: ItemId) -> Option<&GroundItem> {
        self.items.iter().find(|g| g.item.id == id)
    }

    /// Remove a ground item (an agent picked it up).
    pub fn take_item(&mut self, id: ItemId) -> Result<GroundItem, WorldError> {
        let index = self
            .items
            .iter()
            .position(|g| g.item.id == id)
            .ok_or(WorldError::ItemNotFound(id))?;
        Ok(self.items.remove(index))
    }

    /// Number of items on the ground.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    // -------------------------------------------------------------------
    // Cell annotations
    // -------------------------------------------------------------------

    /// Add a designation to a cell.
    pub fn designate(&mut self, cell: CellPos, designation: Designation) -> Result<(), WorldError> {
        self.check_bounds(cell)?;
        self.cells.entry(cell).or_default().designations.insert(designation);
        Ok(())
    }

    /// Remove a designation from a cell.
    pub fn clear_designation(&mut self, cell: CellPos, designation: Designation) {
        if let Some(info) = self.cells.get_mut(&cell) {
            info.designations.remove(&designation);
        }
    }

    /// Set the zone covering a cell.
    pub fn set_zone(&mut self, cell: CellPos, zone: ZoneKind) -> Result<(), WorldError> {
        self.check_bounds(cell)?;
        self.cells.entry(cell).or_default().zone = Some(zone);
        Ok(())
    }

    /// Put a thing on a cell (on top of whatever is there).
    pub fn add_thing(&mut self, cell: CellPos, thing: ThingKind) -> Result<(), WorldError> {
        self.check_bounds(cell)?;
        self.cells.entry(cell).or_default().things.insert(0, thing);
        Ok(())
    }
}

impl SpatialIndex for GridMap {
    fn items_within(&self, center: CellPos, radius: u32) -> Vec<&GroundItem> {
        let radius_sq = u64::from(radius).saturating_mul(u64::from(radius));
        let mut found: Vec<(u64, &GroundItem)> = self
            .items
            .iter()
            .map(|g| (g.position.distance_sq(center), g))
            .filter(|(d, _)| *d <= radius_sq)
            .collect();
        // Stable: equal distances keep placement order.
        found.sort_by_key(|(d, _)| *d);
        found.into_iter().map(|(_, g)| g).collect()
    }

    fn path_cost(&self, from: CellPos, to: CellPos) -> Option<u32> {
        if !self.in_bounds(from) || !self.in_bounds(to) {
            return None;
        }
        if self.region_of(from) != self.region_of(to) {
            return None;
        }
        Some(from.manhattan(to).saturating_mul(self.move_cost))
    }

    fn cell_info(&self, cell: CellPos) -> CellInfo {
        self.cells.get(&cell).cloned().unwrap_or_default()
    }
}
