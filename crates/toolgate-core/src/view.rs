//! Read-only inputs shared by every entry point.

use toolgate_world::{Catalog, SpatialIndex};

use crate::config::GateSettings;

/// Everything an evaluation may read but never write: the settings
/// snapshot, the definition catalog, the map, and the current tick.
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    /// Settings snapshot for this evaluation.
    pub settings: &'a GateSettings,
    /// Definition catalog.
    pub catalog: &'a Catalog,
    /// Spatial queries.
    pub map: &'a dyn SpatialIndex,
    /// Current simulation tick.
    pub tick: u64,
}

impl<'a> WorldView<'a> {
    /// Bundle the read-only inputs.
    pub const fn new(
        settings: &'a GateSettings,
        catalog: &'a Catalog,
        map: &'a dyn SpatialIndex,
        tick: u64,
    ) -> Self {
        Self {
            settings,
            catalog,
            map,
            tick,
        }
    }
}
