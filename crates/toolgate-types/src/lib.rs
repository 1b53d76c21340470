//! Shared type definitions for the toolgate job gating engine.
//!
//! Every crate in the workspace speaks in these types: the collaborator
//! side (`toolgate-world`) stores them, the decision core
//! (`toolgate-core`) reads them.
//!
//! # Modules
//!
//! - [`ids`] -- UUID newtypes for runtime instances, `u32` handles for
//!   catalog definitions
//! - [`enums`] -- Difficulty mode, work categories, quality, designations
//! - [`structs`] -- Agents, items, cell positions, work identifiers

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    AcquisitionSource, AgentKind, Designation, JobPriority, Mode, QualityCategory,
    ScannerCategory, StatGating, ThingKind, WorkCategory, ZoneKind,
};
pub use ids::{AgentId, ItemId, JobDefId, JobId, MaterialId, StatId, ThingDefId, WorkGiverId};
pub use structs::{Agent, CellPos, Item, WorkId};
