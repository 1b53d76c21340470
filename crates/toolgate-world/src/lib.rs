//! Collaborator side of the toolgate engine: definitions, map, job queues,
//! and messaging.
//!
//! Everything the decision core reads or writes outside its own state lives
//! here, behind small traits so a host can plug in its own implementations.
//!
//! # Modules
//!
//! - [`catalog`] -- Name-interned stat, material, thing, job and work giver
//!   definitions with stable `u32` handles and a reload version.
//! - [`error`] -- Error types for catalog and map operations.
//! - [`jobs`] -- [`JobQueue`] commands and the in-memory [`JobBoard`].
//! - [`map`] -- [`SpatialIndex`] queries and the in-memory [`GridMap`].
//! - [`messages`] -- Localization keys and the [`Messenger`] sink.
//! - [`starting_world`] -- Default definitions shared by the engine binary
//!   and tests.

pub mod catalog;
pub mod error;
pub mod jobs;
pub mod map;
pub mod messages;
pub mod starting_world;

// Re-export primary types at crate root.
pub use catalog::{Catalog, JobDef, MaterialDef, StatDef, ThingDef, WorkGiverDef};
pub use error::WorldError;
pub use jobs::{AgentQueue, JobBoard, JobEntry, JobQueue, QueuedJob};
pub use map::{CellInfo, GridMap, GroundItem, SpatialIndex};
pub use messages::{Message, MessageKey, MessageLog, Messenger, render};
pub use starting_world::{RESEARCH_BENCH_MODULE, StartingDefs, create_starting_catalog};
