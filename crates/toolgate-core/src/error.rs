//! Error types for the `toolgate-core` crate.
//!
//! Inner components return these instead of swallowing failures. Only the
//! outermost entry points (`JobGate::evaluate`, `RescueOptionBuilder::build_menu`,
//! registry dispatch) turn them into safe defaults.

use toolgate_types::{AgentId, MaterialId, StatId, ThingDefId, WorkId};
use toolgate_world::WorldError;

/// Errors raised while evaluating a gate decision.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// A stat handle has no definition.
    #[error("unknown stat: {0}")]
    UnknownStat(StatId),

    /// An item refers to a thing definition that does not exist.
    #[error("unknown thing definition: {0}")]
    UnknownThing(ThingDefId),

    /// An item refers to a material that does not exist.
    #[error("unknown material: {0}")]
    UnknownMaterial(MaterialId),

    /// A score came out as NaN or infinite.
    #[error("non-finite score {score} for {stat}")]
    NonFiniteScore {
        /// The stat being scored.
        stat: StatId,
        /// The offending value.
        score: f32,
    },

    /// A collaborator failed.
    #[error(transparent)]
    World(#[from] WorldError),
}

/// Errors raised by compatibility modules.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// A module with the same name is already registered.
    #[error("compatibility module already registered: {0}")]
    Duplicate(String),

    /// A module names a stat the catalog does not define.
    #[error("module {module} references unknown stat {stat}")]
    UnknownStat {
        /// The module name.
        module: String,
        /// The missing stat name.
        stat: String,
    },

    /// A module's own initialization failed.
    #[error("module {module} failed to initialize: {reason}")]
    InitFailed {
        /// The module name.
        module: String,
        /// Description of the failure.
        reason: String,
    },
}

/// Errors raised while executing a rescue action.
#[derive(Debug, thiserror::Error)]
pub enum RescueError {
    /// No tool for the stat exists within the search budget.
    #[error("no candidate tool for {stat}")]
    NoCandidateTool {
        /// The stat nothing could be found for.
        stat: StatId,
    },

    /// The agent carries too many tools and drops are outstanding.
    #[error("agent carries too many tools: {pending_drops} drops outstanding")]
    CarryNonCompliant {
        /// Drop jobs still queued.
        pending_drops: usize,
    },

    /// The action belongs to a different agent.
    #[error("rescue action for {expected} executed on {actual}")]
    AgentMismatch {
        /// Agent the action was built for.
        expected: AgentId,
        /// Agent it was executed on.
        actual: AgentId,
    },

    /// A scanner described work the catalog does not know.
    #[error("unknown work: {0}")]
    UnknownWork(WorkId),

    /// The gate pipeline failed.
    #[error(transparent)]
    Gate(#[from] GateError),
}
