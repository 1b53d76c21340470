//! Tool gating decision engine.
//!
//! Decides whether a simulated agent may start a unit of work given the
//! tools it carries, and tries to fix things when it may not: queue a
//! fetch for a better tool, drop excess tools, or offer the player a
//! one-click "fetch the tool, then do it" menu entry.
//!
//! # Modules
//!
//! - [`config`] -- `toolgate-config.yaml` loading and the immutable
//!   [`GateSettings`] snapshot every entry point reads.
//! - [`error`] -- Error types for the engine.
//! - [`view`] -- [`WorldView`], the read-only bundle of settings, catalog
//!   and map passed into every decision.
//! - [`scoring`] -- Per-item tool scores, quirks, virtual substitutes.
//! - [`compat`] -- Pluggable compatibility modules and their registry.
//! - [`resolver`] -- Which stats a unit of work depends on (memoized).
//! - [`search`] -- Find a better tool on the map and queue its pickup.
//! - [`carry`] -- Carry limit enforcement for the strictest mode.
//! - [`gate`] -- The [`JobGate`] decision pipeline.
//! - [`rescue`] -- Context-menu rescue options and their execution.
//!
//! [`GateSettings`]: config::GateSettings
//! [`WorldView`]: view::WorldView
//! [`JobGate`]: gate::JobGate

pub mod carry;
pub mod compat;
pub mod config;
pub mod error;
pub mod gate;
pub mod rescue;
pub mod resolver;
pub mod scoring;
pub mod search;
pub mod view;

pub use carry::{CarryEnforcer, carried_tools};
pub use compat::{CompatibilityModule, CompatibilityRegistry, ModuleReport, StatBindingModule};
pub use config::{CarryLimitConfig, ConfigError, GateConfig, GateSettings, IntegrationConfig};
pub use error::{GateError, ModuleError, RescueError};
pub use gate::{AllowReason, Assessment, BlockReason, GateDecision, GateStats, JobGate};
pub use rescue::{
    CategoryScanner, FeedbackReason, MenuOption, MenuOptionSummary, RescueAction,
    RescueOptionBuilder, RescueOutcome, ScanCandidate, ScanContext, Scanner,
};
pub use resolver::StatRequirementResolver;
pub use scoring::{EPSILON, Quirk, QuirkEffect, ScoredTool, TagQuirk, ToolScorer, ToolSource};
pub use search::{AcquisitionRequest, AssignmentSearch, UpgradeCandidate};
pub use view::WorldView;
