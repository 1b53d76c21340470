//! Interactive rescue: turn a blocked context-menu entry into "fetch the
//! tool, then do the job".
//!
//! - [`scanners`] -- [`Scanner`] trait, click context, and the built-in
//!   per-category scanners
//! - [`builder`] -- [`RescueOptionBuilder`]: runs scanners through the
//!   gate, keeps the single best option, and executes it when picked

pub mod builder;
pub mod scanners;

pub use builder::{
    FeedbackReason, MenuOption, MenuOptionSummary, RescueAction, RescueOptionBuilder,
    RescueOutcome,
};
pub use scanners::{CategoryScanner, ScanCandidate, ScanContext, Scanner, TargetDescription};
