//! Enumeration types shared by every toolgate crate.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// Global difficulty tier controlling whether and how strictly jobs are gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Tools only speed work up; the gate never blocks.
    #[default]
    Normal,
    /// Required stats block work when no adequate tool is carried.
    Hardcore,
    /// Required and optional stats block, and the carry limit is enforced.
    Nightmare,
}

impl Mode {
    /// Whether the gate may block jobs in this mode.
    pub const fn gates_jobs(self) -> bool {
        !matches!(self, Self::Normal)
    }

    /// Whether this is the strictest mode (carry limit active).
    pub const fn is_strictest(self) -> bool {
        matches!(self, Self::Nightmare)
    }
}

impl core::fmt::Display for Mode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::Normal => "normal",
            Self::Hardcore => "hardcore",
            Self::Nightmare => "nightmare",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// Broad kind of an agent. Only humanlike agents are subject to gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// A colonist or other humanlike pawn.
    Humanlike,
    /// A tame or wild animal.
    Animal,
    /// A mechanical unit.
    Mechanoid,
}

// ---------------------------------------------------------------------------
// Work
// ---------------------------------------------------------------------------

/// Work-type category of a job or work giver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkCategory {
    /// Digging out rock and ore.
    Mining,
    /// Felling trees and cutting plants.
    PlantCutting,
    /// Harvesting crops.
    Harvesting,
    /// Sowing crops in growing zones.
    Sowing,
    /// Building frames and blueprints.
    Construction,
    /// Tearing down structures.
    Deconstruction,
    /// Smoothing rough stone floors and walls.
    Smoothing,
    /// Repairing damaged buildings.
    Repair,
    /// Cleaning filth.
    Cleaning,
    /// Working at a research bench.
    Research,
    /// Eating and drinking.
    Ingest,
    /// Waiting around.
    Idle,
    /// Carrying things from one place to another.
    Hauling,
    /// Anything else.
    Other,
}

impl WorkCategory {
    /// Categories that never touch a gated stat and are always allowed.
    pub const fn is_structurally_exempt(self) -> bool {
        matches!(self, Self::Ingest | Self::Idle | Self::Hauling)
    }
}

/// How a stat participates in gating by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatGating {
    /// Blocks in Hardcore and Nightmare.
    Required,
    /// Blocks only in Nightmare; a bonus elsewhere.
    #[default]
    Optional,
    /// Never blocks.
    Never,
}

impl StatGating {
    /// Whether a stat with this gating blocks work in `mode`.
    pub const fn blocks_in(self, mode: Mode) -> bool {
        match (self, mode) {
            (Self::Required, Mode::Hardcore | Mode::Nightmare)
            | (Self::Optional, Mode::Nightmare) => true,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Quality tier of a crafted item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityCategory {
    /// Worst quality.
    Awful,
    /// Below average.
    Poor,
    /// Average.
    #[default]
    Normal,
    /// Above average.
    Good,
    /// Well above average.
    Excellent,
    /// Near perfect.
    Masterwork,
    /// Best quality.
    Legendary,
}

impl QualityCategory {
    /// Multiplier applied to a tool's bonus over baseline.
    pub const fn bonus_multiplier(self) -> f32 {
        match self {
            Self::Awful => 0.8,
            Self::Poor => 0.9,
            Self::Normal => 1.0,
            Self::Good => 1.1,
            Self::Excellent => 1.2,
            Self::Masterwork => 1.35,
            Self::Legendary => 1.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// Where a new job lands on an agent's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPriority {
    /// Ahead of every queued non-urgent job.
    Front,
    /// Appended at the tail.
    #[default]
    Normal,
}

/// Who asked for a tool acquisition or a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionSource {
    /// The job gate, while deciding a job start.
    Gate,
    /// The interactive rescue menu.
    Rescue,
    /// Direct host request.
    Manual,
}

// ---------------------------------------------------------------------------
// Map annotations
// ---------------------------------------------------------------------------

/// A player-placed designation on a map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Designation {
    /// Dig out this rock.
    Mine,
    /// Tear down this structure.
    Deconstruct,
    /// Smooth this floor.
    SmoothFloor,
    /// Smooth this wall.
    SmoothWall,
    /// Cut this plant or fell this tree.
    CutPlant,
    /// Harvest this crop.
    HarvestPlant,
}

/// A zone covering a map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    /// A growing zone where crops get sown.
    Growing,
    /// A stockpile zone.
    Stockpile,
}

/// Kind of thing occupying a map cell, as seen from a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThingKind {
    /// Natural rock or ore.
    Rock,
    /// A tree.
    Tree,
    /// A crop or wild plant.
    Plant {
        /// Whether the plant is ready to harvest.
        harvestable: bool,
    },
    /// A building.
    Building {
        /// Whether hit points are below maximum.
        damaged: bool,
    },
    /// An unfinished blueprint or frame.
    Blueprint,
    /// A research bench.
    ResearchBench,
    /// Dirt, blood, or other filth.
    Filth,
    /// A loose item.
    Item,
}

/// Category of an interactive rescue scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScannerCategory {
    /// Mining designated rock.
    Mine,
    /// Deconstructing a designated structure.
    Deconstruct,
    /// Smoothing a designated floor or wall.
    Smooth,
    /// Sowing a growing zone.
    Sow,
    /// Harvesting a ripe plant.
    Harvest,
    /// Cutting plants or felling trees.
    CutPlant,
    /// Repairing a damaged building.
    Repair,
    /// Cleaning filth.
    Clean,
    /// Researching at a bench.
    Research,
    /// Finishing a blueprint.
    Construct,
}

impl ScannerCategory {
    /// Every built-in category, in default dispatch order.
    pub const ALL: [Self; 10] = [
        Self::Mine,
        Self::Deconstruct,
        Self::Smooth,
        Self::Construct,
        Self::CutPlant,
        Self::Harvest,
        Self::Sow,
        Self::Repair,
        Self::Clean,
        Self::Research,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_mode_never_gates() {
        assert!(!Mode::Normal.gates_jobs());
        assert!(Mode::Hardcore.gates_jobs());
        assert!(Mode::Nightmare.is_strictest());
        assert!(!Mode::Hardcore.is_strictest());
    }

    #[test]
    fn stat_gating_by_mode() {
        assert!(!StatGating::Required.blocks_in(Mode::Normal));
        assert!(StatGating::Required.blocks_in(Mode::Hardcore));
        assert!(StatGating::Required.blocks_in(Mode::Nightmare));
        assert!(!StatGating::Optional.blocks_in(Mode::Hardcore));
        assert!(StatGating::Optional.blocks_in(Mode::Nightmare));
        assert!(!StatGating::Never.blocks_in(Mode::Nightmare));
    }

    #[test]
    fn exempt_categories() {
        assert!(WorkCategory::Ingest.is_structurally_exempt());
        assert!(WorkCategory::Hauling.is_structurally_exempt());
        assert!(!WorkCategory::Mining.is_structurally_exempt());
    }

    #[test]
    fn quality_order_matches_multiplier() {
        assert!(QualityCategory::Legendary > QualityCategory::Awful);
        assert!(
            QualityCategory::Good.bonus_multiplier() > QualityCategory::Normal.bonus_multiplier()
        );
    }

    #[test]
    fn mode_serializes_snake_case() {
        let json = serde_json::to_string(&Mode::Nightmare).unwrap_or_default();
        assert_eq!(json, "\"nightmare\"");
    }
}
