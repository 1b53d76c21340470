//! Per-category scanners that turn a clicked cell into a unit of work.

use toolgate_types::{
    Agent, CellPos, Designation, JobDefId, ScannerCategory, StatId, ThingKind, WorkCategory,
    WorkGiverId, WorkId, ZoneKind,
};
use toolgate_world::{Catalog, CellInfo, SpatialIndex};

use crate::error::RescueError;

/// Context hint weights.
pub const HINT_DESIGNATION: u32 = 100;
/// Clicked thing matches the scanner's category.
pub const HINT_THING: u32 = 50;
/// Clicked zone matches the scanner's category.
pub const HINT_ZONE: u32 = 30;
/// The agent does this kind of work.
pub const HINT_WORK_ENABLED: u32 = 10;

/// What the player clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanContext {
    /// Identifies one menu-open event; scanner results are memoized per click.
    pub click_id: u64,
    /// Clicked cell.
    pub cell: CellPos,
    /// Annotations on the clicked cell.
    pub info: CellInfo,
    /// Whether the queue modifier key was held.
    pub queue_modifier: bool,
}

impl ScanContext {
    /// Capture the annotations of `cell`.
    pub fn at(click_id: u64, map: &dyn SpatialIndex, cell: CellPos) -> Self {
        Self {
            click_id,
            cell,
            info: map.cell_info(cell),
            queue_modifier: false,
        }
    }

    /// Set the queue modifier, builder-style.
    #[must_use]
    pub const fn with_queue_modifier(mut self, held: bool) -> Self {
        self.queue_modifier = held;
        self
    }

    /// The category the click most plausibly means. Designations win over
    /// clicked things, which win over zones.
    pub fn primary_category(&self) -> Option<ScannerCategory> {
        let rules: [fn(ScannerCategory, &CellInfo) -> bool; 3] =
            [designation_matches, thing_matches, zone_matches];
        rules.into_iter().find_map(|rule| {
            ScannerCategory::ALL
                .into_iter()
                .find(|&c| handles(c, &self.info) && rule(c, &self.info))
        })
    }
}

/// A unit of work a scanner found at the clicked cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDescription {
    /// The work to perform.
    pub work: WorkId,
    /// The job it runs, if known.
    pub job: Option<JobDefId>,
    /// Where to perform it.
    pub target: CellPos,
}

/// A described target together with everything the gate needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCandidate {
    /// Category of the scanner that produced it.
    pub category: ScannerCategory,
    /// The work to perform.
    pub work: WorkId,
    /// The job it runs, if known.
    pub job: Option<JobDefId>,
    /// Resolved stats of the work.
    pub required_stats: Vec<StatId>,
    /// Where to perform it.
    pub target: CellPos,
}

/// Recognizes one kind of work at a clicked cell.
pub trait Scanner {
    /// Name for diagnostics.
    fn name(&self) -> &str;

    /// The category this scanner serves.
    fn category(&self) -> ScannerCategory;

    /// Cheap check on the click alone.
    fn can_handle(&self, ctx: &ScanContext) -> bool;

    /// Describe the work at the click, or `None` if there is nothing to do
    /// for this agent.
    fn try_describe_target(
        &self,
        catalog: &Catalog,
        agent: &Agent,
        ctx: &ScanContext,
    ) -> Result<Option<TargetDescription>, RescueError>;

    /// How strongly the click suggests this scanner's work.
    fn hint_score(&self, agent: &Agent, ctx: &ScanContext) -> u32 {
        hint_score(self.category(), agent, &ctx.info)
    }
}

// ---------------------------------------------------------------------------
// Category rules
// ---------------------------------------------------------------------------

/// Work category served by a scanner category.
pub const fn work_category(category: ScannerCategory) -> WorkCategory {
    match category {
        ScannerCategory::Mine => WorkCategory::Mining,
        ScannerCategory::Deconstruct => WorkCategory::Deconstruction,
        ScannerCategory::Smooth => WorkCategory::Smoothing,
        ScannerCategory::Sow => WorkCategory::Sowing,
        ScannerCategory::Harvest => WorkCategory::Harvesting,
        ScannerCategory::CutPlant => WorkCategory::PlantCutting,
        ScannerCategory::Repair => WorkCategory::Repair,
        ScannerCategory::Clean => WorkCategory::Cleaning,
        ScannerCategory::Research => WorkCategory::Research,
        ScannerCategory::Construct => WorkCategory::Construction,
    }
}

const fn is_plant(thing: ThingKind) -> bool {
    matches!(thing, ThingKind::Plant { .. })
}

fn designation_matches(category: ScannerCategory, info: &CellInfo) -> bool {
    match category {
        ScannerCategory::Mine => info.has(Designation::Mine),
        ScannerCategory::Deconstruct => info.has(Designation::Deconstruct),
        ScannerCategory::Smooth => {
            info.has(Designation::SmoothFloor) || info.has(Designation::SmoothWall)
        }
        ScannerCategory::Harvest => info.has(Designation::HarvestPlant),
        ScannerCategory::CutPlant => info.has(Designation::CutPlant),
        ScannerCategory::Sow
        | ScannerCategory::Repair
        | ScannerCategory::Clean
        | ScannerCategory::Research
        | ScannerCategory::Construct => false,
    }
}

fn thing_matches(category: ScannerCategory, info: &CellInfo) -> bool {
    match category {
        ScannerCategory::Mine => info.any_thing(|t| t == ThingKind::Rock),
        ScannerCategory::Deconstruct => info.any_thing(|t| matches!(t, ThingKind::Building { .. })),
        ScannerCategory::Harvest => {
            info.any_thing(|t| t == ThingKind::Plant { harvestable: true })
        }
        ScannerCategory::CutPlant => info.any_thing(|t| t == ThingKind::Tree || is_plant(t)),
        ScannerCategory::Repair => info.any_thing(|t| t == ThingKind::Building { damaged: true }),
        ScannerCategory::Clean => info.any_thing(|t| t == ThingKind::Filth),
        ScannerCategory::Research => info.any_thing(|t| t == ThingKind::ResearchBench),
        ScannerCategory::Construct => info.any_thing(|t| t == ThingKind::Blueprint),
        ScannerCategory::Smooth | ScannerCategory::Sow => false,
    }
}

fn zone_matches(category: ScannerCategory, info: &CellInfo) -> bool {
    category == ScannerCategory::Sow && info.zone == Some(ZoneKind::Growing)
}

/// Whether a built-in scanner of `category` recognizes the cell.
fn handles(category: ScannerCategory, info: &CellInfo) -> bool {
    match category {
        ScannerCategory::Mine
        | ScannerCategory::Deconstruct
        | ScannerCategory::Smooth
        | ScannerCategory::CutPlant => designation_matches(category, info),
        ScannerCategory::Sow => zone_matches(category, info) && !info.any_thing(is_plant),
        ScannerCategory::Harvest => {
            designation_matches(category, info) || thing_matches(category, info)
        }
        ScannerCategory::Repair
        | ScannerCategory::Clean
        | ScannerCategory::Research
        | ScannerCategory::Construct => thing_matches(category, info),
    }
}

/// Context hint score of `category` for a click on `info`.
pub fn hint_score(category: ScannerCategory, agent: &Agent, info: &CellInfo) -> u32 {
    let mut score = 0_u32;
    if designation_matches(category, info) {
        score = score.saturating_add(HINT_DESIGNATION);
    }
    if thing_matches(category, info) {
        score = score.saturating_add(HINT_THING);
    }
    if zone_matches(category, info) {
        score = score.saturating_add(HINT_ZONE);
    }
    if agent.can_do(work_category(category)) {
        score = score.saturating_add(HINT_WORK_ENABLED);
    }
    score
}

// ---------------------------------------------------------------------------
// CategoryScanner
// ---------------------------------------------------------------------------

/// Built-in scanner: one category, bound to one work giver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryScanner {
    name: String,
    category: ScannerCategory,
    giver: WorkGiverId,
}

impl CategoryScanner {
    /// A scanner that offers `giver` for clicks of `category`.
    pub fn new(category: ScannerCategory, giver: WorkGiverId) -> Self {
        Self {
            name: format!("{category:?}").to_lowercase(),
            category,
            giver,
        }
    }

    /// One scanner per category, bound to the first work giver of the
    /// matching work type. Categories without a giver are skipped.
    pub fn defaults(catalog: &Catalog) -> Vec<Self> {
        ScannerCategory::ALL
            .into_iter()
            .filter_map(|category| {
                let wanted = work_category(category);
                catalog
                    .work_givers()
                    .find(|(_, giver)| giver.category == wanted)
                    .map(|(id, _)| Self::new(category, id))
            })
            .collect()
    }

    /// The bound work giver.
    pub const fn giver(&self) -> WorkGiverId {
        self.giver
    }
}

impl Scanner for CategoryScanner {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> ScannerCategory {
        self.category
    }

    fn can_handle(&self, ctx: &ScanContext) -> bool {
        handles(self.category, &ctx.info)
    }

    fn try_describe_target(
        &self,
        catalog: &Catalog,
        _agent: &Agent,
        ctx: &ScanContext,
    ) -> Result<Option<TargetDescription>, RescueError> {
        let work = WorkId::Giver(self.giver);
        let giver = catalog
            .work_giver(self.giver)
            .ok_or(RescueError::UnknownWork(work))?;
        Ok(Some(TargetDescription {
            work,
            job: giver.job,
            target: ctx.cell,
        }))
    }
}
