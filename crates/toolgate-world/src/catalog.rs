//! Definition catalog: stats, materials, things, jobs, and work givers.
//!
//! Every definition is interned by its unique name and receives a stable
//! `u32` handle. Handles are plain indices into per-kind tables, so lookups
//! are O(1) and a handle can key a cache without holding a reference to the
//! definition itself.
//!
//! The catalog carries a monotonically increasing [`version`]. Any cache
//! derived from definitions (requirement resolution in particular) compares
//! against it and clears itself when a [`reload`] bumps the counter.
//!
//! [`version`]: Catalog::version
//! [`reload`]: Catalog::reload

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use toolgate_types::{
    JobDefId, MaterialId, StatGating, StatId, ThingDefId, WorkCategory, WorkGiverId, WorkId,
};

use crate::error::WorldError;

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// A work-speed stat tools can augment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDef {
    /// Unique name, e.g. `"digging_speed"`.
    pub name: String,
    /// Display label.
    pub label: String,
    /// Bare-handed capability: the "no tool" floor a tool must beat.
    pub baseline: f32,
    /// Default gating behaviour.
    pub gating: StatGating,
    /// Name of the integration that owns this stat, if any.
    ///
    /// An owned stat only takes part in gating while the owning
    /// compatibility module is active.
    pub owner_module: Option<String>,
}

impl StatDef {
    /// A stat with baseline 1.0 and no owning integration.
    pub fn new(name: &str, label: &str, gating: StatGating) -> Self {
        Self {
            name: String::from(name),
            label: String::from(label),
            baseline: 1.0,
            gating,
            owner_module: None,
        }
    }

    /// Mark the stat as owned by an integration, builder-style.
    #[must_use]
    pub fn owned_by(mut self, module: &str) -> Self {
        self.owner_module = Some(String::from(module));
        self
    }
}

/// A material items can be made from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    /// Unique name.
    pub name: String,
    /// Display label.
    pub label: String,
    /// Scales the bonus of any tool made from this material.
    pub tool_multiplier: f32,
    /// Stat factors of a raw stack of this material used as a makeshift
    /// tool. Empty when the material is no substitute for anything.
    pub virtual_tool: BTreeMap<StatId, f32>,
}

impl MaterialDef {
    /// A material with the given tool multiplier and no virtual profile.
    pub fn new(name: &str, label: &str, tool_multiplier: f32) -> Self {
        Self {
            name: String::from(name),
            label: String::from(label),
            tool_multiplier,
            virtual_tool: BTreeMap::new(),
        }
    }
}

/// A definition of a physical thing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThingDef {
    /// Unique name.
    pub name: String,
    /// Display label.
    pub label: String,
    /// Whether instances count as tools (scored, carried, limited).
    pub is_tool: bool,
    /// Stat factors relative to bare hands (1.3 = 30% faster).
    pub stat_factors: BTreeMap<StatId, f32>,
    /// Free-form tags quirks can match on.
    pub tags: BTreeSet<String>,
    /// For raw material stacks, the material they consist of.
    pub raw_material: Option<MaterialId>,
}

impl ThingDef {
    /// A tool definition with the given factors.
    pub fn tool(name: &str, label: &str, factors: &[(StatId, f32)]) -> Self {
        Self {
            name: String::from(name),
            label: String::from(label),
            is_tool: true,
            stat_factors: factors.iter().copied().collect(),
            tags: BTreeSet::new(),
            raw_material: None,
        }
    }

    /// A raw material stack definition.
    pub fn raw(name: &str, label: &str, material: MaterialId) -> Self {
        Self {
            name: String::from(name),
            label: String::from(label),
            is_tool: false,
            stat_factors: BTreeMap::new(),
            tags: BTreeSet::new(),
            raw_material: Some(material),
        }
    }

    /// Add a tag, builder-style.
    #[must_use]
    pub fn tagged(mut self, tag: &str) -> Self {
        self.tags.insert(String::from(tag));
        self
    }
}

/// A job definition: the concrete unit of work an agent runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDef {
    /// Unique name.
    pub name: String,
    /// Imperative verb shown in menus, e.g. `"Mine"`.
    pub verb: String,
    /// Work-type category.
    pub category: WorkCategory,
    /// Job-level stat binding (fallback when the work giver has none).
    pub stats: Vec<StatId>,
}

/// A work giver: the producer side that hands jobs to agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkGiverDef {
    /// Unique name.
    pub name: String,
    /// Work-type category.
    pub category: WorkCategory,
    /// Work-giver-level stat binding (preferred).
    pub stats: Vec<StatId>,
    /// The job this giver produces.
    pub job: Option<JobDefId>,
}

// ---------------------------------------------------------------------------
// DefTable
// ---------------------------------------------------------------------------

/// Name-interned storage for one kind of definition.
#[derive(Debug, Clone)]
struct DefTable<T> {
    kind: &'static str,
    defs: Vec<T>,
    by_name: BTreeMap<String, u32>,
}

impl<T> DefTable<T> {
    const fn new(kind: &'static str) -> Self {
        Self {
            kind,
            defs: Vec::new(),
            by_name: BTreeMap::new(),
        }
    }

    fn insert(&mut self, name: &str, def: T) -> Result<u32, WorldError> {
        if self.by_name.contains_key(name) {
            return Err(WorldError::DuplicateDef {
                kind: self.kind,
                name: String::from(name),
            });
        }
        let handle = u32::try_from(self.defs.len())
            .ok()
            .ok_or(WorldError::TooManyDefs { kind: self.kind })?;
        self.defs.push(def);
        self.by_name.insert(String::from(name), handle);
        Ok(handle)
    }

    fn get(&self, handle: u32) -> Option<&T> {
        self.defs.get(usize::try_from(handle).ok()?)
    }

    fn lookup(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    fn require(&self, name: &str) -> Result<u32, WorldError> {
        self.lookup(name).ok_or_else(|| WorldError::UnknownDef {
            kind: self.kind,
            name: String::from(name),
        })
    }

    fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        (0_u32..).zip(self.defs.iter())
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// All definitions the gating engine reads, with a reload version counter.
#[derive(Debug, Clone)]
pub struct Catalog {
    version: u64,
    stats: DefTable<StatDef>,
    materials: DefTable<MaterialDef>,
    things: DefTable<ThingDef>,
    jobs: DefTable<JobDef>,
    givers: DefTable<WorkGiverDef>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Create an empty catalog at version 0.
    pub const fn new() -> Self {
        Self {
            version: 0,
            stats: DefTable::new("stat"),
            materials: DefTable::new("material"),
            things: DefTable::new("thing"),
            jobs: DefTable::new("job"),
            givers: DefTable::new("work giver"),
        }
    }

    /// Current definition version. Bumped by [`Catalog::reload`].
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Replace every definition with those from `fresh` and bump the
    /// version so derived caches notice.
    pub fn reload(&mut self, fresh: Self) {
        let next = self.version.saturating_add(1);
        *self = fresh;
        self.version = next;
        tracing::info!(version = next, "definition catalog reloaded");
    }

    // -------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------

    /// Register a stat definition.
    pub fn add_stat(&mut self, def: StatDef) -> Result<StatId, WorldError> {
        let name = def.name.clone();
        self.stats.insert(&name, def).map(StatId)
    }

    /// Register a material definition.
    pub fn add_material(&mut self, def: MaterialDef) -> Result<MaterialId, WorldError> {
        let name = def.name.clone();
        self.materials.insert(&name, def).map(MaterialId)
    }

    /// Register a thing definition.
    pub fn add_thing(&mut self, def: ThingDef) -> Result<ThingDefId, WorldError> {
        let name = def.name.clone();
        self.things.insert(&name, def).map(ThingDefId)
    }

    /// Register a job definition.
    pub fn add_job(&mut self, def: JobDef) -> Result<JobDefId, WorldError> {
        let name = def.name.clone();
        self.jobs.insert(&name, def).map(JobDefId)
    }

    /// Register a work giver definition.
    pub fn add_work_giver(&mut self, def: WorkGiverDef) -> Result<WorkGiverId, WorldError> {
        let name = def.name.clone();
        self.givers.insert(&name, def).map(WorkGiverId)
    }

    // -------------------------------------------------------------------
    // Lookup by handle
    // -------------------------------------------------------------------

    /// Look up a stat definition.
    pub fn stat(&self, id: StatId) -> Option<&StatDef> {
        self.stats.get(id.raw())
    }

    /// Look up a material definition.
    pub fn material(&self, id: MaterialId) -> Option<&MaterialDef> {
        self.materials.get(id.raw())
    }

    /// Look up a thing definition.
    pub fn thing(&self, id: ThingDefId) -> Option<&ThingDef> {
        self.things.get(id.raw())
    }

    /// Look up a job definition.
    pub fn job(&self, id: JobDefId) -> Option<&JobDef> {
        self.jobs.get(id.raw())
    }

    /// Look up a work giver definition.
    pub fn work_giver(&self, id: WorkGiverId) -> Option<&WorkGiverDef> {
        self.givers.get(id.raw())
    }

    // -------------------------------------------------------------------
    // Lookup by name
    // -------------------------------------------------------------------

    /// Find a stat handle by name.
    pub fn stat_named(&self, name: &str) -> Option<StatId> {
        self.stats.lookup(name).map(StatId)
    }

    /// Find a material handle by name.
    pub fn material_named(&self, name: &str) -> Option<MaterialId> {
        self.materials.lookup(name).map(MaterialId)
    }

    /// Find a thing handle by name.
    pub fn thing_named(&self, name: &str) -> Option<ThingDefId> {
        self.things.lookup(name).map(ThingDefId)
    }

    /// Find a job handle by name.
    pub fn job_named(&self, name: &str) -> Option<JobDefId> {
        self.jobs.lookup(name).map(JobDefId)
    }

    /// Find a work giver handle by name.
    pub fn work_giver_named(&self, name: &str) -> Option<WorkGiverId> {
        self.givers.lookup(name).map(WorkGiverId)
    }

    /// Find a stat handle by name, failing with [`WorldError::UnknownDef`].
    pub fn require_stat(&self, name: &str) -> Result<StatId, WorldError> {
        self.stats.require(name).map(StatId)
    }

    /// Find a job handle by name, failing with [`WorldError::UnknownDef`].
    pub fn require_job(&self, name: &str) -> Result<JobDefId, WorldError> {
        self.jobs.require(name).map(JobDefId)
    }

    // -------------------------------------------------------------------
    // Iteration
    // -------------------------------------------------------------------

    /// Iterate over all stats in registration order.
    pub fn stats(&self) -> impl Iterator<Item = (StatId, &StatDef)> {
        self.stats.iter().map(|(h, d)| (StatId(h), d))
    }

    /// Iterate over all work givers in registration order.
    pub fn work_givers(&self) -> impl Iterator<Item = (WorkGiverId, &WorkGiverDef)> {
        self.givers.iter().map(|(h, d)| (WorkGiverId(h), d))
    }

    // -------------------------------------------------------------------
    // Work metadata
    // -------------------------------------------------------------------

    /// Work-type category of a work identifier.
    pub fn work_category(&self, work: WorkId) -> Option<WorkCategory> {
        match work {
            WorkId::Giver(id) => self.work_giver(id).map(|g| g.category),
            WorkId::Job(id) => self.job(id).map(|j| j.category),
        }
    }

    /// The job a work identifier ultimately runs.
    pub fn job_for(&self, work: WorkId) -> Option<JobDefId> {
        match work {
            WorkId::Giver(id) => self.work_giver(id).and_then(|g| g.job),
            WorkId::Job(id) => Some(id),
        }
    }

    /// Menu verb for a work identifier, falling back to the giver name.
    pub fn work_verb(&self, work: WorkId) -> String {
        if let Some(job) = self.job_for(work).and_then(|id| self.job(id)) {
            return job.verb.clone();
        }
        match work {
            WorkId::Giver(id) => self
                .work_giver(id)
                .map_or_else(|| work.to_string(), |g| g.name.clone()),
            WorkId::Job(_) => work.to_string(),
        }
    }

    /// Whether instances of `def` are tools.
    pub fn is_tool(&self, def: ThingDefId) -> bool {
        self.thing(def).is_some_and(|t| t.is_tool)
    }

    /// Display label of a stat, or its handle when unknown.
    pub fn stat_label(&self, id: StatId) -> String {
        self.stat(id)
            .map_or_else(|| id.to_string(), |s| s.label.clone())
    }

    /// Display label of a thing, or its handle when unknown.
    pub fn thing_label(&self, id: ThingDefId) -> String {
        self.thing(id)
            .map_or_else(|| id.to_string(), |t| t.label.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> (Catalog, StatId, JobDefId, WorkGiverId) {
        let mut catalog = Catalog::new();
        let digging = catalog
            .add_stat(StatDef::new("digging_speed", "Digging speed", StatGating::Required))
            .unwrap();
        let mine = catalog
            .add_job(JobDef {
                name: String::from("mine"),
                verb: String::from("Mine"),
                category: WorkCategory::Mining,
                stats: vec![digging],
            })
            .unwrap();
        let giver = catalog
            .add_work_giver(WorkGiverDef {
                name: String::from("mine_designated"),
                category: WorkCategory::Mining,
                stats: Vec::new(),
                job: Some(mine),
            })
            .unwrap();
        (catalog, digging, mine, giver)
    }

    #[test]
    fn handles_are_sequential_per_kind() {
        let (catalog, digging, mine, giver) = sample();
        assert_eq!(digging, StatId(0));
        assert_eq!(mine, JobDefId(0));
        assert_eq!(giver, WorkGiverId(0));
        assert_eq!(catalog.stat_named("digging_speed"), Some(digging));
    }

    #[test]
    fn duplicate_names_rejected() {
        let (mut catalog, ..) = sample();
        let result =
            catalog.add_stat(StatDef::new("digging_speed", "Again", StatGating::Optional));
        assert!(matches!(result, Err(WorldError::DuplicateDef { kind: "stat", .. })));
    }

    #[test]
    fn work_metadata_follows_giver_to_job() {
        let (catalog, _, mine, giver) = sample();
        assert_eq!(catalog.job_for(WorkId::Giver(giver)), Some(mine));
        assert_eq!(
            catalog.work_category(WorkId::Giver(giver)),
            Some(WorkCategory::Mining)
        );
        assert_eq!(catalog.work_verb(WorkId::Giver(giver)), "Mine");
    }

    #[test]
    fn reload_bumps_version() {
        let (mut catalog, ..) = sample();
        assert_eq!(catalog.version(), 0);
        let (fresh, ..) = sample();
        catalog.reload(fresh);
        assert_eq!(catalog.version(), 1);
        assert!(catalog.stat_named("digging_speed").is_some());
    }

    #[test]
    fn unknown_lookups_return_none() {
        let (catalog, ..) = sample();
        assert!(catalog.stat(StatId(99)).is_none());
        assert!(catalog.require_job("sow").is_err());
        assert_eq!(catalog.stat_label(StatId(99)), "stat#99");
    }
}
