//! Default definitions and a small demo map.
//!
//! Creates the stat, material, tool, job and work giver definitions the
//! engine binary and the scenario tests share: ten work stats (one owned by
//! the `research_bench` integration), eight tools, four materials, and a
//! work giver per gated activity plus the structurally exempt ones.

use toolgate_types::{
    JobDefId, MaterialId, StatGating, StatId, ThingDefId, WorkCategory, WorkGiverId,
};

use crate::catalog::{Catalog, JobDef, MaterialDef, StatDef, ThingDef, WorkGiverDef};
use crate::error::WorldError;

/// Name of the integration that owns the research speed stat.
pub const RESEARCH_BENCH_MODULE: &str = "research_bench";

/// Handles of every starting definition, returned alongside the catalog so
/// callers can build agents, items, and jobs without name lookups.
#[derive(Debug, Clone)]
pub struct StartingDefs {
    // --- Stats ---
    /// Digging speed (required).
    pub digging_speed: StatId,
    /// Mining yield (optional).
    pub mining_yield: StatId,
    /// Tree felling speed (required).
    pub tree_felling_speed: StatId,
    /// Plant harvesting speed (optional).
    pub plant_harvesting_speed: StatId,
    /// Sowing speed (optional).
    pub sowing_speed: StatId,
    /// Construction speed (required).
    pub construction_speed: StatId,
    /// Smoothing speed (required).
    pub smoothing_speed: StatId,
    /// Maintenance speed (optional).
    pub maintenance_speed: StatId,
    /// Cleaning speed (optional).
    pub cleaning_speed: StatId,
    /// Research speed (required, owned by [`RESEARCH_BENCH_MODULE`]).
    pub research_speed: StatId,

    // --- Materials ---
    /// Steel: the reference material.
    pub steel: MaterialId,
    /// Plasteel: better than steel.
    pub plasteel: MaterialId,
    /// Wood: flimsy tools.
    pub wood: MaterialId,
    /// Granite: weak tools, chunks double as makeshift tools.
    pub granite: MaterialId,

    // --- Things ---
    /// Pickaxe.
    pub pickaxe: ThingDefId,
    /// Axe.
    pub axe: ThingDefId,
    /// Sickle.
    pub sickle: ThingDefId,
    /// Hoe.
    pub hoe: ThingDefId,
    /// Hammer.
    pub hammer: ThingDefId,
    /// Chisel.
    pub chisel: ThingDefId,
    /// Broom.
    pub broom: ThingDefId,
    /// Research kit.
    pub research_kit: ThingDefId,
    /// Granite chunk (raw material).
    pub granite_chunk: ThingDefId,
    /// Wood log (raw material).
    pub wood_log: ThingDefId,

    // --- Jobs ---
    /// Mine a rock.
    pub job_mine: JobDefId,
    /// Cut a plant or fell a tree.
    pub job_cut_plant: JobDefId,
    /// Harvest a crop.
    pub job_harvest: JobDefId,
    /// Sow a crop.
    pub job_sow: JobDefId,
    /// Finish a blueprint.
    pub job_build: JobDefId,
    /// Tear down a structure.
    pub job_deconstruct: JobDefId,
    /// Smooth a floor or wall.
    pub job_smooth: JobDefId,
    /// Repair a building.
    pub job_repair: JobDefId,
    /// Clean filth.
    pub job_clean: JobDefId,
    /// Research at a bench.
    pub job_research: JobDefId,
    /// Eat.
    pub job_ingest: JobDefId,
    /// Haul an item.
    pub job_haul: JobDefId,

    // --- Work givers ---
    /// Mine designated rock.
    pub mine: WorkGiverId,
    /// Fell designated trees.
    pub fell_trees: WorkGiverId,
    /// Cut designated plants (falls back to the job binding).
    pub cut_plants: WorkGiverId,
    /// Harvest ripe crops.
    pub harvest: WorkGiverId,
    /// Sow growing zones.
    pub sow: WorkGiverId,
    /// Finish blueprints.
    pub construct: WorkGiverId,
    /// Deconstruct designated structures.
    pub deconstruct: WorkGiverId,
    /// Smooth designated floors and walls.
    pub smooth: WorkGiverId,
    /// Repair damaged buildings.
    pub repair: WorkGiverId,
    /// Clean filth.
    pub clean: WorkGiverId,
    /// Research at a bench (stats contributed by the integration).
    pub research: WorkGiverId,
    /// Eat a meal.
    pub eat: WorkGiverId,
    /// Haul items to stockpiles.
    pub haul: WorkGiverId,
}

fn job(
    catalog: &mut Catalog,
    name: &str,
    verb: &str,
    category: WorkCategory,
    stats: Vec<StatId>,
) -> Result<JobDefId, WorldError> {
    catalog.add_job(JobDef {
        name: String::from(name),
        verb: String::from(verb),
        category,
        stats,
    })
}

fn giver(
    catalog: &mut Catalog,
    name: &str,
    category: WorkCategory,
    stats: Vec<StatId>,
    job: JobDefId,
) -> Result<WorkGiverId, WorldError> {
    catalog.add_work_giver(WorkGiverDef {
        name: String::from(name),
        category,
        stats,
        job: Some(job),
    })
}

/// Create the default definition catalog.
///
/// # Errors
///
/// Returns [`WorldError`] if registration fails (should not happen with
/// valid hard-coded data).
#[allow(clippy::too_many_lines)]
pub fn create_starting_catalog() -> Result<(Catalog, StartingDefs), WorldError> {
    use StatGating::{Optional, Required};
    use WorkCategory as W;

    let mut c = Catalog::new();

    // --- Stats ---
    let digging_speed = c.add_stat(StatDef::new("digging_speed", "Digging speed", Required))?;
    let mining_yield = c.add_stat(StatDef::new("mining_yield", "Mining yield", Optional))?;
    let tree_felling_speed =
        c.add_stat(StatDef::new("tree_felling_speed", "Tree felling speed", Required))?;
    let plant_harvesting_speed = c.add_stat(StatDef::new(
        "plant_harvesting_speed",
        "Plant harvesting speed",
        Optional,
    ))?;
    let sowing_speed = c.add_stat(StatDef::new("sowing_speed", "Sowing speed", Optional))?;
    let construction_speed =
        c.add_stat(StatDef::new("construction_speed", "Construction speed", Required))?;
    let smoothing_speed =
        c.add_stat(StatDef::new("smoothing_speed", "Smoothing speed", Required))?;
    let maintenance_speed =
        c.add_stat(StatDef::new("maintenance_speed", "Maintenance speed", Optional))?;
    let cleaning_speed = c.add_stat(StatDef::new("cleaning_speed", "Cleaning speed", Optional))?;
    let research_speed = c.add_stat(
        StatDef::new("research_speed", "Research speed", Required).owned_by(RESEARCH_BENCH_MODULE),
    )?;

    // --- Materials ---
    let steel = c.add_material(MaterialDef::new("steel", "steel", 1.0))?;
    let plasteel = c.add_material(MaterialDef::new("plasteel", "plasteel", 1.3))?;
    let wood = c.add_material(MaterialDef::new("wood", "wooden", 0.6))?;
    let mut granite_def = MaterialDef::new("granite", "granite", 0.8);
    granite_def.virtual_tool.insert(digging_speed, 1.05);
    granite_def.virtual_tool.insert(construction_speed, 1.05);
    let granite = c.add_material(granite_def)?;

    // --- Tools ---
    let pickaxe = c.add_thing(
        ThingDef::tool(
            "pickaxe",
            "pickaxe",
            &[(digging_speed, 1.3), (mining_yield, 1.15)],
        )
        .tagged("tool:mining"),
    )?;
    let axe = c.add_thing(
        ThingDef::tool(
            "axe",
            "axe",
            &[(tree_felling_speed, 1.4), (plant_harvesting_speed, 1.1)],
        )
        .tagged("tool:plants"),
    )?;
    let sickle = c.add_thing(
        ThingDef::tool(
            "sickle",
            "sickle",
            &[(plant_harvesting_speed, 1.3), (sowing_speed, 1.05)],
        )
        .tagged("tool:plants"),
    )?;
    let hoe = c.add_thing(ThingDef::tool("hoe", "hoe", &[(sowing_speed, 1.3)]).tagged("tool:plants"))?;
    let hammer = c.add_thing(
        ThingDef::tool(
            "hammer",
            "hammer",
            &[(construction_speed, 1.3), (maintenance_speed, 1.2)],
        )
        .tagged("tool:construction"),
    )?;
    let chisel = c.add_thing(
        ThingDef::tool("chisel", "chisel", &[(smoothing_speed, 1.4)]).tagged("tool:construction"),
    )?;
    let broom = c.add_thing(ThingDef::tool("broom", "broom", &[(cleaning_speed, 1.5)]))?;
    let research_kit = c.add_thing(ThingDef::tool(
        "research_kit",
        "research kit",
        &[(research_speed, 1.25)],
    ))?;

    // --- Raw materials ---
    let granite_chunk = c.add_thing(ThingDef::raw("granite_chunk", "granite chunk", granite))?;
    let wood_log = c.add_thing(ThingDef::raw("wood_log", "wood log", wood))?;

    // --- Jobs ---
    let job_mine = job(&mut c, "mine", "Mine", W::Mining, vec![digging_speed])?;
    let job_cut_plant = job(
        &mut c,
        "cut_plant",
        "Cut",
        W::PlantCutting,
        vec![plant_harvesting_speed],
    )?;
    let job_harvest = job(
        &mut c,
        "harvest",
        "Harvest",
        W::Harvesting,
        vec![plant_harvesting_speed],
    )?;
    let job_sow = job(&mut c, "sow", "Sow", W::Sowing, vec![sowing_speed])?;
    let job_build = job(&mut c, "build", "Build", W::Construction, vec![construction_speed])?;
    let job_deconstruct = job(
        &mut c,
        "deconstruct",
        "Deconstruct",
        W::Deconstruction,
        vec![construction_speed],
    )?;
    let job_smooth = job(&mut c, "smooth", "Smooth", W::Smoothing, vec![smoothing_speed])?;
    let job_repair = job(&mut c, "repair", "Repair", W::Repair, vec![maintenance_speed])?;
    let job_clean = job(&mut c, "clean", "Clean", W::Cleaning, vec![cleaning_speed])?;
    let job_research = job(&mut c, "research", "Research", W::Research, vec![research_speed])?;
    let job_ingest = job(&mut c, "ingest", "Eat", W::Ingest, Vec::new())?;
    let job_haul = job(&mut c, "haul", "Haul", W::Hauling, Vec::new())?;

    // --- Work givers ---
    let mine = giver(
        &mut c,
        "mine_designated",
        W::Mining,
        vec![digging_speed, mining_yield],
        job_mine,
    )?;
    let fell_trees = giver(
        &mut c,
        "fell_trees",
        W::PlantCutting,
        vec![tree_felling_speed],
        job_cut_plant,
    )?;
    let cut_plants = giver(&mut c, "cut_plants", W::PlantCutting, Vec::new(), job_cut_plant)?;
    let harvest = giver(
        &mut c,
        "harvest_crops",
        W::Harvesting,
        vec![plant_harvesting_speed],
        job_harvest,
    )?;
    let sow = giver(&mut c, "sow_zones", W::Sowing, vec![sowing_speed], job_sow)?;
    let construct = giver(
        &mut c,
        "finish_blueprints",
        W::Construction,
        vec![construction_speed],
        job_build,
    )?;
    let deconstruct = giver(
        &mut c,
        "deconstruct_designated",
        W::Deconstruction,
        vec![construction_speed],
        job_deconstruct,
    )?;
    let smooth = giver(
        &mut c,
        "smooth_designated",
        W::Smoothing,
        vec![smoothing_speed],
        job_smooth,
    )?;
    let repair = giver(
        &mut c,
        "repair_damaged",
        W::Repair,
        vec![maintenance_speed],
        job_repair,
    )?;
    let clean = giver(&mut c, "clean_filth", W::Cleaning, vec![cleaning_speed], job_clean)?;
    let research = giver(&mut c, "research_bench", W::Research, Vec::new(), job_research)?;
    let eat = giver(&mut c, "eat_meal", W::Ingest, Vec::new(), job_ingest)?;
    let haul = giver(&mut c, "haul_general", W::Hauling, Vec::new(), job_haul)?;

    let defs = StartingDefs {
        digging_speed,
        mining_yield,
        tree_felling_speed,
        plant_harvesting_speed,
        sowing_speed,
        construction_speed,
        smoothing_speed,
        maintenance_speed,
        cleaning_speed,
        research_speed,
        steel,
        plasteel,
        wood,
        granite,
        pickaxe,
        axe,
        sickle,
        hoe,
        hammer,
        chisel,
        broom,
        research_kit,
        granite_chunk,
        wood_log,
        job_mine,
        job_cut_plant,
        job_harvest,
        job_sow,
        job_build,
        job_deconstruct,
        job_smooth,
        job_repair,
        job_clean,
        job_research,
        job_ingest,
        job_haul,
        mine,
        fell_trees,
        cut_plants,
        harvest,
        sow,
        construct,
        deconstruct,
        smooth,
        repair,
        clean,
        research,
        eat,
        haul,
    };

    Ok((c, defs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use toolgate_types::WorkId;

    use super::*;

    #[test]
    fn starting_catalog_builds() {
        let result = create_starting_catalog();
        assert!(result.is_ok());
    }

    #[test]
    fn every_tool_has_a_factor() {
        let (catalog, defs) = create_starting_catalog().unwrap();
        for tool in [
            defs.pickaxe,
            defs.axe,
            defs.sickle,
            defs.hoe,
            defs.hammer,
            defs.chisel,
            defs.broom,
            defs.research_kit,
        ] {
            let def = catalog.thing(tool).unwrap();
            assert!(def.is_tool, "{} should be a tool", def.name);
            assert!(!def.stat_factors.is_empty(), "{} has no factors", def.name);
        }
        assert!(!catalog.is_tool(defs.granite_chunk));
    }

    #[test]
    fn research_stat_is_owned() {
        let (catalog, defs) = create_starting_catalog().unwrap();
        let stat = catalog.stat(defs.research_speed).unwrap();
        assert_eq!(stat.owner_module.as_deref(), Some(RESEARCH_BENCH_MODULE));
    }

    #[test]
    fn granite_is_a_virtual_digging_tool() {
        let (catalog, defs) = create_starting_catalog().unwrap();
        let granite = catalog.material(defs.granite).unwrap();
        assert!(granite.virtual_tool.contains_key(&defs.digging_speed));
        assert_eq!(
            catalog.thing(defs.granite_chunk).unwrap().raw_material,
            Some(defs.granite)
        );
    }

    #[test]
    fn exempt_givers_have_exempt_categories() {
        let (catalog, defs) = create_starting_catalog().unwrap();
        for giver in [defs.eat, defs.haul] {
            let category = catalog.work_category(WorkId::Giver(giver)).unwrap();
            assert!(category.is_structurally_exempt());
        }
    }
}
