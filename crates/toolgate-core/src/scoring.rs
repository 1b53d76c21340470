//! Tool scoring: how much an item improves an agent at one stat.
//!
//! A score is a multiplier relative to bare hands. The per-stat
//! [`baseline`] is the bare-handed floor; an item only counts as a tool for
//! a stat when its score beats that floor by more than [`EPSILON`].
//!
//! Real items score as
//!
//! ```text
//! 1 + (factor - 1) * material * quality * (0.5 + 0.5 * condition)
//! ```
//!
//! followed by every registered [`Quirk`] in registration order. Carried
//! raw material stacks whose material declares a virtual-tool profile can
//! stand in for a tool; they are synthesized per query and never stored.
//!
//! [`baseline`]: ToolScorer::baseline

use serde::{Deserialize, Serialize};
use toolgate_types::{Agent, Item, ItemId, QualityCategory, StatId, ThingDefId};
use toolgate_world::{Catalog, ThingDef};

use crate::error::GateError;
use crate::view::WorldView;

/// Minimum margin by which a score must exceed the baseline to count.
pub const EPSILON: f32 = 0.001;

/// Whether `score` beats `baseline` by more than [`EPSILON`].
pub fn beats_baseline(score: f32, baseline: f32) -> bool {
    score > baseline + EPSILON
}

// ---------------------------------------------------------------------------
// Quirks
// ---------------------------------------------------------------------------

/// An externally registered scoring adjustment.
pub trait Quirk {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Adjust `score` for an item of `def` evaluated for `stat`.
    fn adjust(&self, def: &ThingDef, stat: StatId, score: f32) -> f32;
}

/// How a [`TagQuirk`] changes a score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuirkEffect {
    /// Add a flat amount.
    Add(f32),
    /// Multiply by a factor.
    Multiply(f32),
}

/// Quirk that matches a definition tag, optionally for a single stat.
#[derive(Debug, Clone, PartialEq)]
pub struct TagQuirk {
    name: String,
    tag: String,
    stat: Option<StatId>,
    effect: QuirkEffect,
}

impl TagQuirk {
    /// A quirk applying `effect` to every def tagged `tag`.
    pub fn new(name: &str, tag: &str, effect: QuirkEffect) -> Self {
        Self {
            name: String::from(name),
            tag: String::from(tag),
            stat: None,
            effect,
        }
    }

    /// Restrict the quirk to one stat, builder-style.
    #[must_use]
    pub const fn for_stat(mut self, stat: StatId) -> Self {
        self.stat = Some(stat);
        self
    }
}

impl Quirk for TagQuirk {
    fn name(&self) -> &str {
        &self.name
    }

    fn adjust(&self, def: &ThingDef, stat: StatId, score: f32) -> f32 {
        if !def.tags.contains(&self.tag) || self.stat.is_some_and(|s| s != stat) {
            return score;
        }
        match self.effect {
            QuirkEffect::Add(amount) => score + amount,
            QuirkEffect::Multiply(factor) => score * factor,
        }
    }
}

// ---------------------------------------------------------------------------
// Scored tools
// ---------------------------------------------------------------------------

/// Where a scored tool came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolSource {
    /// The equipped primary tool.
    Equipped,
    /// A tool in the inventory.
    Inventory,
    /// A carried raw material stack standing in for a tool.
    Virtual,
}

/// A carried item together with its score for one stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredTool {
    /// The item (for virtual tools, the material stack).
    pub item: ItemId,
    /// The item's definition.
    pub def: ThingDefId,
    /// Where the item is carried.
    pub source: ToolSource,
    /// The item's quality.
    pub quality: QualityCategory,
    /// The score for the stat.
    pub score: f32,
}

impl ScoredTool {
    /// Whether this is a virtual substitute rather than a real tool.
    pub fn is_virtual(&self) -> bool {
        self.source == ToolSource::Virtual
    }

    /// Whether `self` should replace `incumbent` as the best tool.
    ///
    /// Higher score wins; within [`EPSILON`], a real tool beats a virtual
    /// one, then higher quality wins, otherwise the incumbent stays.
    fn outranks(&self, incumbent: &Self) -> bool {
        let diff = self.score - incumbent.score;
        if diff > EPSILON {
            return true;
        }
        if diff < -EPSILON {
            return false;
        }
        match (self.is_virtual(), incumbent.is_virtual()) {
            (false, true) => true,
            (true, false) => false,
            _ => self.quality > incumbent.quality,
        }
    }
}

// ---------------------------------------------------------------------------
// ToolScorer
// ---------------------------------------------------------------------------

/// Scores items against stats. Holds only the registered quirks.
#[derive(Default)]
pub struct ToolScorer {
    quirks: Vec<Box<dyn Quirk>>,
}

impl core::fmt::Debug for ToolScorer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ToolScorer")
            .field("quirks", &self.quirk_names())
            .finish()
    }
}

impl ToolScorer {
    /// A scorer with no quirks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a quirk. Quirks apply in registration order.
    pub fn register_quirk(&mut self, quirk: Box<dyn Quirk>) {
        tracing::debug!(quirk = quirk.name(), "quirk registered");
        self.quirks.push(quirk);
    }

    /// Names of the registered quirks, in order.
    pub fn quirk_names(&self) -> Vec<&str> {
        self.quirks.iter().map(|q| q.name()).collect()
    }

    /// Bare-handed value of `stat`.
    pub fn baseline(&self, catalog: &Catalog, stat: StatId) -> Result<f32, GateError> {
        catalog
            .stat(stat)
            .map(|s| s.baseline)
            .ok_or(GateError::UnknownStat(stat))
    }

    fn apply_quirks(&self, def: &ThingDef, stat: StatId, score: f32) -> Result<f32, GateError> {
        let adjusted = self
            .quirks
            .iter()
            .fold(score, |acc, quirk| quirk.adjust(def, stat, acc));
        if adjusted.is_finite() {
            Ok(adjusted)
        } else {
            Err(GateError::NonFiniteScore {
                stat,
                score: adjusted,
            })
        }
    }

    /// Score a real item for `stat`. Items without a factor for the stat
    /// score the baseline.
    pub fn score(&self, catalog: &Catalog, item: &Item, stat: StatId) -> Result<f32, GateError> {
        let def = catalog
            .thing(item.def)
            .ok_or(GateError::UnknownThing(item.def))?;
        let baseline = self.baseline(catalog, stat)?;
        let Some(&factor) = def.stat_factors.get(&stat) else {
            return Ok(baseline);
        };
        let material = match item.material {
            Some(id) => {
                catalog
                    .material(id)
                    .ok_or(GateError::UnknownMaterial(id))?
                    .tool_multiplier
            }
            None => 1.0,
        };
        let quality = item.quality.bonus_multiplier();
        let condition = 0.5 + 0.5 * item.condition();
        let raw = 1.0 + (factor - 1.0) * material * quality * condition;
        self.apply_quirks(def, stat, raw)
    }

    /// Score of a carried raw stack used as a makeshift tool, if its
    /// material has a virtual profile for `stat`.
    pub fn virtual_score(
        &self,
        catalog: &Catalog,
        item: &Item,
        stat: StatId,
    ) -> Result<Option<f32>, GateError> {
        let def = catalog
            .thing(item.def)
            .ok_or(GateError::UnknownThing(item.def))?;
        if def.is_tool {
            return Ok(None);
        }
        let Some(material_id) = def.raw_material else {
            return Ok(None);
        };
        let material = catalog
            .material(material_id)
            .ok_or(GateError::UnknownMaterial(material_id))?;
        match material.virtual_tool.get(&stat) {
            Some(&factor) => self.apply_quirks(def, stat, factor).map(Some),
            None => Ok(None),
        }
    }

    /// The best carried tool for `stat`, or `None` if nothing beats the
    /// baseline.
    ///
    /// Considers the equipped tool, inventory tools, and (when enabled)
    /// virtual substitutes from carried material stacks.
    pub fn best_tool(
        &self,
        view: &WorldView<'_>,
        agent: &Agent,
        stat: StatId,
    ) -> Result<Option<ScoredTool>, GateError> {
        let catalog = view.catalog;
        let baseline = self.baseline(catalog, stat)?;
        let mut best: Option<ScoredTool> = None;

        let mut consider = |candidate: ScoredTool| {
            if !beats_baseline(candidate.score, baseline) {
                return;
            }
            if best.as_ref().is_none_or(|b| candidate.outranks(b)) {
                best = Some(candidate);
            }
        };

        if let Some(item) = agent.equipped.as_ref().filter(|i| catalog.is_tool(i.def)) {
            consider(ScoredTool {
                item: item.id,
                def: item.def,
                source: ToolSource::Equipped,
                quality: item.quality,
                score: self.score(catalog, item, stat)?,
            });
        }
        for item in agent.inventory.iter().filter(|i| catalog.is_tool(i.def)) {
            consider(ScoredTool {
                item: item.id,
                def: item.def,
                source: ToolSource::Inventory,
                quality: item.quality,
                score: self.score(catalog, item, stat)?,
            });
        }
        if view.settings.virtual_tools_enabled {
            for item in &agent.inventory {
                if let Some(score) = self.virtual_score(catalog, item, stat)? {
                    consider(ScoredTool {
                        item: item.id,
                        def: item.def,
                        source: ToolSource::Virtual,
                        quality: item.quality,
                        score,
                    });
                }
            }
        }
        Ok(best)
    }

    /// The agent's effective value for `stat`: the best tool's score or
    /// the baseline.
    pub fn current_score(
        &self,
        view: &WorldView<'_>,
        agent: &Agent,
        stat: StatId,
    ) -> Result<f32, GateError> {
        match self.best_tool(view, agent, stat)? {
            Some(tool) => Ok(tool.score),
            None => self.baseline(view.catalog, stat),
        }
    }

    /// Highest score `item` achieves for any stat its definition lists.
    ///
    /// Used to decide which tools are most worth keeping.
    pub fn usefulness(&self, catalog: &Catalog, item: &Item) -> Result<f32, GateError> {
        let def = catalog
            .thing(item.def)
            .ok_or(GateError::UnknownThing(item.def))?;
        let mut best = 0.0_f32;
        for &stat in def.stat_factors.keys() {
            best = best.max(self.score(catalog, item, stat)?);
        }
        Ok(best)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use toolgate_types::{CellPos, Mode};
    use toolgate_world::{GridMap, MaterialDef, StartingDefs, create_starting_catalog};

    use super::*;
    use crate::config::GateSettings;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn setup() -> (Catalog, StartingDefs, GridMap, GateSettings) {
        let (catalog, defs) = create_starting_catalog().unwrap();
        (
            catalog,
            defs,
            GridMap::new(10, 10),
            GateSettings::for_mode(Mode::Hardcore),
        )
    }

    #[test]
    fn steel_pickaxe_scores_its_factor() {
        let (catalog, defs, ..) = setup();
        let pickaxe = Item::new(defs.pickaxe, Some(defs.steel));
        let score = ToolScorer::new().score(&catalog, &pickaxe, defs.digging_speed).unwrap();
        assert!(approx(score, 1.3));
    }

    #[test]
    fn material_quality_and_condition_scale_the_bonus() {
        let (catalog, defs, ..) = setup();
        let scorer = ToolScorer::new();
        let plasteel = Item::new(defs.pickaxe, Some(defs.plasteel));
        assert!(approx(
            scorer.score(&catalog, &plasteel, defs.digging_speed).unwrap(),
            1.0 + 0.3 * 1.3
        ));

        let legendary =
            Item::new(defs.pickaxe, Some(defs.steel)).with_quality(QualityCategory::Legendary);
        assert!(approx(
            scorer.score(&catalog, &legendary, defs.digging_speed).unwrap(),
            1.45
        ));

        let broken = Item::new(defs.pickaxe, Some(defs.steel)).with_hit_points(0);
        assert!(approx(
            scorer.score(&catalog, &broken, defs.digging_speed).unwrap(),
            1.15
        ));
    }

    #[test]
    fn missing_factor_scores_baseline() {
        let (catalog, defs, ..) = setup();
        let axe = Item::new(defs.axe, Some(defs.steel));
        let score = ToolScorer::new().score(&catalog, &axe, defs.digging_speed).unwrap();
        assert!(approx(score, 1.0));
        assert!(!beats_baseline(score, 1.0));
    }

    #[test]
    fn quirks_apply_in_registration_order() {
        let (catalog, defs, ..) = setup();
        let pickaxe = Item::new(defs.pickaxe, Some(defs.steel));

        let mut add_then_mul = ToolScorer::new();
        add_then_mul.register_quirk(Box::new(TagQuirk::new(
            "sharp",
            "tool:mining",
            QuirkEffect::Add(0.2),
        )));
        add_then_mul.register_quirk(Box::new(TagQuirk::new(
            "heavy",
            "tool:mining",
            QuirkEffect::Multiply(2.0),
        )));
        let mut mul_then_add = ToolScorer::new();
        mul_then_add.register_quirk(Box::new(TagQuirk::new(
            "heavy",
            "tool:mining",
            QuirkEffect::Multiply(2.0),
        )));
        mul_then_add.register_quirk(Box::new(TagQuirk::new(
            "sharp",
            "tool:mining",
            QuirkEffect::Add(0.2),
        )));

        let a = add_then_mul.score(&catalog, &pickaxe, defs.digging_speed).unwrap();
        let b = mul_then_add.score(&catalog, &pickaxe, defs.digging_speed).unwrap();
        assert!(approx(a, 3.0));
        assert!(approx(b, 2.8));
        assert_eq!(add_then_mul.quirk_names(), vec!["sharp", "heavy"]);
    }

    #[test]
    fn stat_restricted_quirk_ignores_other_stats() {
        let (catalog, defs, ..) = setup();
        let pickaxe = Item::new(defs.pickaxe, Some(defs.steel));
        let mut scorer = ToolScorer::new();
        scorer.register_quirk(Box::new(
            TagQuirk::new("yield", "tool:mining", QuirkEffect::Add(0.5))
                .for_stat(defs.mining_yield),
        ));
        assert!(approx(
            scorer.score(&catalog, &pickaxe, defs.digging_speed).unwrap(),
            1.3
        ));
        assert!(approx(
            scorer.score(&catalog, &pickaxe, defs.mining_yield).unwrap(),
            1.65
        ));
    }

    #[test]
    fn best_tool_scans_equipped_and_inventory() {
        let (catalog, defs, map, settings) = setup();
        let view = WorldView::new(&settings, &catalog, &map, 0);
        let mut agent = Agent::colonist("Alder", CellPos::new(0, 0));
        agent.equip(Item::new(defs.axe, Some(defs.steel)));
        let pickaxe = Item::new(defs.pickaxe, Some(defs.steel));
        let pickaxe_id = pickaxe.id;
        agent.inventory.push(pickaxe);

        let scorer = ToolScorer::new();
        let best = scorer.best_tool(&view, &agent, defs.digging_speed).unwrap().unwrap();
        assert_eq!(best.item, pickaxe_id);
        assert_eq!(best.source, ToolSource::Inventory);

        assert!(scorer.best_tool(&view, &agent, defs.smoothing_speed).unwrap().is_none());
        assert!(approx(
            scorer.current_score(&view, &agent, defs.smoothing_speed).unwrap(),
            1.0
        ));
    }

    #[test]
    fn virtual_substitute_requires_setting() {
        let (catalog, defs, map, mut settings) = setup();
        let mut agent = Agent::colonist("Birch", CellPos::new(0, 0));
        agent
            .inventory
            .push(Item::new(defs.granite_chunk, Some(defs.granite)).with_stack(20));
        let scorer = ToolScorer::new();

        let view = WorldView::new(&settings, &catalog, &map, 0);
        let best = scorer.best_tool(&view, &agent, defs.digging_speed).unwrap().unwrap();
        assert!(best.is_virtual());
        assert!(approx(best.score, 1.05));

        settings.virtual_tools_enabled = false;
        let view = WorldView::new(&settings, &catalog, &map, 0);
        assert!(scorer.best_tool(&view, &agent, defs.digging_speed).unwrap().is_none());
    }

    #[test]
    fn tie_prefers_real_tool_over_virtual() {
        let (mut catalog, defs, map, settings) = setup();
        let mut profile = MaterialDef::new("flint", "flint", 0.5);
        profile.virtual_tool.insert(defs.smoothing_speed, 1.4);
        let flint = catalog.add_material(profile).unwrap();
        let flint_chunk = catalog
            .add_thing(ThingDef::raw("flint_chunk", "flint chunk", flint))
            .unwrap();
        let view = WorldView::new(&settings, &catalog, &map, 0);

        let mut agent = Agent::colonist("Cedar", CellPos::new(0, 0));
        agent.inventory.push(Item::new(flint_chunk, Some(flint)));
        let chisel = Item::new(defs.chisel, Some(defs.steel));
        let chisel_id = chisel.id;
        agent.inventory.push(chisel);

        let best = ToolScorer::new()
            .best_tool(&view, &agent, defs.smoothing_speed)
            .unwrap()
            .unwrap();
        assert_eq!(best.item, chisel_id);
    }

    #[test]
    fn tie_prefers_higher_quality() {
        let (mut catalog, defs, map, settings) = setup();
        let bronze = catalog.add_material(MaterialDef::new("bronze", "bronze", 1.1)).unwrap();
        let view = WorldView::new(&settings, &catalog, &map, 0);

        let mut agent = Agent::colonist("Dell", CellPos::new(0, 0));
        agent.inventory.push(Item::new(defs.pickaxe, Some(bronze)));
        let good = Item::new(defs.pickaxe, Some(defs.steel)).with_quality(QualityCategory::Good);
        let good_id = good.id;
        agent.inventory.push(good);

        let best = ToolScorer::new()
            .best_tool(&view, &agent, defs.digging_speed)
            .unwrap()
            .unwrap();
        assert_eq!(best.item, good_id);
    }

    #[test]
    fn unknown_definition_is_an_error() {
        let (catalog, defs, ..) = setup();
        let ghost = Item::new(ThingDefId(999), None);
        assert!(matches!(
            ToolScorer::new().score(&catalog, &ghost, defs.digging_speed),
            Err(GateError::UnknownThing(_))
        ));
        assert!(matches!(
            ToolScorer::new().baseline(&catalog, StatId(999)),
            Err(GateError::UnknownStat(_))
        ));
    }

    #[test]
    fn usefulness_is_the_best_stat_score() {
        let (catalog, defs, ..) = setup();
        let hammer = Item::new(defs.hammer, Some(defs.steel));
        assert!(approx(ToolScorer::new().usefulness(&catalog, &hammer).unwrap(), 1.3));
    }
}
