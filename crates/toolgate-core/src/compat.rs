//! Compatibility registry: third-party integrations contributing stats.
//!
//! Each integration registers a [`CompatibilityModule`] once at startup.
//! Modules declare the work categories they have jurisdiction over, the
//! extra stats those works depend on, and optionally whether one of those
//! stats hard-blocks in a given mode. Nothing reflects into foreign code;
//! the module hands over typed data.
//!
//! Initialization is isolated per module: a failing module is logged,
//! marked inactive for the session, and never stops the others. Dispatch
//! only ever consults active modules, so an inactive or absent module
//! contributes nothing.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use toolgate_types::{Mode, StatId, WorkCategory};
use toolgate_world::Catalog;
use tracing::{debug, info, warn};

use crate::config::IntegrationConfig;
use crate::error::ModuleError;

/// A pluggable integration contributing stat requirements.
pub trait CompatibilityModule {
    /// Unique module name.
    fn name(&self) -> &str;

    /// Whether the integration is present in this session.
    fn is_mod_active(&self) -> bool;

    /// Resolve whatever the module needs from the catalog. Must be
    /// idempotent.
    fn initialize(&mut self, catalog: &Catalog) -> Result<(), ModuleError>;

    /// Extra stats the module cares about.
    fn compatibility_stats(&self) -> &[StatId];

    /// Whether work in `category` falls under this module.
    fn claims(&self, category: WorkCategory) -> bool;

    /// Jurisdiction predicate: for claimed work, whether `stat`
    /// hard-blocks in `mode`. `None` defers to the stat's own gating.
    fn stat_required(&self, _stat: StatId, _mode: Mode) -> Option<bool> {
        None
    }

    /// Free-form diagnostics for the debug report.
    fn debug_info(&self) -> String {
        String::new()
    }
}

// ---------------------------------------------------------------------------
// StatBindingModule
// ---------------------------------------------------------------------------

/// Data-driven module: claims categories, contributes named stats, and
/// makes them block in a fixed set of modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatBindingModule {
    name: String,
    active: bool,
    categories: BTreeSet<WorkCategory>,
    stat_names: Vec<String>,
    stats: Vec<StatId>,
    blocking_modes: BTreeSet<Mode>,
}

impl StatBindingModule {
    /// A module with no claims, blocking in Hardcore and Nightmare.
    pub fn new(name: &str, active: bool) -> Self {
        Self {
            name: String::from(name),
            active,
            categories: BTreeSet::new(),
            stat_names: Vec::new(),
            stats: Vec::new(),
            blocking_modes: [Mode::Hardcore, Mode::Nightmare].into_iter().collect(),
        }
    }

    /// Build a module from its config descriptor.
    pub fn from_config(config: &IntegrationConfig) -> Self {
        Self {
            name: config.name.clone(),
            active: config.active,
            categories: config.categories.iter().copied().collect(),
            stat_names: config.stats.clone(),
            stats: Vec::new(),
            blocking_modes: config.blocking_modes.iter().copied().collect(),
        }
    }

    /// Claim a work category, builder-style.
    #[must_use]
    pub fn claiming(mut self, category: WorkCategory) -> Self {
        self.categories.insert(category);
        self
    }

    /// Contribute a stat by name, builder-style.
    #[must_use]
    pub fn contributing(mut self, stat: &str) -> Self {
        self.stat_names.push(String::from(stat));
        self
    }

    /// Replace the blocking modes, builder-style.
    #[must_use]
    pub fn blocking_in(mut self, modes: &[Mode]) -> Self {
        self.blocking_modes = modes.iter().copied().collect();
        self
    }
}

impl CompatibilityModule for StatBindingModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_mod_active(&self) -> bool {
        self.active
    }

    fn initialize(&mut self, catalog: &Catalog) -> Result<(), ModuleError> {
        let mut resolved = Vec::with_capacity(self.stat_names.len());
        for stat_name in &self.stat_names {
            let stat = catalog
                .stat_named(stat_name)
                .ok_or_else(|| ModuleError::UnknownStat {
                    module: self.name.clone(),
                    stat: stat_name.clone(),
                })?;
            if !resolved.contains(&stat) {
                resolved.push(stat);
            }
        }
        self.stats = resolved;
        Ok(())
    }

    fn compatibility_stats(&self) -> &[StatId] {
        &self.stats
    }

    fn claims(&self, category: WorkCategory) -> bool {
        self.categories.contains(&category)
    }

    fn stat_required(&self, stat: StatId, mode: Mode) -> Option<bool> {
        self.stats
            .contains(&stat)
            .then_some(self.blocking_modes.contains(&mode))
    }

    fn debug_info(&self) -> String {
        format!(
            "categories={:?} stats={:?} blocking={:?}",
            self.categories, self.stat_names, self.blocking_modes
        )
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

struct ModuleSlot {
    module: Box<dyn CompatibilityModule>,
    initialized: bool,
    failure: Option<String>,
}

impl ModuleSlot {
    fn is_active(&self) -> bool {
        self.initialized && self.failure.is_none() && self.module.is_mod_active()
    }
}

/// One line of [`CompatibilityRegistry::debug_report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReport {
    /// Module name.
    pub name: String,
    /// Whether the module takes part in dispatch.
    pub active: bool,
    /// Whether initialization succeeded.
    pub initialized: bool,
    /// Initialization failure, if any.
    pub failure: Option<String>,
    /// Contributed stats.
    pub stats: Vec<StatId>,
    /// Module diagnostics.
    pub debug: String,
}

/// Ordered, name-deduplicated collection of compatibility modules.
#[derive(Default)]
pub struct CompatibilityRegistry {
    slots: Vec<ModuleSlot>,
    revision: u64,
}

impl core::fmt::Debug for CompatibilityRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CompatibilityRegistry")
            .field("modules", &self.names())
            .field("revision", &self.revision)
            .finish()
    }
}

impl CompatibilityRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// One [`StatBindingModule`] per config descriptor. Duplicates are
    /// logged and skipped.
    pub fn from_integrations(integrations: &[IntegrationConfig]) -> Self {
        let mut registry = Self::new();
        for integration in integrations {
            if let Err(err) =
                registry.register(Box::new(StatBindingModule::from_config(integration)))
            {
                warn!(error = %err, "skipping integration");
            }
        }
        registry
    }

    /// Register a module. Names are unique.
    pub fn register(&mut self, module: Box<dyn CompatibilityModule>) -> Result<(), ModuleError> {
        if self.slots.iter().any(|s| s.module.name() == module.name()) {
            return Err(ModuleError::Duplicate(String::from(module.name())));
        }
        debug!(module = module.name(), "compatibility module registered");
        self.slots.push(ModuleSlot {
            module,
            initialized: false,
            failure: None,
        });
        self.revision = self.revision.saturating_add(1);
        Ok(())
    }

    /// Initialize every module not yet initialized.
    ///
    /// Failures are logged and returned; the failing module stays
    /// inactive for the session and the rest carry on.
    pub fn initialize_all(&mut self, catalog: &Catalog) -> Vec<ModuleError> {
        let mut errors = Vec::new();
        for slot in &mut self.slots {
            if slot.initialized || slot.failure.is_some() {
                continue;
            }
            match slot.module.initialize(catalog) {
                Ok(()) => {
                    slot.initialized = true;
                    info!(
                        module = slot.module.name(),
                        active = slot.module.is_mod_active(),
                        "compatibility module initialized"
                    );
                }
                Err(err) => {
                    warn!(module = slot.module.name(), error = %err, "compatibility module failed to initialize");
                    slot.failure = Some(err.to_string());
                    errors.push(err);
                }
            }
        }
        self.revision = self.revision.saturating_add(1);
        errors
    }

    /// Bumped whenever the set of modules or their state changes.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no module is registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Registered module names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.module.name()).collect()
    }

    /// Whether the named module is registered and active.
    pub fn is_active(&self, name: &str) -> bool {
        self.slots
            .iter()
            .any(|s| s.module.name() == name && s.is_active())
    }

    fn active(&self) -> impl Iterator<Item = &dyn CompatibilityModule> {
        self.slots
            .iter()
            .filter(|s| s.is_active())
            .map(|s| s.module.as_ref())
    }

    /// Stats contributed by active modules claiming `category`, in
    /// registration order without duplicates.
    pub fn contributed_stats(&self, category: WorkCategory) -> Vec<StatId> {
        let mut stats = Vec::new();
        for module in self.active().filter(|m| m.claims(category)) {
            for &stat in module.compatibility_stats() {
                if !stats.contains(&stat) {
                    stats.push(stat);
                }
            }
        }
        stats
    }

    /// First opinion of an active module claiming `category` on whether
    /// `stat` blocks in `mode`.
    pub fn jurisdiction(&self, category: WorkCategory, stat: StatId, mode: Mode) -> Option<bool> {
        self.active()
            .filter(|m| m.claims(category))
            .find_map(|m| m.stat_required(stat, mode))
    }

    /// Per-module diagnostics.
    pub fn debug_report(&self) -> Vec<ModuleReport> {
        self.slots
            .iter()
            .map(|s| ModuleReport {
                name: String::from(s.module.name()),
                active: s.is_active(),
                initialized: s.initialized,
                failure: s.failure.clone(),
                stats: s.module.compatibility_stats().to_vec(),
                debug: s.module.debug_info(),
            })
            .collect()
    }
}
