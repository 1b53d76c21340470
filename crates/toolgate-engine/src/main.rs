//! Demo host for the toolgate gating engine.
//!
//! Seeds a small colony, runs the gate over a fixed number of ticks, then
//! opens the rescue menu for every colonist on a designated rock cell and
//! carries out the first actionable option. A JSON report goes to stdout;
//! logs go to stderr.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging via `tracing-subscriber`
//! 2. Load `toolgate-config.yaml` (or defaults), apply `TOOLGATE_MODE`
//! 3. Build the definition catalog
//! 4. Register and initialize compatibility modules
//! 5. Generate the demo colony
//! 6. Run the tick loop
//! 7. Build rescue menus and execute one option
//! 8. Print the report

mod colony;
mod error;
mod runner;

use std::path::Path;

use serde::Serialize;
use toolgate_core::{
    CompatibilityRegistry, ConfigError, GateConfig, GateStats, JobGate, MenuOption,
    MenuOptionSummary, ModuleReport, RescueOptionBuilder, RescueOutcome, ScanContext, ToolScorer,
    WorldView,
};
use toolgate_types::Mode;
use toolgate_world::{JobBoard, Message, MessageLog, create_starting_catalog};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::colony::DemoConfig;
use crate::error::EngineError;
use crate::runner::RunSummary;

/// Configuration file read from the working directory.
const CONFIG_PATH: &str = "toolgate-config.yaml";

/// One colonist's rescue menu.
#[derive(Debug, Serialize)]
struct ColonistMenu {
    colonist: String,
    options: Vec<MenuOptionSummary>,
}

/// Everything the demo prints.
#[derive(Debug, Serialize)]
struct Report {
    mode: Mode,
    run: RunSummary,
    gate: GateStats,
    menus: Vec<ColonistMenu>,
    rescue: Option<RescueOutcome>,
    messages: Vec<String>,
    modules: Vec<ModuleReport>,
}

#[allow(clippy::too_many_lines)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("toolgate-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    let settings = config.snapshot(0);
    info!(
        mode = %settings.mode,
        gating_enabled = settings.gating_enabled,
        rescue_enabled = settings.rescue_enabled,
        integrations = config.integrations.len(),
        "Configuration loaded"
    );

    // 3. Build the definition catalog.
    let (catalog, defs) = create_starting_catalog()?;
    info!(
        stats = catalog.stats().count(),
        work_givers = catalog.work_givers().count(),
        "Catalog created"
    );

    // 4. Register and initialize compatibility modules.
    let mut registry = CompatibilityRegistry::from_integrations(&config.integrations);
    for failure in registry.initialize_all(&catalog) {
        warn!(error = %failure, "Compatibility module unavailable");
    }
    info!(
        modules = registry.len(),
        revision = registry.revision(),
        "Compatibility modules initialized"
    );

    // 5. Generate the demo colony.
    let demo = load_demo_config()?;
    let mut colony = colony::build_colony(&demo, &defs)?;

    // 6. Run the tick loop.
    let mut gate = JobGate::new(ToolScorer::new(), registry);
    let mut board = JobBoard::new();
    let mut log = MessageLog::new();
    let run = runner::run(
        demo.ticks,
        &settings,
        &catalog,
        &mut colony,
        &mut gate,
        &mut board,
        &mut log,
    );

    // 7. Build rescue menus and execute the first actionable option.
    let mut builder = RescueOptionBuilder::with_default_scanners(&catalog);
    info!(scanners = ?builder.scanner_names(), "Rescue scanners registered");
    let view = WorldView::new(&settings, &catalog, &colony.map, run.ticks);
    let ctx = ScanContext::at(1, &colony.map, colony.click);
    let mut menus = Vec::with_capacity(colony.agents.len());
    let mut rescue = None;
    for agent in &colony.agents {
        let options = builder.build_menu(&mut gate, &view, &board, agent, &ctx);
        let action = rescue
            .is_none()
            .then(|| options.iter().find_map(|o| o.action.as_ref()))
            .flatten();
        if let Some(action) = action {
            let outcome =
                builder.execute(&mut gate, &view, &mut board, &mut log, agent, action)?;
            info!(
                colonist = agent.name,
                acquisitions = outcome.acquisitions,
                interrupted = outcome.interrupted,
                "Rescue executed"
            );
            rescue = Some(outcome);
        }
        menus.push(ColonistMenu {
            colonist: agent.name.clone(),
            options: options.iter().map(MenuOption::summary).collect(),
        });
    }

    // 8. Print the report.
    let report = Report {
        mode: settings.mode,
        run,
        gate: gate.stats(),
        menus,
        rescue,
        messages: log.drain().iter().map(Message::fallback_text).collect(),
        modules: gate.registry().debug_report(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    info!("toolgate-engine finished");
    Ok(())
}

/// Load configuration from `toolgate-config.yaml` if present, otherwise use
/// defaults. The mode override and validation apply either way.
fn load_config() -> Result<GateConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        let config = GateConfig::from_file(config_path)?;
        Ok(config)
    } else {
        info!("Config file not found, using defaults");
        let mut config = GateConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

/// Load the `demo` section of `toolgate-config.yaml`, falling back to
/// defaults when the file or the section is missing.
fn load_demo_config() -> Result<DemoConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if !config_path.exists() {
        return Ok(DemoConfig::default());
    }
    let contents = std::fs::read_to_string(config_path).map_err(ConfigError::from)?;
    let raw: serde_yml::Value = serde_yml::from_str(&contents).map_err(ConfigError::from)?;
    let Some(section) = raw.get("demo") else {
        info!("No demo section in config, using defaults");
        return Ok(DemoConfig::default());
    };
    let demo: DemoConfig = serde_yml::from_value(section.clone()).map_err(ConfigError::from)?;
    info!(
        seed = demo.seed,
        colonists = demo.colonists,
        ticks = demo.ticks,
        "Demo configuration loaded"
    );
    Ok(demo)
}
