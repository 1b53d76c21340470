//! Configuration loading and the immutable settings snapshot.
//!
//! The canonical configuration lives in `toolgate-config.yaml` at the
//! project root. [`GateConfig`] mirrors that file; every field has a
//! default so an empty file is valid. Entry points never read the config
//! directly: the host calls [`GateConfig::snapshot`] and passes the
//! resulting [`GateSettings`] into each evaluation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use toolgate_types::{Mode, WorkCategory};

/// Environment variable that overrides [`GateConfig::mode`].
pub const MODE_ENV_VAR: &str = "TOOLGATE_MODE";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level gating configuration.
///
/// Mirrors the structure of `toolgate-config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Difficulty tier.
    #[serde(default)]
    pub mode: Mode,

    /// Master switch for job gating.
    #[serde(default = "default_true")]
    pub gating_enabled: bool,

    /// Whether the interactive rescue menu is offered.
    #[serde(default = "default_true")]
    pub rescue_enabled: bool,

    /// Whether carried raw materials can stand in for tools.
    #[serde(default = "default_true")]
    pub virtual_tools_enabled: bool,

    /// Minimum improvement over the current best, in percent, for an
    /// upgrade to be worth fetching.
    #[serde(default = "default_min_gain_pct")]
    pub min_gain_pct: f32,

    /// Search radius for acquisition candidates, in cells.
    #[serde(default = "default_search_radius")]
    pub search_radius: u32,

    /// Maximum path cost an acquisition may incur.
    #[serde(default = "default_path_cost_budget")]
    pub path_cost_budget: u32,

    /// Carry limit policy (strictest mode only).
    #[serde(default)]
    pub carry_limit: CarryLimitConfig,

    /// Minimum ticks between two identical block messages for one agent.
    #[serde(default = "default_message_cooldown_ticks")]
    pub message_cooldown_ticks: u64,

    /// Third-party integrations contributing stat requirements.
    #[serde(default)]
    pub integrations: Vec<IntegrationConfig>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            gating_enabled: true,
            rescue_enabled: true,
            virtual_tools_enabled: true,
            min_gain_pct: default_min_gain_pct(),
            search_radius: default_search_radius(),
            path_cost_budget: default_path_cost_budget(),
            carry_limit: CarryLimitConfig::default(),
            message_cooldown_ticks: default_message_cooldown_ticks(),
            integrations: Vec::new(),
        }
    }
}

impl GateConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `TOOLGATE_MODE` overrides `mode` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override values with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(MODE_ENV_VAR) {
            self.apply_mode_override(&val);
        }
    }

    /// Replace `mode` with a textual mode name. Unknown names are logged
    /// and ignored.
    pub fn apply_mode_override(&mut self, value: &str) {
        match parse_mode(value) {
            Some(mode) => self.mode = mode,
            None => tracing::warn!(value, "ignoring unknown {MODE_ENV_VAR}"),
        }
    }

    /// Reject values no evaluation could work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_gain_pct.is_finite() || self.min_gain_pct < 0.0 {
            return Err(ConfigError::Invalid {
                field: "min_gain_pct",
                reason: format!("must be a non-negative number, got {}", self.min_gain_pct),
            });
        }
        if self.carry_limit.enabled && self.carry_limit.base_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "carry_limit.base_limit",
                reason: String::from("must be at least 1 when the limit is enabled"),
            });
        }
        for integration in &self.integrations {
            if integration.name.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "integrations.name",
                    reason: String::from("must not be empty"),
                });
            }
        }
        Ok(())
    }

    /// Freeze the current values into an immutable snapshot.
    ///
    /// `revision` identifies this snapshot; caches derived from settings
    /// are dropped whenever it changes.
    pub const fn snapshot(&self, revision: u64) -> GateSettings {
        GateSettings {
            revision,
            mode: self.mode,
            gating_enabled: self.gating_enabled,
            rescue_enabled: self.rescue_enabled,
            virtual_tools_enabled: self.virtual_tools_enabled,
            min_gain_pct: self.min_gain_pct,
            search_radius: self.search_radius,
            path_cost_budget: self.path_cost_budget,
            carry_limit_enabled: self.carry_limit.enabled,
            carry_base_limit: self.carry_limit.base_limit,
            message_cooldown_ticks: self.message_cooldown_ticks,
        }
    }
}

/// Carry limit policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryLimitConfig {
    /// Whether the limit is enforced in the strictest mode.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of tools an agent may carry.
    #[serde(default = "default_base_limit")]
    pub base_limit: u32,
}

impl Default for CarryLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_limit: default_base_limit(),
        }
    }
}

/// Descriptor of a third-party integration.
///
/// Each descriptor becomes a `StatBindingModule` in the compatibility
/// registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// Unique module name.
    pub name: String,

    /// Whether the host detected the integration.
    #[serde(default = "default_true")]
    pub active: bool,

    /// Work categories the module has jurisdiction over.
    #[serde(default)]
    pub categories: Vec<WorkCategory>,

    /// Names of the stats the module contributes.
    #[serde(default)]
    pub stats: Vec<String>,

    /// Modes in which the contributed stats hard-block.
    #[serde(default = "default_blocking_modes")]
    pub blocking_modes: Vec<Mode>,
}

/// Immutable settings snapshot passed into every top-level entry point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateSettings {
    /// Snapshot revision, part of every settings-derived cache key.
    pub revision: u64,
    /// Difficulty tier.
    pub mode: Mode,
    /// Master switch for job gating.
    pub gating_enabled: bool,
    /// Whether the rescue menu is offered.
    pub rescue_enabled: bool,
    /// Whether raw materials can stand in for tools.
    pub virtual_tools_enabled: bool,
    /// Minimum upgrade gain, in percent.
    pub min_gain_pct: f32,
    /// Acquisition search radius, in cells.
    pub search_radius: u32,
    /// Acquisition path cost cap.
    pub path_cost_budget: u32,
    /// Whether the carry limit is configured on.
    pub carry_limit_enabled: bool,
    /// Configured carry limit.
    pub carry_base_limit: u32,
    /// Block message cooldown, in ticks.
    pub message_cooldown_ticks: u64,
}

impl Default for GateSettings {
    fn default() -> Self {
        GateConfig::default().snapshot(0)
    }
}

impl GateSettings {
    /// Default settings in `mode`.
    pub fn for_mode(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Whether the gate may block at all under these settings.
    pub const fn gating_active(&self) -> bool {
        self.gating_enabled && self.mode.gates_jobs()
    }

    /// Whether the carry limit is enforced under these settings.
    pub const fn carry_enforced(&self) -> bool {
        self.carry_limit_enabled && self.mode.is_strictest()
    }
}

fn parse_mode(value: &str) -> Option<Mode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "normal" => Some(Mode::Normal),
        "hardcore" => Some(Mode::Hardcore),
        "nightmare" => Some(Mode::Nightmare),
        _ => None,
    }
}

const fn default_true() -> bool {
    true
}

const fn default_min_gain_pct() -> f32 {
    10.0
}

const fn default_search_radius() -> u32 {
    40
}

const fn default_path_cost_budget() -> u32 {
    300
}

const fn default_base_limit() -> u32 {
    3
}

const fn default_message_cooldown_ticks() -> u64 {
    600
}

fn default_blocking_modes() -> Vec<Mode> {
    vec![Mode::Hardcore, Mode::Nightmare]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GateConfig::default();
        assert_eq!(config.mode, Mode::Normal);
        assert_eq!(config.search_radius, 40);
        assert_eq!(config.path_cost_budget, 300);
        assert_eq!(config.carry_limit.base_limit, 3);
        assert_eq!(config.message_cooldown_ticks, 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
mode: nightmare
gating_enabled: true
rescue_enabled: false
virtual_tools_enabled: false
min_gain_pct: 25.0
search_radius: 12
path_cost_budget: 80
carry_limit:
  enabled: true
  base_limit: 2
message_cooldown_ticks: 100
integrations:
  - name: research_bench
    active: false
    categories: [research]
    stats: [research_speed]
    blocking_modes: [nightmare]
";
        let mut config: GateConfig = serde_yml::from_str(yaml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.mode, Mode::Nightmare);
        assert!(!config.rescue_enabled);
        assert!(!config.virtual_tools_enabled);
        assert_eq!(config.search_radius, 12);
        assert_eq!(config.carry_limit.base_limit, 2);
        assert_eq!(config.integrations.len(), 1);
        let integration = config.integrations.first().unwrap();
        assert!(!integration.active);
        assert_eq!(integration.categories, vec![WorkCategory::Research]);
        assert_eq!(integration.blocking_modes, vec![Mode::Nightmare]);

        config.apply_mode_override("Hardcore");
        assert_eq!(config.mode, Mode::Hardcore);
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let config: GateConfig = serde_yml::from_str("search_radius: 5\n").unwrap();
        assert_eq!(config.search_radius, 5);
        assert!(config.gating_enabled);
        assert_eq!(config.path_cost_budget, 300);
    }

    #[test]
    fn integration_defaults() {
        let config: GateConfig =
            serde_yml::from_str("integrations:\n  - name: extra\n").unwrap();
        let integration = config.integrations.first().unwrap();
        assert!(integration.active);
        assert!(integration.stats.is_empty());
        assert_eq!(
            integration.blocking_modes,
            vec![Mode::Hardcore, Mode::Nightmare]
        );
    }

    #[test]
    fn unknown_mode_override_is_ignored() {
        let mut config = GateConfig::default();
        config.apply_mode_override("apocalypse");
        assert_eq!(config.mode, Mode::Normal);
    }

    #[test]
    fn zero_carry_limit_rejected() {
        let mut config = GateConfig::default();
        config.carry_limit.base_limit = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "carry_limit.base_limit",
                ..
            })
        ));
    }

    #[test]
    fn snapshot_carries_revision() {
        let mut config = GateConfig::default();
        config.mode = Mode::Nightmare;
        let settings = config.snapshot(7);
        assert_eq!(settings.revision, 7);
        assert!(settings.gating_active());
        assert!(settings.carry_enforced());
        assert!(!GateSettings::for_mode(Mode::Hardcore).carry_enforced());
        assert!(!GateSettings::default().gating_active());
    }
}
