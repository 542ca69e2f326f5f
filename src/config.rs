//! Scenario configuration surface (§6). Loading, reporting, and the
//! CLI/batch harness proper are out of scope (§1) — this is just the
//! `Deserialize` shape of the recognized config keys plus the validation
//! pass a loader would run before constructing a `Simulation`, grounded
//! on the teacher's `common::scene::{Scene, validate_scene}`.

use std::collections::HashSet;
use std::fs;

use anyhow::Context;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RouterKindConfig {
    Epidemic,
    SprayAndWait,
    Passive,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PriorityStrategyConfig {
    Random,
    Fifo,
    PrioritizedFifo,
    PrioritizedLffFifo,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ForwardingOrderManagerConfig {
    Unchanged,
    ExponentiallyDecaying,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum InterfaceTypeConfig {
    SimpleBroadcastInterface,
    InterferenceLimitedInterface,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterfaceConfig {
    #[serde(flatten)]
    pub kind: InterfaceTypeConfig,
    pub transmit_speed: f64,
    pub transmit_range: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovementModelConfig {
    pub rng_seed: u64,
    pub world_size: (f64, f64),
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    pub class: String,
    pub interval: f64,
    pub size: usize,
    #[serde(default)]
    pub hosts: Vec<u32>,
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizationConfig {
    #[serde(default = "default_cell_size_mult")]
    pub cell_size_mult: f64,
    #[serde(default)]
    pub randomize_update_order: bool,
}

fn default_cell_size_mult() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub nrof_reports: u32,
    #[serde(default)]
    pub report_dir: Option<String>,
    #[serde(default)]
    pub reports: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    pub group_id: String,
    pub movement_model: MovementModelConfig,
    pub router: RouterKindConfig,
    #[serde(default)]
    pub caching_priority: Option<PriorityStrategyConfig>,
    #[serde(default)]
    pub forwarding_order: Option<PriorityStrategyConfig>,
    #[serde(default)]
    pub forwarding_order_manager: Option<ForwardingOrderManagerConfig>,
    pub nrof_hosts: u32,
    pub nrof_interfaces: u32,
    pub interfaces: Vec<InterfaceConfig>,
    pub speed: f64,
    pub msg_ttl: Option<u32>,
    pub buffer_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub end_time: f64,
    pub update_interval: f64,
    #[serde(default = "default_true")]
    pub simulate_connections: bool,
    pub nrof_host_groups: u32,
    pub groups: Vec<GroupConfig>,
    #[serde(default)]
    pub events: Vec<EventsConfig>,
    #[serde(default)]
    pub optimization: Option<OptimizationConfig>,
    #[serde(default)]
    pub report: Option<ReportConfig>,
}

fn default_true() -> bool {
    true
}

/// Mirrors the teacher's `SceneLoadError`: a plain enum over the stages
/// that can fail, rather than a generic boxed error.
#[derive(Debug)]
pub enum ScenarioLoadError {
    FileReadError(String),
    ParseError(String),
    ValidationError(ConfigError),
}

impl std::fmt::Display for ScenarioLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioLoadError::FileReadError(msg) => write!(f, "failed to read scenario file: {msg}"),
            ScenarioLoadError::ParseError(msg) => write!(f, "failed to parse scenario JSON: {msg}"),
            ScenarioLoadError::ValidationError(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ScenarioLoadError {}

pub fn load_scenario(path: &str) -> Result<ScenarioConfig, ScenarioLoadError> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading {path}"))
        .map_err(|e| ScenarioLoadError::FileReadError(e.to_string()))?;
    let scenario: ScenarioConfig = serde_json::from_str(&data)
        .context("invalid scenario JSON")
        .map_err(|e| ScenarioLoadError::ParseError(e.to_string()))?;
    validate_scenario(&scenario).map_err(ScenarioLoadError::ValidationError)?;
    Ok(scenario)
}

/// Checks the structural constraints a `Simulation` builder relies on:
/// nonzero counts, a group per declared host-group slot, no duplicate
/// group ids, and every interface carrying a positive range and speed.
pub fn validate_scenario(scenario: &ScenarioConfig) -> Result<(), ConfigError> {
    if scenario.end_time <= 0.0 {
        return Err(ConfigError::Invalid("end_time must be positive".into()));
    }
    if scenario.update_interval <= 0.0 {
        return Err(ConfigError::Invalid("update_interval must be positive".into()));
    }
    if scenario.groups.len() != scenario.nrof_host_groups as usize {
        return Err(ConfigError::Invalid(format!(
            "nrof_host_groups ({}) does not match number of groups provided ({})",
            scenario.nrof_host_groups,
            scenario.groups.len()
        )));
    }

    let mut group_ids = HashSet::new();
    for group in &scenario.groups {
        if !group_ids.insert(group.group_id.clone()) {
            return Err(ConfigError::Invalid(format!("duplicate group id: {}", group.group_id)));
        }
        if group.nrof_hosts == 0 {
            return Err(ConfigError::Invalid(format!("group {} has nrof_hosts == 0", group.group_id)));
        }
        if group.interfaces.len() != group.nrof_interfaces as usize {
            return Err(ConfigError::Invalid(format!(
                "group {}: nrof_interfaces ({}) does not match interfaces provided ({})",
                group.group_id,
                group.nrof_interfaces,
                group.interfaces.len()
            )));
        }
        if group.buffer_size == 0 {
            return Err(ConfigError::Invalid(format!("group {} has buffer_size == 0", group.group_id)));
        }
        for iface in &group.interfaces {
            if iface.transmit_range <= 0.0 {
                return Err(ConfigError::Invalid(format!("group {}: interface transmit_range must be positive", group.group_id)));
            }
            if iface.transmit_speed <= 0.0 {
                return Err(ConfigError::Invalid(format!("group {}: interface transmit_speed must be positive", group.group_id)));
            }
        }
    }

    for events in &scenario.events {
        if events.interval <= 0.0 {
            return Err(ConfigError::Invalid(format!("events class {}: interval must be positive", events.class)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_group() -> GroupConfig {
        GroupConfig {
            group_id: "g1".into(),
            movement_model: MovementModelConfig { rng_seed: 1, world_size: (100.0, 100.0), model: None },
            router: RouterKindConfig::Epidemic,
            caching_priority: None,
            forwarding_order: None,
            forwarding_order_manager: None,
            nrof_hosts: 2,
            nrof_interfaces: 1,
            interfaces: vec![InterfaceConfig {
                kind: InterfaceTypeConfig::SimpleBroadcastInterface,
                transmit_speed: 1000.0,
                transmit_range: 10.0,
            }],
            speed: 1.0,
            msg_ttl: None,
            buffer_size: 1000,
        }
    }

    fn minimal_scenario() -> ScenarioConfig {
        ScenarioConfig {
            name: "test".into(),
            end_time: 100.0,
            update_interval: 1.0,
            simulate_connections: true,
            nrof_host_groups: 1,
            groups: vec![minimal_group()],
            events: Vec::new(),
            optimization: None,
            report: None,
        }
    }

    #[test]
    fn minimal_scenario_validates() {
        assert!(validate_scenario(&minimal_scenario()).is_ok());
    }

    #[test]
    fn rejects_group_count_mismatch() {
        let mut s = minimal_scenario();
        s.nrof_host_groups = 2;
        assert!(validate_scenario(&s).is_err());
    }

    #[test]
    fn rejects_zero_buffer_size() {
        let mut s = minimal_scenario();
        s.groups[0].buffer_size = 0;
        assert!(validate_scenario(&s).is_err());
    }

    #[test]
    fn rejects_duplicate_group_ids() {
        let mut s = minimal_scenario();
        s.groups.push(minimal_group());
        s.nrof_host_groups = 2;
        assert!(validate_scenario(&s).is_err());
    }

    #[test]
    fn rejects_nonpositive_interface_range() {
        let mut s = minimal_scenario();
        s.groups[0].interfaces[0].transmit_range = 0.0;
        assert!(validate_scenario(&s).is_err());
    }
}
