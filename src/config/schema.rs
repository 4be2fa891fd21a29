//! Configuration schema definitions.
//!
//! This module defines the structure of a topology file.
//! All types derive Serde traits for deserialization from TOML.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

pub use crate::health::state::WarnPolicy;
use crate::topology::{ComponentId, EndpointConfig, PingEntry, RPI_PING_TABLE};

/// Root configuration for the topology.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Ground-link endpoint handed to the comm driver.
    pub endpoint: EndpointConfig,

    /// Assembly-phase settings.
    pub assembly: AssemblyConfig,

    /// Watchdog policy.
    pub watchdog: WatchdogConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Ping thresholds keyed by component instance name.
    pub ping: BTreeMap<ComponentId, PingEntry>,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            assembly: AssemblyConfig::default(),
            watchdog: WatchdogConfig::default(),
            observability: ObservabilityConfig::default(),
            ping: RPI_PING_TABLE.iter().collect(),
        }
    }
}

/// Assembly-phase configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Cap on bytes allocated while building the topology (unbounded if unset).
    pub memory_budget_bytes: Option<usize>,
}

/// Watchdog configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchdogConfig {
    pub warn_policy: WarnPolicy,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
