//! Configuration types deserialized from `mvnet.toml`.

use serde::Deserialize;

/// The top-level engine configuration parsed from `mvnet.toml`.
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Default, Deserialize)]
pub struct EngineConfig {
    /// Network naming and capacity limits.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Global (decision-diagram) composition settings.
    #[serde(default)]
    pub global: GlobalConfig,
    /// Which optimization passes the pass runner executes.
    #[serde(default)]
    pub passes: PassConfig,
}

/// Network-level settings.
#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    /// Name given to networks created from this configuration.
    #[serde(default = "default_network_name")]
    pub name: String,
    /// Upper bound on the number of nodes a single network may hold.
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: default_network_name(),
            max_nodes: default_max_nodes(),
        }
    }
}

fn default_network_name() -> String {
    "network".to_string()
}

fn default_max_nodes() -> usize {
    1 << 24
}

/// Settings for computing global functions over the primary inputs.
#[derive(Debug, Deserialize)]
pub struct GlobalConfig {
    /// Enables dynamic variable reordering during composition.
    #[serde(default)]
    pub reorder: bool,
    /// Wall-clock budget in milliseconds; unlimited when absent.
    pub timeout_ms: Option<u64>,
    /// Only compose the cones of latch inputs instead of all outputs.
    #[serde(default)]
    pub from_latches_only: bool,
    /// Release intermediate results once their last consumer is composed.
    #[serde(default = "default_true")]
    pub drop_intermediate: bool,
    /// How primary inputs are ordered before variables are created.
    #[serde(default)]
    pub input_order: InputOrder,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            reorder: false,
            timeout_ms: None,
            from_latches_only: false,
            drop_intermediate: true,
            input_order: InputOrder::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Primary-input ordering heuristic used before variable allocation.
#[derive(Debug, Default, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum InputOrder {
    /// Interleave inputs by depth-first traversal from the outputs (default).
    #[default]
    Interleave,
    /// Keep the network's primary-input list order.
    Natural,
}

/// Selection of optimization passes.
#[derive(Debug, Deserialize)]
pub struct PassConfig {
    /// Eliminate constant and single-input nodes, then delete dangling logic.
    #[serde(default = "default_true")]
    pub sweep: bool,
    /// Drop fanins that are outside each node's true support.
    #[serde(default = "default_true")]
    pub minimum_base: bool,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            sweep: true,
            minimum_base: true,
        }
    }
}
