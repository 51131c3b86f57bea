//! Search configuration: depth bound, prediction threshold, cost model.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_depth must be at least 1")]
    ZeroDepth,

    #[error("prediction_threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("default_cost_ceiling must be positive and finite, got {0}")]
    InvalidCeiling(f64),

    #[error("cost model field '{field}' must be non-negative and finite, got {value}")]
    InvalidCost { field: &'static str, value: f64 },
}

/// Per-edge costs used to price candidate paths.
///
/// Every edge costs at least `edge_cost`, so path cost grows strictly with
/// path length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    /// Base cost of any edge.
    pub edge_cost: f64,
    /// Added when the edge was never concretely exercised.
    pub unexercised_surcharge: f64,
    /// Cost of a launch edge (replaces `edge_cost`).
    pub launch_cost: f64,
    /// Cost of a reset edge (replaces `edge_cost`).
    pub reset_cost: f64,
    /// Added when the edge leads into a predicted state.
    pub predicted_surcharge: f64,
    /// Added to the final cost when the destination was never observed.
    pub unobserved_destination_penalty: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            edge_cost: 1.0,
            unexercised_surcharge: 0.5,
            launch_cost: 3.0,
            reset_cost: 5.0,
            predicted_surcharge: 2.0,
            unobserved_destination_penalty: 1.0,
        }
    }
}

impl CostModel {
    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("edge_cost", self.edge_cost),
            ("unexercised_surcharge", self.unexercised_surcharge),
            ("launch_cost", self.launch_cost),
            ("reset_cost", self.reset_cost),
            ("predicted_surcharge", self.predicted_surcharge),
            (
                "unobserved_destination_penalty",
                self.unobserved_destination_penalty,
            ),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidCost { field, value });
            }
        }
        if self.edge_cost == 0.0 {
            return Err(ConfigError::InvalidCost {
                field: "edge_cost",
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// Tuning knobs for path search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Hard bound on path length.
    pub max_depth: usize,
    /// Minimum co-occurrence probability for a predicted action.
    pub prediction_threshold: f64,
    /// Ceiling used when the caller does not pass one.
    pub default_cost_ceiling: f64,
    /// Maximum frontier entries carried into one depth level.
    pub max_frontier: usize,
    pub cost_model: CostModel,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 15,
            prediction_threshold: 0.75,
            default_cost_ceiling: 25.0,
            max_frontier: 10_000,
            cost_model: CostModel::default(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        let threshold = self.prediction_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        let ceiling = self.default_cost_ceiling;
        if !ceiling.is_finite() || ceiling <= 0.0 {
            return Err(ConfigError::InvalidCeiling(ceiling));
        }
        self.cost_model.validate()
    }
}

/// Toggles gating which edges a search may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConstraints {
    /// Allow a reset action as the first step.
    pub include_reset: bool,
    /// Allow launch actions.
    pub include_launch: bool,
    /// Allow edges derived from the static window transition graph.
    pub include_wtg: bool,
    /// The first step must be a launch or reset.
    pub force_launch_first: bool,
    /// Only concretely exercised edges; no prediction.
    pub maximum_dstg: bool,
    /// Allow batched action-queue steps.
    pub include_action_queue: bool,
}

impl Default for PathConstraints {
    fn default() -> Self {
        Self {
            include_reset: false,
            include_launch: true,
            include_wtg: false,
            force_launch_first: false,
            maximum_dstg: false,
            include_action_queue: false,
        }
    }
}
