//! Branch-and-bound path search over the abstract graph.
//!
//! The finder expands an explicit frontier level by level. Each accepted edge
//! is recorded in a [`TraversalArena`](crate::path::builder::TraversalArena)
//! with a back-pointer to the edge that produced it, so branches never copy
//! their prefix. Search may insert predicted states and implicit edges into
//! the graph; those insertions are reported in [`GraphDelta`].

pub mod back_stack;
pub mod finder;
pub mod guard;
pub mod predictor;

use std::collections::{BTreeMap, BTreeSet};

use wayfinder_model::{AbstractAction, StateId, TransitionId, WindowId};

pub use back_stack::BackStack;
pub use finder::PathFinder;
pub use predictor::{PredictedAction, Prediction, StatePredictor};

use crate::config::PathConstraints;
use crate::path::{Goal, PathType, TransitionPath};

/// What counts as a destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet {
    /// Literal target states.
    pub states: BTreeSet<StateId>,
    /// Window-level targets: any state of these windows may qualify.
    pub windows: BTreeSet<WindowId>,
}

impl TargetSet {
    pub fn states(states: impl IntoIterator<Item = StateId>) -> Self {
        Self {
            states: states.into_iter().collect(),
            windows: BTreeSet::new(),
        }
    }

    pub fn windows(windows: impl IntoIterator<Item = WindowId>) -> Self {
        Self {
            states: BTreeSet::new(),
            windows: windows.into_iter().collect(),
        }
    }

    /// Window-level targeting enables speculative prediction.
    pub fn accepts_window_targets(&self) -> bool {
        !self.windows.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.windows.is_empty()
    }
}

/// One call's worth of search input.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub root: StateId,
    pub targets: TargetSet,
    pub constraints: PathConstraints,
    /// Falls back to the configured default ceiling.
    pub cost_ceiling: Option<f64>,
    /// Goals per target window; a missing or empty entry accepts any state
    /// of that window.
    pub goals_by_target: BTreeMap<WindowId, BTreeSet<Goal>>,
    pub path_type: PathType,
    /// The caller's live window stack, oldest first.
    pub window_stack: Vec<StateId>,
    /// Destinations the caller gave up on.
    pub abandoned: BTreeSet<StateId>,
    /// Actions never to be predicted.
    pub excluded_predictions: BTreeSet<AbstractAction>,
    /// Traces a replay search may follow. Empty means any.
    pub target_traces: BTreeSet<u32>,
    pub path_count_limitation: usize,
}

impl SearchRequest {
    pub fn new(root: StateId, targets: TargetSet) -> Self {
        Self {
            root,
            targets,
            constraints: PathConstraints::default(),
            cost_ceiling: None,
            goals_by_target: BTreeMap::new(),
            path_type: PathType::Normal,
            window_stack: Vec::new(),
            abandoned: BTreeSet::new(),
            excluded_predictions: BTreeSet::new(),
            target_traces: BTreeSet::new(),
            path_count_limitation: usize::MAX,
        }
    }

    pub fn with_constraints(mut self, constraints: PathConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_cost_ceiling(mut self, ceiling: f64) -> Self {
        self.cost_ceiling = Some(ceiling);
        self
    }

    pub fn with_goals(mut self, window: WindowId, goals: impl IntoIterator<Item = Goal>) -> Self {
        self.goals_by_target
            .entry(window)
            .or_default()
            .extend(goals);
        self
    }

    pub fn with_path_type(mut self, path_type: PathType) -> Self {
        self.path_type = path_type;
        self
    }

    pub fn with_window_stack(mut self, stack: Vec<StateId>) -> Self {
        self.window_stack = stack;
        self
    }

    pub fn abandon(mut self, state: StateId) -> Self {
        self.abandoned.insert(state);
        self
    }

    pub fn exclude_prediction(mut self, action: AbstractAction) -> Self {
        self.excluded_predictions.insert(action);
        self
    }

    pub fn following_traces(mut self, traces: impl IntoIterator<Item = u32>) -> Self {
        self.target_traces.extend(traces);
        self
    }

    pub fn with_path_count_limitation(mut self, limit: usize) -> Self {
        self.path_count_limitation = limit;
        self
    }
}

/// Nodes and edges a search inserted into the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphDelta {
    pub states: Vec<StateId>,
    pub transitions: Vec<TransitionId>,
}

impl GraphDelta {
    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.transitions.is_empty()
    }
}

/// Counters for one search call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Source states expanded.
    pub expansions: usize,
    /// Length of the longest branch recorded.
    pub depth_reached: usize,
    pub pruned_by_cost: usize,
    pub rejected_disabled: usize,
    pub rejected_trace: usize,
    /// Branches dropped for a cheaper branch with the same key.
    pub dominated: usize,
    /// Predicted states synthesized.
    pub predictions: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Cheapest paths first.
    pub paths: Vec<TransitionPath>,
    pub delta: GraphDelta,
    pub stats: SearchStats,
    /// Final cost of the best path, if any was found.
    pub best_cost: Option<f64>,
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
