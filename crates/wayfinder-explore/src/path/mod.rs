pub mod builder;
pub mod trace;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use wayfinder_model::{AbstractAction, AbstractState, GraphAccessor, Input, StateId, TransitionId};

use crate::config::CostModel;

/// What the caller wants to trigger once the destination is reached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Goal {
    Input(Input),
    Action(AbstractAction),
}

impl Goal {
    /// Whether `state` offers this goal.
    pub fn is_exposed_by(&self, state: &AbstractState) -> bool {
        match self {
            Goal::Input(input) => state.available_inputs().contains(input),
            Goal::Action(action) => state.available_actions().contains(action),
        }
    }
}

/// Controls trace-following and WTG-inclusion semantics of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathType {
    Normal,
    /// Like `Normal`, but WTG-derived edges are admissible.
    WithWtg,
    /// Replay: every step must continue a recorded trace.
    FullTrace,
    /// Replay where a launch restarts the trace context.
    PartialTrace,
}

impl PathType {
    pub fn is_replay(self) -> bool {
        matches!(self, PathType::FullTrace | PathType::PartialTrace)
    }

    pub fn includes_wtg(self) -> bool {
        self == PathType::WithWtg
    }
}

/// Whether a path cost is a running estimate or final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostMode {
    InProgress,
    /// The destination is confirmed a hit; unobserved destinations are
    /// penalized.
    Final,
}

/// A linear route through the abstract graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionPath {
    pub root: StateId,
    pub destination: StateId,
    pub path_type: PathType,
    /// Goals that justified ending the search at `destination`.
    pub goal: BTreeSet<Goal>,
    transitions: Vec<TransitionId>,
}

impl TransitionPath {
    pub fn new(
        root: StateId,
        destination: StateId,
        path_type: PathType,
        transitions: Vec<TransitionId>,
    ) -> Self {
        Self {
            root,
            destination,
            path_type,
            goal: BTreeSet::new(),
            transitions,
        }
    }

    pub fn transitions(&self) -> &[TransitionId] {
        &self.transitions
    }

    pub fn get(&self, index: usize) -> Option<TransitionId> {
        self.transitions.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn position(&self, transition: TransitionId) -> Option<usize> {
        self.transitions.iter().position(|t| *t == transition)
    }

    /// Same endpoints and same edge sequence, regardless of goals.
    pub fn same_route(&self, other: &TransitionPath) -> bool {
        self.root == other.root
            && self.destination == other.destination
            && self.transitions == other.transitions
    }

    pub fn cost<G: GraphAccessor + ?Sized>(
        &self,
        graph: &G,
        model: &CostModel,
        mode: CostMode,
    ) -> f64 {
        let running: f64 = self
            .transitions
            .iter()
            .map(|t| edge_cost(graph, model, *t))
            .sum();
        match mode {
            CostMode::InProgress => running,
            CostMode::Final => running + destination_penalty(graph, model, self.destination),
        }
    }
}

/// Cost of traversing one edge.
pub fn edge_cost<G: GraphAccessor + ?Sized>(
    graph: &G,
    model: &CostModel,
    transition: TransitionId,
) -> f64 {
    let t = graph.transition(transition);
    let mut cost = if t.action.is_reset() {
        model.reset_cost
    } else if t.action.is_launch() {
        model.launch_cost
    } else {
        model.edge_cost
    };
    if !t.is_exercised() {
        cost += model.unexercised_surcharge;
    }
    if graph.state(t.dest).is_predicted() {
        cost += model.predicted_surcharge;
    }
    cost
}

/// Extra cost charged once a path ends at `destination`.
pub fn destination_penalty<G: GraphAccessor + ?Sized>(
    graph: &G,
    model: &CostModel,
    destination: StateId,
) -> f64 {
    if graph.state(destination).is_observed() {
        0.0
    } else {
        model.unobserved_destination_penalty
    }
}
