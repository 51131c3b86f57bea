use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::action::AbstractAction;
use crate::state::StateId;

pub type TransitionId = u32;

/// Soft-delete status of an edge. Only `Active` edges are visible to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionStatus {
    Active,
    Deactivated,
    Ignored,
    /// Detached from its source; kept in the arena so ids stay stable.
    Removed,
}

/// Which model an edge was learned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelVersion {
    /// Reused from a previous app version's model.
    Base,
    /// Learned during the current exploration run.
    Running,
}

/// Participation of an edge in a recorded concrete trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TraceStep {
    pub trace_id: u32,
    pub step: u32,
}

impl TraceStep {
    pub fn new(trace_id: u32, step: u32) -> Self {
        Self { trace_id, step }
    }
}

/// An edge of the abstract state graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbstractTransition {
    pub id: TransitionId,
    pub source: StateId,
    pub dest: StateId,
    pub action: AbstractAction,
    pub status: TransitionStatus,
    /// When set, the edge is only pertinent while one of
    /// `dependent_states` sits on the caller's window back-stack.
    pub guard_enabled: bool,
    pub dependent_states: BTreeSet<StateId>,
    /// Number of concrete executions observed for this edge.
    pub interactions: u32,
    /// Derived rather than observed.
    pub is_implicit: bool,
    /// Derived from the static window transition graph.
    pub from_wtg: bool,
    pub tracing: BTreeSet<TraceStep>,
    pub model_version: ModelVersion,
}

impl AbstractTransition {
    /// An observed, unguarded edge. The id is assigned on insertion.
    pub fn new(source: StateId, dest: StateId, action: AbstractAction) -> Self {
        Self {
            id: 0,
            source,
            dest,
            action,
            status: TransitionStatus::Active,
            guard_enabled: false,
            dependent_states: BTreeSet::new(),
            interactions: 0,
            is_implicit: false,
            from_wtg: false,
            tracing: BTreeSet::new(),
            model_version: ModelVersion::Running,
        }
    }

    pub fn implicit(mut self) -> Self {
        self.is_implicit = true;
        self
    }

    pub fn wtg(mut self) -> Self {
        self.from_wtg = true;
        self.is_implicit = true;
        self
    }

    pub fn guarded(mut self, dependent_states: impl IntoIterator<Item = StateId>) -> Self {
        self.guard_enabled = true;
        self.dependent_states = dependent_states.into_iter().collect();
        self
    }

    pub fn with_interactions(mut self, interactions: u32) -> Self {
        self.interactions = interactions;
        self
    }

    pub fn traced(mut self, trace_id: u32, step: u32) -> Self {
        self.tracing.insert(TraceStep::new(trace_id, step));
        self
    }

    pub fn with_model_version(mut self, version: ModelVersion) -> Self {
        self.model_version = version;
        self
    }

    /// Only active edges are visible to search.
    pub fn is_usable(&self) -> bool {
        self.status == TransitionStatus::Active
    }

    /// Guarded edges carry a non-empty dependent state set.
    pub fn is_guarded(&self) -> bool {
        self.guard_enabled && !self.dependent_states.is_empty()
    }

    pub fn is_exercised(&self) -> bool {
        self.interactions > 0
    }

    /// Created mid-run and never confirmed by a concrete execution.
    pub fn is_unconfirmed_runtime_edge(&self) -> bool {
        self.model_version == ModelVersion::Running && !self.is_exercised()
    }

    pub fn has_trace(&self, trace_id: u32) -> bool {
        self.tracing.iter().any(|t| t.trace_id == trace_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_requires_dependent_states() {
        let t = AbstractTransition::new(0, 1, AbstractAction::click("a"));
        assert!(!t.is_guarded());

        let mut t = t.guarded([]);
        assert!(!t.is_guarded());

        t.dependent_states.insert(4);
        assert!(t.is_guarded());
    }

    #[test]
    fn test_wtg_edges_are_implicit() {
        let t = AbstractTransition::new(0, 1, AbstractAction::click("a")).wtg();
        assert!(t.from_wtg);
        assert!(t.is_implicit);
    }

    #[test]
    fn test_unconfirmed_runtime_edge() {
        let t = AbstractTransition::new(0, 1, AbstractAction::click("a"));
        assert!(t.is_unconfirmed_runtime_edge());

        let t = t.with_interactions(1);
        assert!(!t.is_unconfirmed_runtime_edge());

        let t = AbstractTransition::new(0, 1, AbstractAction::click("a"))
            .with_model_version(ModelVersion::Base);
        assert!(!t.is_unconfirmed_runtime_edge());
    }
}
