use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use wayfinder_model::{AbstractAction, AbstractTransition, GraphAccessor, StateId, TransitionId};

/// Why a path segment was blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisableReason {
    /// A specific edge on the path did not behave as modeled.
    UnavailableAction,
    /// The path ran to completion but never reached its destination.
    UnachievableFinalState,
}

/// One step of a disabled segment, stored by action rather than by edge id
/// so that it also blocks edges between sibling state instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisabledStep {
    pub action: AbstractAction,
    pub dependent_states: BTreeSet<StateId>,
}

impl DisabledStep {
    /// Same action, and dependent sets either both empty or intersecting.
    fn matches(&self, edge: &AbstractTransition) -> bool {
        if self.action != edge.action {
            return false;
        }
        if self.dependent_states.is_empty() && edge.dependent_states.is_empty() {
            return true;
        }
        !self.dependent_states.is_disjoint(&edge.dependent_states)
    }
}

/// A learned path segment that must never be proposed again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisabledPath {
    pub source: StateId,
    pub steps: Vec<DisabledStep>,
    pub reason: DisableReason,
}

impl DisabledPath {
    /// Capture `segment` as a disabled path. `None` for an empty segment.
    pub fn from_segment<G: GraphAccessor + ?Sized>(
        graph: &G,
        segment: &[TransitionId],
        reason: DisableReason,
    ) -> Option<Self> {
        let first = *segment.first()?;
        let steps = segment
            .iter()
            .map(|id| {
                let edge = graph.transition(*id);
                DisabledStep {
                    action: edge.action.clone(),
                    dependent_states: edge.dependent_states.clone(),
                }
            })
            .collect();
        Some(Self {
            source: graph.transition(first).source,
            steps,
            reason,
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The single comparator for disabled segments: equal length, same
    /// starting source, and every step matching.
    pub fn matches<G: GraphAccessor + ?Sized>(&self, graph: &G, segment: &[TransitionId]) -> bool {
        segment.len() == self.steps.len() && self.matches_steps(graph, segment)
    }

    /// Whether `segment` matches the leading steps of this one without
    /// completing it.
    pub fn matches_leading<G: GraphAccessor + ?Sized>(
        &self,
        graph: &G,
        segment: &[TransitionId],
    ) -> bool {
        segment.len() < self.steps.len() && self.matches_steps(graph, segment)
    }

    /// Whether `path` ends with this segment.
    pub fn matches_suffix<G: GraphAccessor + ?Sized>(
        &self,
        graph: &G,
        path: &[TransitionId],
    ) -> bool {
        path.len() >= self.steps.len()
            && self.matches(graph, &path[path.len() - self.steps.len()..])
    }

    /// Whether this segment occurs anywhere in `path`.
    pub fn occurs_in<G: GraphAccessor + ?Sized>(&self, graph: &G, path: &[TransitionId]) -> bool {
        !self.steps.is_empty()
            && path
                .windows(self.steps.len())
                .any(|window| self.matches(graph, window))
    }

    fn matches_steps<G: GraphAccessor + ?Sized>(
        &self,
        graph: &G,
        segment: &[TransitionId],
    ) -> bool {
        let Some(&first) = segment.first() else {
            return false;
        };
        graph.transition(first).source == self.source
            && self
                .steps
                .iter()
                .zip(segment)
                .all(|(step, id)| step.matches(graph.transition(*id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfinder_model::{AbstractGraph, AbstractState, WindowKind};

    #[test]
    fn test_matches_sibling_instances_by_action() {
        let mut g = AbstractGraph::new();
        let w = g.add_window("Main", WindowKind::Activity);
        let a = g.add_state(AbstractState::new(w));
        let b = g.add_state(AbstractState::new(w));
        let b2 = g.add_state(AbstractState::new(w));
        let ab = g.add_transition(AbstractTransition::new(a, b, AbstractAction::click("x")));
        let ab2 = g.add_transition(AbstractTransition::new(a, b2, AbstractAction::click("x")));
        let ay = g.add_transition(AbstractTransition::new(a, b, AbstractAction::click("y")));

        let disabled =
            DisabledPath::from_segment(&g, &[ab], DisableReason::UnavailableAction).unwrap();

        assert!(disabled.matches(&g, &[ab]));
        assert!(disabled.matches(&g, &[ab2]));
        assert!(!disabled.matches(&g, &[ay]));
        assert!(!disabled.matches(&g, &[]));
    }

    #[test]
    fn test_dependent_states_must_intersect() {
        let mut g = AbstractGraph::new();
        let w = g.add_window("Main", WindowKind::Activity);
        let a = g.add_state(AbstractState::new(w));
        let b = g.add_state(AbstractState::new(w));
        let guarded = g.add_transition(
            AbstractTransition::new(a, b, AbstractAction::click("x")).guarded([10, 11]),
        );
        let overlapping = g.add_transition(
            AbstractTransition::new(a, b, AbstractAction::click("x")).guarded([11, 12]),
        );
        let disjoint = g.add_transition(
            AbstractTransition::new(a, b, AbstractAction::click("x")).guarded([13]),
        );
        let unguarded =
            g.add_transition(AbstractTransition::new(a, b, AbstractAction::click("x")));

        let disabled =
            DisabledPath::from_segment(&g, &[guarded], DisableReason::UnavailableAction).unwrap();

        assert!(disabled.matches(&g, &[overlapping]));
        assert!(!disabled.matches(&g, &[disjoint]));
        assert!(!disabled.matches(&g, &[unguarded]));
    }

    #[test]
    fn test_occurs_in_and_suffix() {
        let mut g = AbstractGraph::new();
        let w = g.add_window("Main", WindowKind::Activity);
        let a = g.add_state(AbstractState::new(w));
        let b = g.add_state(AbstractState::new(w));
        let c = g.add_state(AbstractState::new(w));
        let d = g.add_state(AbstractState::new(w));
        let ab = g.add_transition(AbstractTransition::new(a, b, AbstractAction::click("1")));
        let bc = g.add_transition(AbstractTransition::new(b, c, AbstractAction::click("2")));
        let cd = g.add_transition(AbstractTransition::new(c, d, AbstractAction::click("3")));

        let disabled =
            DisabledPath::from_segment(&g, &[bc], DisableReason::UnachievableFinalState).unwrap();

        assert!(disabled.occurs_in(&g, &[ab, bc, cd]));
        assert!(disabled.matches_suffix(&g, &[ab, bc]));
        assert!(!disabled.matches_suffix(&g, &[ab, bc, cd]));
        assert!(!disabled.occurs_in(&g, &[ab]));
        assert!(!disabled.matches_leading(&g, &[bc]));
    }

    #[test]
    fn test_matches_leading_steps_only() {
        let mut g = AbstractGraph::new();
        let w = g.add_window("Main", WindowKind::Activity);
        let a = g.add_state(AbstractState::new(w));
        let b = g.add_state(AbstractState::new(w));
        let c = g.add_state(AbstractState::new(w));
        let ab = g.add_transition(AbstractTransition::new(a, b, AbstractAction::click("1")));
        let bc = g.add_transition(AbstractTransition::new(b, c, AbstractAction::click("2")));

        let disabled =
            DisabledPath::from_segment(&g, &[ab, bc], DisableReason::UnavailableAction).unwrap();

        assert!(disabled.matches_leading(&g, &[ab]));
        assert!(!disabled.matches_leading(&g, &[bc]));
        assert!(!disabled.matches_leading(&g, &[ab, bc]));
    }

    #[test]
    fn test_empty_segment_is_not_captured() {
        let g = AbstractGraph::new();
        assert!(DisabledPath::from_segment(&g, &[], DisableReason::UnavailableAction).is_none());
    }
}
