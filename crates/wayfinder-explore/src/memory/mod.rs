//! Learned search memory, owned by the caller and threaded into every search.
//!
//! Holds:
//! - Disabled path segments learned from execution failures
//! - Disabled edges (false edges removed after a failed attempt)
//! - The (root, destination) path cache
//!
//! Disabled segments and edges persist for the whole exploration session and
//! serialize to JSON. The path cache is rebuilt per run.

pub mod disabled;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wayfinder_model::{GraphAccessor, StateId, TransitionId};

pub use disabled::{DisableReason, DisabledPath, DisabledStep};

use crate::path::TransitionPath;

/// What `register_failure` learned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FailureOutcome {
    /// The false edge that was removed from the graph, if any.
    pub removed_edge: Option<TransitionId>,
    /// The segment that is now disabled, if learning took place.
    pub disabled: Option<DisabledPath>,
    /// Cached paths evicted for the failed route.
    pub evicted: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchMemory {
    disabled_paths: Vec<DisabledPath>,
    disabled_edges: BTreeSet<TransitionId>,
    #[serde(skip)]
    path_cache: BTreeMap<(StateId, StateId), Vec<TransitionPath>>,
}

impl SearchMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a disabled segment. Returns false if an equal one exists.
    pub fn disable_path(&mut self, path: DisabledPath) -> bool {
        if self.disabled_paths.contains(&path) {
            return false;
        }
        self.disabled_paths.push(path);
        true
    }

    pub fn disabled_paths(&self) -> &[DisabledPath] {
        &self.disabled_paths
    }

    pub fn disable_edge(&mut self, transition: TransitionId) {
        self.disabled_edges.insert(transition);
    }

    pub fn is_edge_disabled(&self, transition: TransitionId) -> bool {
        self.disabled_edges.contains(&transition)
    }

    /// Whether any disabled segment occurs anywhere in `path`.
    pub fn is_disabled_path<G: GraphAccessor + ?Sized>(
        &self,
        graph: &G,
        path: &TransitionPath,
    ) -> bool {
        self.disabled_paths
            .iter()
            .any(|disabled| disabled.occurs_in(graph, path.transitions()))
    }

    /// Whether the newly appended edge of `extended` completes a disabled
    /// segment. Every shorter prefix was already checked on the way in.
    pub fn blocks_extension<G: GraphAccessor + ?Sized>(
        &self,
        graph: &G,
        extended: &[TransitionId],
    ) -> bool {
        self.disabled_paths
            .iter()
            .any(|disabled| disabled.matches_suffix(graph, extended))
    }

    /// Disabled segments whose leading steps end `chain` without completing
    /// the segment, as (segment index, matched steps). Two branches with the
    /// same open segments can be blocked by the same future edges only.
    pub fn open_segments<G: GraphAccessor + ?Sized>(
        &self,
        graph: &G,
        chain: &[TransitionId],
    ) -> Vec<(usize, usize)> {
        self.disabled_paths
            .iter()
            .enumerate()
            .flat_map(move |(index, disabled)| {
                (1..disabled.len().min(chain.len() + 1))
                    .filter(move |&matched| {
                        disabled.matches_leading(graph, &chain[chain.len() - matched..])
                    })
                    .map(move |matched| (index, matched))
            })
            .collect()
    }

    /// Cache a found path under its endpoints, skipping duplicates.
    pub fn cache_path(&mut self, path: TransitionPath) {
        let entry = self
            .path_cache
            .entry((path.root, path.destination))
            .or_default();
        if !entry.iter().any(|cached| cached.same_route(&path)) {
            entry.push(path);
        }
    }

    pub fn cached_paths(&self, root: StateId, destination: StateId) -> &[TransitionPath] {
        self.path_cache
            .get(&(root, destination))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Learn from a path whose execution went wrong.
    ///
    /// `corrupting` is the edge known to have misbehaved, if any;
    /// `last_attempted` is the last edge the executor tried.
    pub fn register_failure<G: GraphAccessor + ?Sized>(
        &mut self,
        graph: &mut G,
        path: &TransitionPath,
        corrupting: Option<TransitionId>,
        last_attempted: TransitionId,
    ) -> FailureOutcome {
        let mut outcome = FailureOutcome::default();

        if graph.transition(last_attempted).is_unconfirmed_runtime_edge() {
            graph.remove_transition(last_attempted);
            self.disable_edge(last_attempted);
            outcome.removed_edge = Some(last_attempted);
            info!(transition = last_attempted, "removed unconfirmed runtime edge");
        }

        outcome.evicted = self.evict(path);

        if path.is_empty() {
            return outcome;
        }
        if corrupting.is_some_and(|edge| graph.transition(edge).action.is_launch_or_reset()) {
            return outcome;
        }

        let located = match corrupting {
            Some(edge) => match path.position(edge) {
                Some(index) => Some(index),
                None => {
                    warn!(
                        transition = edge,
                        root = path.root,
                        destination = path.destination,
                        "corrupting edge is not on the failed path"
                    );
                    None
                }
            },
            None => None,
        };
        let (end, reason) = match located {
            Some(index) => (index, DisableReason::UnavailableAction),
            None => (path.len() - 1, DisableReason::UnachievableFinalState),
        };

        let transitions = path.transitions();
        if graph.transition(transitions[end]).action.is_launch_or_reset() {
            return outcome;
        }

        let start = transitions[..end]
            .iter()
            .rposition(|id| graph.transition(*id).action.is_launch_or_reset())
            .map_or(0, |index| index + 1);

        let segment = &transitions[start..=end];
        if let Some(disabled) = DisabledPath::from_segment(&*graph, segment, reason) {
            info!(
                source = disabled.source,
                steps = disabled.len(),
                reason = ?reason,
                "disabled path segment"
            );
            if self.disable_path(disabled.clone()) {
                outcome.disabled = Some(disabled);
            }
        }
        outcome
    }

    fn evict(&mut self, path: &TransitionPath) -> usize {
        let Some(cached) = self.path_cache.get_mut(&(path.root, path.destination)) else {
            return 0;
        };
        let before = cached.len();
        cached.retain(|candidate| !candidate.same_route(path));
        before - cached.len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathType;
    use wayfinder_model::{
        AbstractAction, AbstractGraph, AbstractState, AbstractTransition, ModelVersion, WindowKind,
    };

    struct Line {
        graph: AbstractGraph,
        a: StateId,
        c: StateId,
        ab: TransitionId,
        launch: TransitionId,
        bc: TransitionId,
    }

    /// a -click(x)-> b -launch-> a' -click(y)-> c, all from the base model.
    fn line() -> Line {
        let mut g = AbstractGraph::new();
        let w = g.add_window("Main", WindowKind::Activity);
        let a = g.add_state(AbstractState::new(w).with_gui_state(1));
        let b = g.add_state(AbstractState::new(w).with_gui_state(2));
        let a2 = g.add_state(AbstractState::new(w).with_gui_state(3));
        let c = g.add_state(AbstractState::new(w).with_gui_state(4));
        let base = |t: AbstractTransition| t.with_model_version(ModelVersion::Base);
        let ab = g.add_transition(base(AbstractTransition::new(
            a,
            b,
            AbstractAction::click("x"),
        )));
        let launch = g.add_transition(base(AbstractTransition::new(
            b,
            a2,
            AbstractAction::launch(),
        )));
        let bc = g.add_transition(base(AbstractTransition::new(
            a2,
            c,
            AbstractAction::click("y"),
        )));
        Line {
            graph: g,
            a,
            c,
            ab,
            launch,
            bc,
        }
    }

    #[test]
    fn test_failure_disables_segment_after_launch() {
        let mut l = line();
        let path = TransitionPath::new(l.a, l.c, PathType::Normal, vec![l.ab, l.launch, l.bc]);
        let mut memory = SearchMemory::new();

        let outcome = memory.register_failure(&mut l.graph, &path, Some(l.bc), l.bc);

        let disabled = outcome.disabled.unwrap();
        assert_eq!(disabled.reason, DisableReason::UnavailableAction);
        assert_eq!(disabled.len(), 1);
        assert_eq!(disabled.steps[0].action, AbstractAction::click("y"));
        assert!(outcome.removed_edge.is_none());
        assert!(memory.is_disabled_path(&l.graph, &path));
    }

    #[test]
    fn test_corrupting_before_reset_uses_path_start() {
        let mut l = line();
        let path = TransitionPath::new(l.a, l.c, PathType::Normal, vec![l.ab, l.launch, l.bc]);
        let mut memory = SearchMemory::new();

        let outcome = memory.register_failure(&mut l.graph, &path, Some(l.ab), l.ab);

        let disabled = outcome.disabled.unwrap();
        assert_eq!(disabled.source, l.a);
        assert_eq!(disabled.len(), 1);
    }

    #[test]
    fn test_launch_failure_teaches_nothing() {
        let mut l = line();
        let path = TransitionPath::new(l.a, l.c, PathType::Normal, vec![l.ab, l.launch, l.bc]);
        let mut memory = SearchMemory::new();

        let outcome = memory.register_failure(&mut l.graph, &path, Some(l.launch), l.launch);

        assert!(outcome.disabled.is_none());
        assert!(memory.disabled_paths().is_empty());
    }

    #[test]
    fn test_off_path_launch_teaches_nothing() {
        let mut l = line();
        let path = TransitionPath::new(l.a, l.c, PathType::Normal, vec![l.ab]);
        let mut memory = SearchMemory::new();

        let outcome = memory.register_failure(&mut l.graph, &path, Some(l.launch), l.ab);

        assert!(outcome.disabled.is_none());
        assert!(memory.disabled_paths().is_empty());
    }

    #[test]
    fn test_open_segments_track_partial_matches() {
        let mut l = line();
        let path = TransitionPath::new(l.a, l.c, PathType::Normal, vec![l.ab, l.launch, l.bc]);
        let mut memory = SearchMemory::new();
        let segment = DisabledPath::from_segment(
            &l.graph,
            &[l.ab, l.launch, l.bc],
            DisableReason::UnachievableFinalState,
        )
        .unwrap();
        memory.disable_path(segment);

        assert_eq!(memory.open_segments(&l.graph, &[l.ab]), vec![(0, 1)]);
        assert_eq!(memory.open_segments(&l.graph, &[l.ab, l.launch]), vec![(0, 2)]);
        assert!(memory.open_segments(&l.graph, &[l.launch]).is_empty());
        assert!(memory.open_segments(&l.graph, path.transitions()).is_empty());
    }

    #[test]
    fn test_unknown_corrupting_edge_disables_whole_tail() {
        let mut l = line();
        let path = TransitionPath::new(l.a, l.c, PathType::Normal, vec![l.ab, l.launch, l.bc]);
        let mut memory = SearchMemory::new();

        let outcome = memory.register_failure(&mut l.graph, &path, None, l.bc);

        let disabled = outcome.disabled.unwrap();
        assert_eq!(disabled.reason, DisableReason::UnachievableFinalState);
        assert_eq!(disabled.steps.len(), 1);
    }

    #[test]
    fn test_unconfirmed_runtime_edge_is_removed() {
        let mut g = AbstractGraph::new();
        let w = g.add_window("Main", WindowKind::Activity);
        let a = g.add_state(AbstractState::new(w));
        let b = g.add_state(AbstractState::new(w));
        let ab = g.add_transition(AbstractTransition::new(a, b, AbstractAction::click("x")));
        let path = TransitionPath::new(a, b, PathType::Normal, vec![ab]);
        let mut memory = SearchMemory::new();

        let outcome = memory.register_failure(&mut g, &path, Some(ab), ab);

        assert_eq!(outcome.removed_edge, Some(ab));
        assert!(memory.is_edge_disabled(ab));
        assert_eq!(g.edges_from(a).count(), 0);
    }

    #[test]
    fn test_failure_evicts_cached_route_only() {
        let mut l = line();
        let failed = TransitionPath::new(l.a, l.c, PathType::Normal, vec![l.ab, l.launch, l.bc]);
        let other = TransitionPath::new(l.a, l.c, PathType::Normal, vec![l.ab]);
        let mut memory = SearchMemory::new();
        memory.cache_path(failed.clone());
        memory.cache_path(other.clone());
        memory.cache_path(other.clone());
        assert_eq!(memory.cached_paths(l.a, l.c).len(), 2);

        let outcome = memory.register_failure(&mut l.graph, &failed, Some(l.bc), l.bc);

        assert_eq!(outcome.evicted, 1);
        assert_eq!(memory.cached_paths(l.a, l.c), &[other]);
    }

    #[test]
    fn test_repeated_failure_is_deduplicated() {
        let mut l = line();
        let path = TransitionPath::new(l.a, l.c, PathType::Normal, vec![l.ab, l.launch, l.bc]);
        let mut memory = SearchMemory::new();

        memory.register_failure(&mut l.graph, &path, Some(l.bc), l.bc);
        let second = memory.register_failure(&mut l.graph, &path, Some(l.bc), l.bc);

        assert!(second.disabled.is_none());
        assert_eq!(memory.disabled_paths().len(), 1);
    }

    #[test]
    fn test_json_keeps_learning_but_not_cache() {
        let mut l = line();
        let path = TransitionPath::new(l.a, l.c, PathType::Normal, vec![l.ab, l.launch, l.bc]);
        let mut memory = SearchMemory::new();
        memory.cache_path(path.clone());
        memory.register_failure(&mut l.graph, &path, Some(l.bc), l.bc);
        memory.disable_edge(l.ab);

        let restored = SearchMemory::from_json(&memory.to_json().unwrap()).unwrap();

        assert_eq!(restored.disabled_paths(), memory.disabled_paths());
        assert!(restored.is_edge_disabled(l.ab));
        assert!(restored.cached_paths(l.a, l.c).is_empty());
    }
}
