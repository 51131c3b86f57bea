//! Guard resolution: which guarded edges are pertinent for a branch.
//!
//! A guarded edge is only valid while one of its dependent states sits on
//! the window back-stack. The stack is walked from the most recent entry;
//! the first entry that any guarded edge depends on admits every guarded
//! edge matching that entry, and the walk stops there.

use std::collections::BTreeSet;

use tracing::debug;
use wayfinder_model::{
    AbstractState, AbstractTransition, GraphAccessor, StateEquivalence, TransitionId,
};

use super::BackStack;

/// Filter `candidates` down to the pertinent ones, preserving order.
pub fn pertinent_transitions<G, E>(
    graph: &G,
    equivalence: &E,
    candidates: &[TransitionId],
    prefix: &[TransitionId],
    stack: &BackStack,
) -> Vec<TransitionId>
where
    G: GraphAccessor + ?Sized,
    E: StateEquivalence + ?Sized,
{
    if guard_context_reset(graph, prefix) {
        return candidates.to_vec();
    }

    let mut admitted: BTreeSet<TransitionId> = BTreeSet::new();
    let mut guarded: Vec<&AbstractTransition> = Vec::new();
    for id in candidates {
        let edge = graph.transition(*id);
        if edge.is_guarded() {
            guarded.push(edge);
        } else {
            admitted.insert(*id);
        }
    }

    if !guarded.is_empty() {
        for entry in stack.iter_recent() {
            let entry_state = graph.state(entry);
            let matching: Vec<TransitionId> = guarded
                .iter()
                .filter(|edge| depends_on(graph, equivalence, edge, entry_state))
                .map(|edge| edge.id)
                .collect();
            if !matching.is_empty() {
                debug!(entry, admitted = matching.len(), "guard slice selected");
                admitted.extend(matching);
                break;
            }
        }
    }

    candidates
        .iter()
        .filter(|id| admitted.contains(id))
        .copied()
        .collect()
}

/// Guards are not checked right after a launch or reset, at the root, or
/// while every prefix edge is explicit and guard-enabled.
pub fn guard_context_reset<G: GraphAccessor + ?Sized>(graph: &G, prefix: &[TransitionId]) -> bool {
    let Some(&last) = prefix.last() else {
        return true;
    };
    if graph.transition(last).action.is_launch_or_reset() {
        return true;
    }
    prefix.iter().all(|id| {
        let edge = graph.transition(*id);
        !edge.is_implicit && edge.guard_enabled
    })
}

fn depends_on<G, E>(
    graph: &G,
    equivalence: &E,
    edge: &AbstractTransition,
    entry: &AbstractState,
) -> bool
where
    G: GraphAccessor + ?Sized,
    E: StateEquivalence + ?Sized,
{
    edge.dependent_states.iter().any(|dependent| {
        let dependent = graph.state(*dependent);
        equivalence.equivalent(dependent, entry)
            || (edge.from_wtg && dependent.window == entry.window)
    })
}
