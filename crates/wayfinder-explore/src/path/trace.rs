//! Trace-following gate for replay searches.
//!
//! A replay path must continue a recorded concrete trace step by step. The
//! steps still consistent with the committed prefix are found by walking the
//! prefix backwards from its last edge; a reset (or a launch, in partial
//! mode) ends the walk because it restarts the trace context.

use std::collections::BTreeSet;

use wayfinder_model::{AbstractTransition, GraphAccessor, TraceStep, TransitionId};

use super::PathType;

/// Whether `candidate` may extend `prefix` under `path_type`.
///
/// An empty `target_traces` set accepts any recorded trace.
pub fn is_trace_consistent<G: GraphAccessor + ?Sized>(
    graph: &G,
    candidate: TransitionId,
    prefix: &[TransitionId],
    target_traces: &BTreeSet<u32>,
    path_type: PathType,
) -> bool {
    if !path_type.is_replay() {
        return true;
    }
    let partial = path_type == PathType::PartialTrace;
    let edge = graph.transition(candidate);
    if edge.action.is_reset() || (partial && edge.action.is_launch()) {
        return true;
    }

    let Some(&last_id) = prefix.last() else {
        return starts_target_trace(edge, target_traces);
    };
    let last = graph.transition(last_id);
    if last.action.is_reset() {
        return starts_target_trace(edge, target_traces);
    }
    if partial && last.action.is_launch() {
        return true;
    }

    let valid = valid_trace_steps(graph, prefix, target_traces, partial);
    if valid.is_empty() {
        return false;
    }
    edge.tracing.iter().any(|step| {
        step.step
            .checked_sub(1)
            .is_some_and(|previous| valid.contains(&TraceStep::new(step.trace_id, previous)))
    })
}

/// Steps of the prefix's last edge that every earlier edge (back to the
/// nearest context reset) continues consistently.
pub fn valid_trace_steps<G: GraphAccessor + ?Sized>(
    graph: &G,
    prefix: &[TransitionId],
    target_traces: &BTreeSet<u32>,
    partial: bool,
) -> BTreeSet<TraceStep> {
    let Some((&last_id, earlier)) = prefix.split_last() else {
        return BTreeSet::new();
    };
    let mut valid: BTreeSet<TraceStep> = graph
        .transition(last_id)
        .tracing
        .iter()
        .filter(|step| target_traces.is_empty() || target_traces.contains(&step.trace_id))
        .copied()
        .collect();

    for (offset, &id) in (1u32..).zip(earlier.iter().rev()) {
        if valid.is_empty() {
            break;
        }
        let edge = graph.transition(id);
        if edge.action.is_reset() || (partial && edge.action.is_launch()) {
            break;
        }
        valid.retain(|step| {
            step.step >= offset
                && edge
                    .tracing
                    .contains(&TraceStep::new(step.trace_id, step.step - offset))
        });
    }
    valid
}

fn starts_target_trace(edge: &AbstractTransition, target_traces: &BTreeSet<u32>) -> bool {
    if target_traces.is_empty() {
        return !edge.tracing.is_empty();
    }
    edge.tracing
        .iter()
        .any(|step| target_traces.contains(&step.trace_id))
}
