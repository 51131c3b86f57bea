//! Path materialization from the search's back-pointer arena.
//!
//! The finder records every accepted edge as a [`TraversalRecord`] holding
//! the id of the record that produced it. A path is rebuilt by walking those
//! parent pointers from a terminal record to the root.

use std::collections::BTreeSet;

use wayfinder_model::{GraphAccessor, StateId, TransitionId};

use super::{edge_cost, trace, Goal, PathType, TransitionPath};
use crate::config::CostModel;
use crate::memory::SearchMemory;
use crate::search::BackStack;

pub type RecordId = usize;

/// One accepted edge of a search branch.
#[derive(Debug, Clone)]
pub struct TraversalRecord {
    pub transition: TransitionId,
    /// Back-stack after taking `transition`.
    pub back_stack: BackStack,
    pub parent: Option<RecordId>,
    pub depth: usize,
    /// Running cost of the branch up to and including `transition`.
    pub cost: f64,
}

/// Arena of traversal records for one search call.
#[derive(Debug, Clone, Default)]
pub struct TraversalArena {
    records: Vec<TraversalRecord>,
}

impl TraversalArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: TraversalRecord) -> RecordId {
        self.records.push(record);
        self.records.len() - 1
    }

    /// Panics on an unknown id: every id handed out came from `push`.
    pub fn get(&self, id: RecordId) -> &TraversalRecord {
        self.records
            .get(id)
            .unwrap_or_else(|| panic!("traversal record {id} missing from arena"))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Transition ids from the root down to `terminal`.
    pub fn chain(&self, terminal: RecordId) -> Vec<TransitionId> {
        let mut chain = Vec::with_capacity(self.get(terminal).depth + 1);
        let mut cursor = Some(terminal);
        while let Some(id) = cursor {
            let record = self.get(id);
            chain.push(record.transition);
            cursor = record.parent;
        }
        chain.reverse();
        chain
    }
}

/// Materialize the path ending at `terminal`.
pub fn build_path(
    arena: &TraversalArena,
    terminal: RecordId,
    root: StateId,
    destination: StateId,
    path_type: PathType,
    goal: BTreeSet<Goal>,
) -> TransitionPath {
    let mut path = TransitionPath::new(root, destination, path_type, arena.chain(terminal));
    path.goal = goal;
    path
}

/// Outcome of offering one more edge to a branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CandidateVerdict {
    Accepted { cost: f64 },
    OverCeiling,
    TraceInconsistent,
    Disabled,
}

/// Per-search inputs for judging candidates.
#[derive(Debug, Clone, Copy)]
pub struct CandidateContext<'a> {
    pub cost_model: &'a CostModel,
    pub path_type: PathType,
    pub target_traces: &'a BTreeSet<u32>,
}

/// Judge extending `prefix` (running cost `prefix_cost`) with `candidate`.
pub fn evaluate_candidate<G: GraphAccessor + ?Sized>(
    graph: &G,
    memory: &SearchMemory,
    ctx: &CandidateContext<'_>,
    prefix: &[TransitionId],
    prefix_cost: f64,
    candidate: TransitionId,
    ceiling: f64,
) -> CandidateVerdict {
    let cost = prefix_cost + edge_cost(graph, ctx.cost_model, candidate);
    if cost > ceiling {
        return CandidateVerdict::OverCeiling;
    }
    if ctx.path_type.is_replay()
        && !trace::is_trace_consistent(graph, candidate, prefix, ctx.target_traces, ctx.path_type)
    {
        return CandidateVerdict::TraceInconsistent;
    }
    let mut extended = Vec::with_capacity(prefix.len() + 1);
    extended.extend_from_slice(prefix);
    extended.push(candidate);
    if memory.blocks_extension(graph, &extended) {
        return CandidateVerdict::Disabled;
    }
    CandidateVerdict::Accepted { cost }
}
