//! Property tests for path search over random cyclic graphs.

use std::collections::{BTreeSet, VecDeque};

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use wayfinder_explore::path::CostMode;
use wayfinder_explore::{
    PathFinder, SearchConfig, SearchMemory, SearchOutcome, SearchRequest, TargetSet,
};
use wayfinder_model::{
    AbstractAction, AbstractGraph, AbstractState, AbstractTransition, CooccurrenceTable,
    ModelVersion, StateId, StructuralEquivalence, WindowKind,
};

const STATES: usize = 8;

/// (source, dest, widget, exercised)
type EdgeSpec = (usize, usize, u8, bool);

/// Build a graph over two windows. States are observed; edges come from the
/// base model so failure learning never removes them.
fn build_graph(edges: &[EdgeSpec]) -> (AbstractGraph, Vec<StateId>) {
    let mut graph = AbstractGraph::new();
    let windows = [
        graph.add_window("Main", WindowKind::Activity),
        graph.add_window("Detail", WindowKind::Activity),
    ];
    let states: Vec<StateId> = (0..STATES)
        .map(|i| {
            graph.add_state(AbstractState::new(windows[i % 2]).with_gui_state(i as u64 + 1))
        })
        .collect();
    for &(from, to, widget, exercised) in edges {
        let transition = AbstractTransition::new(
            states[from],
            states[to],
            AbstractAction::click(&format!("w{widget}")),
        )
        .with_interactions(u32::from(exercised))
        .with_model_version(ModelVersion::Base);
        graph.add_transition(transition);
    }
    (graph, states)
}

fn edge_strategy() -> impl Strategy<Value = Vec<EdgeSpec>> {
    prop::collection::vec((0..STATES, 0..STATES, 0u8..4, any::<bool>()), 0..STATES * 4)
}

fn search(
    graph: &mut AbstractGraph,
    memory: &SearchMemory,
    config: &SearchConfig,
    request: &SearchRequest,
) -> SearchOutcome {
    let stats = CooccurrenceTable::new();
    let equivalence = StructuralEquivalence::new();
    PathFinder::new(config, &stats, &equivalence).find_path(graph, memory, request)
}

proptest! {
    #[test]
    fn search_terminates_within_depth(
        edges in edge_strategy(),
        max_depth in 1_usize..8,
        target in 1..STATES,
    ) {
        let (mut graph, states) = build_graph(&edges);
        let config = SearchConfig { max_depth, ..Default::default() };
        let request = SearchRequest::new(states[0], TargetSet::states([states[target]]));

        let outcome = search(&mut graph, &SearchMemory::new(), &config, &request);

        prop_assert!(outcome.stats.depth_reached <= max_depth);
        for path in &outcome.paths {
            prop_assert!(path.len() <= max_depth);
            prop_assert_eq!(path.destination, states[target]);
        }
    }
}

/// Edge count of the shortest route from `root` to `target`, ignoring costs.
fn shortest_route(edges: &[EdgeSpec], root: usize, target: usize) -> Option<usize> {
    let mut distance = vec![None; STATES];
    distance[root] = Some(0);
    let mut queue = VecDeque::from([root]);
    while let Some(state) = queue.pop_front() {
        let next = distance[state].map(|d: usize| d + 1);
        for &(from, to, _, _) in edges {
            if from == state && distance[to].is_none() {
                distance[to] = next;
                queue.push_back(to);
            }
        }
    }
    distance[target]
}

proptest! {
    #[test]
    fn reachable_targets_are_found(
        edges in edge_strategy(),
        max_depth in 1_usize..7,
        target in 1..STATES,
    ) {
        let (mut graph, states) = build_graph(&edges);
        let config = SearchConfig { max_depth, max_frontier: usize::MAX, ..Default::default() };
        let request = SearchRequest::new(states[0], TargetSet::states([states[target]]));

        let outcome = search(&mut graph, &SearchMemory::new(), &config, &request);

        match shortest_route(&edges, 0, target) {
            Some(length) if length <= max_depth => {
                prop_assert!(!outcome.paths.is_empty());
                prop_assert_eq!(outcome.paths[0].len(), length);
            }
            _ => prop_assert!(outcome.paths.is_empty()),
        }
    }
}

proptest! {
    #[test]
    fn paths_never_repeat_an_edge(edges in edge_strategy(), target in 1..STATES) {
        let (mut graph, states) = build_graph(&edges);
        let request = SearchRequest::new(states[0], TargetSet::states([states[target]]));

        let outcome = search(&mut graph, &SearchMemory::new(), &SearchConfig::default(), &request);

        for path in &outcome.paths {
            let unique: BTreeSet<_> = path.transitions().iter().collect();
            prop_assert_eq!(unique.len(), path.len());
        }
    }
}

proptest! {
    #[test]
    fn paths_fit_under_ceiling(
        edges in edge_strategy(),
        target in 1..STATES,
        ceiling in 1.0_f64..12.0,
    ) {
        let (mut graph, states) = build_graph(&edges);
        let config = SearchConfig::default();
        let request = SearchRequest::new(states[0], TargetSet::states([states[target]]))
            .with_cost_ceiling(ceiling);

        let outcome = search(&mut graph, &SearchMemory::new(), &config, &request);

        for path in &outcome.paths {
            let cost = path.cost(&graph, &config.cost_model, CostMode::Final);
            prop_assert!(cost <= ceiling);
            prop_assert_eq!(Some(cost), outcome.best_cost);
        }
        prop_assert_eq!(outcome.best_cost.is_some(), !outcome.paths.is_empty());
    }
}

proptest! {
    #[test]
    fn learned_failures_are_never_proposed_again(edges in edge_strategy(), target in 1..STATES) {
        let (mut graph, states) = build_graph(&edges);
        let config = SearchConfig::default();
        let request = SearchRequest::new(states[0], TargetSet::states([states[target]]));
        let mut memory = SearchMemory::new();

        let first = search(&mut graph, &memory, &config, &request);
        if let Some(failed) = first.paths.first() {
            let last = *failed.transitions().last().unwrap();
            memory.register_failure(&mut graph, failed, Some(last), last);

            let second = search(&mut graph, &memory, &config, &request);
            for path in &second.paths {
                prop_assert!(!memory.is_disabled_path(&graph, path));
                prop_assert!(!path.same_route(failed));
            }
        }
    }
}

#[test]
fn test_seeded_graphs_search_deterministically() {
    for seed in 0..20u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let edges: Vec<EdgeSpec> = (0..rng.gen_range(0..STATES * 4))
            .map(|_| {
                (
                    rng.gen_range(0..STATES),
                    rng.gen_range(0..STATES),
                    rng.gen_range(0..4u8),
                    rng.gen_bool(0.5),
                )
            })
            .collect();
        let target = rng.gen_range(1..STATES);

        let (mut first_graph, states) = build_graph(&edges);
        let (mut second_graph, _) = build_graph(&edges);
        let request = SearchRequest::new(states[0], TargetSet::states([states[target]]));
        let config = SearchConfig::default();

        let first = search(&mut first_graph, &SearchMemory::new(), &config, &request);
        let second = search(&mut second_graph, &SearchMemory::new(), &config, &request);

        assert_eq!(first.paths, second.paths, "seed {seed}");
        assert_eq!(first.stats, second.stats, "seed {seed}");
    }
}
