use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info};
use wayfinder_model::{
    AbstractAction, AbstractTransition, ActionStatistics, ActionType, GraphAccessor,
    StateEquivalence, StateId, TransitionId,
};

use super::guard::{guard_context_reset, pertinent_transitions};
use super::predictor::StatePredictor;
use super::{BackStack, GraphDelta, SearchOutcome, SearchRequest, SearchStats};
use crate::config::SearchConfig;
use crate::memory::SearchMemory;
use crate::path::builder::{
    build_path, evaluate_candidate, CandidateContext, CandidateVerdict, RecordId, TraversalArena,
    TraversalRecord,
};
use crate::path::{destination_penalty, Goal};

/// Path search over an abstract graph.
///
/// Searching is also a graph-completion step: when an action has no usable
/// concrete edge the finder may insert a predicted state and an implicit
/// edge into `graph`. Insertions are listed in the outcome's delta.
pub struct PathFinder<'a, S: ?Sized, E: ?Sized> {
    config: &'a SearchConfig,
    stats: &'a S,
    equivalence: &'a E,
}

impl<'a, S, E> PathFinder<'a, S, E>
where
    S: ActionStatistics + ?Sized,
    E: StateEquivalence + ?Sized,
{
    pub fn new(config: &'a SearchConfig, stats: &'a S, equivalence: &'a E) -> Self {
        Self {
            config,
            stats,
            equivalence,
        }
    }

    /// Find the cheapest paths from `request.root` to a state satisfying the
    /// request's targets. An empty outcome means "no route".
    pub fn find_path<G: GraphAccessor + ?Sized>(
        &self,
        graph: &mut G,
        memory: &SearchMemory,
        request: &SearchRequest,
    ) -> SearchOutcome {
        let ceiling = request
            .cost_ceiling
            .unwrap_or(self.config.default_cost_ceiling);
        let mut search = Search {
            config: self.config,
            stats: self.stats,
            equivalence: self.equivalence,
            graph,
            memory,
            request,
            arena: TraversalArena::new(),
            best_costs: HashMap::new(),
            hits: Vec::new(),
            ceiling,
            delta: GraphDelta::default(),
            counters: SearchStats::default(),
        };
        search.run();
        search.finish()
    }
}

/// Branches sharing a key continue identically, so only the cheapest one is
/// expanded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BranchKey {
    transition: TransitionId,
    back_stack: BackStack,
    guard_reset: bool,
    /// Disabled segments the branch tail has started but not completed.
    open_segments: Vec<(usize, usize)>,
}

/// A branch that reached a target.
#[derive(Debug, Clone)]
struct Hit {
    record: RecordId,
    destination: StateId,
    goal: BTreeSet<Goal>,
    cost: f64,
}

struct Search<'r, G: ?Sized, S: ?Sized, E: ?Sized> {
    config: &'r SearchConfig,
    stats: &'r S,
    equivalence: &'r E,
    graph: &'r mut G,
    memory: &'r SearchMemory,
    request: &'r SearchRequest,
    arena: TraversalArena,
    /// Cheapest running cost seen per branch key.
    best_costs: HashMap<BranchKey, f64>,
    hits: Vec<Hit>,
    /// Only ever tightens.
    ceiling: f64,
    delta: GraphDelta,
    counters: SearchStats,
}

impl<'r, G, S, E> Search<'r, G, S, E>
where
    G: GraphAccessor + ?Sized,
    S: ActionStatistics + ?Sized,
    E: StateEquivalence + ?Sized,
{
    fn run(&mut self) {
        let root = self.request.root;
        let initial_stack = if self.request.window_stack.is_empty() {
            BackStack::new(vec![self.graph.launcher_state()])
        } else {
            BackStack::new(self.request.window_stack.clone())
        };

        let mut frontier = self.expand(root, None, &initial_stack, 0, &[], 0.0);

        for depth in 1..self.config.max_depth {
            if frontier.is_empty() || self.found_observed_destinations() {
                break;
            }
            debug!(depth, frontier = frontier.len(), ceiling = self.ceiling, "expanding level");

            let mut next = Vec::new();
            for record_id in frontier {
                let record = self.arena.get(record_id).clone();
                if record.cost > self.ceiling {
                    self.counters.pruned_by_cost += 1;
                    continue;
                }
                let dest = self.graph.transition(record.transition).dest;
                if !self.is_expandable(dest, &record.back_stack) {
                    continue;
                }
                let prefix = self.arena.chain(record_id);
                let produced = self.expand(
                    dest,
                    Some(record_id),
                    &record.back_stack,
                    depth,
                    &prefix,
                    record.cost,
                );
                next.extend(produced);
                if next.len() >= self.config.max_frontier {
                    debug!(depth, cap = self.config.max_frontier, "frontier cap reached");
                    next.truncate(self.config.max_frontier);
                    break;
                }
            }
            frontier = next;
        }
    }

    /// The branch left the app, or sits somewhere search cannot continue.
    fn is_expandable(&self, state: StateId, stack: &BackStack) -> bool {
        if stack.is_empty() || self.graph.is_launcher_window(state) {
            return false;
        }
        !(self.graph.state(state).is_virtual() && !self.includes_wtg())
    }

    /// Stop once every destination found so far was concretely observed.
    fn found_observed_destinations(&self) -> bool {
        !self.hits.is_empty()
            && self
                .hits
                .iter()
                .all(|hit| self.graph.state(hit.destination).is_observed())
    }

    fn includes_wtg(&self) -> bool {
        self.request.constraints.include_wtg || self.request.path_type.includes_wtg()
    }

    /// Expand every admissible action of `source`; returns the new frontier
    /// records.
    fn expand(
        &mut self,
        source: StateId,
        parent: Option<RecordId>,
        stack: &BackStack,
        depth: usize,
        prefix: &[TransitionId],
        prefix_cost: f64,
    ) -> Vec<RecordId> {
        self.counters.expansions += 1;
        let config = self.config;
        let request = self.request;
        let ctx = CandidateContext {
            cost_model: &config.cost_model,
            path_type: request.path_type,
            target_traces: &request.target_traces,
        };

        let actions: Vec<AbstractAction> = self
            .graph
            .state(source)
            .available_actions()
            .iter()
            .filter(|action| self.is_admissible_action(action, depth))
            .cloned()
            .collect();

        let mut produced = Vec::new();
        for action in actions {
            let concrete: Vec<TransitionId> = self
                .graph
                .edges_from(source)
                .filter(|edge| edge.action == action && self.is_usable_edge(edge))
                .map(|edge| edge.id)
                .collect();
            let mut candidates =
                pertinent_transitions(&*self.graph, self.equivalence, &concrete, prefix, stack);
            if let Some(predicted) = self.predict(source, &action, &concrete, &candidates, stack) {
                candidates.push(predicted);
            }

            for candidate in candidates {
                let edge = self.graph.transition(candidate);
                if edge.source == edge.dest || prefix.contains(&candidate) {
                    continue;
                }
                let verdict = evaluate_candidate(
                    &*self.graph,
                    self.memory,
                    &ctx,
                    prefix,
                    prefix_cost,
                    candidate,
                    self.ceiling,
                );
                match verdict {
                    CandidateVerdict::Accepted { cost } => {
                        if let Some(record) = self.accept(candidate, parent, stack, depth, cost) {
                            produced.push(record);
                        }
                    }
                    CandidateVerdict::OverCeiling => self.counters.pruned_by_cost += 1,
                    CandidateVerdict::TraceInconsistent => self.counters.rejected_trace += 1,
                    CandidateVerdict::Disabled => self.counters.rejected_disabled += 1,
                }
            }
        }
        produced
    }

    fn is_admissible_action(&self, action: &AbstractAction, depth: usize) -> bool {
        let constraints = &self.request.constraints;
        let first_step = depth == 0;
        match action.action_type {
            ActionType::Unknown => false,
            ActionType::ResetApp => first_step && constraints.include_reset,
            ActionType::LaunchApp => {
                constraints.include_launch || (first_step && constraints.force_launch_first)
            }
            ActionType::ActionQueue => {
                constraints.include_action_queue && !(first_step && constraints.force_launch_first)
            }
            _ => !(first_step && constraints.force_launch_first),
        }
    }

    /// The single predicate deciding whether search may use an edge.
    fn is_usable_edge(&self, edge: &AbstractTransition) -> bool {
        if !edge.is_usable() || self.memory.is_edge_disabled(edge.id) {
            return false;
        }
        if self.graph.is_launcher_window(edge.dest) {
            return false;
        }
        let dest = self.graph.state(edge.dest);
        if dest.is_exhausted_prediction() {
            return false;
        }
        if self.request.constraints.maximum_dstg {
            return edge.is_exercised();
        }
        edge.is_exercised() || self.includes_wtg() || !edge.from_wtg || dest.is_predicted()
    }

    /// Synthesize a predicted destination for `action` when the concrete
    /// edges cannot be trusted to say where it leads.
    fn predict(
        &mut self,
        source: StateId,
        action: &AbstractAction,
        concrete: &[TransitionId],
        pertinent: &[TransitionId],
        stack: &BackStack,
    ) -> Option<TransitionId> {
        let request = self.request;
        if !request.targets.accepts_window_targets()
            || request.constraints.maximum_dstg
            || !action.is_widget_action()
        {
            return None;
        }
        // An earlier prediction for this action is reused through `concrete`.
        if concrete
            .iter()
            .any(|id| self.graph.state(self.graph.transition(*id).dest).is_predicted())
        {
            return None;
        }
        let destinations: BTreeSet<StateId> = pertinent
            .iter()
            .map(|id| self.graph.transition(*id).dest)
            .collect();
        let untrusted =
            pertinent.is_empty() || action.has_many_cardinality() || destinations.len() > 1;
        if !untrusted {
            return None;
        }

        let predictor = StatePredictor::new(self.stats, self.config.prediction_threshold);
        let prediction = predictor.predict(
            &*self.graph,
            source,
            action,
            stack,
            &request.excluded_predictions,
        )?;
        let state = self.graph.insert_state(prediction.into_state());
        let transition = self
            .graph
            .insert_transition(AbstractTransition::new(source, state, action.clone()).implicit());
        self.delta.states.push(state);
        self.delta.transitions.push(transition);
        self.counters.predictions += 1;
        debug!(source, state, transition, %action, "inserted predicted edge");
        Some(transition)
    }

    /// Record an accepted edge. Returns the record to expand next, or `None`
    /// when the branch ended on a hit or is dominated.
    fn accept(
        &mut self,
        transition: TransitionId,
        parent: Option<RecordId>,
        stack: &BackStack,
        depth: usize,
        cost: f64,
    ) -> Option<RecordId> {
        let edge = self.graph.transition(transition);
        let next_stack = stack.advance(&*self.graph, edge);
        let dest = edge.dest;

        let record = self.arena.push(TraversalRecord {
            transition,
            back_stack: next_stack,
            parent,
            depth,
            cost,
        });
        self.counters.depth_reached = self.counters.depth_reached.max(depth + 1);

        if let Some(goal) = self.hit(dest) {
            let final_cost =
                cost + destination_penalty(&*self.graph, &self.config.cost_model, dest);
            if final_cost <= self.ceiling {
                self.ceiling = final_cost;
                debug!(destination = dest, cost = final_cost, length = depth + 1, "target reached");
                self.hits.push(Hit {
                    record,
                    destination: dest,
                    goal,
                    cost: final_cost,
                });
            } else {
                self.counters.pruned_by_cost += 1;
            }
            return None;
        }

        // Replay branches depend on their whole prefix and are never merged.
        if self.request.path_type.is_replay() {
            return Some(record);
        }
        let key = self.branch_key(record);
        if self.best_costs.get(&key).is_some_and(|best| *best <= cost) {
            self.counters.dominated += 1;
            return None;
        }
        self.best_costs.insert(key, cost);
        Some(record)
    }

    /// What decides how the branch ending at `record` may continue.
    fn branch_key(&self, record: RecordId) -> BranchKey {
        let chain = self.arena.chain(record);
        let entry = self.arena.get(record);
        BranchKey {
            transition: entry.transition,
            back_stack: entry.back_stack.clone(),
            guard_reset: guard_context_reset(&*self.graph, &chain),
            open_segments: self.memory.open_segments(&*self.graph, &chain),
        }
    }
}

impl<'r, G, S, E> Search<'r, G, S, E>
where
    G: GraphAccessor + ?Sized,
    S: ?Sized,
    E: ?Sized,
{
    /// Goals satisfied at `state`, or `None` when it is not a destination.
    fn hit(&self, state: StateId) -> Option<BTreeSet<Goal>> {
        let request = self.request;
        let node = self.graph.state(state);
        if node.is_ignored() || request.abandoned.contains(&state) {
            return None;
        }
        let exposed = |goals: &BTreeSet<Goal>| -> BTreeSet<Goal> {
            goals
                .iter()
                .filter(|goal| goal.is_exposed_by(node))
                .cloned()
                .collect()
        };
        let window_goals = request.goals_by_target.get(&node.window);

        if request.targets.states.contains(&state) && !node.is_virtual() {
            return Some(window_goals.map(exposed).unwrap_or_default());
        }
        if request.targets.windows.contains(&node.window) {
            return match window_goals {
                Some(goals) if !goals.is_empty() => {
                    let reached = exposed(goals);
                    (!reached.is_empty()).then_some(reached)
                }
                _ => Some(BTreeSet::new()),
            };
        }
        None
    }

    fn finish(mut self) -> SearchOutcome {
        let ceiling = self.ceiling;
        let arena = &self.arena;
        self.hits.retain(|hit| hit.cost <= ceiling);
        self.hits.sort_by(|a, b| {
            a.cost
                .total_cmp(&b.cost)
                .then_with(|| arena.get(a.record).depth.cmp(&arena.get(b.record).depth))
        });
        self.hits.truncate(self.request.path_count_limitation);

        let request = self.request;
        let paths: Vec<_> = self
            .hits
            .iter()
            .map(|hit| {
                build_path(
                    arena,
                    hit.record,
                    request.root,
                    hit.destination,
                    request.path_type,
                    hit.goal.clone(),
                )
            })
            .collect();
        let best_cost = self.hits.first().map(|hit| hit.cost);

        info!(
            root = request.root,
            paths = paths.len(),
            best_cost = ?best_cost,
            expansions = self.counters.expansions,
            depth = self.counters.depth_reached,
            predictions = self.counters.predictions,
            "path search finished"
        );

        SearchOutcome {
            paths,
            delta: self.delta,
            stats: self.counters,
            best_cost,
        }
    }
}
