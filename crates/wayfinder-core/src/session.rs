use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::info;
use wayfinder_explore::{
    FailureOutcome, Goal, PathConstraints, PathFinder, SearchMemory, SearchOutcome, SearchRequest,
    TargetSet, TransitionPath,
};
use wayfinder_model::{
    AbstractAction, AbstractGraph, CooccurrenceTable, StateId, StructuralEquivalence, TraceStep,
    TransitionId, WindowId,
};

use crate::config::{SessionConfig, SessionError};

/// Everything the engine needs across searches in one exploration run.
pub struct ExplorationSession {
    graph: AbstractGraph,
    statistics: CooccurrenceTable,
    equivalence: StructuralEquivalence,
    memory: SearchMemory,
    config: SessionConfig,
    /// The caller's live window back-stack, oldest first.
    window_stack: Vec<StateId>,
}

impl ExplorationSession {
    /// Start a session over an empty graph.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        Self::with_graph(AbstractGraph::new(), config)
    }

    /// Start a session over an existing graph.
    pub fn with_graph(graph: AbstractGraph, config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            graph,
            statistics: CooccurrenceTable::new(),
            equivalence: StructuralEquivalence::new(),
            memory: SearchMemory::new(),
            config,
            window_stack: Vec::new(),
        })
    }

    pub fn graph(&self) -> &AbstractGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut AbstractGraph {
        &mut self.graph
    }

    pub fn statistics_mut(&mut self) -> &mut CooccurrenceTable {
        &mut self.statistics
    }

    pub fn equivalence_mut(&mut self) -> &mut StructuralEquivalence {
        &mut self.equivalence
    }

    pub fn memory(&self) -> &SearchMemory {
        &self.memory
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Replace the live window back-stack that guard resolution starts
    /// from. An empty stack means the app was just launched.
    pub fn set_window_stack(&mut self, stack: Vec<StateId>) {
        self.window_stack = stack;
    }

    pub fn window_stack(&self) -> &[StateId] {
        &self.window_stack
    }

    /// Run one search and cache every returned path.
    pub fn search(&mut self, request: &SearchRequest) -> SearchOutcome {
        let finder = PathFinder::new(&self.config.search, &self.statistics, &self.equivalence);
        let outcome = finder.find_path(&mut self.graph, &self.memory, request);
        for path in &outcome.paths {
            self.memory.cache_path(path.clone());
        }
        outcome
    }

    /// Paths from `root` to a state satisfying `targets`, cheapest first.
    /// Empty when there is no route under `cost_ceiling`. Guards are
    /// resolved against the stack last given to `set_window_stack`.
    pub fn find_path_to_target_component(
        &mut self,
        root: StateId,
        targets: TargetSet,
        constraints: PathConstraints,
        cost_ceiling: f64,
        goals_by_target: BTreeMap<WindowId, BTreeSet<Goal>>,
        path_count_limitation: Option<usize>,
    ) -> Vec<TransitionPath> {
        let mut request = SearchRequest::new(root, targets)
            .with_constraints(constraints)
            .with_cost_ceiling(cost_ceiling)
            .with_window_stack(self.window_stack.clone())
            .with_path_count_limitation(
                path_count_limitation.unwrap_or(self.config.default_path_count_limitation),
            );
        request.goals_by_target = goals_by_target;
        self.search(&request).paths
    }

    /// Feed back a path whose execution went wrong.
    pub fn register_failure(
        &mut self,
        path: &TransitionPath,
        corrupting: Option<TransitionId>,
        last_attempted: TransitionId,
    ) -> FailureOutcome {
        self.memory
            .register_failure(&mut self.graph, path, corrupting, last_attempted)
    }

    pub fn is_disabled_path(&self, path: &TransitionPath) -> bool {
        self.memory.is_disabled_path(&self.graph, path)
    }

    /// Record a concrete execution of `transition`.
    pub fn record_interaction(&mut self, transition: TransitionId, step: Option<TraceStep>) {
        self.graph.record_interaction(transition, step);
    }

    /// Drop a predicted action that turned out not to be there.
    pub fn invalidate_prediction(&mut self, state: StateId, action: &AbstractAction) -> bool {
        self.graph.invalidate_prediction(state, action)
    }

    /// Write learned disabled paths and edges as JSON.
    pub fn save_memory(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        std::fs::write(path, self.memory.to_json()?)?;
        info!(
            path = %path.display(),
            disabled_paths = self.memory.disabled_paths().len(),
            "saved search memory"
        );
        Ok(())
    }

    /// Replace the learned memory with one saved earlier. The path cache
    /// starts empty.
    pub fn load_memory(&mut self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        self.memory = SearchMemory::from_json(&text)?;
        info!(
            path = %path.display(),
            disabled_paths = self.memory.disabled_paths().len(),
            "loaded search memory"
        );
        Ok(())
    }
}
