//! Abstract state/transition graph.
//!
//! States, transitions and windows live in arenas indexed by integer id.
//! Ids are never reused: removing a transition detaches it from its source
//! and marks it `Removed`, but its slot stays in the arena.

use serde::{Deserialize, Serialize};

use crate::action::AbstractAction;
use crate::state::{AbstractState, StateId};
use crate::transition::{AbstractTransition, TraceStep, TransitionId, TransitionStatus};
use crate::window::{Window, WindowId, WindowKind};

/// Access to the abstract graph, as consumed by path search.
///
/// Lookups by id panic on unknown ids: ids handed to the search always come
/// from the graph itself, so a miss is a bookkeeping bug.
pub trait GraphAccessor {
    fn state(&self, id: StateId) -> &AbstractState;

    fn transition(&self, id: TransitionId) -> &AbstractTransition;

    fn window(&self, id: WindowId) -> &Window;

    /// The state standing for the device home screen.
    fn launcher_state(&self) -> StateId;

    /// All transitions still attached to their source.
    fn edges(&self) -> Box<dyn Iterator<Item = &AbstractTransition> + '_>;

    /// Outgoing transitions of `state`.
    fn edges_from(&self, state: StateId) -> Box<dyn Iterator<Item = &AbstractTransition> + '_>;

    fn insert_state(&mut self, state: AbstractState) -> StateId;

    fn insert_transition(&mut self, transition: AbstractTransition) -> TransitionId;

    fn remove_transition(&mut self, id: TransitionId);

    fn is_launcher_window(&self, state: StateId) -> bool {
        self.window(self.state(state).window).is_launcher()
    }
}

/// In-memory arena implementation of the abstract graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbstractGraph {
    windows: Vec<Window>,
    states: Vec<AbstractState>,
    transitions: Vec<AbstractTransition>,
    launcher: StateId,
}

impl AbstractGraph {
    /// Create a graph holding only the launcher window and its state.
    pub fn new() -> Self {
        let mut graph = AbstractGraph {
            windows: Vec::new(),
            states: Vec::new(),
            transitions: Vec::new(),
            launcher: 0,
        };
        let window = graph.add_window("Launcher", WindowKind::Launcher);
        graph.launcher = graph.add_state(AbstractState::new(window).with_gui_state(0));
        graph
    }

    pub fn add_window(&mut self, name: &str, kind: WindowKind) -> WindowId {
        let id = self.windows.len() as WindowId;
        self.windows.push(Window {
            id,
            name: name.to_string(),
            kind,
        });
        id
    }

    pub fn add_state(&mut self, mut state: AbstractState) -> StateId {
        let id = self.states.len() as StateId;
        state.id = id;
        state.transitions.clear();
        self.states.push(state);
        id
    }

    /// Insert a transition and register its action as available at the source.
    pub fn add_transition(&mut self, mut transition: AbstractTransition) -> TransitionId {
        let id = self.transitions.len() as TransitionId;
        transition.id = id;
        let source = &mut self.states[transition.source as usize];
        source.transitions.push(id);
        if !source.is_predicted() {
            source.add_action(transition.action.clone());
        }
        self.transitions.push(transition);
        id
    }

    pub fn state_mut(&mut self, id: StateId) -> &mut AbstractState {
        &mut self.states[id as usize]
    }

    pub fn transition_mut(&mut self, id: TransitionId) -> &mut AbstractTransition {
        &mut self.transitions[id as usize]
    }

    pub fn set_transition_status(&mut self, id: TransitionId, status: TransitionStatus) {
        if status == TransitionStatus::Removed {
            self.detach(id);
        } else {
            self.transitions[id as usize].status = status;
        }
    }

    /// Record a concrete execution of a transition, optionally as a step
    /// of a recorded trace.
    pub fn record_interaction(&mut self, id: TransitionId, step: Option<TraceStep>) {
        let transition = &mut self.transitions[id as usize];
        transition.interactions += 1;
        if let Some(step) = step {
            transition.tracing.insert(step);
        }
    }

    /// Drop a predicted action from a predicted state once it has been
    /// exercised or disproved. Returns whether anything changed.
    pub fn invalidate_prediction(&mut self, state: StateId, action: &AbstractAction) -> bool {
        self.states[state as usize].remove_prediction(action)
    }

    pub fn states(&self) -> &[AbstractState] {
        &self.states
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    fn detach(&mut self, id: TransitionId) {
        let transition = &mut self.transitions[id as usize];
        transition.status = TransitionStatus::Removed;
        let source = transition.source;
        self.states[source as usize].transitions.retain(|t| *t != id);
    }
}

impl Default for AbstractGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphAccessor for AbstractGraph {
    fn state(&self, id: StateId) -> &AbstractState {
        &self.states[id as usize]
    }

    fn transition(&self, id: TransitionId) -> &AbstractTransition {
        &self.transitions[id as usize]
    }

    fn window(&self, id: WindowId) -> &Window {
        &self.windows[id as usize]
    }

    fn launcher_state(&self) -> StateId {
        self.launcher
    }

    fn edges(&self) -> Box<dyn Iterator<Item = &AbstractTransition> + '_> {
        Box::new(
            self.transitions
                .iter()
                .filter(|t| t.status != TransitionStatus::Removed),
        )
    }

    fn edges_from(&self, state: StateId) -> Box<dyn Iterator<Item = &AbstractTransition> + '_> {
        Box::new(
            self.states[state as usize]
                .transitions
                .iter()
                .map(|id| &self.transitions[*id as usize]),
        )
    }

    fn insert_state(&mut self, state: AbstractState) -> StateId {
        self.add_state(state)
    }

    fn insert_transition(&mut self, transition: AbstractTransition) -> TransitionId {
        self.add_transition(transition)
    }

    fn remove_transition(&mut self, id: TransitionId) {
        self.detach(id);
    }
}
