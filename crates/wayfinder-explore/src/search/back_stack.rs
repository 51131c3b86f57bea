use wayfinder_model::{AbstractTransition, GraphAccessor, StateId};

/// Window back-stack carried along a search branch, oldest entry first.
///
/// An empty stack means the branch navigated out of the app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BackStack(Vec<StateId>);

impl BackStack {
    pub fn new(entries: Vec<StateId>) -> Self {
        Self(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn top(&self) -> Option<StateId> {
        self.0.last().copied()
    }

    /// Entries from most recent to oldest.
    pub fn iter_recent(&self) -> impl Iterator<Item = StateId> + '_ {
        self.0.iter().rev().copied()
    }

    pub fn entries(&self) -> &[StateId] {
        &self.0
    }

    /// The stack after taking `transition`.
    ///
    /// Launch and reset restart from the launcher; back pops; crossing into
    /// another window pushes the source state.
    pub fn advance<G: GraphAccessor + ?Sized>(
        &self,
        graph: &G,
        transition: &AbstractTransition,
    ) -> BackStack {
        if transition.action.is_launch_or_reset() {
            return BackStack(vec![graph.launcher_state()]);
        }
        let mut entries = self.0.clone();
        if transition.action.is_press_back() {
            entries.pop();
        } else if graph.state(transition.source).window != graph.state(transition.dest).window {
            entries.push(transition.source);
        }
        BackStack(entries)
    }
}
