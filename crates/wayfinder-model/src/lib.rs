pub mod action;
pub mod equivalence;
pub mod graph;
pub mod state;
pub mod stats;
pub mod transition;
pub mod window;

pub use action::{AbstractAction, ActionType, Cardinality, Input};
pub use equivalence::{IdentityEquivalence, StateEquivalence, StructuralEquivalence};
pub use graph::{AbstractGraph, GraphAccessor};
pub use state::{AbstractState, StateId, StateKind, StateStatus};
pub use stats::{ActionStatistics, CooccurrenceCounts, CooccurrenceTable, WindowBucket};
pub use transition::{AbstractTransition, ModelVersion, TraceStep, TransitionId, TransitionStatus};
pub use window::{Window, WindowId, WindowKind};
