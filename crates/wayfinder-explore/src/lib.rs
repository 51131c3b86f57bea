//! Path search over a growing abstract GUI state graph.
//!
//! The [`search::PathFinder`] runs a level-synchronous, cost-bounded BFS
//! from a root state toward target states or windows. While it searches it
//! may synthesize predicted destination states and insert them into the
//! graph, so a search is also a lazy graph-completion step: callers observe
//! the inserted nodes and edges through [`search::GraphDelta`].
//!
//! [`memory::SearchMemory`] keeps what the engine learns across searches:
//! path prefixes disabled after failed executions, disabled edges, and a
//! cache of previously returned paths.

pub mod config;
pub mod memory;
pub mod path;
pub mod search;

pub use config::{ConfigError, CostModel, PathConstraints, SearchConfig};
pub use memory::{DisableReason, DisabledPath, FailureOutcome, SearchMemory};
pub use path::{Goal, PathType, TransitionPath};
pub use search::{GraphDelta, PathFinder, SearchOutcome, SearchRequest, SearchStats, TargetSet};
