//! Caller-facing exploration session.
//!
//! [`session::ExplorationSession`] owns the abstract graph, the action
//! co-occurrence statistics, the learned search memory and the configuration,
//! and exposes the operations a test-generation strategy needs between two
//! device actions: find a path to a target, report a failed path, and ask
//! whether a path is known to be bad.

pub mod config;
pub mod session;

pub use config::{SessionConfig, SessionError};
pub use session::ExplorationSession;
