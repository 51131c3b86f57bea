//! Fuzzy state equality used when matching guard dependencies.

use std::collections::{BTreeMap, BTreeSet};

use crate::state::{AbstractState, StateId};

/// Policy deciding whether two abstract states count as the same node.
pub trait StateEquivalence {
    fn equivalent(&self, a: &AbstractState, b: &AbstractState) -> bool;
}

/// Identity, then structural hash, then registered backward mappings.
///
/// Backward mappings link a state of a reused (base) model to the states of
/// the running model it was re-identified as.
#[derive(Debug, Clone, Default)]
pub struct StructuralEquivalence {
    backward: BTreeMap<StateId, BTreeSet<StateId>>,
}

impl StructuralEquivalence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register that `base` (from a previous model) maps onto `running`.
    pub fn register_backward(&mut self, base: StateId, running: StateId) {
        self.backward.entry(base).or_default().insert(running);
    }

    fn mapped(&self, from: StateId, to: StateId) -> bool {
        self.backward
            .get(&from)
            .is_some_and(|targets| targets.contains(&to))
    }
}

impl StateEquivalence for StructuralEquivalence {
    fn equivalent(&self, a: &AbstractState, b: &AbstractState) -> bool {
        if a.id == b.id {
            return true;
        }
        // Zero means "no signature computed".
        if a.structural_hash != 0 && a.structural_hash == b.structural_hash {
            return true;
        }
        self.mapped(a.id, b.id) || self.mapped(b.id, a.id)
    }
}

/// Identity only.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityEquivalence;

impl StateEquivalence for IdentityEquivalence {
    fn equivalent(&self, a: &AbstractState, b: &AbstractState) -> bool {
        a.id == b.id
    }
}
