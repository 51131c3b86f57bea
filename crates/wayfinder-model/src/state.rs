use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::action::{AbstractAction, Input};
use crate::transition::TransitionId;
use crate::window::WindowId;

pub type StateId = u32;

/// What an abstract state node stands for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateKind {
    /// A cluster of concretely observed GUI states.
    Concrete,
    /// Placeholder for "any instance of this window".
    Virtual,
    /// Speculative destination synthesized from action co-occurrence.
    /// Maps each predicted action to its estimated probability.
    Predicted {
        #[serde(with = "probability_pairs")]
        probabilities: BTreeMap<AbstractAction, f64>,
    },
}

/// JSON object keys must be strings, so probabilities travel as pairs.
mod probability_pairs {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serializer};

    use crate::action::AbstractAction;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<AbstractAction, f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<AbstractAction, f64>, D::Error> {
        let pairs: Vec<(AbstractAction, f64)> = Vec::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateStatus {
    Active,
    Ignored,
}

/// A node of the abstract state graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbstractState {
    pub id: StateId,
    pub window: WindowId,
    pub kind: StateKind,
    pub status: StateStatus,
    /// Hashes of the concrete GUI states clustered into this node.
    pub gui_states: BTreeSet<u64>,
    /// Structural signature used for fuzzy equality.
    pub structural_hash: u64,
    actions: BTreeSet<AbstractAction>,
    inputs: BTreeSet<Input>,
    pub(crate) transitions: Vec<TransitionId>,
}

impl AbstractState {
    /// A concrete state on `window`. The id is assigned on insertion.
    pub fn new(window: WindowId) -> Self {
        Self {
            id: 0,
            window,
            kind: StateKind::Concrete,
            status: StateStatus::Active,
            gui_states: BTreeSet::new(),
            structural_hash: 0,
            actions: BTreeSet::new(),
            inputs: BTreeSet::new(),
            transitions: Vec::new(),
        }
    }

    pub fn virtual_state(window: WindowId) -> Self {
        Self {
            kind: StateKind::Virtual,
            ..Self::new(window)
        }
    }

    pub fn predicted(window: WindowId, probabilities: BTreeMap<AbstractAction, f64>) -> Self {
        let actions = probabilities.keys().cloned().collect();
        Self {
            kind: StateKind::Predicted { probabilities },
            actions,
            ..Self::new(window)
        }
    }

    pub fn with_action(mut self, action: AbstractAction) -> Self {
        self.actions.insert(action);
        self
    }

    pub fn with_input(mut self, input: Input) -> Self {
        self.inputs.insert(input);
        self
    }

    pub fn with_gui_state(mut self, gui_state_hash: u64) -> Self {
        self.gui_states.insert(gui_state_hash);
        self
    }

    pub fn with_structural_hash(mut self, hash: u64) -> Self {
        self.structural_hash = hash;
        self
    }

    pub fn add_action(&mut self, action: AbstractAction) {
        self.actions.insert(action);
    }

    pub fn add_input(&mut self, input: Input) {
        self.inputs.insert(input);
    }

    pub fn available_actions(&self) -> &BTreeSet<AbstractAction> {
        &self.actions
    }

    pub fn available_inputs(&self) -> &BTreeSet<Input> {
        &self.inputs
    }

    /// Outgoing transition ids, in insertion order.
    pub fn transition_ids(&self) -> &[TransitionId] {
        &self.transitions
    }

    pub fn is_virtual(&self) -> bool {
        self.kind == StateKind::Virtual
    }

    pub fn is_predicted(&self) -> bool {
        matches!(self.kind, StateKind::Predicted { .. })
    }

    pub fn is_ignored(&self) -> bool {
        self.status == StateStatus::Ignored
    }

    /// True once at least one concrete GUI state was clustered here.
    pub fn is_observed(&self) -> bool {
        !self.gui_states.is_empty()
    }

    pub fn predicted_probabilities(&self) -> Option<&BTreeMap<AbstractAction, f64>> {
        match &self.kind {
            StateKind::Predicted { probabilities } => Some(probabilities),
            _ => None,
        }
    }

    /// A predicted node with no predicted actions left is exhausted.
    pub fn is_exhausted_prediction(&self) -> bool {
        self.predicted_probabilities()
            .is_some_and(|probabilities| probabilities.is_empty())
    }

    /// Drop one predicted action. Returns whether it was present.
    pub(crate) fn remove_prediction(&mut self, action: &AbstractAction) -> bool {
        let removed = match &mut self.kind {
            StateKind::Predicted { probabilities } => probabilities.remove(action).is_some(),
            _ => false,
        };
        if removed {
            self.actions.remove(action);
        }
        removed
    }
}
