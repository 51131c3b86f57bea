use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of UI action an abstract action performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionType {
    Click,
    LongClick,
    ItemClick,
    Swipe,
    TextInsert,
    PressBack,
    PressMenu,
    RotateUi,
    LaunchApp,
    ResetApp,
    /// A batched sequence of actions replayed as one step.
    ActionQueue,
    Unknown,
}

/// How many concrete widgets an abstract action's widget group covers.
///
/// `Many` marks dynamic-content containers (list items and the like) whose
/// outcome cannot be trusted from a single observed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Cardinality {
    One,
    Many,
}

/// An action label on an abstract transition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbstractAction {
    pub action_type: ActionType,
    /// Widget signature the action targets (None for system actions).
    pub widget: Option<String>,
    pub cardinality: Cardinality,
}

impl AbstractAction {
    pub fn new(action_type: ActionType, widget: Option<&str>) -> Self {
        Self {
            action_type,
            widget: widget.map(str::to_string),
            cardinality: Cardinality::One,
        }
    }

    pub fn click(widget: &str) -> Self {
        Self::new(ActionType::Click, Some(widget))
    }

    pub fn launch() -> Self {
        Self::new(ActionType::LaunchApp, None)
    }

    pub fn reset() -> Self {
        Self::new(ActionType::ResetApp, None)
    }

    pub fn press_back() -> Self {
        Self::new(ActionType::PressBack, None)
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn is_launch(&self) -> bool {
        self.action_type == ActionType::LaunchApp
    }

    pub fn is_reset(&self) -> bool {
        self.action_type == ActionType::ResetApp
    }

    pub fn is_launch_or_reset(&self) -> bool {
        self.is_launch() || self.is_reset()
    }

    pub fn is_press_back(&self) -> bool {
        self.action_type == ActionType::PressBack
    }

    pub fn is_widget_action(&self) -> bool {
        matches!(
            self.action_type,
            ActionType::Click
                | ActionType::LongClick
                | ActionType::ItemClick
                | ActionType::Swipe
                | ActionType::TextInsert
        ) && self.widget.is_some()
    }

    pub fn has_many_cardinality(&self) -> bool {
        self.cardinality == Cardinality::Many
    }
}

impl fmt::Display for AbstractAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.widget {
            Some(widget) => write!(f, "{:?}({widget})", self.action_type),
            None => write!(f, "{:?}", self.action_type),
        }
    }
}

/// A GUI input event handler exposed by a window (from the static window
/// transition graph), independent of the abstract action that triggers it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Input {
    pub id: u32,
    pub event: ActionType,
    pub widget: Option<String>,
}

impl Input {
    pub fn new(id: u32, event: ActionType, widget: Option<&str>) -> Self {
        Self {
            id,
            event,
            widget: widget.map(str::to_string),
        }
    }
}
