use serde::{Deserialize, Serialize};

pub type WindowId = u32;

/// Kind of logical screen a window stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowKind {
    Activity,
    Dialog,
    OptionsMenu,
    /// The device home screen. Reaching it means the app was left.
    Launcher,
}

/// A logical screen identity that abstract states belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub id: WindowId,
    pub name: String,
    pub kind: WindowKind,
}

impl Window {
    pub fn is_launcher(&self) -> bool {
        self.kind == WindowKind::Launcher
    }
}
