//! Action co-occurrence statistics.
//!
//! For every trigger action, counts how often each other action became
//! enabled right after the trigger was executed, bucketed by the window the
//! trigger depended on. A synthetic `Fake` bucket collects observations whose
//! dependent window was unknown.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::AbstractAction;
use crate::window::WindowId;

/// Key of a co-occurrence bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WindowBucket {
    Window(WindowId),
    Fake,
}

/// Joint counts keyed by bucket, then by co-occurring action.
pub type CooccurrenceCounts = BTreeMap<WindowBucket, BTreeMap<AbstractAction, u32>>;

/// Lookup of historical co-occurrence statistics.
pub trait ActionStatistics {
    /// Per-bucket joint counts of actions enabled after `trigger`.
    fn enabled_actions_for(&self, trigger: &AbstractAction) -> Option<&CooccurrenceCounts>;

    /// How many times `trigger` was observed in `bucket`.
    fn total_trigger_count(&self, bucket: WindowBucket, trigger: &AbstractAction) -> Option<u32>;
}

/// In-memory co-occurrence index.
#[derive(Debug, Clone, Default)]
pub struct CooccurrenceTable {
    joint: BTreeMap<AbstractAction, CooccurrenceCounts>,
    totals: BTreeMap<(WindowBucket, AbstractAction), u32>,
}

impl CooccurrenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one execution of `trigger` in `bucket`, after which
    /// `enabled` actions were available.
    pub fn record(
        &mut self,
        bucket: WindowBucket,
        trigger: &AbstractAction,
        enabled: &[AbstractAction],
    ) {
        *self
            .totals
            .entry((bucket, trigger.clone()))
            .or_insert(0) += 1;

        let counts = self
            .joint
            .entry(trigger.clone())
            .or_default()
            .entry(bucket)
            .or_default();
        for action in enabled {
            *counts.entry(action.clone()).or_insert(0) += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

impl ActionStatistics for CooccurrenceTable {
    fn enabled_actions_for(&self, trigger: &AbstractAction) -> Option<&CooccurrenceCounts> {
        self.joint.get(trigger)
    }

    fn total_trigger_count(&self, bucket: WindowBucket, trigger: &AbstractAction) -> Option<u32> {
        self.totals.get(&(bucket, trigger.clone())).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_joint_and_total() {
        let mut table = CooccurrenceTable::new();
        let z = AbstractAction::click("z");
        let v = AbstractAction::click("v");
        let w = AbstractAction::click("w");

        table.record(WindowBucket::Window(1), &z, &[v.clone(), w.clone()]);
        table.record(WindowBucket::Window(1), &z, &[v.clone()]);

        assert_eq!(table.total_trigger_count(WindowBucket::Window(1), &z), Some(2));
        let counts = table.enabled_actions_for(&z).unwrap();
        assert_eq!(counts[&WindowBucket::Window(1)][&v], 2);
        assert_eq!(counts[&WindowBucket::Window(1)][&w], 1);
    }

    #[test]
    fn test_unknown_trigger_has_no_statistics() {
        let table = CooccurrenceTable::new();
        let z = AbstractAction::click("z");
        assert!(table.is_empty());
        assert!(table.enabled_actions_for(&z).is_none());
        assert_eq!(table.total_trigger_count(WindowBucket::Fake, &z), None);
    }
}
