//! State prediction from action co-occurrence statistics.
//!
//! When an action has no usable concrete edge, the predictor guesses which
//! actions will be enabled after it fires, using how often each action
//! became available after the same trigger in the past. Statistics are
//! bucketed by dependent window; the bucket of the most specific window on
//! the branch (the source window, then the back-stack from most recent) is
//! merged with the fake-window bucket by summing counts.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;
use wayfinder_model::{
    AbstractAction, AbstractState, ActionStatistics, GraphAccessor, StateId, WindowBucket, WindowId,
};

use super::BackStack;

/// Estimate for one co-occurring action.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictedAction {
    pub action: AbstractAction,
    /// `joint / total`.
    pub probability: f64,
    /// Zero when the trigger was observed only once.
    pub effectiveness: f64,
    pub joint: u32,
    pub total: u32,
}

impl PredictedAction {
    pub fn is_admissible(&self, threshold: f64) -> bool {
        self.probability >= threshold && self.effectiveness > 0.0
    }
}

/// A synthesized destination, not yet inserted into the graph.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub window: WindowId,
    /// Admitted actions, in action order.
    pub actions: Vec<PredictedAction>,
}

impl Prediction {
    pub fn into_state(self) -> AbstractState {
        let probabilities: BTreeMap<AbstractAction, f64> = self
            .actions
            .into_iter()
            .map(|predicted| (predicted.action, predicted.probability))
            .collect();
        AbstractState::predicted(self.window, probabilities)
    }
}

pub struct StatePredictor<'a, S: ActionStatistics + ?Sized> {
    stats: &'a S,
    threshold: f64,
}

impl<'a, S: ActionStatistics + ?Sized> StatePredictor<'a, S> {
    pub fn new(stats: &'a S, threshold: f64) -> Self {
        Self { stats, threshold }
    }

    /// Every co-occurring action with its estimate, admissible or not.
    ///
    /// Returns the window the statistics were matched on (or the source
    /// window when only the fake bucket had data), or `None` when `trigger`
    /// has no statistics at all.
    pub fn estimate<G: GraphAccessor + ?Sized>(
        &self,
        graph: &G,
        source: StateId,
        trigger: &AbstractAction,
        stack: &BackStack,
    ) -> Option<(WindowId, Vec<PredictedAction>)> {
        let counts = self.stats.enabled_actions_for(trigger)?;
        let source_window = graph.state(source).window;

        let mut candidates = vec![source_window];
        for entry in stack.iter_recent() {
            let window = graph.state(entry).window;
            if !candidates.contains(&window) {
                candidates.push(window);
            }
        }
        let matched = candidates
            .into_iter()
            .find(|window| counts.contains_key(&WindowBucket::Window(*window)));

        let mut buckets = vec![WindowBucket::Fake];
        if let Some(window) = matched {
            buckets.insert(0, WindowBucket::Window(window));
        }

        let mut joint: BTreeMap<&AbstractAction, u32> = BTreeMap::new();
        let mut total = 0u32;
        let mut found = false;
        for bucket in buckets {
            let Some(bucket_counts) = counts.get(&bucket) else {
                continue;
            };
            found = true;
            total += self.stats.total_trigger_count(bucket, trigger).unwrap_or(0);
            for (action, count) in bucket_counts {
                *joint.entry(action).or_insert(0) += count;
            }
        }
        if !found || total == 0 {
            return None;
        }

        let effectiveness = if total == 1 { 0.0 } else { 1.0 };
        let estimates = joint
            .into_iter()
            .map(|(action, count)| PredictedAction {
                action: action.clone(),
                probability: f64::from(count) / f64::from(total),
                effectiveness,
                joint: count,
                total,
            })
            .collect();
        Some((matched.unwrap_or(source_window), estimates))
    }

    /// Synthesize a predicted destination for firing `trigger` at `source`.
    ///
    /// `None` unless at least one action clears the threshold and is not
    /// in `excluded`.
    pub fn predict<G: GraphAccessor + ?Sized>(
        &self,
        graph: &G,
        source: StateId,
        trigger: &AbstractAction,
        stack: &BackStack,
        excluded: &BTreeSet<AbstractAction>,
    ) -> Option<Prediction> {
        let (window, estimates) = self.estimate(graph, source, trigger, stack)?;
        let actions: Vec<PredictedAction> = estimates
            .into_iter()
            .filter(|predicted| predicted.is_admissible(self.threshold))
            .filter(|predicted| !excluded.contains(&predicted.action))
            .collect();
        if actions.is_empty() {
            return None;
        }
        debug!(source, %trigger, window, admitted = actions.len(), "predicted destination");
        Some(Prediction { window, actions })
    }
}
