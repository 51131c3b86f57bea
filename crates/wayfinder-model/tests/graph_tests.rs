use std::collections::BTreeMap;

use wayfinder_model::{
    AbstractAction, AbstractGraph, AbstractState, AbstractTransition, GraphAccessor,
    TransitionStatus, WindowKind,
};

fn two_state_graph() -> (AbstractGraph, u32, u32) {
    let mut g = AbstractGraph::new();
    let main = g.add_window("Main", WindowKind::Activity);
    let a = g.add_state(AbstractState::new(main).with_gui_state(1));
    let b = g.add_state(AbstractState::new(main).with_gui_state(2));
    (g, a, b)
}

#[test]
fn test_deactivated_edge_stays_attached() {
    let (mut g, a, b) = two_state_graph();
    let t = g.add_transition(AbstractTransition::new(a, b, AbstractAction::click("x")));

    g.set_transition_status(t, TransitionStatus::Deactivated);

    assert_eq!(g.edges_from(a).count(), 1);
    assert!(!g.transition(t).is_usable());
}

#[test]
fn test_removed_status_detaches_edge() {
    let (mut g, a, b) = two_state_graph();
    let t = g.add_transition(AbstractTransition::new(a, b, AbstractAction::click("x")));

    g.set_transition_status(t, TransitionStatus::Removed);

    assert_eq!(g.edges_from(a).count(), 0);
    assert!(g.state(a).transition_ids().is_empty());
}

#[test]
fn test_invalidate_prediction_exhausts_predicted_state() {
    let (mut g, a, _) = two_state_graph();
    let mut probabilities = BTreeMap::new();
    probabilities.insert(AbstractAction::click("v"), 0.8);
    let window = g.state(a).window;
    let p = g.insert_state(AbstractState::predicted(window, probabilities));

    assert!(!g.invalidate_prediction(p, &AbstractAction::click("w")));
    assert!(g.invalidate_prediction(p, &AbstractAction::click("v")));
    assert!(g.state(p).is_exhausted_prediction());
}

#[test]
fn test_edges_into_predicted_state_do_not_register_actions_on_predicted_source() {
    let (mut g, a, _) = two_state_graph();
    let mut probabilities = BTreeMap::new();
    probabilities.insert(AbstractAction::click("v"), 0.9);
    let window = g.state(a).window;
    let p = g.insert_state(AbstractState::predicted(window, probabilities));
    g.insert_transition(AbstractTransition::new(p, a, AbstractAction::click("q")));

    let actions = g.state(p).available_actions();
    assert_eq!(actions.len(), 1);
    assert!(actions.contains(&AbstractAction::click("v")));
}

#[test]
fn test_graph_serializes() {
    let (mut g, a, b) = two_state_graph();
    g.add_transition(AbstractTransition::new(a, b, AbstractAction::click("x")).traced(1, 0));
    let mut probabilities = BTreeMap::new();
    probabilities.insert(AbstractAction::click("v"), 0.8);
    let window = g.state(a).window;
    let p = g.insert_state(AbstractState::predicted(window, probabilities));

    let json = serde_json::to_string(&g).unwrap();
    let restored: AbstractGraph = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.state_count(), g.state_count());
    assert_eq!(restored.edges().count(), 1);
    assert_eq!(restored.edges_from(a).next().unwrap().dest, b);
    assert_eq!(
        restored.state(p).predicted_probabilities().unwrap()[&AbstractAction::click("v")],
        0.8
    );
}
