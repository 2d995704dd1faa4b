//! Integration tests for patterns and the matching network

use quadrille_engine::{
    Condition, DeltaKind, Network, Pattern, SolutionChange, StandardEvaluator, Term, Terminal,
    Variable,
};
use quadrille_foundation::{Node, Quad};
use quadrille_storage::{MemoryStore, QuadStore};

fn quad(s: &str, p: &str, o: &str) -> Quad {
    Quad::new(Node::iri("urn:g"), Node::iri(s), Node::iri(p), Node::iri(o))
}

// =============================================================================
// Patterns
// =============================================================================

#[test]
fn repeated_variable_requires_equal_nodes() {
    let reflexive = Pattern::new(Term::var("x"), Node::iri("urn:knows"), Term::var("x"));
    assert!(reflexive.matches(&quad("urn:a", "urn:knows", "urn:a")).is_some());
    assert!(reflexive.matches(&quad("urn:a", "urn:knows", "urn:b")).is_none());
}

#[test]
fn graph_position_can_be_bound() {
    let pattern = Pattern::new(Term::var("s"), Term::Any, Term::Any).in_graph(Term::var("g"));
    let bindings = pattern.matches(&quad("urn:a", "urn:p", "urn:b")).unwrap();
    assert_eq!(bindings.value("g"), Some(&Node::iri("urn:g")));
    assert_eq!(bindings.len(), 2);
}

#[test]
fn condition_keys_ignore_pattern_order() {
    let p1 = Pattern::new(Term::var("x"), Node::iri("urn:p"), Term::var("y"));
    let p2 = Pattern::new(Term::var("y"), Node::iri("urn:q"), Term::var("z"));
    let a = Condition::new().when(p1.clone()).when(p2.clone());
    let b = Condition::new().when(p2).when(p1);
    assert_ne!(a, b);
    assert_eq!(a.key(), b.key());
}

#[test]
fn output_variables_of_plain_condition() {
    let condition = Condition::new()
        .when(Pattern::new(Term::var("x"), Node::iri("urn:p"), Term::var("y")))
        .unless(vec![Pattern::new(Term::var("y"), Node::iri("urn:q"), Term::var("z"))]);
    let vars: Vec<Variable> = condition.output_variables().into_iter().collect();
    assert_eq!(vars, vec![Variable::new("x"), Variable::new("y")]);
}

// =============================================================================
// Network
// =============================================================================

#[test]
fn join_emits_once_per_complete_match() {
    let evaluator = StandardEvaluator;
    let condition = Condition::new()
        .when(Pattern::new(Term::var("x"), Node::iri("urn:parent"), Term::var("y")))
        .when(Pattern::new(Term::var("y"), Node::iri("urn:parent"), Term::var("z")));
    let mut network = Network::compile(&condition).unwrap();
    let store = MemoryStore::new();
    assert!(network.prime(&store, &evaluator).is_empty());

    // Right side first, then left.
    assert!(network.insert(&quad("urn:b", "urn:parent", "urn:c"), &evaluator).deltas.is_empty());
    let propagation = network.insert(&quad("urn:a", "urn:parent", "urn:b"), &evaluator);
    assert_eq!(propagation.deltas.len(), 1);
    assert_eq!(propagation.deltas[0].kind, DeltaKind::Activated);
    assert_eq!(
        propagation.deltas[0].token.bindings().value("z"),
        Some(&Node::iri("urn:c"))
    );

    let propagation = network.remove(&quad("urn:b", "urn:parent", "urn:c"), &evaluator);
    assert_eq!(propagation.deltas.len(), 1);
    assert_eq!(propagation.deltas[0].kind, DeltaKind::Deactivated);
    assert_eq!(network.tokens().count(), 0);
}

#[test]
fn primed_network_matches_existing_store() {
    let evaluator = StandardEvaluator;
    let mut store = MemoryStore::new();
    store.insert(quad("urn:a", "urn:p", "urn:b")).unwrap();
    store.insert(quad("urn:c", "urn:p", "urn:d")).unwrap();

    let condition = Condition::new().when(Pattern::new(Term::var("x"), Node::iri("urn:p"), Term::var("y")));
    let mut network = Network::compile(&condition).unwrap();
    let propagation = network.prime(&store, &evaluator);

    let mut terminal = Terminal::new();
    let changes = terminal.apply(&propagation.deltas);
    assert_eq!(changes.len(), 2);
    assert!(changes.iter().all(|change| matches!(change, SolutionChange::New(_))));
    assert_eq!(terminal.len(), 2);
}

#[test]
fn negation_only_condition_matches_empty_bindings() {
    let evaluator = StandardEvaluator;
    let condition = Condition::new().unless(vec![Pattern::new(Term::Any, Node::iri("urn:alarm"), Term::Any)]);
    let mut network = Network::compile(&condition).unwrap();
    let store = MemoryStore::new();

    let primed = network.prime(&store, &evaluator);
    assert_eq!(primed.deltas.len(), 1);
    assert!(primed.deltas[0].token.bindings().is_empty());

    let raised = network.insert(&quad("urn:a", "urn:alarm", "urn:on"), &evaluator);
    assert_eq!(raised.deltas[0].kind, DeltaKind::Deactivated);

    let cleared = network.remove(&quad("urn:a", "urn:alarm", "urn:on"), &evaluator);
    assert_eq!(cleared.deltas[0].kind, DeltaKind::Activated);
}

#[test]
fn step_bindings_reflect_partial_matches() {
    let evaluator = StandardEvaluator;
    let condition = Condition::new()
        .when(Pattern::new(Term::var("x"), Node::iri("urn:p"), Term::var("y")))
        .when(Pattern::new(Term::var("y"), Node::iri("urn:q"), Term::var("z")));
    let mut network = Network::compile(&condition).unwrap();
    network.prime(&MemoryStore::new(), &evaluator);
    network.insert(&quad("urn:a", "urn:p", "urn:b"), &evaluator);
    network.insert(&quad("urn:c", "urn:p", "urn:d"), &evaluator);

    assert_eq!(network.step_bindings(0).len(), 2);
    assert!(network.step_bindings(1).is_empty());
}
