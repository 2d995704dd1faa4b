//! Integration tests for continuous and ad hoc queries

use std::cell::RefCell;
use std::rc::Rc;

use quadrille_engine::{
    Aggregate, Aggregation, Bindings, Condition, EngineConfig, Pattern, Query, QueryEngine,
    SolutionListener, Term,
};
use quadrille_foundation::{ErrorKind, Node, NodeFactory, Quad};
use quadrille_storage::{MemoryStore, QuadStore};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    New(Bindings),
    Retracted(Bindings),
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<Event>>>);

impl Recorder {
    fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

impl SolutionListener for Recorder {
    fn on_new_solution(&mut self, solution: &Bindings) {
        self.0.borrow_mut().push(Event::New(solution.clone()));
    }

    fn on_solution_retracted(&mut self, solution: &Bindings) {
        self.0.borrow_mut().push(Event::Retracted(solution.clone()));
    }
}

fn quad(s: &str, p: &str, o: &str) -> Quad {
    Quad::new(Node::iri("urn:g"), Node::iri(s), Node::iri(p), Node::iri(o))
}

fn knows() -> Query {
    Query::new(Condition::new().when(Pattern::new(Term::var("a"), Node::iri("urn:knows"), Term::var("b"))))
}

fn pair(a: &str, b: &str) -> Bindings {
    [("a", Node::iri(a)), ("b", Node::iri(b))].into_iter().collect()
}

// =============================================================================
// Continuous Queries
// =============================================================================

#[test]
fn listener_is_replayed_then_notified() {
    let mut store = MemoryStore::new();
    store.insert(quad("urn:ann", "urn:knows", "urn:bob")).unwrap();
    let mut engine = QueryEngine::new(&mut store);

    let recorder = Recorder::default();
    engine.register(&mut store, &knows(), Box::new(recorder.clone())).unwrap();
    assert_eq!(recorder.take(), vec![Event::New(pair("urn:ann", "urn:bob"))]);

    store.insert(quad("urn:bob", "urn:knows", "urn:cat")).unwrap();
    store.remove(&quad("urn:ann", "urn:knows", "urn:bob")).unwrap();
    assert_eq!(engine.flush(&mut store), 2);
    assert_eq!(
        recorder.take(),
        vec![
            Event::New(pair("urn:bob", "urn:cat")),
            Event::Retracted(pair("urn:ann", "urn:bob")),
        ]
    );
}

#[test]
fn equal_conditions_share_one_network() {
    let mut store = MemoryStore::new();
    let mut engine = QueryEngine::new(&mut store);
    let p1 = Pattern::new(Term::var("a"), Node::iri("urn:knows"), Term::var("b"));
    let p2 = Pattern::new(Term::var("b"), Node::iri("urn:likes"), Term::var("c"));
    let forward = Query::new(Condition::new().when(p1.clone()).when(p2.clone()));
    let backward = Query::new(Condition::new().when(p2).when(p1));

    let first = Recorder::default();
    let second = Recorder::default();
    let id1 = engine.register(&mut store, &forward, Box::new(first.clone())).unwrap();
    let id2 = engine.register(&mut store, &backward, Box::new(second.clone())).unwrap();
    assert_eq!(engine.query_count(), 1);
    assert_eq!(engine.listener_count(&forward), 2);

    store.insert(quad("urn:ann", "urn:knows", "urn:bob")).unwrap();
    store.insert(quad("urn:bob", "urn:likes", "urn:tea")).unwrap();
    engine.flush(&mut store);
    assert_eq!(first.take().len(), 1);
    assert_eq!(second.take().len(), 1);

    assert!(engine.unregister(id1));
    assert_eq!(engine.query_count(), 1);
    assert!(engine.unregister(id2));
    assert_eq!(engine.query_count(), 0);
    assert!(!engine.unregister(id2));
}

#[test]
fn solution_from_two_graphs_is_announced_once() {
    let mut store = MemoryStore::new();
    let mut engine = QueryEngine::new(&mut store);
    let recorder = Recorder::default();
    engine.register(&mut store, &knows(), Box::new(recorder.clone())).unwrap();

    let other = Quad::new(Node::iri("urn:h"), Node::iri("urn:ann"), Node::iri("urn:knows"), Node::iri("urn:bob"));
    store.insert(quad("urn:ann", "urn:knows", "urn:bob")).unwrap();
    store.insert(other.clone()).unwrap();
    engine.flush(&mut store);
    assert_eq!(recorder.take(), vec![Event::New(pair("urn:ann", "urn:bob"))]);

    store.remove(&other).unwrap();
    engine.flush(&mut store);
    assert!(recorder.take().is_empty());

    store.remove(&quad("urn:ann", "urn:knows", "urn:bob")).unwrap();
    engine.flush(&mut store);
    assert_eq!(recorder.take(), vec![Event::Retracted(pair("urn:ann", "urn:bob"))]);
}

#[test]
fn negated_query_tracks_blockers() {
    let mut store = MemoryStore::new();
    let mut engine = QueryEngine::new(&mut store);
    let lonely = Query::new(
        Condition::new()
            .when(Pattern::new(Term::var("a"), Node::iri("urn:knows"), Term::var("b")))
            .unless(vec![Pattern::new(Term::var("b"), Node::iri("urn:knows"), Term::var("a"))]),
    );
    let recorder = Recorder::default();
    engine.register(&mut store, &lonely, Box::new(recorder.clone())).unwrap();

    store.insert(quad("urn:ann", "urn:knows", "urn:bob")).unwrap();
    engine.flush(&mut store);
    assert_eq!(recorder.take(), vec![Event::New(pair("urn:ann", "urn:bob"))]);

    store.insert(quad("urn:bob", "urn:knows", "urn:ann")).unwrap();
    engine.flush(&mut store);
    assert_eq!(recorder.take(), vec![Event::Retracted(pair("urn:ann", "urn:bob"))]);
    assert_eq!(engine.solutions(&lonely), Some(Vec::new()));
}

#[test]
fn invalid_query_is_rejected() {
    let mut store = MemoryStore::new();
    let mut engine = QueryEngine::new(&mut store);
    let empty = Query::new(Condition::new());
    let err = engine.register(&mut store, &empty, Box::new(Recorder::default())).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidQuery(_)));
    assert_eq!(engine.query_count(), 0);

    let err = engine.execute(&mut store, &Rc::new(empty)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidQuery(_)));
}

// =============================================================================
// Ad Hoc Queries
// =============================================================================

#[test]
fn execute_returns_sorted_bag() {
    let mut store = MemoryStore::new();
    let mut engine = QueryEngine::new(&mut store);
    store.insert(quad("urn:bob", "urn:knows", "urn:cat")).unwrap();
    store.insert(quad("urn:ann", "urn:knows", "urn:bob")).unwrap();
    store
        .insert(Quad::new(Node::iri("urn:h"), Node::iri("urn:ann"), Node::iri("urn:knows"), Node::iri("urn:bob")))
        .unwrap();

    let solutions = engine.execute(&mut store, &Rc::new(knows())).unwrap();
    assert_eq!(
        solutions,
        vec![
            pair("urn:ann", "urn:bob"),
            pair("urn:ann", "urn:bob"),
            pair("urn:bob", "urn:cat"),
        ]
    );
}

#[test]
fn cached_query_is_maintained() {
    let mut store = MemoryStore::new();
    let mut engine = QueryEngine::new(&mut store);
    let query = Rc::new(knows());

    assert!(engine.execute(&mut store, &query).unwrap().is_empty());
    assert_eq!(engine.cache().len(), 1);

    store.insert(quad("urn:ann", "urn:knows", "urn:bob")).unwrap();
    assert_eq!(engine.execute(&mut store, &query).unwrap(), vec![pair("urn:ann", "urn:bob")]);
    assert_eq!(engine.cache().len(), 1);
    assert_eq!(engine.cache().entries().next().unwrap().hits(), 2);

    // Equal content, different identity: a separate entry.
    engine.execute(&mut store, &Rc::new(knows())).unwrap();
    assert_eq!(engine.cache().len(), 2);
}

#[test]
fn count_query_through_cache() {
    let mut factory = NodeFactory::new();
    let mut store = MemoryStore::new();
    let mut engine = QueryEngine::new(&mut store);
    let query = Rc::new(Query::new(
        Condition::new()
            .when(Pattern::new(Term::var("a"), Node::iri("urn:knows"), Term::var("b")))
            .aggregate(Aggregation::new().group_by("a").bind("n", Aggregate::count())),
    ));
    store.insert(quad("urn:ann", "urn:knows", "urn:bob")).unwrap();
    store.insert(quad("urn:ann", "urn:knows", "urn:cat")).unwrap();
    store.insert(quad("urn:bob", "urn:knows", "urn:cat")).unwrap();

    let solutions = engine.execute(&mut store, &query).unwrap();
    assert_eq!(solutions.len(), 2);
    assert_eq!(solutions[0].value("a"), Some(&Node::iri("urn:ann")));
    assert_eq!(solutions[0].value("n"), Some(&factory.integer(2)));

    store.remove(&quad("urn:ann", "urn:knows", "urn:bob")).unwrap();
    let solutions = engine.execute(&mut store, &query).unwrap();
    assert_eq!(solutions[0].value("n"), Some(&factory.integer(1)));
}

#[test]
fn zero_capacity_cache_still_answers() {
    let mut store = MemoryStore::new();
    let mut engine = QueryEngine::with_config(&mut store, EngineConfig::new().with_cache_capacity(0));
    store.insert(quad("urn:ann", "urn:knows", "urn:bob")).unwrap();
    let query = Rc::new(knows());
    assert_eq!(engine.execute(&mut store, &query).unwrap().len(), 1);
    assert_eq!(engine.execute(&mut store, &query).unwrap().len(), 1);
    assert!(engine.cache().is_empty());
}
