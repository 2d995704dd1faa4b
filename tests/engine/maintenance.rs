//! Incremental maintenance agrees with evaluation from scratch.
//!
//! Random insert/remove sequences over a tiny graph are applied to a live
//! engine. After every flush its inference graph must equal what a fresh
//! engine concludes from the same base facts.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use proptest::prelude::*;
use quadrille_engine::{
    Aggregate, Aggregation, Bindings, Condition, ConclusionTerm, Pattern, Query, QueryEngine, Rule,
    RuleEngine, SolutionListener, Term,
};
use quadrille_foundation::vocab;
use quadrille_foundation::{Node, Quad};
use quadrille_storage::{MemoryStore, QuadFilter, QuadStore};

fn edge(from: u8, to: u8) -> Quad {
    Quad::new(
        Node::iri("urn:g"),
        Node::iri(format!("urn:n{from}")),
        Node::iri("urn:next"),
        Node::iri(format!("urn:n{to}")),
    )
}

fn rules() -> Vec<Rule> {
    vec![
        Rule::builder("reach-base")
            .when(Pattern::new(Term::var("x"), Node::iri("urn:next"), Term::var("y")))
            .conclude(ConclusionTerm::var("x"), Node::iri("urn:reaches"), ConclusionTerm::var("y"))
            .build(),
        Rule::builder("reach-step")
            .when(Pattern::new(Term::var("x"), Node::iri("urn:reaches"), Term::var("y")))
            .when(Pattern::new(Term::var("y"), Node::iri("urn:next"), Term::var("z")))
            .conclude(ConclusionTerm::var("x"), Node::iri("urn:reaches"), ConclusionTerm::var("z"))
            .build(),
        Rule::builder("dead-end")
            .when(Pattern::new(Term::var("x"), Node::iri("urn:next"), Term::var("y")))
            .unless(vec![Pattern::new(Term::var("y"), Node::iri("urn:next"), Term::Any)])
            .conclude(ConclusionTerm::var("y"), Node::iri(vocab::RDF_TYPE), Node::iri("urn:Sink"))
            .build(),
        Rule::builder("out-degree")
            .when(Pattern::new(Term::var("x"), Node::iri("urn:next"), Term::var("y")))
            .aggregate(Aggregation::new().group_by("x").bind("n", Aggregate::count()))
            .conclude(ConclusionTerm::var("x"), Node::iri("urn:outDegree"), ConclusionTerm::var("n"))
            .build(),
    ]
}

fn inferred(store: &MemoryStore) -> Vec<Quad> {
    store.matching(&QuadFilter::any().with_graph(Node::iri(vocab::GRAPH_INFERENCE)))
}

fn from_scratch(base: &BTreeSet<Quad>) -> Vec<Quad> {
    let mut store = MemoryStore::new();
    for quad in base {
        store.insert(quad.clone()).unwrap();
    }
    let mut engine = RuleEngine::new(&mut store);
    for rule in rules() {
        engine.add(&mut store, rule).unwrap();
    }
    inferred(&store)
}

#[derive(Clone, Default)]
struct Live(Rc<RefCell<BTreeSet<Bindings>>>);

impl SolutionListener for Live {
    fn on_new_solution(&mut self, solution: &Bindings) {
        assert!(self.0.borrow_mut().insert(solution.clone()), "solution announced twice");
    }

    fn on_solution_retracted(&mut self, solution: &Bindings) {
        assert!(self.0.borrow_mut().remove(solution), "unknown solution retracted");
    }
}

fn two_hop() -> Query {
    Query::new(
        Condition::new()
            .when(Pattern::new(Term::var("a"), Node::iri("urn:next"), Term::var("b")))
            .when(Pattern::new(Term::var("b"), Node::iri("urn:next"), Term::var("c"))),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rules_match_batch_evaluation(ops in prop::collection::vec((any::<bool>(), 0u8..4, 0u8..4), 1..24)) {
        let mut store = MemoryStore::new();
        let mut engine = RuleEngine::new(&mut store);
        for rule in rules() {
            engine.add(&mut store, rule).unwrap();
        }

        let mut base = BTreeSet::new();
        for (add, from, to) in ops {
            let quad = edge(from, to);
            if add {
                store.insert(quad.clone()).unwrap();
                base.insert(quad);
            } else {
                store.remove(&quad).unwrap();
                base.remove(&quad);
            }
            engine.flush(&mut store).unwrap();
            prop_assert_eq!(inferred(&store), from_scratch(&base));
        }
    }

    #[test]
    fn listeners_match_fresh_execution(ops in prop::collection::vec((any::<bool>(), 0u8..4, 0u8..4), 1..24)) {
        let mut store = MemoryStore::new();
        let mut engine = QueryEngine::new(&mut store);
        let live = Live::default();
        engine.register(&mut store, &two_hop(), Box::new(live.clone())).unwrap();

        for (add, from, to) in ops {
            let quad = edge(from, to);
            if add {
                store.insert(quad).unwrap();
            } else {
                store.remove(&quad).unwrap();
            }
            engine.flush(&mut store);

            let mut fresh = QueryEngine::new(&mut store);
            let expected: BTreeSet<Bindings> =
                fresh.execute(&mut store, &Rc::new(two_hop())).unwrap().into_iter().collect();
            fresh.detach(&mut store);
            let seen = live.0.borrow().clone();
            prop_assert_eq!(seen, expected);
        }
    }
}
