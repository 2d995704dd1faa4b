//! Integration tests for nodes, quads, and the node factory

use std::collections::HashSet;
use std::sync::Arc;

use quadrille_foundation::vocab;
use quadrille_foundation::{ErrorKind, Iri, Literal, Node, NodeFactory, Quad};

// =============================================================================
// Node Identity
// =============================================================================

#[test]
fn factory_and_direct_iris_are_equal() {
    let mut factory = NodeFactory::new();
    assert_eq!(factory.iri("urn:a"), Node::iri("urn:a"));
}

#[test]
fn factory_interns_repeated_strings() {
    let mut factory = NodeFactory::new();
    let a = factory.intern("urn:shared");
    let b = factory.intern("urn:shared");
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(factory.interned_count(), 1);
}

#[test]
fn blanks_are_distinct() {
    let mut factory = NodeFactory::new();
    let blanks: HashSet<Node> = (0..100).map(|_| factory.blank()).collect();
    assert_eq!(blanks.len(), 100);
}

#[test]
fn literals_compare_by_lexical_datatype_and_language() {
    let mut factory = NodeFactory::new();
    assert_eq!(factory.integer(2), factory.typed("2", vocab::XSD_INTEGER));
    assert_ne!(factory.integer(2), factory.string("2"));
    assert_ne!(factory.lang_string("chat", "fr"), factory.lang_string("chat", "en"));
}

#[test]
fn literal_accessors() {
    let lit = Literal::lang_string("hello", "en");
    assert_eq!(lit.lexical(), "hello");
    assert_eq!(lit.language(), Some("en"));
    assert_eq!(lit.datatype(), &Iri::new(vocab::RDF_LANG_STRING));
}

#[test]
fn node_kind_predicates() {
    let mut factory = NodeFactory::new();
    assert!(factory.iri("urn:a").is_iri());
    assert!(factory.blank().is_blank());
    assert!(factory.boolean(true).is_literal());
}

// =============================================================================
// Quads
// =============================================================================

#[test]
fn well_formed_quad_validates() {
    let mut factory = NodeFactory::new();
    let quad = Quad::new(
        factory.iri("urn:g"),
        factory.blank(),
        factory.iri("urn:p"),
        factory.string("o"),
    );
    assert!(quad.validate().is_ok());
}

#[test]
fn literal_subject_is_rejected() {
    let mut factory = NodeFactory::new();
    let quad = Quad::new(
        factory.iri("urn:g"),
        factory.integer(1),
        factory.iri("urn:p"),
        factory.iri("urn:o"),
    );
    let err = quad.validate().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnsupportedNode(_)));
}

#[test]
fn blank_predicate_is_rejected() {
    let mut factory = NodeFactory::new();
    let quad = Quad::new(
        factory.iri("urn:g"),
        factory.iri("urn:s"),
        factory.blank(),
        factory.iri("urn:o"),
    );
    assert!(quad.validate().is_err());
}

#[test]
fn quads_in_different_graphs_differ() {
    let a = Quad::new(Node::iri("urn:g1"), Node::iri("urn:s"), Node::iri("urn:p"), Node::iri("urn:o"));
    let b = Quad::new(Node::iri("urn:g2"), Node::iri("urn:s"), Node::iri("urn:p"), Node::iri("urn:o"));
    assert_ne!(a, b);
}
