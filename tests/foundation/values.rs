//! Integration tests for typed values
//!
//! Tests decoding literals, encoding back to nodes, promotion, and ordering.

use std::cmp::Ordering;

use quadrille_foundation::value::decimal_lexical;
use quadrille_foundation::vocab;
use quadrille_foundation::{Node, NodeFactory, Numeric, Value, ValueType};

// =============================================================================
// Decoding
// =============================================================================

#[test]
fn decode_integer() {
    let mut factory = NodeFactory::new();
    assert_eq!(Value::from_node(&factory.integer(42)).as_integer(), Some(42));
}

#[test]
fn decode_boolean_forms() {
    let mut factory = NodeFactory::new();
    assert_eq!(Value::from_node(&factory.typed("1", vocab::XSD_BOOLEAN)).as_bool(), Some(true));
    assert_eq!(Value::from_node(&factory.boolean(false)).as_bool(), Some(false));
}

#[test]
fn decode_language_string_drops_tag() {
    let mut factory = NodeFactory::new();
    let value = Value::from_node(&factory.lang_string("chat", "fr"));
    assert_eq!(value.as_str(), Some("chat"));
}

#[test]
fn ill_typed_literal_stays_a_node() {
    let mut factory = NodeFactory::new();
    let node = factory.typed("forty-two", vocab::XSD_INTEGER);
    assert_eq!(Value::from_node(&node), Value::Node(node));
}

#[test]
fn iri_decodes_to_node() {
    let value = Value::from_node(&Node::iri("urn:a"));
    assert_eq!(value.value_type(), ValueType::Node);
}

// =============================================================================
// Encoding
// =============================================================================

#[test]
fn integer_round_trips_through_node() {
    let mut factory = NodeFactory::new();
    assert_eq!(Value::Integer(7).to_node(), factory.integer(7));
}

#[test]
fn decimals_always_carry_a_fraction() {
    assert_eq!(decimal_lexical(2.0), "2.0");
    assert_eq!(decimal_lexical(2.5), "2.5");
}

// =============================================================================
// Promotion and Ordering
// =============================================================================

#[test]
fn promotion_table() {
    assert_eq!(Value::Integer(1).promote(&Value::Integer(2)).unwrap(), Numeric::Integers(1, 2));
    assert_eq!(
        Value::Integer(1).promote(&Value::Decimal(2.5)).unwrap(),
        Numeric::Decimals(1.0, 2.5)
    );
    assert!(Value::from("a").promote(&Value::Integer(1)).is_err());
}

#[test]
fn mixed_numeric_comparison() {
    assert_eq!(Value::Integer(1).compare(&Value::Decimal(1.5)).unwrap(), Ordering::Less);
    assert_eq!(Value::Decimal(2.0).compare(&Value::Integer(2)).unwrap(), Ordering::Equal);
}

#[test]
fn strings_and_numbers_do_not_compare() {
    assert!(Value::from("1").compare(&Value::Integer(1)).is_err());
}

#[test]
fn same_term_promotes_numbers() {
    assert!(Value::Integer(3).same_term(&Value::Decimal(3.0)));
    assert!(!Value::from("3").same_term(&Value::Integer(3)));
}
