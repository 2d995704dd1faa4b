//! Integration tests for error types

use quadrille_foundation::{Error, ErrorContext, ErrorKind, SemanticLimit, ValueType};

#[test]
fn type_mismatch_message() {
    let err = Error::type_mismatch(ValueType::Numeric, ValueType::String);
    assert_eq!(err.to_string(), "type mismatch: expected numeric, got string");
}

#[test]
fn unbound_variable_message() {
    assert_eq!(Error::unbound_variable("x").to_string(), "unbound variable: ?x");
}

#[test]
fn invalid_rule_carries_rule_name() {
    let err = Error::invalid_rule("r1", "rule has no conclusions");
    match err.kind {
        ErrorKind::InvalidRule { rule, reason } => {
            assert_eq!(rule, "r1");
            assert_eq!(reason, "rule has no conclusions");
        }
        other => panic!("unexpected kind: {other:?}"),
    }
}

#[test]
fn limit_exceeded_names_the_phase() {
    let err = Error::limit_exceeded(SemanticLimit::MaxRounds {
        limit: 10,
        context: Some("rederive".to_string()),
    });
    assert_eq!(err.to_string(), "limit exceeded: max rounds (10) exceeded: rederive");
}

#[test]
fn context_is_attached() {
    let err = Error::new(ErrorKind::DivisionByZero)
        .with_context(ErrorContext::new().with_source("rule r").with_frame("conclusion 1"));
    let context = err.context.unwrap();
    assert_eq!(context.source.as_deref(), Some("rule r"));
    assert_eq!(context.stack, vec!["conclusion 1".to_string()]);
}
