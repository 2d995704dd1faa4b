//! Rule compiler: validates rules, builds their networks, and instantiates
//! conclusions for a match.

use quadrille_foundation::{Error, ErrorContext, Node, Quad, Result, Value, ValueType};

use super::{ConclusionTerm, Rule};
use crate::expr::Evaluator;
use crate::network::Network;
use crate::token::Bindings;

/// The quads one match concludes, and the conclusion attempts that failed.
#[derive(Clone, Debug, Default)]
pub struct Instantiation {
    /// Resolved, well-formed conclusions.
    pub quads: Vec<Quad>,
    /// One error per dropped conclusion (or one for a failing guard).
    pub failures: Vec<Error>,
}

/// Turns rules into networks and matches into conclusions.
pub struct RuleCompiler;

impl RuleCompiler {
    /// Checks a rule's structure.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRule` if the condition is malformed, the rule has no
    /// conclusions, a conclusion or the guard reads a variable the
    /// condition does not bind, or a constant conclusion term cannot occupy
    /// its position.
    pub fn validate(rule: &Rule) -> Result<()> {
        let invalid = |reason: String| Error::invalid_rule(rule.id.as_str(), reason);

        rule.condition.validate().map_err(invalid)?;
        if rule.conclusions.is_empty() {
            return Err(invalid("rule has no conclusions".to_string()));
        }

        let bound = rule.condition.output_variables();
        if let Some(guard) = &rule.guard {
            if let Some(var) = guard.variables().difference(&bound).next() {
                return Err(invalid(format!("guard reads unbound variable {var}")));
            }
        }
        for conclusion in &rule.conclusions {
            if let Some(var) = conclusion.variables().difference(&bound).next() {
                return Err(invalid(format!("conclusion reads unbound variable {var}")));
            }
            if let ConclusionTerm::Node(node) = &conclusion.subject {
                if node.is_literal() {
                    return Err(invalid(format!("literal {node} cannot be a subject")));
                }
            }
            if let ConclusionTerm::Node(node) = &conclusion.predicate {
                if !node.is_iri() {
                    return Err(invalid(format!("{node} cannot be a predicate")));
                }
            }
        }
        Ok(())
    }

    /// Validates a rule and builds its (unprimed) network.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRule` as for [`RuleCompiler::validate`].
    pub fn compile(rule: &Rule) -> Result<Network> {
        Self::validate(rule)?;
        Network::compile(&rule.condition)
    }

    /// Resolves a rule's conclusions for one match.
    ///
    /// A guard that is not `true` yields nothing; a guard that fails to
    /// evaluate yields one failure. Each conclusion that cannot be resolved
    /// into a well-formed quad is dropped with its own failure. Failures
    /// carry the rule id and the guard or conclusion index as context.
    #[must_use]
    pub fn instantiate(
        rule: &Rule,
        bindings: &Bindings,
        graph: &Node,
        evaluator: &dyn Evaluator,
    ) -> Instantiation {
        let mut out = Instantiation::default();
        let context =
            |frame: String| ErrorContext::new().with_source(rule.id.as_str()).with_frame(frame);
        if let Some(guard) = &rule.guard {
            let error = match evaluator.evaluate(guard, bindings) {
                Ok(Value::Bool(true)) => None,
                Ok(Value::Bool(false)) => return out,
                Ok(other) => Some(Error::type_mismatch(ValueType::Bool, other.value_type())),
                Err(error) => Some(error),
            };
            if let Some(error) = error {
                out.failures.push(error.with_context(context("guard".to_string())));
                return out;
            }
        }
        for (index, conclusion) in rule.conclusions.iter().enumerate() {
            let resolved = resolve(&conclusion.subject, bindings, evaluator).and_then(|subject| {
                let predicate = resolve(&conclusion.predicate, bindings, evaluator)?;
                let object = resolve(&conclusion.object, bindings, evaluator)?;
                let quad = Quad::new(graph.clone(), subject, predicate, object);
                quad.validate()?;
                Ok(quad)
            });
            match resolved {
                Ok(quad) => out.quads.push(quad),
                Err(error) => out
                    .failures
                    .push(error.with_context(context(format!("conclusion {index}")))),
            }
        }
        out
    }
}

fn resolve(term: &ConclusionTerm, bindings: &Bindings, evaluator: &dyn Evaluator) -> Result<Node> {
    match term {
        ConclusionTerm::Node(node) => Ok(node.clone()),
        ConclusionTerm::Variable(var) => bindings
            .get(var)
            .cloned()
            .ok_or_else(|| Error::unbound_variable(var.name())),
        ConclusionTerm::Expression(expr) => Ok(evaluator.evaluate(expr, bindings)?.to_node()),
    }
}
