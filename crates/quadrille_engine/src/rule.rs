//! Forward-chaining rules over quads.
//!
//! A [`Rule`] pairs a [`Condition`] with conclusions written into the
//! engine's inference graph whenever the condition matches. The
//! [`RuleEngine`] keeps those conclusions exactly in step with the store.

pub mod compiler;
pub mod engine;
mod support;

pub use compiler::{Instantiation, RuleCompiler};
pub use engine::{ConclusionFailure, FlushReport, RuleEngine};

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use quadrille_foundation::Node;

use crate::expr::{Aggregation, Expression};
use crate::pattern::{Condition, Pattern, Variable};

// =============================================================================
// Rule Id
// =============================================================================

/// A rule's unique name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(Arc<str>);

impl RuleId {
    /// Creates a rule id.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.into())
    }

    /// Returns the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleId({})", self.0)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// =============================================================================
// Conclusions
// =============================================================================

/// One position of a conclusion.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConclusionTerm {
    /// A fixed node.
    Node(Node),
    /// The node bound to a variable.
    Variable(Variable),
    /// A computed value.
    Expression(Expression),
}

impl ConclusionTerm {
    /// Shorthand for a variable term.
    #[must_use]
    pub fn var(name: &str) -> Self {
        Self::Variable(Variable::new(name))
    }

    fn collect_variables(&self, out: &mut BTreeSet<Variable>) {
        match self {
            Self::Node(_) => {}
            Self::Variable(var) => {
                out.insert(var.clone());
            }
            Self::Expression(expr) => expr.collect_variables(out),
        }
    }
}

impl From<Node> for ConclusionTerm {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<Variable> for ConclusionTerm {
    fn from(var: Variable) -> Self {
        Self::Variable(var)
    }
}

impl From<Expression> for ConclusionTerm {
    fn from(expr: Expression) -> Self {
        Self::Expression(expr)
    }
}

/// A triple template asserted into the inference graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Conclusion {
    /// Subject position.
    pub subject: ConclusionTerm,
    /// Predicate position.
    pub predicate: ConclusionTerm,
    /// Object position.
    pub object: ConclusionTerm,
}

impl Conclusion {
    /// Creates a conclusion.
    #[must_use]
    pub fn new(
        subject: impl Into<ConclusionTerm>,
        predicate: impl Into<ConclusionTerm>,
        object: impl Into<ConclusionTerm>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Returns every variable the conclusion reads.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut out = BTreeSet::new();
        self.subject.collect_variables(&mut out);
        self.predicate.collect_variables(&mut out);
        self.object.collect_variables(&mut out);
        out
    }
}

// =============================================================================
// Rule
// =============================================================================

/// A named condition with conclusions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    /// Unique name.
    pub id: RuleId,
    /// What must match.
    pub condition: Condition,
    /// Evaluated per match; only `true` lets the rule conclude.
    pub guard: Option<Expression>,
    /// What is asserted per match.
    pub conclusions: Vec<Conclusion>,
    /// Inactive rules are registered but do not match.
    pub active: bool,
}

impl Rule {
    /// Starts building a rule.
    #[must_use]
    pub fn builder(id: &str) -> RuleBuilder {
        RuleBuilder {
            rule: Self {
                id: RuleId::new(id),
                condition: Condition::new(),
                guard: None,
                conclusions: Vec::new(),
                active: true,
            },
        }
    }
}

/// Builder for [`Rule`].
#[derive(Clone, Debug)]
pub struct RuleBuilder {
    rule: Rule,
}

impl RuleBuilder {
    /// Adds a positive pattern.
    #[must_use]
    pub fn when(mut self, pattern: Pattern) -> Self {
        self.rule.condition.positives.push(pattern);
        self
    }

    /// Adds a negative conjunction.
    #[must_use]
    pub fn unless(mut self, conjunction: Vec<Pattern>) -> Self {
        self.rule.condition.negatives.push(conjunction);
        self
    }

    /// Sets the aggregation.
    #[must_use]
    pub fn aggregate(mut self, aggregation: Aggregation) -> Self {
        self.rule.condition.aggregation = Some(aggregation);
        self
    }

    /// Sets the guard.
    #[must_use]
    pub fn guard(mut self, guard: Expression) -> Self {
        self.rule.guard = Some(guard);
        self
    }

    /// Adds a conclusion.
    #[must_use]
    pub fn conclude(
        mut self,
        subject: impl Into<ConclusionTerm>,
        predicate: impl Into<ConclusionTerm>,
        object: impl Into<ConclusionTerm>,
    ) -> Self {
        self.rule
            .conclusions
            .push(Conclusion::new(subject, predicate, object));
        self
    }

    /// Registers the rule without activating it.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.rule.active = false;
        self
    }

    /// Finishes the rule.
    #[must_use]
    pub fn build(self) -> Rule {
        self.rule
    }
}
