//! Quad patterns and conditions.
//!
//! A [`Pattern`] is a quad template whose positions are fixed nodes,
//! variables, or wildcards. A [`Condition`] combines positive patterns,
//! negative conjunctions, and an optional aggregation; it is the left-hand
//! side of a rule and the body of a query.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use quadrille_foundation::{Node, Quad};
use quadrille_storage::QuadFilter;

use crate::expr::Aggregation;
use crate::token::Bindings;

// =============================================================================
// Variable
// =============================================================================

/// A named variable. A leading `?` in the name is ignored.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(Arc<str>);

impl Variable {
    /// Creates a variable.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.strip_prefix('?').unwrap_or(name).into())
    }

    /// Returns the name without `?`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// =============================================================================
// Term
// =============================================================================

/// One position of a pattern.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    /// Matches exactly this node.
    Node(Node),
    /// Matches anything and binds it.
    Variable(Variable),
    /// Matches anything without binding.
    Any,
}

impl Term {
    /// Shorthand for a variable term.
    #[must_use]
    pub fn var(name: &str) -> Self {
        Self::Variable(Variable::new(name))
    }

    /// Returns the variable, if this is one.
    #[must_use]
    pub const fn as_variable(&self) -> Option<&Variable> {
        match self {
            Self::Variable(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the node if this position is fixed.
    #[must_use]
    pub const fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(n) => write!(f, "{n}"),
            Self::Variable(v) => write!(f, "{v}"),
            Self::Any => write!(f, "_"),
        }
    }
}

impl From<Node> for Term {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<Variable> for Term {
    fn from(var: Variable) -> Self {
        Self::Variable(var)
    }
}

// =============================================================================
// Pattern
// =============================================================================

/// A quad template.
///
/// Repeating a variable constrains those positions to the same node.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pattern {
    /// Graph position.
    pub graph: Term,
    /// Subject position.
    pub subject: Term,
    /// Predicate position.
    pub predicate: Term,
    /// Object position.
    pub object: Term,
}

impl Pattern {
    /// Creates a pattern matching in any graph.
    #[must_use]
    pub fn new(subject: impl Into<Term>, predicate: impl Into<Term>, object: impl Into<Term>) -> Self {
        Self {
            graph: Term::Any,
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Restricts the graph position.
    #[must_use]
    pub fn in_graph(mut self, graph: impl Into<Term>) -> Self {
        self.graph = graph.into();
        self
    }

    fn positions(&self) -> [&Term; 4] {
        [&self.graph, &self.subject, &self.predicate, &self.object]
    }

    /// Returns the variables of this pattern.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<Variable> {
        self.positions()
            .into_iter()
            .filter_map(Term::as_variable)
            .cloned()
            .collect()
    }

    /// Matches a quad, binding only this pattern's variables.
    #[must_use]
    pub fn matches(&self, quad: &Quad) -> Option<Bindings> {
        let mut bindings = Bindings::new();
        let values = [&quad.graph, &quad.subject, &quad.predicate, &quad.object];
        for (term, value) in self.positions().into_iter().zip(values) {
            match term {
                Term::Any => {}
                Term::Node(node) => {
                    if node != value {
                        return None;
                    }
                }
                Term::Variable(var) => match bindings.get(var) {
                    Some(bound) if bound != value => return None,
                    Some(_) => {}
                    None => bindings.insert(var.clone(), value.clone()),
                },
            }
        }
        Some(bindings)
    }

    /// Returns the store filter selecting candidate quads.
    #[must_use]
    pub fn filter(&self) -> QuadFilter {
        QuadFilter {
            graph: self.graph.as_node().cloned(),
            subject: self.subject.as_node().cloned(),
            predicate: self.predicate.as_node().cloned(),
            object: self.object.as_node().cloned(),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?} {:?} {:?} {:?}]",
            self.subject, self.predicate, self.object, self.graph
        )
    }
}

// =============================================================================
// Condition
// =============================================================================

/// Positive patterns, negative conjunctions, and an optional aggregation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Condition {
    /// Conjunction that must match.
    pub positives: Vec<Pattern>,
    /// Conjunctions that must each have no match at all.
    pub negatives: Vec<Vec<Pattern>>,
    /// Grouping applied to the surviving matches.
    pub aggregation: Option<Aggregation>,
}

impl Condition {
    /// Creates an empty condition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a positive pattern.
    #[must_use]
    pub fn when(mut self, pattern: Pattern) -> Self {
        self.positives.push(pattern);
        self
    }

    /// Adds a negative conjunction.
    #[must_use]
    pub fn unless(mut self, conjunction: Vec<Pattern>) -> Self {
        self.negatives.push(conjunction);
        self
    }

    /// Sets the aggregation.
    #[must_use]
    pub fn aggregate(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    /// Returns the variables bound by the positive patterns.
    #[must_use]
    pub fn positive_variables(&self) -> BTreeSet<Variable> {
        self.positives.iter().flat_map(Pattern::variables).collect()
    }

    /// Returns the variables bound in every complete match.
    ///
    /// With an aggregation only the grouping and result variables survive.
    #[must_use]
    pub fn output_variables(&self) -> BTreeSet<Variable> {
        match &self.aggregation {
            Some(aggregation) => aggregation.output_variables(),
            None => self.positive_variables(),
        }
    }

    /// Checks the condition's structure.
    ///
    /// # Errors
    ///
    /// Returns a description of the first structural problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.positives.is_empty() && self.negatives.is_empty() {
            return Err("condition has no patterns".to_string());
        }
        if self.negatives.iter().any(Vec::is_empty) {
            return Err("negative conjunction has no patterns".to_string());
        }
        if let Some(aggregation) = &self.aggregation {
            aggregation.validate(&self.positive_variables())?;
        }
        Ok(())
    }

    /// Returns the canonical form used to recognize identical conditions.
    #[must_use]
    pub fn key(&self) -> ConditionKey {
        let mut positives = self.positives.clone();
        positives.sort();
        let mut negatives: Vec<Vec<Pattern>> = self
            .negatives
            .iter()
            .map(|conjunction| {
                let mut sorted = conjunction.clone();
                sorted.sort();
                sorted
            })
            .collect();
        negatives.sort();
        ConditionKey {
            positives,
            negatives,
            aggregation: self.aggregation.clone(),
        }
    }
}

/// Canonical form of a [`Condition`].
///
/// Positive patterns and each negative conjunction compare as unordered
/// multisets, so two conditions listing the same patterns in different
/// orders have equal keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConditionKey {
    positives: Vec<Pattern>,
    negatives: Vec<Vec<Pattern>>,
    aggregation: Option<Aggregation>,
}
