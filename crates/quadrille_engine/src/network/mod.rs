//! The incremental matching network.
//!
//! A [`Network`] compiles one [`Condition`] into a pipeline of stages:
//!
//! 1. the positive join chain, seeded with the root token;
//! 2. one negative stage per negative conjunction, in declaration order;
//! 3. an optional aggregate stage.
//!
//! Each quad insertion or removal flows through the stages in that order
//! and yields the exact set of output tokens that became valid or invalid.
//! Nothing is rescanned: every stage keeps the memories it needs to answer
//! incrementally.

mod aggregate;
mod alpha;
mod join;
mod negative;
mod terminal;

use std::collections::BTreeSet;

use quadrille_foundation::{Error, Quad, Result};
use quadrille_storage::QuadStore;
use tracing::trace;

pub use terminal::{SolutionChange, Terminal};

use self::aggregate::AggregateNode;
use self::join::JoinChain;
use self::negative::NegativeNode;
use crate::expr::Evaluator;
use crate::pattern::Condition;
use crate::token::{Bindings, Token};

// =============================================================================
// Deltas
// =============================================================================

/// Direction of a token change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeltaKind {
    /// The token became valid.
    Activated,
    /// The token stopped being valid.
    Deactivated,
}

/// One output token change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenDelta {
    /// Direction.
    pub kind: DeltaKind,
    /// The token concerned.
    pub token: Token,
}

impl TokenDelta {
    /// An activation.
    #[must_use]
    pub fn activated(token: Token) -> Self {
        Self {
            kind: DeltaKind::Activated,
            token,
        }
    }

    /// A deactivation.
    #[must_use]
    pub fn deactivated(token: Token) -> Self {
        Self {
            kind: DeltaKind::Deactivated,
            token,
        }
    }
}

/// The outcome of pushing one mutation through a network.
#[derive(Clone, Debug, Default)]
pub struct Propagation {
    /// Output token changes, in the order they occurred.
    pub deltas: Vec<TokenDelta>,
    /// Aggregate evaluations that failed, with the group's bindings.
    pub failures: Vec<(Bindings, Error)>,
}

impl Propagation {
    /// Returns true if nothing changed and nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty() && self.failures.is_empty()
    }
}

// =============================================================================
// Network
// =============================================================================

/// A compiled condition with live memories.
#[derive(Clone, Debug)]
pub struct Network {
    condition: Condition,
    positive: JoinChain,
    negatives: Vec<NegativeNode>,
    aggregate: Option<AggregateNode>,
    outputs: BTreeSet<Token>,
}

impl Network {
    /// Compiles a condition into an empty, unprimed network.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` if the condition is structurally malformed.
    pub fn compile(condition: &Condition) -> Result<Self> {
        condition.validate().map_err(Error::invalid_query)?;
        let positive_vars = condition.positive_variables();
        Ok(Self {
            condition: condition.clone(),
            positive: JoinChain::new(&condition.positives, &BTreeSet::new()),
            negatives: condition
                .negatives
                .iter()
                .map(|conjunction| NegativeNode::new(conjunction, &positive_vars))
                .collect(),
            aggregate: condition.aggregation.clone().map(AggregateNode::new),
            outputs: BTreeSet::new(),
        })
    }

    /// The condition this network matches.
    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Loads the store's current contents, as if every quad had just been
    /// inserted, and returns the resulting activations.
    pub fn prime<S: QuadStore + ?Sized>(&mut self, store: &S, evaluator: &dyn Evaluator) -> Propagation {
        self.positive.fill(store);
        for negative in &mut self.negatives {
            negative.fill(store);
        }
        let mut deltas: Vec<TokenDelta> = self
            .positive
            .add_seed(Token::root())
            .iter()
            .map(|partial| TokenDelta::activated(partial.to_token()))
            .collect();
        for negative in &mut self.negatives {
            deltas = negative.handle(deltas);
        }
        let propagation = self.finish(deltas, evaluator);
        trace!(
            outputs = self.outputs.len(),
            failures = propagation.failures.len(),
            "network primed"
        );
        propagation
    }

    /// Propagates a quad insertion.
    pub fn insert(&mut self, quad: &Quad, evaluator: &dyn Evaluator) -> Propagation {
        let mut deltas: Vec<TokenDelta> = self
            .positive
            .insert_fact(quad)
            .iter()
            .map(|partial| TokenDelta::activated(partial.to_token()))
            .collect();
        for negative in &mut self.negatives {
            deltas = negative.on_insert(quad, deltas);
        }
        self.finish(deltas, evaluator)
    }

    /// Propagates a quad removal.
    pub fn remove(&mut self, quad: &Quad, evaluator: &dyn Evaluator) -> Propagation {
        let mut deltas: Vec<TokenDelta> = self
            .positive
            .remove_fact(quad)
            .iter()
            .map(|partial| TokenDelta::deactivated(partial.to_token()))
            .collect();
        for negative in &mut self.negatives {
            deltas = negative.on_remove(quad, deltas);
        }
        self.finish(deltas, evaluator)
    }

    fn finish(&mut self, deltas: Vec<TokenDelta>, evaluator: &dyn Evaluator) -> Propagation {
        let mut failures = Vec::new();
        let deltas = match &mut self.aggregate {
            Some(aggregate) => aggregate.handle(deltas, evaluator, &mut failures),
            None => deltas,
        };
        for delta in &deltas {
            match delta.kind {
                DeltaKind::Activated => assert!(
                    self.outputs.insert(delta.token.clone()),
                    "output token activated twice"
                ),
                DeltaKind::Deactivated => assert!(
                    self.outputs.remove(&delta.token),
                    "unknown output token deactivated"
                ),
            }
        }
        Propagation { deltas, failures }
    }

    /// Current output tokens.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.outputs.iter()
    }

    /// Bindings of the partial matches held after positive pattern `index`.
    #[must_use]
    pub fn step_bindings(&self, index: usize) -> Vec<Bindings> {
        let mut bindings: Vec<Bindings> = self
            .positive
            .level(index + 1)
            .map(|partial| partial.bindings.clone())
            .collect();
        bindings.sort();
        bindings.dedup();
        bindings
    }
}
