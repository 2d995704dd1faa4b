//! Incremental matching, rules, and queries for Quadrille.
//!
//! This crate provides:
//! - [`Network`] - The incremental matching network compiled from a [`Condition`]
//! - [`RuleEngine`] - Support-counted forward chaining into an inference graph
//! - [`QueryEngine`] - Continuous queries with listeners, and cached ad hoc queries
//! - [`ResultCache`] - Identity-keyed, self-organizing result cache
//! - [`Evaluator`] - Expression and aggregate evaluation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod config;
pub mod expr;
pub mod network;
pub mod pattern;
pub mod provenance;
pub mod query;
pub mod rule;
pub mod token;

pub use cache::{CacheEntry, ResultCache};
pub use config::EngineConfig;
pub use expr::{
    Aggregate, AggregateFunction, Aggregation, BinaryOp, Evaluator, Expression, StandardEvaluator,
    UnaryOp,
};
pub use network::{DeltaKind, Network, Propagation, SolutionChange, Terminal, TokenDelta};
pub use pattern::{Condition, ConditionKey, Pattern, Term, Variable};
pub use provenance::{Derivation, MatchStatus, MatchStep};
pub use query::{CachedResult, ListenerId, Query, QueryEngine, SolutionListener};
pub use rule::{
    Conclusion, ConclusionFailure, ConclusionTerm, FlushReport, Rule, RuleBuilder, RuleEngine,
    RuleId,
};
pub use token::{Bindings, Token};
