//! Engine configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use quadrille_foundation::vocab;

/// Settings shared by the rule engine and the query engine.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// IRI of the graph receiving rule conclusions.
    pub inference_graph: String,
    /// Maximum propagation rounds per flush before the kill switch fires.
    pub max_rounds: usize,
    /// Number of ad hoc queries kept in the result cache.
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Default round limit.
    pub const DEFAULT_MAX_ROUNDS: usize = 1_000_000;
    /// Default cache capacity.
    pub const DEFAULT_CACHE_CAPACITY: usize = 64;

    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inference_graph: vocab::GRAPH_INFERENCE.to_string(),
            max_rounds: Self::DEFAULT_MAX_ROUNDS,
            cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Sets the inference graph IRI.
    #[must_use]
    pub fn with_inference_graph(mut self, iri: impl Into<String>) -> Self {
        self.inference_graph = iri.into();
        self
    }

    /// Sets the round limit.
    #[must_use]
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Sets the result cache capacity.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}
