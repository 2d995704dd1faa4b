//! Quadrille - RDF quad store with incremental reasoning
//!
//! This crate re-exports all layers of the Quadrille system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: quadrille_engine     - Matching network, rules, continuous queries, cache
//! Layer 1: quadrille_storage    - Quad store contract, memory store, change feed
//! Layer 0: quadrille_foundation - Nodes, quads, values, errors
//! ```

pub use quadrille_engine as engine;
pub use quadrille_foundation as foundation;
pub use quadrille_storage as storage;
