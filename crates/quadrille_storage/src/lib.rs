//! Quad store interface, in-memory store, and change feed for Quadrille.
//!
//! This crate provides:
//! - [`QuadStore`] - The store contract consumed by the engines
//! - [`MemoryStore`] - Indexed in-memory store with O(1) snapshots
//! - [`ChangeFeed`] - Per-subscriber buffers of store mutations
//! - [`Changeset`] - Batched additions and removals

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod feed;
pub mod memory;
pub mod store;

pub use feed::{Change, ChangeFeed, SubscriptionId};
pub use memory::{MemoryStore, Snapshot};
pub use store::{ApplyReport, Changeset, QuadFilter, QuadStore};
