//! In-memory quad store.
//!
//! Quads live in persistent (`im`) sets with one index per position, so a
//! [`Snapshot`] of the contents is O(1) and shares structure with the store.

use quadrille_foundation::{Node, Quad, Result};
use tracing::trace;

use crate::feed::{Change, ChangeFeed, SubscriptionId};
use crate::store::{QuadFilter, QuadStore};

type Index = im::HashMap<Node, im::HashSet<Quad>>;

// =============================================================================
// Snapshot
// =============================================================================

/// Immutable view of a store's contents at one point in time.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    all: im::HashSet<Quad>,
    by_graph: Index,
    by_subject: Index,
    by_predicate: Index,
    by_object: Index,
}

impl Snapshot {
    /// Returns true if the quad is present.
    #[must_use]
    pub fn contains(&self, quad: &Quad) -> bool {
        self.all.contains(quad)
    }

    /// Returns the number of quads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Returns true if there are no quads.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Returns every quad satisfying the filter, in quad order.
    ///
    /// Scans the smallest index among the bound positions.
    #[must_use]
    pub fn matching(&self, filter: &QuadFilter) -> Vec<Quad> {
        let empty = im::HashSet::new();
        let candidates = [
            (filter.graph.as_ref(), &self.by_graph),
            (filter.subject.as_ref(), &self.by_subject),
            (filter.predicate.as_ref(), &self.by_predicate),
            (filter.object.as_ref(), &self.by_object),
        ]
        .into_iter()
        .filter_map(|(bound, index)| bound.map(|node| index.get(node).unwrap_or(&empty)))
        .min_by_key(|set| set.len())
        .unwrap_or(&self.all);

        let mut quads: Vec<Quad> = candidates
            .iter()
            .filter(|quad| filter.matches(quad))
            .cloned()
            .collect();
        quads.sort();
        quads
    }

    /// Iterates every quad in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Quad> {
        self.all.iter()
    }

    fn insert(&mut self, quad: &Quad) -> bool {
        if self.all.insert(quad.clone()).is_some() {
            return false;
        }
        index_insert(&mut self.by_graph, &quad.graph, quad);
        index_insert(&mut self.by_subject, &quad.subject, quad);
        index_insert(&mut self.by_predicate, &quad.predicate, quad);
        index_insert(&mut self.by_object, &quad.object, quad);
        true
    }

    fn remove(&mut self, quad: &Quad) -> bool {
        if self.all.remove(quad).is_none() {
            return false;
        }
        index_remove(&mut self.by_graph, &quad.graph, quad);
        index_remove(&mut self.by_subject, &quad.subject, quad);
        index_remove(&mut self.by_predicate, &quad.predicate, quad);
        index_remove(&mut self.by_object, &quad.object, quad);
        true
    }
}

fn index_insert(index: &mut Index, key: &Node, quad: &Quad) {
    if let Some(set) = index.get_mut(key) {
        set.insert(quad.clone());
    } else {
        index.insert(key.clone(), im::HashSet::unit(quad.clone()));
    }
}

fn index_remove(index: &mut Index, key: &Node, quad: &Quad) {
    let now_empty = index.get_mut(key).is_some_and(|set| {
        set.remove(quad);
        set.is_empty()
    });
    if now_empty {
        index.remove(key);
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// A [`QuadStore`] held entirely in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    contents: Snapshot,
    feed: ChangeFeed,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an immutable view of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.contents.clone()
    }

    /// Returns the number of changes pending for a subscriber.
    #[must_use]
    pub fn pending(&self, id: SubscriptionId) -> usize {
        self.feed.pending(id)
    }
}

impl QuadStore for MemoryStore {
    fn insert(&mut self, quad: Quad) -> Result<bool> {
        quad.validate()?;
        if !self.contents.insert(&quad) {
            return Ok(false);
        }
        trace!(%quad, "inserted");
        self.feed.publish(&Change::Added(quad));
        Ok(true)
    }

    fn remove(&mut self, quad: &Quad) -> Result<bool> {
        if !self.contents.remove(quad) {
            return Ok(false);
        }
        trace!(%quad, "removed");
        self.feed.publish(&Change::Removed(quad.clone()));
        Ok(true)
    }

    fn contains(&self, quad: &Quad) -> bool {
        self.contents.contains(quad)
    }

    fn matching(&self, filter: &QuadFilter) -> Vec<Quad> {
        self.contents.matching(filter)
    }

    fn len(&self) -> usize {
        self.contents.len()
    }

    fn subscribe(&mut self) -> SubscriptionId {
        self.feed.subscribe()
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.feed.unsubscribe(id)
    }

    fn drain_changes(&mut self, id: SubscriptionId) -> Vec<Change> {
        self.feed.drain(id)
    }
}
