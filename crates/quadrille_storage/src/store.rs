//! The quad store interface.

use quadrille_foundation::{Node, Quad, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::feed::{Change, SubscriptionId};

// =============================================================================
// Filter
// =============================================================================

/// Selects quads by any combination of bound positions.
///
/// An unset position is a wildcard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuadFilter {
    /// Required graph.
    pub graph: Option<Node>,
    /// Required subject.
    pub subject: Option<Node>,
    /// Required predicate.
    pub predicate: Option<Node>,
    /// Required object.
    pub object: Option<Node>,
}

impl QuadFilter {
    /// Creates a filter matching every quad.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Restricts the graph.
    #[must_use]
    pub fn with_graph(mut self, graph: Node) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Restricts the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: Node) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Restricts the predicate.
    #[must_use]
    pub fn with_predicate(mut self, predicate: Node) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Restricts the object.
    #[must_use]
    pub fn with_object(mut self, object: Node) -> Self {
        self.object = Some(object);
        self
    }

    /// Returns true if the quad satisfies every bound position.
    #[must_use]
    pub fn matches(&self, quad: &Quad) -> bool {
        fn ok(bound: Option<&Node>, actual: &Node) -> bool {
            bound.is_none_or(|node| node == actual)
        }
        ok(self.graph.as_ref(), &quad.graph)
            && ok(self.subject.as_ref(), &quad.subject)
            && ok(self.predicate.as_ref(), &quad.predicate)
            && ok(self.object.as_ref(), &quad.object)
    }
}

// =============================================================================
// Changeset
// =============================================================================

/// A batch of additions and removals applied together.
///
/// Removals are applied before additions, so a quad present in both ends
/// up in the store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Changeset {
    /// Quads to insert.
    pub added: Vec<Quad>,
    /// Quads to remove.
    pub removed: Vec<Quad>,
}

impl Changeset {
    /// Creates an empty changeset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a quad to insert.
    #[must_use]
    pub fn add(mut self, quad: Quad) -> Self {
        self.added.push(quad);
        self
    }

    /// Adds a quad to remove.
    #[must_use]
    pub fn remove(mut self, quad: Quad) -> Self {
        self.removed.push(quad);
        self
    }

    /// Returns true if the changeset holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// What applying a [`Changeset`] actually changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Quads that were newly inserted.
    pub added: usize,
    /// Quads that were present and got removed.
    pub removed: usize,
}

// =============================================================================
// QuadStore
// =============================================================================

/// A mutable set of quads with a change feed.
///
/// Every successful mutation is recorded, in order, in the buffer of every
/// current subscriber. Subscribers drain their buffer when they are ready
/// to process it.
pub trait QuadStore {
    /// Inserts a quad. Returns false if it was already present.
    ///
    /// # Errors
    ///
    /// Returns an error if the quad is structurally unsupported.
    fn insert(&mut self, quad: Quad) -> Result<bool>;

    /// Removes a quad. Returns false if it was absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to remove the quad.
    fn remove(&mut self, quad: &Quad) -> Result<bool>;

    /// Returns true if the quad is present.
    fn contains(&self, quad: &Quad) -> bool;

    /// Returns every quad satisfying the filter, in quad order.
    fn matching(&self, filter: &QuadFilter) -> Vec<Quad>;

    /// Returns the number of quads.
    fn len(&self) -> usize;

    /// Returns true if the store holds no quads.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Opens a change buffer that records every later mutation.
    fn subscribe(&mut self) -> SubscriptionId;

    /// Closes a change buffer. Returns false if it did not exist.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;

    /// Takes every change recorded for the subscriber since the last drain.
    fn drain_changes(&mut self, id: SubscriptionId) -> Vec<Change>;

    /// Applies a changeset: every removal, then every addition.
    ///
    /// # Errors
    ///
    /// Returns an error, before mutating anything, if any added quad is
    /// structurally unsupported.
    fn apply(&mut self, changeset: &Changeset) -> Result<ApplyReport> {
        for quad in &changeset.added {
            quad.validate()?;
        }
        let mut report = ApplyReport::default();
        for quad in &changeset.removed {
            if self.remove(quad)? {
                report.removed += 1;
            }
        }
        for quad in &changeset.added {
            if self.insert(quad.clone())? {
                report.added += 1;
            }
        }
        Ok(report)
    }
}
