//! Change notification.
//!
//! Each subscriber owns a buffer. Publishing appends to every buffer;
//! draining hands a subscriber its buffer and leaves it empty.

use std::collections::BTreeMap;
use std::fmt;

use quadrille_foundation::Quad;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a change buffer.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Returns the raw index of this subscription.
    #[must_use]
    pub const fn index(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

/// A single store mutation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Change {
    /// The quad was inserted.
    Added(Quad),
    /// The quad was removed.
    Removed(Quad),
}

impl Change {
    /// Returns the quad this change is about.
    #[must_use]
    pub fn quad(&self) -> &Quad {
        match self {
            Self::Added(quad) | Self::Removed(quad) => quad,
        }
    }

    /// Returns true for an insertion.
    #[must_use]
    pub const fn is_addition(&self) -> bool {
        matches!(self, Self::Added(_))
    }
}

/// Per-subscriber change buffers.
#[derive(Clone, Debug, Default)]
pub struct ChangeFeed {
    next_id: u64,
    buffers: BTreeMap<SubscriptionId, Vec<Change>>,
}

impl ChangeFeed {
    /// Creates a feed without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new, empty buffer.
    pub fn subscribe(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.buffers.insert(id, Vec::new());
        id
    }

    /// Closes a buffer, discarding anything pending in it.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.buffers.remove(&id).is_some()
    }

    /// Records a change for every subscriber.
    pub fn publish(&mut self, change: &Change) {
        for buffer in self.buffers.values_mut() {
            buffer.push(change.clone());
        }
    }

    /// Takes everything pending for a subscriber.
    ///
    /// An unknown subscriber has nothing pending.
    pub fn drain(&mut self, id: SubscriptionId) -> Vec<Change> {
        self.buffers
            .get_mut(&id)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Returns the number of changes pending for a subscriber.
    #[must_use]
    pub fn pending(&self, id: SubscriptionId) -> usize {
        self.buffers.get(&id).map_or(0, Vec::len)
    }

    /// Returns the number of open buffers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.buffers.len()
    }
}
