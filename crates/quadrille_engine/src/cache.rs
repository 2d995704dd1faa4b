//! A small fixed-capacity cache ranked by recent hits.
//!
//! Entries are matched by object identity (`Rc::ptr_eq`), not by value:
//! callers keep the `Rc` of a query they intend to run again. Ranking is
//! self-organizing. A hit moves an entry at most one slot towards the front,
//! and every probe ages the entries it scans past, so entries that stop
//! being probed drift to the back and are evicted first.

use std::fmt;
use std::rc::Rc;

/// One cache slot.
pub struct CacheEntry<K, V> {
    key: Rc<K>,
    value: V,
    hits: u32,
}

impl<K, V> CacheEntry<K, V> {
    /// The cached key.
    #[must_use]
    pub fn key(&self) -> &Rc<K> {
        &self.key
    }

    /// The cached value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// The current hit count.
    #[must_use]
    pub fn hits(&self) -> u32 {
        self.hits
    }
}

impl<K: fmt::Debug, V> fmt::Debug for CacheEntry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("hits", &self.hits)
            .finish_non_exhaustive()
    }
}

/// Fixed-capacity, identity-keyed cache.
pub struct ResultCache<K, V> {
    entries: Vec<CacheEntry<K, V>>,
    capacity: usize,
}

impl<K, V> ResultCache<K, V> {
    /// Creates an empty cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks an entry up by identity.
    ///
    /// A hit gains one hit and swaps with its left neighbour if that
    /// neighbour now has fewer hits. Every entry scanned before the match
    /// (every entry, on a miss) loses one hit, saturating at zero.
    pub fn probe(&mut self, key: &Rc<K>) -> Option<&mut V> {
        let mut found = None;
        for (i, entry) in self.entries.iter_mut().enumerate() {
            if Rc::ptr_eq(&entry.key, key) {
                entry.hits = entry.hits.saturating_add(1);
                found = Some(i);
                break;
            }
            entry.hits = entry.hits.saturating_sub(1);
        }
        let mut i = found?;
        if i > 0 && self.entries[i - 1].hits < self.entries[i].hits {
            self.entries.swap(i - 1, i);
            i -= 1;
        }
        Some(&mut self.entries[i].value)
    }

    /// Inserts an entry with one hit.
    ///
    /// Fills a free slot if there is one; otherwise replaces the last
    /// (lowest-ranked) entry and returns it.
    pub fn insert(&mut self, key: Rc<K>, value: V) -> Option<(Rc<K>, V)> {
        if self.capacity == 0 {
            return Some((key, value));
        }
        let entry = CacheEntry { key, value, hits: 1 };
        if self.entries.len() < self.capacity {
            self.entries.push(entry);
            return None;
        }
        let last = self.entries.len() - 1;
        let evicted = std::mem::replace(&mut self.entries[last], entry);
        Some((evicted.key, evicted.value))
    }

    /// Removes an entry by identity.
    pub fn remove(&mut self, key: &Rc<K>) -> Option<V> {
        let i = self.entries.iter().position(|entry| Rc::ptr_eq(&entry.key, key))?;
        Some(self.entries.remove(i).value)
    }

    /// Entries in rank order.
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry<K, V>> {
        self.entries.iter()
    }

    /// Mutable access to every cached value, in rank order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.iter_mut().map(|entry| &mut entry.value)
    }
}

impl<K: fmt::Debug, V> fmt::Debug for ResultCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCache")
            .field("capacity", &self.capacity)
            .field("entries", &self.entries)
            .finish()
    }
}
