//! Alpha memories: per-pattern quad matches, indexed by join key.

use std::collections::HashMap;

use quadrille_foundation::{Node, Quad};
use quadrille_storage::QuadStore;

use crate::pattern::{Pattern, Variable};
use crate::token::Bindings;

/// Quads matching one pattern, bucketed by the values of the join variables.
#[derive(Clone, Debug)]
pub(crate) struct AlphaMemory {
    pattern: Pattern,
    key_vars: Vec<Variable>,
    buckets: HashMap<Vec<Node>, HashMap<Quad, Bindings>>,
    len: usize,
}

impl AlphaMemory {
    pub(crate) fn new(pattern: Pattern, key_vars: Vec<Variable>) -> Self {
        Self {
            pattern,
            key_vars,
            buckets: HashMap::new(),
            len: 0,
        }
    }

    pub(crate) fn key_vars(&self) -> &[Variable] {
        &self.key_vars
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Records a matching quad.
    ///
    /// Returns the pattern's bindings if the quad matched and was not
    /// already held.
    pub(crate) fn activate(&mut self, quad: &Quad) -> Option<Bindings> {
        let bindings = self.pattern.matches(quad)?;
        let bucket = self
            .buckets
            .entry(bindings.key(&self.key_vars))
            .or_default();
        if bucket.contains_key(quad) {
            return None;
        }
        bucket.insert(quad.clone(), bindings.clone());
        self.len += 1;
        Some(bindings)
    }

    /// Forgets a quad.
    ///
    /// Returns the bindings it had been stored with, if it was held.
    pub(crate) fn deactivate(&mut self, quad: &Quad) -> Option<Bindings> {
        let bindings = self.pattern.matches(quad)?;
        let key = bindings.key(&self.key_vars);
        let bucket = self.buckets.get_mut(&key)?;
        let removed = bucket.remove(quad)?;
        if bucket.is_empty() {
            self.buckets.remove(&key);
        }
        self.len -= 1;
        Some(removed)
    }

    /// Returns the held quads whose join values equal `key`.
    pub(crate) fn probe(&self, key: &[Node]) -> impl Iterator<Item = (&Quad, &Bindings)> {
        self.buckets.get(key).into_iter().flat_map(|bucket| bucket.iter())
    }

    /// Loads every matching quad currently in the store.
    pub(crate) fn fill<S: QuadStore + ?Sized>(&mut self, store: &S) -> usize {
        store
            .matching(&self.pattern.filter())
            .iter()
            .filter(|quad| self.activate(quad).is_some())
            .count()
    }
}
