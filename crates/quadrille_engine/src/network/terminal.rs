//! Query terminals: support-counted solution sets.

use std::collections::BTreeMap;

use super::{DeltaKind, TokenDelta};
use crate::token::Bindings;

/// A change in the visible solution set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolutionChange {
    /// The bindings became a solution.
    New(Bindings),
    /// The bindings stopped being a solution.
    Retracted(Bindings),
}

/// Counts the tokens behind each distinct solution.
///
/// Several tokens may share bindings (the same triple in two graphs, say);
/// a solution appears with its first token and disappears with its last.
#[derive(Clone, Debug, Default)]
pub struct Terminal {
    counts: BTreeMap<Bindings, usize>,
}

impl Terminal {
    /// Creates an empty terminal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies network deltas, returning the solution changes they cause.
    ///
    /// # Panics
    ///
    /// Panics if a deactivation has no matching activation.
    pub fn apply(&mut self, deltas: &[TokenDelta]) -> Vec<SolutionChange> {
        let mut changes = Vec::new();
        for delta in deltas {
            let bindings = delta.token.bindings();
            match delta.kind {
                DeltaKind::Activated => {
                    let count = self.counts.entry(bindings.clone()).or_insert(0);
                    *count += 1;
                    if *count == 1 {
                        changes.push(SolutionChange::New(bindings.clone()));
                    }
                }
                DeltaKind::Deactivated => {
                    let count = self
                        .counts
                        .get_mut(bindings)
                        .expect("solution support underflow");
                    *count -= 1;
                    if *count == 0 {
                        self.counts.remove(bindings);
                        changes.push(SolutionChange::Retracted(bindings.clone()));
                    }
                }
            }
        }
        changes
    }

    /// Distinct solutions with their support counts, in bindings order.
    pub fn solutions(&self) -> impl Iterator<Item = (&Bindings, usize)> {
        self.counts.iter().map(|(bindings, count)| (bindings, *count))
    }

    /// Every solution repeated once per supporting token.
    #[must_use]
    pub fn bag(&self) -> Vec<Bindings> {
        self.counts
            .iter()
            .flat_map(|(bindings, count)| std::iter::repeat_n(bindings.clone(), *count))
            .collect()
    }

    /// Number of distinct solutions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if there are no solutions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
