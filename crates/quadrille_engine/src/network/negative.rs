//! Negative stages: pass a token only while its conjunction has no match.

use std::collections::{BTreeSet, HashMap};

use quadrille_foundation::Quad;
use quadrille_storage::QuadStore;

use super::join::JoinChain;
use super::{DeltaKind, TokenDelta};
use crate::pattern::{Pattern, Variable};
use crate::token::Token;

/// Negation as failure over a conjunction.
///
/// Each incoming token seeds the conjunction's join chain; the number of
/// complete matches extending it is its count. Variables of the
/// conjunction that the token does not bind are existential.
#[derive(Clone, Debug)]
pub(crate) struct NegativeNode {
    chain: JoinChain,
    counts: HashMap<Token, usize>,
}

impl NegativeNode {
    pub(crate) fn new(conjunction: &[Pattern], upstream_vars: &BTreeSet<Variable>) -> Self {
        Self {
            chain: JoinChain::new(conjunction, upstream_vars),
            counts: HashMap::new(),
        }
    }

    pub(crate) fn fill<S: QuadStore + ?Sized>(&mut self, store: &S) {
        self.chain.fill(store);
    }

    /// Applies an insertion: the conjunction sees the quad first, then the
    /// incoming deltas are handled.
    pub(crate) fn on_insert(&mut self, quad: &Quad, incoming: Vec<TokenDelta>) -> Vec<TokenDelta> {
        let mut out = self.fact_added(quad);
        out.extend(self.handle(incoming));
        out
    }

    /// Applies a removal: incoming deltas are handled while the quad is
    /// still visible, then the conjunction forgets it.
    pub(crate) fn on_remove(&mut self, quad: &Quad, incoming: Vec<TokenDelta>) -> Vec<TokenDelta> {
        let mut out = self.handle(incoming);
        out.extend(self.fact_removed(quad));
        out
    }

    /// Handles upstream deltas without touching the conjunction's memories.
    pub(crate) fn handle(&mut self, incoming: Vec<TokenDelta>) -> Vec<TokenDelta> {
        let mut out = Vec::new();
        for delta in incoming {
            match delta.kind {
                DeltaKind::Activated => {
                    let count = self.chain.add_seed(delta.token.clone()).len();
                    let previous = self.counts.insert(delta.token.clone(), count);
                    assert!(previous.is_none(), "token activated twice at a negative stage");
                    if count == 0 {
                        out.push(delta);
                    }
                }
                DeltaKind::Deactivated => {
                    self.chain.remove_seed(&delta.token);
                    let count = self
                        .counts
                        .remove(&delta.token)
                        .expect("unknown token deactivated at a negative stage");
                    if count == 0 {
                        out.push(delta);
                    }
                }
            }
        }
        out
    }

    fn fact_added(&mut self, quad: &Quad) -> Vec<TokenDelta> {
        let mut out = Vec::new();
        for partial in self.chain.insert_fact(quad) {
            let count = self
                .counts
                .get_mut(&partial.seed)
                .expect("negative match for an unknown token");
            *count += 1;
            if *count == 1 {
                out.push(TokenDelta::deactivated(partial.seed));
            }
        }
        out
    }

    fn fact_removed(&mut self, quad: &Quad) -> Vec<TokenDelta> {
        let mut out = Vec::new();
        for partial in self.chain.remove_fact(quad) {
            let count = self
                .counts
                .get_mut(&partial.seed)
                .expect("negative match for an unknown token");
            assert!(*count > 0, "negative count underflow");
            *count -= 1;
            if *count == 0 {
                out.push(TokenDelta::activated(partial.seed));
            }
        }
        out
    }
}
