//! Join chains: a conjunction of patterns matched left to right.
//!
//! A chain of `n` patterns keeps `n` alpha memories and `n + 1` beta
//! memories. Beta level `i` holds the partial matches of the first `i`
//! patterns, each extending one seed token; level `n` holds complete
//! matches. Every beta level below `n` is hashed on the join variables of
//! the alpha it feeds, so both sides of a join are probed by key.

use std::collections::{BTreeSet, HashMap, HashSet};

use quadrille_foundation::{Node, Quad};
use quadrille_storage::QuadStore;

use super::alpha::AlphaMemory;
use crate::pattern::{Pattern, Variable};
use crate::token::{Bindings, Token};

/// A match of a prefix of the chain.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Partial {
    /// The token this match extends.
    pub(crate) seed: Token,
    /// Seed bindings plus everything bound by matched patterns.
    pub(crate) bindings: Bindings,
    /// One quad per matched pattern.
    pub(crate) facts: im::Vector<Quad>,
}

impl Partial {
    fn seeded(seed: Token) -> Self {
        Self {
            bindings: seed.bindings().clone(),
            seed,
            facts: im::Vector::new(),
        }
    }

    fn extend(&self, quad: &Quad, bindings: &Bindings) -> Option<Self> {
        let merged = self.bindings.merge(bindings)?;
        let mut facts = self.facts.clone();
        facts.push_back(quad.clone());
        Some(Self {
            seed: self.seed.clone(),
            bindings: merged,
            facts,
        })
    }

    /// The match as a token of its own, without the seed's facts.
    pub(crate) fn to_token(&self) -> Token {
        Token::new(self.bindings.clone(), self.facts.clone())
    }
}

#[derive(Clone, Debug, Default)]
struct BetaMemory {
    key_vars: Vec<Variable>,
    buckets: HashMap<Vec<Node>, HashSet<Partial>>,
}

impl BetaMemory {
    fn insert(&mut self, partial: Partial) -> bool {
        self.buckets
            .entry(partial.bindings.key(&self.key_vars))
            .or_default()
            .insert(partial)
    }

    fn remove(&mut self, partial: &Partial) -> bool {
        let key = partial.bindings.key(&self.key_vars);
        let Some(bucket) = self.buckets.get_mut(&key) else {
            return false;
        };
        let removed = bucket.remove(partial);
        if bucket.is_empty() {
            self.buckets.remove(&key);
        }
        removed
    }

    fn probe(&self, key: &[Node]) -> impl Iterator<Item = &Partial> {
        self.buckets.get(key).into_iter().flat_map(|bucket| bucket.iter())
    }

    fn iter(&self) -> impl Iterator<Item = &Partial> {
        self.buckets.values().flatten()
    }
}

/// A conjunction of patterns sharing join memories.
#[derive(Clone, Debug)]
pub(crate) struct JoinChain {
    alphas: Vec<AlphaMemory>,
    betas: Vec<BetaMemory>,
}

impl JoinChain {
    /// Builds the chain for `patterns`, given the variables every seed binds.
    pub(crate) fn new(patterns: &[Pattern], seed_vars: &BTreeSet<Variable>) -> Self {
        let mut bound = seed_vars.clone();
        let mut alphas = Vec::with_capacity(patterns.len());
        let mut betas = Vec::with_capacity(patterns.len() + 1);
        for pattern in patterns {
            let vars = pattern.variables();
            let key_vars: Vec<Variable> = vars.intersection(&bound).cloned().collect();
            betas.push(BetaMemory {
                key_vars: key_vars.clone(),
                buckets: HashMap::new(),
            });
            alphas.push(AlphaMemory::new(pattern.clone(), key_vars));
            bound.extend(vars);
        }
        betas.push(BetaMemory::default());
        Self { alphas, betas }
    }

    fn depth(&self) -> usize {
        self.alphas.len()
    }

    /// Loads every alpha memory from the store.
    pub(crate) fn fill<S: QuadStore + ?Sized>(&mut self, store: &S) {
        for alpha in &mut self.alphas {
            alpha.fill(store);
        }
    }

    /// Complete matches currently held.
    pub(crate) fn complete(&self) -> impl Iterator<Item = &Partial> {
        self.betas[self.depth()].iter()
    }

    /// Partial matches after the first `count` patterns.
    pub(crate) fn level(&self, count: usize) -> impl Iterator<Item = &Partial> {
        self.betas.get(count).into_iter().flat_map(BetaMemory::iter)
    }

    /// Starts matching from a new seed. Returns the complete matches gained.
    pub(crate) fn add_seed(&mut self, seed: Token) -> Vec<Partial> {
        let start = Partial::seeded(seed);
        if !self.betas[0].insert(start.clone()) {
            return Vec::new();
        }
        self.cascade(vec![(0, start)], true)
    }

    /// Drops a seed and everything extending it. Returns the complete
    /// matches lost.
    pub(crate) fn remove_seed(&mut self, seed: &Token) -> Vec<Partial> {
        let start = Partial::seeded(seed.clone());
        if !self.betas[0].remove(&start) {
            return Vec::new();
        }
        self.cascade(vec![(0, start)], false)
    }

    /// Adds a quad to every alpha it matches. Returns the complete matches
    /// gained.
    ///
    /// Alphas are visited in order, so a quad matching several patterns
    /// joins with itself exactly once per combination.
    pub(crate) fn insert_fact(&mut self, quad: &Quad) -> Vec<Partial> {
        let mut gained = Vec::new();
        for i in 0..self.depth() {
            let Some(bindings) = self.alphas[i].activate(quad) else {
                continue;
            };
            let work = self.join_right(i, quad, &bindings, true);
            gained.extend(self.cascade(work, true));
        }
        gained
    }

    /// Removes a quad from every alpha holding it. Returns the complete
    /// matches lost.
    pub(crate) fn remove_fact(&mut self, quad: &Quad) -> Vec<Partial> {
        let mut lost = Vec::new();
        for i in 0..self.depth() {
            let Some(bindings) = self.alphas[i].deactivate(quad) else {
                continue;
            };
            let work = self.join_right(i, quad, &bindings, false);
            lost.extend(self.cascade(work, false));
        }
        lost
    }

    /// Joins a fact entering (or leaving) alpha `i` with beta level `i`,
    /// updating level `i + 1`.
    fn join_right(
        &mut self,
        i: usize,
        quad: &Quad,
        bindings: &Bindings,
        inserting: bool,
    ) -> Vec<(usize, Partial)> {
        let key = bindings.key(self.alphas[i].key_vars());
        let children: Vec<Partial> = self.betas[i]
            .probe(&key)
            .filter_map(|left| left.extend(quad, bindings))
            .collect();
        children
            .into_iter()
            .filter(|child| self.store(i + 1, child, inserting))
            .map(|child| (i + 1, child))
            .collect()
    }

    /// Extends (or unwinds) partial matches level by level.
    fn cascade(&mut self, mut work: Vec<(usize, Partial)>, inserting: bool) -> Vec<Partial> {
        let depth = self.depth();
        let mut complete = Vec::new();
        while let Some((level, partial)) = work.pop() {
            if level == depth {
                complete.push(partial);
                continue;
            }
            let alpha = &self.alphas[level];
            let key = partial.bindings.key(alpha.key_vars());
            let children: Vec<Partial> = alpha
                .probe(&key)
                .filter_map(|(quad, bindings)| partial.extend(quad, bindings))
                .collect();
            for child in children {
                if self.store(level + 1, &child, inserting) {
                    work.push((level + 1, child));
                }
            }
        }
        complete
    }

    fn store(&mut self, level: usize, partial: &Partial, inserting: bool) -> bool {
        if inserting {
            self.betas[level].insert(partial.clone())
        } else {
            self.betas[level].remove(partial)
        }
    }
}
