//! Variable bindings and tokens.
//!
//! Both are persistent: extending a binding set or a token shares structure
//! with the original, so tokens are cheap to clone into every memory that
//! holds them.

use std::fmt;

use quadrille_foundation::{Node, Quad};

use crate::pattern::Variable;

// =============================================================================
// Bindings
// =============================================================================

/// A mapping from variables to nodes.
///
/// Also the solution type reported by queries.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bindings(im::OrdMap<Variable, Node>);

impl Bindings {
    /// Creates empty bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the node bound to a variable.
    #[must_use]
    pub fn get(&self, var: &Variable) -> Option<&Node> {
        self.0.get(var)
    }

    /// Gets the node bound to a variable by name (with or without `?`).
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Node> {
        self.0.get(&Variable::new(name))
    }

    /// Returns true if the variable is bound.
    #[must_use]
    pub fn contains(&self, var: &Variable) -> bool {
        self.0.contains_key(var)
    }

    /// Binds a variable, replacing any previous binding.
    pub fn insert(&mut self, var: Variable, node: Node) {
        self.0.insert(var, node);
    }

    /// Returns a copy with one more binding.
    #[must_use]
    pub fn with(&self, var: Variable, node: Node) -> Self {
        Self(self.0.update(var, node))
    }

    /// Returns the number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates bindings in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Node)> {
        self.0.iter()
    }

    /// Combines two binding sets.
    ///
    /// Returns `None` if they bind a shared variable to different nodes.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Option<Self> {
        let (mut merged, smaller) = if self.len() >= other.len() {
            (self.0.clone(), &other.0)
        } else {
            (other.0.clone(), &self.0)
        };
        for (var, node) in smaller {
            match merged.get(var) {
                Some(existing) if existing != node => return None,
                Some(_) => {}
                None => {
                    merged.insert(var.clone(), node.clone());
                }
            }
        }
        Some(Self(merged))
    }

    /// Returns the nodes bound to the given variables, in order.
    ///
    /// # Panics
    ///
    /// Panics if one of the variables is unbound. Join keys are computed
    /// only over variables the network guarantees are bound.
    #[must_use]
    pub(crate) fn key(&self, vars: &[Variable]) -> Vec<Node> {
        vars.iter()
            .map(|var| {
                self.get(var)
                    .cloned()
                    .unwrap_or_else(|| panic!("join variable {var} is unbound"))
            })
            .collect()
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl<V: Into<Variable>> FromIterator<(V, Node)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (V, Node)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(v, n)| (v.into(), n)).collect())
    }
}

// =============================================================================
// Token
// =============================================================================

/// A partial or complete match: bindings plus the quads that produced them.
///
/// Tokens are never unbound in place. On retraction the token is destroyed
/// and any token built from it is destroyed with it.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token {
    bindings: Bindings,
    facts: im::Vector<Quad>,
}

impl Token {
    /// The empty token that seeds a network.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a token.
    #[must_use]
    pub fn new(bindings: Bindings, facts: im::Vector<Quad>) -> Self {
        Self { bindings, facts }
    }

    /// Returns the bindings.
    #[must_use]
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Returns the supporting quads, one per matched positive pattern.
    #[must_use]
    pub fn facts(&self) -> &im::Vector<Quad> {
        &self.facts
    }

    /// Consumes the token, keeping only its bindings.
    #[must_use]
    pub fn into_bindings(self) -> Bindings {
        self.bindings
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("bindings", &self.bindings)
            .field("facts", &self.facts.len())
            .finish()
    }
}
