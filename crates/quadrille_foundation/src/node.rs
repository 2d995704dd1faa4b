//! RDF nodes and quads.
//!
//! Nodes are immutable and cheaply cloneable: every string payload is an
//! `Arc<str>`, usually shared through a [`NodeFactory`](crate::NodeFactory).

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vocab;

// =============================================================================
// IRI
// =============================================================================

/// An IRI. Equality is by value.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Iri(Arc<str>);

impl Iri {
    /// Creates an IRI from its string form.
    #[must_use]
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    /// Returns the IRI string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

// =============================================================================
// Blank Node
// =============================================================================

/// Identity of a blank node.
///
/// Two blank nodes are equal iff they were allocated as the same blank.
/// Fresh identities come from [`NodeFactory::blank`](crate::NodeFactory::blank).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlankId(pub(crate) u64);

impl BlankId {
    /// Returns the raw index of this blank node.
    #[must_use]
    pub const fn index(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for BlankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:b{}", self.0)
    }
}

// =============================================================================
// Literal
// =============================================================================

/// A literal: lexical form, datatype, and optional language tag.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Literal {
    lexical: Arc<str>,
    datatype: Iri,
    language: Option<Arc<str>>,
}

impl Literal {
    /// Creates a typed literal.
    #[must_use]
    pub fn typed(lexical: impl Into<Arc<str>>, datatype: Iri) -> Self {
        Self {
            lexical: lexical.into(),
            datatype,
            language: None,
        }
    }

    /// Creates a language-tagged string.
    #[must_use]
    pub fn lang_string(lexical: impl Into<Arc<str>>, language: impl Into<Arc<str>>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Iri::new(vocab::RDF_LANG_STRING),
            language: Some(language.into()),
        }
    }

    /// Returns the lexical form.
    #[must_use]
    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    /// Returns the datatype IRI.
    #[must_use]
    pub fn datatype(&self) -> &Iri {
        &self.datatype
    }

    /// Returns the language tag, if any.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.lexical.escape_default())?;
        match &self.language {
            Some(lang) => write!(f, "@{lang}"),
            None if self.datatype.as_str() == vocab::XSD_STRING => Ok(()),
            None => write!(f, "^^{}", self.datatype),
        }
    }
}

// =============================================================================
// Node
// =============================================================================

/// An RDF node.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Node {
    /// An IRI.
    Iri(Iri),
    /// A blank node.
    Blank(BlankId),
    /// A literal.
    Literal(Literal),
}

impl Node {
    /// Creates an IRI node without interning.
    #[must_use]
    pub fn iri(value: impl Into<Arc<str>>) -> Self {
        Self::Iri(Iri::new(value))
    }

    /// Returns true if this is an IRI.
    #[must_use]
    pub const fn is_iri(&self) -> bool {
        matches!(self, Self::Iri(_))
    }

    /// Returns true if this is a blank node.
    #[must_use]
    pub const fn is_blank(&self) -> bool {
        matches!(self, Self::Blank(_))
    }

    /// Returns true if this is a literal.
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Attempts to extract the IRI.
    #[must_use]
    pub const fn as_iri(&self) -> Option<&Iri> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Attempts to extract the literal.
    #[must_use]
    pub const fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(lit) => Some(lit),
            _ => None,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "{iri}"),
            Self::Blank(id) => write!(f, "{id:?}"),
            Self::Literal(lit) => write!(f, "{lit}"),
        }
    }
}

impl From<Iri> for Node {
    fn from(iri: Iri) -> Self {
        Self::Iri(iri)
    }
}

impl From<Literal> for Node {
    fn from(lit: Literal) -> Self {
        Self::Literal(lit)
    }
}

impl From<BlankId> for Node {
    fn from(id: BlankId) -> Self {
        Self::Blank(id)
    }
}

// =============================================================================
// Quad
// =============================================================================

/// A graph-qualified triple.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Quad {
    /// The graph containing the triple.
    pub graph: Node,
    /// The subject.
    pub subject: Node,
    /// The predicate.
    pub predicate: Node,
    /// The object.
    pub object: Node,
}

impl Quad {
    /// Creates a new quad.
    #[must_use]
    pub fn new(graph: Node, subject: Node, predicate: Node, object: Node) -> Self {
        Self {
            graph,
            subject,
            predicate,
            object,
        }
    }

    /// Checks that every node occupies a position it is allowed in.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnsupportedNode`](crate::ErrorKind::UnsupportedNode)
    /// for a literal graph or subject, or a predicate that is not an IRI.
    pub fn validate(&self) -> Result<()> {
        if self.graph.is_literal() {
            return Err(Error::unsupported_node(format!(
                "literal {} in graph position",
                self.graph
            )));
        }
        if self.subject.is_literal() {
            return Err(Error::unsupported_node(format!(
                "literal {} in subject position",
                self.subject
            )));
        }
        if !self.predicate.is_iri() {
            return Err(Error::unsupported_node(format!(
                "{} in predicate position",
                self.predicate
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} .",
            self.subject, self.predicate, self.object, self.graph
        )
    }
}
