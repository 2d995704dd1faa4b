//! Node construction with string interning.
//!
//! IRIs and literal lexical forms are interned so repeated strings share
//! storage. Equality of nodes stays by value; interning only reduces memory
//! and makes clones of equal strings point at one allocation.

use std::collections::HashSet;
use std::sync::Arc;

use crate::node::{BlankId, Iri, Literal, Node};
use crate::vocab;

/// Factory for nodes.
///
/// Owns the string interner and the blank node counter. It is not
/// thread-safe; use external synchronization if needed.
#[derive(Clone, Debug, Default)]
pub struct NodeFactory {
    /// Interned strings.
    strings: HashSet<Arc<str>>,
    /// Next blank node index.
    next_blank: u64,
}

impl NodeFactory {
    /// Creates an empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a string, returning the shared copy.
    pub fn intern(&mut self, s: &str) -> Arc<str> {
        if let Some(existing) = self.strings.get(s) {
            return existing.clone();
        }
        let arc: Arc<str> = s.into();
        self.strings.insert(arc.clone());
        arc
    }

    /// Returns the number of interned strings.
    #[must_use]
    pub fn interned_count(&self) -> usize {
        self.strings.len()
    }

    /// Creates an IRI node.
    pub fn iri(&mut self, value: &str) -> Node {
        Node::Iri(Iri::new(self.intern(value)))
    }

    /// Allocates a fresh blank node, distinct from every blank allocated
    /// before by this factory.
    pub fn blank(&mut self) -> Node {
        let id = BlankId(self.next_blank);
        self.next_blank += 1;
        Node::Blank(id)
    }

    /// Creates a typed literal.
    pub fn typed(&mut self, lexical: &str, datatype: &str) -> Node {
        let lexical = self.intern(lexical);
        let datatype = Iri::new(self.intern(datatype));
        Node::Literal(Literal::typed(lexical, datatype))
    }

    /// Creates an `xsd:string` literal.
    pub fn string(&mut self, value: &str) -> Node {
        self.typed(value, vocab::XSD_STRING)
    }

    /// Creates a language-tagged string.
    pub fn lang_string(&mut self, value: &str, language: &str) -> Node {
        let value = self.intern(value);
        let language = self.intern(language);
        Node::Literal(Literal::lang_string(value, language))
    }

    /// Creates an `xsd:integer` literal.
    pub fn integer(&mut self, value: i64) -> Node {
        self.typed(&value.to_string(), vocab::XSD_INTEGER)
    }

    /// Creates an `xsd:decimal` literal.
    pub fn decimal(&mut self, value: f64) -> Node {
        self.typed(&crate::value::decimal_lexical(value), vocab::XSD_DECIMAL)
    }

    /// Creates an `xsd:boolean` literal.
    pub fn boolean(&mut self, value: bool) -> Node {
        self.typed(if value { "true" } else { "false" }, vocab::XSD_BOOLEAN)
    }
}
