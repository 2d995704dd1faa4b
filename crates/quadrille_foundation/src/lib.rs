//! Nodes, quads, typed values, and errors for Quadrille.
//!
//! This crate provides:
//! - [`Node`] and [`Quad`] - The RDF data model
//! - [`NodeFactory`] - Interned node construction and blank allocation
//! - [`Value`] - Typed primitives decoded from literals
//! - [`ValueType`] - Type descriptors for evaluation errors
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod intern;
pub mod node;
pub mod types;
pub mod value;
pub mod vocab;

pub use error::{Error, ErrorContext, ErrorKind, Result, SemanticLimit};
pub use intern::NodeFactory;
pub use node::{BlankId, Iri, Literal, Node, Quad};
pub use types::ValueType;
pub use value::{Numeric, Value};
