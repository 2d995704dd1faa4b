//! Typed values produced by expression evaluation.
//!
//! A [`Value`] is the decoded form of a node: literals of recognized XSD
//! datatypes become primitives, everything else stays a [`Node`]. Values
//! convert back to nodes when a conclusion is materialized.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::node::{Iri, Literal, Node};
use crate::types::ValueType;
use crate::vocab;

/// A typed primitive or an opaque node.
#[derive(Clone, PartialEq)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating point decimal.
    Decimal(f64),
    /// String value, without its language tag.
    String(Arc<str>),
    /// Any node without a primitive decoding.
    Node(Node),
}

/// Operands after numeric promotion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Numeric {
    /// Both operands are integers.
    Integers(i64, i64),
    /// At least one operand is a decimal; both are widened.
    Decimals(f64, f64),
}

impl Value {
    /// Returns the type of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Integer(_) => ValueType::Integer,
            Self::Decimal(_) => ValueType::Decimal,
            Self::String(_) => ValueType::String,
            Self::Node(_) => ValueType::Node,
        }
    }

    /// Decodes a node.
    ///
    /// Literals of XSD numeric, boolean and string datatypes, and language
    /// strings, decode to primitives. A literal whose lexical form does not
    /// parse under its datatype stays a node.
    #[must_use]
    pub fn from_node(node: &Node) -> Self {
        let Node::Literal(lit) = node else {
            return Self::Node(node.clone());
        };
        let lexical = lit.lexical();
        let decoded = match lit.datatype().as_str() {
            vocab::XSD_INTEGER | vocab::XSD_INT | vocab::XSD_LONG => {
                lexical.trim().parse().ok().map(Self::Integer)
            }
            vocab::XSD_DECIMAL | vocab::XSD_DOUBLE | vocab::XSD_FLOAT => {
                lexical.trim().parse().ok().map(Self::Decimal)
            }
            vocab::XSD_BOOLEAN => match lexical.trim() {
                "true" | "1" => Some(Self::Bool(true)),
                "false" | "0" => Some(Self::Bool(false)),
                _ => None,
            },
            vocab::XSD_STRING | vocab::RDF_LANG_STRING => Some(Self::String(lexical.into())),
            _ => None,
        };
        decoded.unwrap_or_else(|| Self::Node(node.clone()))
    }

    /// Encodes this value as a node.
    #[must_use]
    pub fn to_node(&self) -> Node {
        let typed = |lexical: String, datatype: &str| {
            Node::Literal(Literal::typed(lexical, Iri::new(datatype)))
        };
        match self {
            Self::Bool(b) => typed(b.to_string(), vocab::XSD_BOOLEAN),
            Self::Integer(n) => typed(n.to_string(), vocab::XSD_INTEGER),
            Self::Decimal(x) => typed(decimal_lexical(*x), vocab::XSD_DECIMAL),
            Self::String(s) => Node::Literal(Literal::typed(s.clone(), Iri::new(vocab::XSD_STRING))),
            Self::Node(node) => node.clone(),
        }
    }

    /// Attempts to extract a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a number as a decimal (integers are widened).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Decimal(x) => Some(*x),
            _ => None,
        }
    }

    /// Attempts to extract a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Promotes two operands to a common numeric type.
    ///
    /// | left    | right   | result     |
    /// |---------|---------|------------|
    /// | integer | integer | `Integers` |
    /// | integer | decimal | `Decimals` |
    /// | decimal | integer | `Decimals` |
    /// | decimal | decimal | `Decimals` |
    ///
    /// # Errors
    ///
    /// Returns a type mismatch if either operand is not numeric.
    pub fn promote(&self, other: &Self) -> Result<Numeric> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Ok(Numeric::Integers(*a, *b)),
            _ => match (self.as_decimal(), other.as_decimal()) {
                (Some(a), Some(b)) => Ok(Numeric::Decimals(a, b)),
                (None, _) => Err(Error::type_mismatch(ValueType::Numeric, self.value_type())),
                (_, None) => Err(Error::type_mismatch(ValueType::Numeric, other.value_type())),
            },
        }
    }

    /// Orders two values of comparable types.
    ///
    /// Numbers compare after promotion, strings lexicographically, booleans
    /// with `false < true`, and nodes by their total order.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch for operands of incomparable types, or when
    /// a decimal operand is NaN.
    pub fn compare(&self, other: &Self) -> Result<Ordering> {
        match (self, other) {
            (Self::String(a), Self::String(b)) => Ok(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Ok(a.cmp(b)),
            (Self::Node(a), Self::Node(b)) => Ok(a.cmp(b)),
            _ => match self.promote(other)? {
                Numeric::Integers(a, b) => Ok(a.cmp(&b)),
                Numeric::Decimals(a, b) => a
                    .partial_cmp(&b)
                    .ok_or_else(|| Error::type_mismatch(ValueType::Numeric, ValueType::Decimal)),
            },
        }
    }

    /// Returns true when two values denote the same thing.
    ///
    /// Numbers are equal after promotion; everything else compares by node.
    #[must_use]
    pub fn same_term(&self, other: &Self) -> bool {
        match self.promote(other) {
            Ok(Numeric::Integers(a, b)) => a == b,
            #[allow(clippy::float_cmp)]
            Ok(Numeric::Decimals(a, b)) => a == b,
            Err(_) => self.to_node() == other.to_node(),
        }
    }
}

/// Formats a decimal so that it always carries a fractional part.
#[must_use]
pub fn decimal_lexical(value: f64) -> String {
    let s = value.to_string();
    if value.is_finite() && !s.contains(['.', 'e', 'E']) {
        format!("{s}.0")
    } else {
        s
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Decimal(x) => write!(f, "{}", decimal_lexical(*x)),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Node(node) => write!(f, "{node}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Decimal(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Self::from_node(&node)
    }
}
