//! Type descriptors for evaluated values.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type descriptor for [`Value`](crate::Value).
///
/// Used in type mismatch errors raised by expression evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueType {
    /// Boolean type.
    Bool,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point decimal.
    Decimal,
    /// Plain or language-tagged string.
    String,
    /// An IRI, a blank node, or a literal of an unrecognized datatype.
    Node,
    /// Any numeric type (used as an expected type).
    Numeric,
}

impl ValueType {
    /// Returns true if values of this type take part in arithmetic.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Decimal | Self::Numeric)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::String => "string",
            Self::Node => "node",
            Self::Numeric => "numeric",
        };
        f.write_str(name)
    }
}
