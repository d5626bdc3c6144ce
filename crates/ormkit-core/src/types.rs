//! Value type tags and store-generation policies.

use serde::{Deserialize, Serialize};

/// The type of value a property holds.
///
/// Value types (integers, booleans, guids, ...) cannot hold "no value" unless
/// wrapped as optional; reference-like types (text, bytes) can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Boolean
    Bool,
    /// 8-bit signed integer
    TinyInt,
    /// 16-bit signed integer
    SmallInt,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    BigInt,
    /// 32-bit floating point
    Float,
    /// 64-bit floating point
    Double,
    /// Fixed-point decimal
    Decimal,
    /// 128-bit globally unique identifier
    Guid,
    /// Date and time
    DateTime,
    /// Unicode text
    Text,
    /// Binary data
    Bytes,
}

impl ValueType {
    /// Whether this is a non-nullable value type.
    #[must_use]
    pub const fn is_value_type(self) -> bool {
        !matches!(self, ValueType::Text | ValueType::Bytes)
    }

    /// Whether this is an integer type.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            ValueType::TinyInt | ValueType::SmallInt | ValueType::Int | ValueType::BigInt
        )
    }

    /// Whether a foreign key property of type `self` may reference a principal
    /// key property of type `principal`.
    ///
    /// Types must match exactly, except that any integer may reference any
    /// integer of equal or greater width (`Int` may point at `BigInt`, not the
    /// other way around).
    #[must_use]
    pub fn is_compatible_with(self, principal: ValueType) -> bool {
        if self == principal {
            return true;
        }
        match (self.integer_width(), principal.integer_width()) {
            (Some(dependent), Some(principal)) => dependent <= principal,
            _ => false,
        }
    }

    fn integer_width(self) -> Option<u8> {
        match self {
            ValueType::TinyInt => Some(8),
            ValueType::SmallInt => Some(16),
            ValueType::Int => Some(32),
            ValueType::BigInt => Some(64),
            _ => None,
        }
    }

    /// Display name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::TinyInt => "i8",
            ValueType::SmallInt => "i16",
            ValueType::Int => "i32",
            ValueType::BigInt => "i64",
            ValueType::Float => "f32",
            ValueType::Double => "f64",
            ValueType::Decimal => "decimal",
            ValueType::Guid => "guid",
            ValueType::DateTime => "datetime",
            ValueType::Text => "string",
            ValueType::Bytes => "bytes",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether and how the store computes a property's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StoreGeneratedPattern {
    /// The application always supplies the value.
    #[default]
    None,
    /// Generated by the store on insert.
    Identity,
    /// Generated by the store on insert and update.
    Computed,
}

impl StoreGeneratedPattern {
    /// Check whether the store supplies the value.
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        !matches!(self, Self::None)
    }
}
