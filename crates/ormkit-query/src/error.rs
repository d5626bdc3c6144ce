//! Query translation errors.

use std::error::Error as StdError;
use std::fmt;

/// Why an expression could not be translated or rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// No registered translator accepts the method call.
    UntranslatableMethod {
        /// `Type.Method(params)` signature of the call.
        method: String,
    },
    /// A member refers to an entity type the model does not contain.
    UnknownEntityType(String),
    /// A member refers to a property the entity type does not have.
    UnknownMember {
        /// Entity type.
        entity_type: String,
        /// Member name.
        member: String,
    },
    /// A member was rendered before being bound to a column.
    UnboundMember {
        /// Entity type.
        entity_type: String,
        /// Member name.
        member: String,
    },
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationError::UntranslatableMethod { method } => {
                write!(f, "the method '{}' could not be translated to SQL", method)
            }
            TranslationError::UnknownEntityType(name) => {
                write!(f, "entity type '{}' is not part of the model", name)
            }
            TranslationError::UnknownMember {
                entity_type,
                member,
            } => write!(
                f,
                "'{}' is not a mapped property of entity type '{}'",
                member, entity_type
            ),
            TranslationError::UnboundMember {
                entity_type,
                member,
            } => write!(
                f,
                "member '{}.{}' must be bound to a column before rendering",
                entity_type, member
            ),
        }
    }
}

impl StdError for TranslationError {}

/// Result alias for translation.
pub type Result<T> = std::result::Result<T, TranslationError>;
