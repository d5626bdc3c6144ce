//! Error types for model building.

use std::error::Error as StdError;
use std::fmt;

/// Errors that abort a model build.
///
/// Guard rejections are not errors; guarded setters report them through
/// their return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Several properties carry a `Key` marker and no explicit key resolves
    /// their order.
    CompositePrimaryKeyFromDataAnnotation {
        /// Display name of the entity type.
        entity_type: String,
    },
    /// A foreign key's properties do not fit the principal key.
    IncompatibleForeignKey {
        /// Dependent entity type.
        dependent: String,
        /// Principal entity type.
        principal: String,
        /// What did not match.
        reason: String,
    },
    /// The principal side of a relationship has no key to reference.
    MissingPrincipalKey {
        /// Principal entity type.
        principal: String,
    },
    /// A builder call received an unusable argument.
    InvalidArgument {
        /// Argument name.
        argument: &'static str,
        /// Why it was rejected.
        reason: String,
    },
    /// The named entity type is not part of the model.
    EntityTypeNotFound(String),
    /// The named property does not exist on the entity type.
    PropertyNotFound {
        /// Entity type.
        entity_type: String,
        /// Property name.
        property: String,
    },
    /// Annotation payload could not be (de)serialized.
    Serialization(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidArgument`].
    pub fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CompositePrimaryKeyFromDataAnnotation { entity_type } => write!(
                f,
                "entity type '{}' has a composite primary key defined with Key markers; \
                 composite primary keys can only be set with an explicit key definition",
                entity_type
            ),
            Error::IncompatibleForeignKey {
                dependent,
                principal,
                reason,
            } => write!(
                f,
                "foreign key from '{}' to '{}' is incompatible with the principal key: {}",
                dependent, principal, reason
            ),
            Error::MissingPrincipalKey { principal } => write!(
                f,
                "entity type '{}' cannot be the principal of a relationship because it has no key",
                principal
            ),
            Error::InvalidArgument { argument, reason } => {
                write!(f, "invalid argument '{}': {}", argument, reason)
            }
            Error::EntityTypeNotFound(name) => {
                write!(f, "entity type '{}' is not part of the model", name)
            }
            Error::PropertyNotFound {
                entity_type,
                property,
            } => write!(
                f,
                "property '{}' does not exist on entity type '{}'",
                property, entity_type
            ),
            Error::Serialization(msg) => write!(f, "annotation serialization failed: {}", msg),
        }
    }
}

impl StdError for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result alias for model-building operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_key_message_names_entity() {
        let err = Error::CompositePrimaryKeyFromDataAnnotation {
            entity_type: "B".to_string(),
        };
        assert!(err.to_string().contains("'B'"));
    }

    #[test]
    fn test_invalid_argument_display() {
        let err = Error::invalid_argument("property_names", "must not be empty");
        assert_eq!(
            err.to_string(),
            "invalid argument 'property_names': must not be empty"
        );
    }
}
