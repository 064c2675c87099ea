//! Error types for mapping operations.

use automap_model::InvokeError;
use thiserror::Error;

/// Errors surfaced by the mapper.
///
/// A property whose value is not assignable to the destination slot is not
/// an error; it is skipped and logged.
#[derive(Debug, Error)]
pub enum MapError {
    /// The type cannot be instantiated as a mapping destination.
    #[error("cannot map into {type_name}: {reason}")]
    UnmappableType { type_name: String, reason: String },

    /// Auto-registration is disabled and the type was never registered.
    #[error("don't know how to map {type_name}: type is not registered")]
    UnregisteredType { type_name: String },

    /// An exclusion or override names properties the type does not have.
    #[error("unknown properties on {type_name}: {}", properties.join(", "))]
    UnknownProperty {
        type_name: String,
        properties: Vec<String>,
    },

    /// A null or mismatched value cannot be placed into the destination slot.
    #[error(
        "can't place value of {source_type}.{source_property} into {destination_type}.{destination_property}: {cause}"
    )]
    Coercion {
        source_type: String,
        source_property: String,
        destination_type: String,
        destination_property: String,
        #[source]
        cause: InvokeError,
    },

    /// A constructor or builder factory failed when invoked.
    #[error("failed to construct {type_name}: {cause}")]
    Construction {
        type_name: String,
        #[source]
        cause: InvokeError,
    },

    /// A getter or setter failed for another reason than null coercion.
    #[error("{type_name}.{operation} failed: {cause}")]
    Accessor {
        type_name: String,
        operation: String,
        #[source]
        cause: InvokeError,
    },

    /// A typed convenience call produced an instance of another type.
    #[error("expected an instance of {expected}, got {found}")]
    InstanceType { expected: String, found: String },
}

impl MapError {
    pub(crate) fn unmappable(type_name: &str, reason: impl Into<String>) -> Self {
        Self::UnmappableType {
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_property(type_name: &str, properties: Vec<String>) -> Self {
        Self::UnknownProperty {
            type_name: type_name.to_string(),
            properties,
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_property_lists_every_name() {
        let err = MapError::unknown_property("Plain", vec!["xxx".to_string(), "yyy".to_string()]);
        assert_eq!(err.to_string(), "unknown properties on Plain: xxx, yyy");
    }

    #[test]
    fn coercion_keeps_invoke_cause() {
        let err = MapError::Coercion {
            source_type: "Plain".to_string(),
            source_property: "myShort".to_string(),
            destination_type: "Boxed".to_string(),
            destination_property: "myShort".to_string(),
            cause: InvokeError::NullValue { expected: "short" },
        };
        assert_eq!(
            err.to_string(),
            "can't place value of Plain.myShort into Boxed.myShort: null cannot be converted to short"
        );
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("null cannot be converted to short"));
    }
}
