/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Error types for the IronBus messaging layer.
//!
//! This module provides a unified error hierarchy using `thiserror` for typed,
//! domain-specific errors across field mapping, transport, and service setup.

use crate::field::SemanticType;
use thiserror::Error;

/// Result type alias using [`BusError`] as the error type.
pub type Result<T> = std::result::Result<T, BusError>;

/// Top-level error type for all IronBus operations.
#[derive(Debug, Error)]
pub enum BusError {
    /// Error while mapping a record to or from a mapped message.
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Error reported by the publish/subscribe transport.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Error while constructing or running a service.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
}

/// Errors that occur while describing, filling, or reading a mapped message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// The field uses a semantic type that cannot be mapped.
    #[error("unsupported type {semantic_type} for field {field}")]
    UnsupportedType {
        /// Name of the offending field.
        field: String,
        /// The rejected semantic type.
        semantic_type: SemanticType,
    },

    /// The field name is not part of the message schema.
    #[error("unknown field {field} in {type_name}")]
    UnknownField {
        /// Type name of the mapped message.
        type_name: String,
        /// Requested field name.
        field: String,
    },

    /// Two schema rows share the same field name.
    #[error("duplicate field {field} in {type_name}")]
    DuplicateField {
        /// Type name of the mapped message.
        type_name: String,
        /// Duplicated field name.
        field: String,
    },

    /// The value does not match the declared semantic type.
    #[error("type mismatch for field {field}: expected {expected}, found {actual}")]
    TypeMismatch {
        /// Name of the field.
        field: String,
        /// Declared semantic type.
        expected: SemanticType,
        /// Semantic type of the supplied value.
        actual: SemanticType,
    },

    /// A required field carries no value.
    #[error("missing value for field {field}")]
    MissingValue {
        /// Name of the field.
        field: String,
    },

    /// A string value exceeds the maximum length of its field.
    #[error("field value too long for {field}: {length} exceeds max {max_length}")]
    FieldTooLong {
        /// Name of the field.
        field: String,
        /// Actual length in characters.
        length: usize,
        /// Maximum allowed length.
        max_length: usize,
    },

    /// The message describes a different record type.
    #[error("type name mismatch: expected {expected}, found {actual}")]
    TypeNameMismatch {
        /// Type name the reader expected.
        expected: String,
        /// Type name carried by the message.
        actual: String,
    },

    /// A value is present but cannot be interpreted.
    #[error("invalid value for field {field}: {reason}")]
    InvalidValue {
        /// Name of the field.
        field: String,
        /// Description of why the value is invalid.
        reason: String,
    },
}

/// Errors reported by publish/subscribe transports.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Content filtering was requested on a subscriber created without a filter.
    #[error("topic {topic} is not a filtered topic")]
    NotFiltered {
        /// Topic of the subscriber.
        topic: String,
    },

    /// The filter field is not part of the topic schema.
    #[error("unknown filter field {field} on topic {topic}")]
    UnknownFilterField {
        /// Topic of the subscriber.
        topic: String,
        /// Requested filter field.
        field: String,
    },

    /// The publisher, subscriber, or bus was already shut down.
    #[error("endpoint on topic {topic} is shut down")]
    Closed {
        /// Topic of the endpoint.
        topic: String,
    },

    /// A topic was used with a schema other than the one it was created with.
    #[error("schema mismatch on topic {topic}: registered {registered}, offered {offered}")]
    SchemaMismatch {
        /// Topic name.
        topic: String,
        /// Type name the topic was created with.
        registered: String,
        /// Type name that was offered.
        offered: String,
    },

    /// The underlying transport rejected the publish call.
    #[error("publish failed on topic {topic}: {reason}")]
    PublishFailed {
        /// Topic name.
        topic: String,
        /// Reason reported by the transport.
        reason: String,
    },
}

/// Errors raised while constructing services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// A service was started outside of a Tokio runtime.
    #[error("no tokio runtime available to spawn {service} tasks")]
    NoRuntime {
        /// Name of the service being started.
        service: &'static str,
    },

    /// Service configuration is not usable.
    #[error("configuration error: {0}")]
    Configuration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_error_display() {
        let err = MappingError::FieldTooLong {
            field: "Data".to_string(),
            length: 30,
            max_length: 25,
        };
        assert_eq!(
            err.to_string(),
            "field value too long for Data: 30 exceeds max 25"
        );
    }

    #[test]
    fn test_unsupported_type_display() {
        let err = MappingError::UnsupportedType {
            field: "Flags".to_string(),
            semantic_type: SemanticType::Int16,
        };
        assert_eq!(err.to_string(), "unsupported type Int16 for field Flags");
    }

    #[test]
    fn test_bus_error_from_mapping() {
        let err: BusError = MappingError::MissingValue {
            field: "ID".to_string(),
        }
        .into();
        assert!(matches!(err, BusError::Mapping(MappingError::MissingValue { .. })));
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::NotFiltered {
            topic: "TickDataStream".to_string(),
        };
        assert_eq!(err.to_string(), "topic TickDataStream is not a filtered topic");
    }

    #[test]
    fn test_bus_error_from_service() {
        let err: BusError = ServiceError::NoRuntime {
            service: "CommandService",
        }
        .into();
        assert_eq!(
            err.to_string(),
            "service error: no tokio runtime available to spawn CommandService tasks"
        );
    }
}
