//! Error types for message generation.
//!
//! Every variant is fatal: generation is read-only over the schema, so an
//! error always means the schema, the configuration, or an override disagree
//! with each other. Nothing is retried and no partial message escapes.

use crate::schema::{Cardinality, ScalarKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The engine has no generator for this kind of field.
    #[error("unsupported field kind '{kind}' for field '{field}'")]
    UnsupportedFieldKind { field: String, kind: &'static str },

    /// A size range with `min > max`.
    #[error("invalid {what} range: min {min} is greater than max {max}")]
    InvalidSizeRange {
        what: &'static str,
        min: usize,
        max: usize,
    },

    /// The object pool must be able to hold at least one instance.
    #[error("object pool size must be positive, got {0}")]
    InvalidPoolSize(usize),

    /// No message descriptor is registered under this name.
    #[error("unknown message type: '{0}'")]
    UnknownMessageType(String),

    /// No enum descriptor is registered under this name.
    #[error("unknown enum type: '{0}'")]
    UnknownEnumType(String),

    /// The message has no field with this name.
    #[error("message '{message}' has no field '{field}'")]
    UnknownField { message: String, field: String },

    /// A builder mutation that does not fit the field's cardinality, e.g.
    /// pushing onto a singular field.
    #[error("field '{field}' is {expected}, cannot {operation}")]
    CardinalityMismatch {
        field: String,
        expected: Cardinality,
        operation: &'static str,
    },

    /// A value whose type does not conform to the field it is stored into.
    #[error("field '{field}' expects {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// The schema failed validation.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
}

impl Error {
    pub(crate) fn unsupported_scalar(field: &str, kind: ScalarKind) -> Self {
        Error::UnsupportedFieldKind {
            field: field.to_string(),
            kind: kind.proto_name(),
        }
    }
}
