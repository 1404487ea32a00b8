//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while mapping records to bytes or properties.
#[derive(Error, Debug)]
pub enum CodecError {
    /// JSON encoding or decoding failed.
    #[error("json codec failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A record listed the same field name twice.
    #[error("duplicate field name: {name}")]
    DuplicateField {
        /// The repeated field name.
        name: String,
    },

    /// A field name collides with the split parts of another field.
    #[error("property {property} collides with the split parts of field {field}")]
    PropertyCollision {
        /// The field whose value was split.
        field: String,
        /// The colliding property name.
        property: String,
    },

    /// A stored value could not be converted back to the field type.
    #[error("invalid value for field {field}: {message}")]
    InvalidValue {
        /// The field being decoded.
        field: String,
        /// Why the conversion failed.
        message: String,
    },

    /// A split value is missing one of its parts.
    #[error("field {field} is missing part {index}")]
    MissingPart {
        /// The field being reassembled.
        field: String,
        /// The first missing part number (1-based).
        index: usize,
    },
}

impl CodecError {
    /// Create an invalid value error.
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}
