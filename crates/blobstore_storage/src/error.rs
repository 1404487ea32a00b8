//! Error types for store operations.

use blobstore_codec::CodecError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// An I/O error occurred.
    #[error("{context}: {source}")]
    Io {
        /// What was being done when the error occurred.
        context: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// No record is stored under the key.
    #[error("record not found: {key} in {domain}")]
    NotFound {
        /// The domain searched.
        domain: String,
        /// The missing key.
        key: String,
    },

    /// The key cannot be used by this backend.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The configured store type is not known.
    #[error("unsupported store type: {0}")]
    UnsupportedStoreType(String),

    /// A configuration value is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The service account file could not be used.
    #[error("unable to read service account file {path}: {message}")]
    Credentials {
        /// Path of the credential file.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// A call to the remote Datastore service failed.
    #[error("unable to {operation} in Datastore: {message}")]
    Remote {
        /// The failed operation, e.g. `run query` or `commit`.
        operation: &'static str,
        /// Error message from the transport or the service.
        message: String,
    },
}

impl StoreError {
    /// Creates an I/O error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates a remote call error.
    pub fn remote(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Remote {
            operation,
            message: message.into(),
        }
    }

    /// Returns true if this error reports a missing record.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::NotFound {
            domain: "deployments".into(),
            key: "redis".into(),
        };
        assert_eq!(err.to_string(), "record not found: redis in deployments");
        assert!(err.is_not_found());

        let err = StoreError::remote("commit", "503 Service Unavailable");
        assert_eq!(
            err.to_string(),
            "unable to commit in Datastore: 503 Service Unavailable"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn io_error_keeps_context() {
        let err = StoreError::io(
            "unable to store file /tmp/x",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "unable to store file /tmp/x: denied");
    }
}
