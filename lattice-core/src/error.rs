//! Error types for LATTICE operations.
//!
//! One enum per failure domain (schema resolution, record decode, store
//! write), wrapped by [`LatticeError`]. The split matters for propagation
//! policy: schema errors for the startup schema are fatal, decode and store
//! errors are per-message and the loop keeps running.

use thiserror::Error;

/// Schema resolution errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// Registry used before connection parameters were supplied.
    #[error("Schema registry is not configured")]
    NotInitialized,

    /// The registry has no schema registered under the subject.
    #[error("No schema registered for subject '{subject}'")]
    NotFound { subject: String },

    /// The registry could not be reached or returned garbage.
    #[error("Schema registry unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Per-message decode errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Binary decode failed: corrupt framing or schema/data mismatch.
    #[error("Malformed payload: {reason}")]
    Malformed { reason: String },

    /// Decode succeeded but a required field is absent.
    #[error("Decoded record is missing required field '{field}'")]
    MissingField { field: &'static str },
}

/// Persistence errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The underlying connection is not usable.
    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Top-level error for the ingestion pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LatticeError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LatticeError {
    /// Whether this error terminates the process.
    ///
    /// Schema errors are startup-class: without the one required schema no
    /// message can ever decode, so there is no degraded mode. Decode and
    /// store errors are per-message; they are logged, counted, and the loop
    /// continues.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LatticeError::Schema(_))
    }
}

/// Result type alias for LATTICE operations.
pub type LatticeResult<T> = Result<T, LatticeError>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_errors_are_fatal() {
        assert!(LatticeError::from(SchemaError::NotInitialized).is_fatal());
        assert!(LatticeError::from(SchemaError::NotFound {
            subject: "spo-value".to_string()
        })
        .is_fatal());
        assert!(LatticeError::from(SchemaError::Unavailable {
            reason: "connection refused".to_string()
        })
        .is_fatal());
    }

    #[test]
    fn test_per_message_errors_are_recoverable() {
        assert!(!LatticeError::from(DecodeError::MissingField { field: "object" }).is_fatal());
        assert!(!LatticeError::from(DecodeError::Malformed {
            reason: "bad magic byte".to_string()
        })
        .is_fatal());
        assert!(!LatticeError::from(StoreError::Unavailable {
            reason: "pool timeout".to_string()
        })
        .is_fatal());
    }

    #[test]
    fn test_error_messages_name_the_subject() {
        let err = SchemaError::NotFound {
            subject: "spo-value".to_string(),
        };
        assert!(err.to_string().contains("spo-value"));
    }
}
