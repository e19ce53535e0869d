//! Error types for caskv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using CasKvError
pub type Result<T> = std::result::Result<T, CasKvError>;

/// Unified error type for caskv operations
#[derive(Debug, Error)]
pub enum CasKvError {
    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    NotFound,

    // -------------------------------------------------------------------------
    // CAS Errors
    // -------------------------------------------------------------------------
    /// Write rejected because the supplied token is behind the stored version.
    /// Recoverable: re-read, recompute, retry with the fresh version.
    #[error("CAS conflict: write token rejected by stored version")]
    CasConflict,

    /// Stored bytes are shorter than the fixed version prefix. Either the
    /// store corrupted the value or a non-protocol writer touched the key.
    #[error("Malformed record: {actual} bytes, need at least {expected}")]
    MalformedRecord { expected: usize, actual: usize },

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Delete removed {removed} keys, expected 1")]
    DeleteMismatch { removed: u64 },

    /// Transport-class error wrapped with the operation it interrupted.
    #[error("{op} {key:?}: {source}")]
    Store {
        op: &'static str,
        key: String,
        #[source]
        source: Box<CasKvError>,
    },

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Encode message: {0}")]
    Encode(String),

    #[error("Decode message: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("No pooled connection available within {waited_ms} ms")]
    PoolTimeout { waited_ms: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl CasKvError {
    /// Whether this error came from the transport rather than the protocol.
    ///
    /// A connection that produced a transport error may be mid-stream and
    /// must not be reused; the outcome of an interrupted write is unknown.
    pub fn is_transport(&self) -> bool {
        matches!(self, CasKvError::Io(_) | CasKvError::Protocol(_))
    }

    /// Wrap a transport-class error with the operation and key it interrupted.
    /// Protocol-level outcomes (NotFound, CasConflict, ...) pass through
    /// unchanged so callers can match on them directly.
    pub(crate) fn in_op(self, op: &'static str, key: &str) -> Self {
        if self.is_transport() {
            CasKvError::Store {
                op,
                key: key.to_string(),
                source: Box::new(self),
            }
        } else {
            self
        }
    }
}
