//! Error types for imswire.

use thiserror::Error;

/// Main error type for all imswire operations.
#[derive(Debug, Error)]
pub enum ImswireError {
    /// I/O error during socket operations, including deadline expiry
    /// (surfaced as `ErrorKind::TimedOut`).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer address string is not of the form `host:port`.
    #[error("invalid peer address: {0}")]
    InvalidAddress(String),

    /// A response segment declared a length insufficient for its kind.
    #[error("invalid unmarshal object")]
    InvalidUnmarshal,

    /// A requested semantic segment did not appear in this response.
    #[error("segment not present")]
    SegmentNotPresent,

    /// The peer reported an error through a request-status segment.
    ///
    /// The codes can be rendered to text via
    /// [`ReturnCode`](crate::protocol::ReturnCode) and
    /// [`ReasonCode`](crate::protocol::ReasonCode).
    #[error("peer returned error: returnCode={return_code}, reasonCode={reason_code}")]
    Peer {
        /// Return code from the request-status segment.
        return_code: u32,
        /// Reason code from the request-status segment.
        reason_code: u32,
    },

    /// An operation was attempted on a session that was never started.
    #[error("session not started")]
    NotStarted,

    /// `start` was called on a session that already holds a connection.
    #[error("session already started")]
    AlreadyStarted,

    /// An operation was attempted on a session after `end`.
    #[error("session closed")]
    Closed,
}

/// Result type alias using ImswireError.
pub type Result<T> = std::result::Result<T, ImswireError>;
