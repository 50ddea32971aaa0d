//! Error types for toad-session

use crate::services::ScanError;
use thiserror::Error;

/// Result type for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Session classification and comparison errors
///
/// A lookup that finds nothing is not an error; it returns `None`.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session directory (or one of its children) is missing or unreadable
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] ScanError),

    /// Two classified entries produced the same sequence name
    #[error("Duplicate sequence name: {0}")]
    DuplicateSequence(String),

    /// Fingerprint comparison attempted before classification
    #[error("Session {0} has not been classified yet")]
    ComparisonNotReady(String),
}
