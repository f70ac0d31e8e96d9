//! Offline Store Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction, following the same layout as the other crates in this
//! workspace.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// An offline-store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for offline-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Shelf root is not an absolute path
    #[display("invalid shelf root: {}", _0.display())]
    InvalidRoot(#[error(not(source))] PathBuf),
    /// Metadata snapshot exists but does not parse
    #[display("corrupt metadata snapshot: {}", _0.display())]
    Metadata(#[error(not(source))] PathBuf),
    /// A remote transfer failed (the whole download is rolled back)
    #[display("transfer failed: {_0}")]
    Source(#[error(not(source))] String),
    /// A download for the same identity key is already in flight
    #[display("download already in progress: {_0}")]
    InProgress(#[error(not(source))] String),
    /// Metadata snapshot could not be serialized
    #[display("failed to serialize metadata snapshot")]
    Serialize,
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Source(_) | Self::InProgress(_))
    }
}
