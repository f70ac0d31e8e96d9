//! Vault Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction, following the same layout as the other crates in this
//! workspace.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A vault error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for vault operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Key contains characters outside `[A-Za-z0-9._-]` or is empty
    #[display("invalid credential key: {_0:?}")]
    InvalidKey(#[error(not(source))] String),
    /// Vault root is not an absolute path
    #[display("invalid vault root: {}", _0.display())]
    InvalidRoot(#[error(not(source))] PathBuf),
    /// Access denied on the vault directory or a key file
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
