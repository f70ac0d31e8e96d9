//! Catalog Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction, following the same layout as the other crates in this
//! workspace.

use derive_more::{Display, Error};

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The request pipeline failed before a response arrived
    #[display("session pipeline error")]
    Session,
    /// The server answered with a non-success status
    #[display("server returned status {_0}")]
    Status(#[error(not(source))] u16),
    /// Response body was not the expected payload
    #[display("unexpected response payload")]
    Decode,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Session)
    }
}
