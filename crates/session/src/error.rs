//! Session Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction, following the same layout as the other crates in this
//! workspace.

use derive_more::{Display, Error};

/// A session error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Login failures are deliberately distinct variants so the caller can show
/// the user *why* the attempt failed; none of them are retried automatically.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Credential vault read/write failed
    #[display("credential vault error")]
    Vault,
    /// A required login input was empty; rejected before any network call
    #[display("login failed: missing {_0}")]
    MissingCredential(#[error(not(source))] &'static str),
    /// Server URL did not parse as an absolute URL
    #[display("login failed: invalid server url {_0:?}")]
    InvalidServerUrl(#[error(not(source))] String),
    /// A login attempt is already in flight
    #[display("login already in progress")]
    LoginPending,
    /// The request hit its deadline
    #[display("request timed out")]
    Timeout,
    /// The server answered with a non-success status
    #[display("login rejected by server: {_0} {_1}")]
    Rejected(#[error(not(source))] u16, String),
    /// The request produced no usable response at all
    #[display("no response from server")]
    NoResponse,
    /// No server URL stored; the device has never logged in
    #[display("no server configured; log in first")]
    NotConfigured,
    /// Transport-level failure (connection, TLS, protocol)
    #[display("request failed: {_0}")]
    Transport(#[error(not(source))] String),
    /// Response body was not the expected payload
    #[display("unexpected response payload")]
    Decode,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::NoResponse | Self::Transport(_))
    }
}
