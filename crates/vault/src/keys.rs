//! Well-known vault keys.
//!
//! The session and remember keys double as the server's cookie names, so the
//! inbound capture path can persist a directive under the exact name it
//! arrived with and the outbound path can replay it verbatim.

/// Base URL of the server the device is logged into.
pub const SERVER: &str = "server-url";

/// Short-lived session token. Cookie name as issued by the server.
pub const SESSION: &str = "KOMGA-SESSION";

/// Longer-lived remember-me token, persisted as `value` or
/// `value;expiresAtEpochMillis` when the issuing directive carried an
/// `Expires` attribute. Cookie name as issued by the server.
pub const REMEMBER: &str = "komga-remember-me";
