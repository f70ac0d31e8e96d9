//! Durable credential storage.
//!
//! This crate provides the credential vault: a small key-value namespace that
//! outlives the process and holds the server URL plus the authentication
//! tokens captured from responses. The vault is deliberately dumb — get, set,
//! delete, nothing else — so the session layer owns every policy decision
//! (expiry, encoding, invalidation) and tests can substitute an in-memory
//! vault for the real one.

pub mod error;
pub mod keys;

mod file;
#[cfg(feature = "mock")]
mod memory;

pub use crate::file::FileVault;
#[cfg(feature = "mock")]
pub use crate::memory::MemoryVault;

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub type VaultHandle = Arc<dyn CredentialVault + Send + Sync>;

/// Key-value persistence for credential material.
///
/// Values are opaque strings; the session crate layers its own encodings on
/// top (e.g. the remember-token's `value;expiresAtEpochMillis` form). Keys
/// are restricted to `[A-Za-z0-9._-]` so every implementation can use them
/// as filenames directly.
#[async_trait]
pub trait CredentialVault: Send + Sync {
    /// Read a stored value, `None` if the key has never been set or was
    /// deleted.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, overwriting any previous value for the key.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Deleting a key that does not exist is a no-op.
    async fn delete(&self, key: &str) -> Result<()>;
}
