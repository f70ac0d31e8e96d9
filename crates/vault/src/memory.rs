//! In-memory credential vault for testing.

use crate::CredentialVault;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory credential vault for testing.
///
/// Values live in a `HashMap` behind a [`RwLock`], so all trait methods
/// operate on `&self` without external synchronisation. Ideal for unit tests
/// that need a [`CredentialVault`] without touching the filesystem.
///
/// # Examples
///
/// ```
/// use yomu_vault::{CredentialVault, MemoryVault, keys};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let vault = MemoryVault::with_entries([(keys::SESSION, "abc123")]);
/// assert_eq!(vault.get(keys::SESSION).await?.as_deref(), Some("abc123"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryVault {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryVault {
    /// Create an empty vault.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a vault pre-populated with entries.
    pub fn with_entries(entries: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { entries: RwLock::new(map) }
    }
}

#[async_trait]
impl CredentialVault for MemoryVault {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;

    #[tokio::test]
    async fn test_round_trip() {
        let vault = MemoryVault::new();
        assert_eq!(vault.get(keys::SESSION).await.unwrap(), None);
        vault.set(keys::SESSION, "tok").await.unwrap();
        assert_eq!(vault.get(keys::SESSION).await.unwrap().as_deref(), Some("tok"));
        vault.delete(keys::SESSION).await.unwrap();
        vault.delete(keys::SESSION).await.unwrap();
        assert_eq!(vault.get(keys::SESSION).await.unwrap(), None);
    }
}
