//! File-backed credential vault.
//!
//! One file per key inside a private directory. This is the closest a
//! headless client gets to a platform keychain: the directory and every key
//! file are created with owner-only permissions on Unix.

use crate::CredentialVault;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Credential vault persisting each key to its own file.
#[derive(Debug, Clone)]
pub struct FileVault {
    root: PathBuf,
}

impl FileVault {
    /// Create a vault rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute or cannot be created.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidRoot(root));
        }
        // Non-async on purpose; this happens once at startup and keeping the
        // constructor sync saves every caller an await.
        sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&root, std::fs::Permissions::from_mode(0o700))
                .map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { root })
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }
}

#[async_trait]
impl CredentialVault for FileVault {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::map_io_error(e, &path).into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        fs::write(&path, value).await.map_err(|e| Self::map_io_error(e, &path))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| Self::map_io_error(e, &path))?;
        }
        tracing::debug!(key, "stored credential");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key, "deleted credential");
                Ok(())
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::map_io_error(e, &path).into()),
        }
    }
}

/// Keys become filenames, so restrict them to a safe single-component set.
fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        && !key.starts_with('.');
    if !valid {
        exn::bail!(ErrorKind::InvalidKey(key.to_string()));
    }
    Ok(())
}
