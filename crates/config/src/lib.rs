//! Configuration loading.
//!
//! Layered in the usual order: built-in defaults derived from the platform
//! directories, then the user's `config.toml`, then `YOMU_*` environment
//! variables. Later layers win.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const ENV_PREFIX: &str = "YOMU_";

/// Resolved configuration for the whole application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the offline shelf artifacts.
    pub shelf_dir: PathBuf,
    /// Directory holding the credential vault.
    pub vault_dir: PathBuf,
    /// Per-request timeout for catalog browsing, in seconds.
    pub request_timeout_secs: u64,
    /// Deadline for the login credential probe, in seconds.
    pub login_timeout_secs: u64,
}

impl Config {
    /// Load configuration: defaults, then `config.toml`, then `YOMU_*` env.
    pub fn load() -> Result<Self> {
        let dirs = ProjectDirs::from("dev", "yomu", "yomu")
            .ok_or_raise(|| ErrorKind::NoProjectDirs)?;
        let defaults = Self {
            shelf_dir: dirs.data_dir().join("shelf"),
            vault_dir: dirs.data_dir().join("vault"),
            request_timeout_secs: 4,
            login_timeout_secs: 8,
        };
        let config_file = dirs.config_dir().join("config.toml");
        tracing::debug!(path = %config_file.display(), "loading configuration");
        Self::from_figment(
            Figment::from(Serialized::defaults(defaults))
                .merge(Toml::file(config_file))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        figment.extract().or_raise(|| ErrorKind::Invalid)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }
}
