//! Credential-bearing request pipeline.
//!
//! Every remote call in the workspace goes through [`Transport::execute`]:
//! the outbound half reads the vault and attaches the `Cookie` header before
//! the request is sent, the inbound half persists `Set-Cookie` directives
//! before the response is handed back. Call sites never see credential
//! mechanics.

use crate::cookie;
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use reqwest::header;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use std::time::Duration;
use time::OffsetDateTime;
use yomu_vault::{VaultHandle, keys};

/// Default per-request timeout for catalogue traffic.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);

/// HTTP pipeline over a shared [`reqwest::Client`] and the credential vault.
///
/// Cheap to clone; clones share the connection pool and the vault.
#[derive(Clone)]
pub struct Transport {
    client: Client,
    vault: VaultHandle,
}

impl Transport {
    /// Create a pipeline with the default request timeout.
    pub fn new(vault: VaultHandle) -> Result<Self> {
        Self::with_timeout(vault, DEFAULT_TIMEOUT)
    }

    /// Create a pipeline with a custom default request timeout.
    ///
    /// Individual requests can still override it via
    /// [`RequestBuilder::timeout`].
    pub fn with_timeout(vault: VaultHandle, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ErrorKind::Transport(e.to_string()))?;
        Ok(Self { client, vault })
    }

    pub fn vault(&self) -> &VaultHandle {
        &self.vault
    }

    /// Stored base URL, `None` until the device has logged into a server.
    ///
    /// Trailing slashes are stripped so paths can be joined naively.
    pub async fn base_url(&self) -> Result<Option<String>> {
        let url = self.vault.get(keys::SERVER).await.or_raise(|| ErrorKind::Vault)?;
        Ok(url.map(|url| url.trim_end_matches('/').to_string()))
    }

    /// Start a request against a path under the stored base URL.
    pub async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let base = self.base_url().await?.ok_or_raise(|| ErrorKind::NotConfigured)?;
        Ok(self.client.request(method, format!("{base}{path}")))
    }

    /// Start a request against an absolute URL.
    ///
    /// Used by login, which probes a server before any base URL is stored.
    pub fn request_absolute(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Convenience GET through the full pipeline.
    pub async fn get(&self, path: &str) -> Result<Response> {
        let builder = self.request(Method::GET, path).await?;
        self.execute(builder).await
    }

    /// Run a request through the full pipeline.
    ///
    /// Credential injection completes before the request is sent, and
    /// directive capture completes before the response is returned — a
    /// strict happens-before on both sides. Two concurrent `execute` calls
    /// may interleave their vault reads freely; writes race last-wins, which
    /// is safe because the server reissues tokens monotonically.
    pub async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        let builder = self.outbound(builder).await?;
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                exn::Exn::from(ErrorKind::Timeout)
            } else {
                exn::Exn::from(ErrorKind::Transport(e.to_string()))
            }
        })?;
        self.inbound(&response).await?;
        Ok(response)
    }

    /// Attach the credential header derived from the vault, if any.
    async fn outbound(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let session = self.vault.get(keys::SESSION).await.or_raise(|| ErrorKind::Vault)?;
        let remember = self.vault.get(keys::REMEMBER).await.or_raise(|| ErrorKind::Vault)?;
        let now = OffsetDateTime::now_utc();
        Ok(match cookie::header(session.as_deref(), remember.as_deref(), now) {
            Some(value) => builder.header(header::COOKIE, value),
            None => builder,
        })
    }

    /// Persist credential directives carried by the response.
    async fn inbound(&self, response: &Response) -> Result<()> {
        let values: Vec<&str> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        if values.is_empty() {
            return Ok(());
        }
        cookie::absorb(&self.vault, &values).await
    }
}
