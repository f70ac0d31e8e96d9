//! Login state machine and the authenticated-user snapshot.

use crate::error::{ErrorKind, Result};
use crate::transport::Transport;
use exn::ResultExt;
use reqwest::{Method, Url};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use yomu_models::User;
use yomu_vault::{VaultHandle, keys};

/// Bounded deadline for the login credential probe.
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(8);
/// The soft-fail user refresh tolerates slower servers than browsing does.
const REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

const IDENTITY_PATH: &str = "/api/v2/users/me";
const LOGOUT_PATH: &str = "/api/logout";

/// Authentication session over the credential pipeline.
///
/// Owns the login/logout state machine and a cached snapshot of the
/// authenticated user. At most one login attempt is in flight at a time;
/// a second concurrent attempt is rejected client-side with
/// [`ErrorKind::LoginPending`].
pub struct Session {
    transport: Transport,
    current_user: RwLock<Option<User>>,
    login_pending: AtomicBool,
    login_timeout: Duration,
}

impl Session {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            current_user: RwLock::new(None),
            login_pending: AtomicBool::new(false),
            login_timeout: LOGIN_TIMEOUT,
        }
    }

    /// Override the login probe deadline.
    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    fn vault(&self) -> &VaultHandle {
        self.transport.vault()
    }

    /// Authenticate against `server` with HTTP basic credentials.
    ///
    /// All three inputs must be non-empty and the server URL must parse;
    /// both are checked before any network I/O. The probe asks the identity
    /// endpoint for the user payload with `remember-me=true`, so a
    /// successful response also delivers the session and remember cookies,
    /// which the pipeline persists on the way in.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::Timeout`] when the probe hits its deadline,
    /// [`ErrorKind::Rejected`] with the status code and server message on a
    /// non-success response, [`ErrorKind::NoResponse`] for any other
    /// transport failure, and [`ErrorKind::LoginPending`] when another
    /// attempt is still in flight.
    pub async fn login(&self, server: &str, email: &str, password: &str) -> Result<User> {
        let server = server.trim().trim_end_matches('/');
        if server.is_empty() {
            exn::bail!(ErrorKind::MissingCredential("server url"));
        }
        if email.trim().is_empty() {
            exn::bail!(ErrorKind::MissingCredential("email"));
        }
        if password.is_empty() {
            exn::bail!(ErrorKind::MissingCredential("password"));
        }
        let url = Url::parse(&format!("{server}{IDENTITY_PATH}"))
            .map_err(|_| ErrorKind::InvalidServerUrl(server.to_string()))?;

        if self.login_pending.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            exn::bail!(ErrorKind::LoginPending);
        }
        let result = self.login_inner(url, server, email, password).await;
        self.login_pending.store(false, Ordering::SeqCst);
        result
    }

    async fn login_inner(&self, url: Url, server: &str, email: &str, password: &str) -> Result<User> {
        let builder = self
            .transport
            .request_absolute(Method::GET, url)
            .query(&[("remember-me", "true")])
            .basic_auth(email, Some(password))
            .timeout(self.login_timeout);
        let response = match self.transport.execute(builder).await {
            Ok(response) => response,
            // Keep the distinct timeout reason; fold everything else
            // transport-shaped into "no response".
            Err(e) if matches!(&*e, ErrorKind::Transport(_)) => {
                return Err(e).or_raise(|| ErrorKind::NoResponse);
            },
            Err(e) => return Err(e),
        };
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            exn::bail!(ErrorKind::Rejected(status, message));
        }
        let user: User = response.json().await.or_raise(|| ErrorKind::Decode)?;

        self.vault().set(keys::SERVER, server).await.or_raise(|| ErrorKind::Vault)?;
        *self.current_user.write().await = Some(user.clone());
        tracing::info!(server, "logged in");
        Ok(user)
    }

    /// Drop the session: best-effort server-side invalidation, then delete
    /// both credential tokens and clear the user snapshot.
    ///
    /// Idempotent — logging out twice, or without ever logging in, is fine.
    pub async fn logout(&self) -> Result<()> {
        if let Ok(Some(_)) = self.transport.base_url().await {
            match self.transport.request(Method::POST, LOGOUT_PATH).await {
                Ok(builder) => {
                    if let Err(e) = self.transport.execute(builder).await {
                        tracing::debug!(error = %e, "server-side logout failed; clearing locally");
                    }
                },
                Err(e) => tracing::debug!(error = %e, "server-side logout skipped"),
            }
        }
        let vault = self.vault();
        vault.delete(keys::SESSION).await.or_raise(|| ErrorKind::Vault)?;
        vault.delete(keys::REMEMBER).await.or_raise(|| ErrorKind::Vault)?;
        *self.current_user.write().await = None;
        tracing::info!("logged out");
        Ok(())
    }

    /// Snapshot cached by the last successful login or refresh.
    pub async fn cached_user(&self) -> Option<User> {
        self.current_user.read().await.clone()
    }

    /// Re-derive the authenticated-user snapshot through the pipeline.
    ///
    /// Soft-fails by design: an expired or missing credential is an expected
    /// steady state, so everything short of a vault failure yields
    /// `Ok(None)` ("logged out") rather than an error. Without a stored
    /// session token no network call is attempted at all.
    pub async fn refresh_user(&self) -> Result<Option<User>> {
        if self.transport.base_url().await?.is_none() {
            *self.current_user.write().await = None;
            return Ok(None);
        }
        let session_token = self.vault().get(keys::SESSION).await.or_raise(|| ErrorKind::Vault)?;
        if session_token.is_none() {
            *self.current_user.write().await = None;
            return Ok(None);
        }
        let user = match self.identity_probe().await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!(error = %e, "identity refresh failed; treating as logged out");
                None
            },
        };
        *self.current_user.write().await = user.clone();
        Ok(user)
    }

    async fn identity_probe(&self) -> Result<User> {
        let builder = self
            .transport
            .request(Method::GET, IDENTITY_PATH)
            .await?
            .query(&[("remember-me", "true")])
            .timeout(REFRESH_TIMEOUT);
        let response = self.transport.execute(builder).await?;
        if !response.status().is_success() {
            exn::bail!(ErrorKind::Rejected(response.status().as_u16(), String::new()));
        }
        response.json().await.or_raise(|| ErrorKind::Decode)
    }
}
