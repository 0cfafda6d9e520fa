use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::config::{AppConfig, CredentialsConfig};
use crate::error::OpsError;
use crate::transport::{OpsClient, OpsRequest};
use crate::xml::CanonicalValue;

/// Process-wide owner of the active OPS client.
///
/// At most one authenticated client exists at a time. Authentication attempts
/// are serialized; a successful attempt swaps in a new client and releases the
/// previous one once in-flight fetches holding it have finished.
pub struct OpsSession {
    config: AppConfig,
    client: RwLock<Option<Arc<OpsClient>>>,
    auth_gate: Mutex<()>,
}

impl OpsSession {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
            auth_gate: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.client.read().is_some()
    }

    /// The active authenticated client, if any.
    #[must_use]
    pub fn active_client(&self) -> Option<Arc<OpsClient>> {
        self.client.read().clone()
    }

    /// Exchange credentials for a token and install an authenticated client.
    ///
    /// On failure the currently installed client (or its absence) is left as is.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::Auth`] when the token exchange fails, or
    /// [`OpsError::Config`]/[`OpsError::Internal`] when no client can be built.
    pub async fn authenticate(&self, key: &str, secret: &str) -> Result<(), OpsError> {
        if key.trim().is_empty() || secret.trim().is_empty() {
            return Err(OpsError::InvalidParams(
                "consumer key and secret must not be empty".into(),
            ));
        }

        let _gate = self.auth_gate.lock().await;

        let bootstrap = OpsClient::new(&self.config.ops)?;
        let credential = match bootstrap.acquire_token(key, secret).await {
            Ok(credential) => credential,
            Err(err) => {
                tracing::warn!(error = %err, "OPS authentication failed");
                return Err(err);
            }
        };
        let authenticated = bootstrap.with_credential(credential)?;

        let previous = self.client.write().replace(Arc::new(authenticated));
        tracing::info!(
            replaced = previous.is_some(),
            "OPS authentication succeeded, access token configured"
        );
        Ok(())
    }

    /// Authenticate with the consumer key/secret found in the environment.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::Config`] without any network I/O when either variable
    /// is missing or blank; otherwise as [`OpsSession::authenticate`].
    pub async fn authenticate_from_env(&self) -> Result<(), OpsError> {
        let (key, secret) = credentials_from_env(&self.config.credentials)?;
        self.authenticate(&key, &secret).await
    }

    /// Fetch and decode a resource with the active client.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::NotAuthenticated`] before any successful
    /// authentication (no request is sent), or [`OpsError::Request`] when the
    /// fetch fails.
    pub async fn fetch(&self, request: &OpsRequest) -> Result<CanonicalValue, OpsError> {
        let client = self.active_client().ok_or(OpsError::NotAuthenticated)?;
        client.fetch(request).await
    }

    /// Drop the active client. Returns whether one was installed.
    pub fn sign_out(&self) -> bool {
        self.client.write().take().is_some()
    }
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Read the consumer key and secret from the configured environment variables.
///
/// # Errors
///
/// Returns [`OpsError::Config`] naming the variables when either is unset or blank.
pub fn credentials_from_env(config: &CredentialsConfig) -> Result<(String, String), OpsError> {
    match (non_blank_env(&config.key_env), non_blank_env(&config.secret_env)) {
        (Some(key), Some(secret)) => Ok((key, secret)),
        _ => Err(OpsError::Config(format!(
            "environment variables {} and {} must both be set",
            config.key_env, config.secret_env
        ))),
    }
}
