//! HTTP client for the hosted backend.
//!
//! Data calls go to `{base}/rest/v1/{table}` using the PostgREST query dialect,
//! auth calls to `{base}/auth/v1/*`.

mod auth;
mod data;
mod query;

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use tokio::sync::RwLock;

use crate::error::{BackendError, Result};

/// Default connect timeout (seconds)
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default request timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`RestClient`].
#[derive(Debug, Clone)]
pub struct RestClientConfig {
    /// Project URL, e.g. `https://xyzcompany.supabase.co`
    pub base_url: String,
    /// Public (anon) API key sent with every request
    pub anon_key: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl RestClientConfig {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            anon_key: anon_key.into(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Hosted backend client implementing both [`DataClient`](crate::DataClient) and
/// [`AuthClient`](crate::AuthClient).
///
/// A successful password sign-in stores the session's access token, which is then
/// used for data calls until sign-out. Without a token requests go out with the
/// anon key only.
pub struct RestClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl RestClient {
    /// Build a client with the configured timeouts.
    ///
    /// # Errors
    /// `BackendError::InvalidRequest` when the URL or key is empty,
    /// `BackendError::Network` when the TLS backend cannot be initialised.
    pub fn new(config: RestClientConfig) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() || config.anon_key.trim().is_empty() {
            return Err(BackendError::InvalidRequest {
                raw_code: None,
                raw_message: "backend URL and API key are required".to_string(),
            });
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BackendError::Network {
                detail: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url,
            anon_key: config.anon_key,
            access_token: RwLock::new(None),
        })
    }

    /// Replace the access token used for data calls.
    pub async fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().await = token;
    }

    /// Whether a user token is currently held.
    pub async fn has_access_token(&self) -> bool {
        self.access_token.read().await.is_some()
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    /// Request carrying the API key and the current bearer (user token or anon key).
    pub(crate) async fn data_request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self
            .access_token
            .read()
            .await
            .clone()
            .unwrap_or_else(|| self.anon_key.clone());
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {bearer}"))
    }
}
