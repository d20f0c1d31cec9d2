//! OAuth2 client-credentials tokens for gateway-fronted providers.
//!
//! [`TokenCache`] obtains bearer tokens from a token endpoint and caches one
//! token per `(client_id, token_endpoint, scope)`. A cached token is stored
//! with its expiry already pulled forward by a five minute safety margin, so
//! a token is never handed out once `now >= real_expiry - margin`.
//!
//! The compare-and-refresh sequence runs under one async mutex. Concurrent
//! callers that find an absent or stale token therefore wait for a single
//! in-flight refresh instead of each issuing their own POST.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::error::{Result, SwitchboardError};

/// Safety margin subtracted from `expires_in` before caching.
pub const EXPIRY_SAFETY_MARGIN_SECS: i64 = 300;

/// `expires_in` assumed when the token endpoint omits it.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

const DEFAULT_TOKEN_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Client credentials
// ============================================================================

/// OAuth2 client-credentials grant parameters.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    /// Token endpoint URL (e.g. a Cognito `/oauth2/token` URL).
    pub token_endpoint: String,
    /// Optional scope; omitted from the form body when `None`.
    #[serde(default)]
    pub scope: Option<String>,
}

impl ClientCredentials {
    /// Check that the fields needed for a token request are present.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.client_id.trim().is_empty() {
            return Err("client_id is empty".into());
        }
        if self.client_secret.trim().is_empty() {
            return Err("client_secret is empty".into());
        }
        if self.token_endpoint.trim().is_empty() {
            return Err("token_endpoint is empty".into());
        }
        Ok(())
    }

    fn key(&self) -> TokenKey {
        TokenKey {
            client_id: self.client_id.clone(),
            token_endpoint: self.token_endpoint.clone(),
            scope: self.scope.clone(),
        }
    }
}

// The secret never reaches logs through `{:?}`.
impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_endpoint", &self.token_endpoint)
            .field("scope", &self.scope)
            .finish()
    }
}

// ============================================================================
// Cached token
// ============================================================================

/// A bearer token and the instant after which it must not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub value: String,
    /// Already includes the safety margin.
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Build a token from an endpoint's `expires_in`, applying the safety
    /// margin. The margin is clamped to zero for lifetimes of five minutes
    /// or less.
    pub fn from_expires_in(value: String, expires_in: i64, now: DateTime<Utc>) -> Self {
        let lifetime = if expires_in > EXPIRY_SAFETY_MARGIN_SECS {
            expires_in - EXPIRY_SAFETY_MARGIN_SECS
        } else {
            expires_in.max(0)
        };
        Self {
            value,
            expires_at: now + chrono::Duration::seconds(lifetime),
        }
    }

    /// Returns `true` while the token may still be handed out.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    DEFAULT_EXPIRES_IN_SECS
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TokenKey {
    client_id: String,
    token_endpoint: String,
    scope: Option<String>,
}

// ============================================================================
// Token cache
// ============================================================================

/// Clock used for expiry decisions; injectable for tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Process-lifetime cache of client-credentials tokens.
///
/// # Example
///
/// ```rust,ignore
/// let cache = TokenCache::new();
/// let creds = ClientCredentials {
///     client_id: "id".into(),
///     client_secret: "secret".into(),
///     token_endpoint: "https://auth.example.com/oauth2/token".into(),
///     scope: Some("invoke".into()),
/// };
/// let token = cache.get_token(&creds).await?;
/// ```
pub struct TokenCache {
    client: Client,
    tokens: Mutex<HashMap<TokenKey, CachedToken>>,
    clock: Clock,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCache {
    /// Create a cache with the default 10s token request timeout.
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TOKEN_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(client)
    }

    /// Create a cache that uses a custom HTTP client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            tokens: Mutex::new(HashMap::new()),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the clock used for expiry decisions.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Return a valid bearer token for `creds`, refreshing it when absent or
    /// expired.
    ///
    /// # Errors
    /// [`SwitchboardError::Auth`] when the endpoint is unreachable, answers
    /// with a non-2xx status, or returns a body without `access_token`.
    pub async fn get_token(&self, creds: &ClientCredentials) -> Result<String> {
        let key = creds.key();
        let mut tokens = self.tokens.lock().await;

        if let Some(cached) = tokens.get(&key) {
            if cached.is_valid_at((self.clock)()) {
                debug!(client_id = %creds.client_id, "Using cached OAuth2 token");
                return Ok(cached.value.clone());
            }
        }

        info!(
            client_id = %creds.client_id,
            token_endpoint = %creds.token_endpoint,
            "Fetching new OAuth2 token"
        );
        let token = self.fetch(creds).await.inspect_err(|e| {
            error!(client_id = %creds.client_id, error = %e, "OAuth2 token retrieval failed");
        })?;
        let value = token.value.clone();
        tokens.insert(key, token);
        Ok(value)
    }

    async fn fetch(&self, creds: &ClientCredentials) -> Result<CachedToken> {
        let mut form = vec![
            ("grant_type", "client_credentials"),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
        ];
        if let Some(scope) = creds.scope.as_deref() {
            form.push(("scope", scope));
        }

        let response = self
            .client
            .post(&creds.token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| SwitchboardError::Auth(format!("token endpoint unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SwitchboardError::Auth(format!(
                "token endpoint returned {}: {}",
                status,
                crate::utils::string::preview(&body, 200)
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| SwitchboardError::Auth(format!("invalid token response: {}", e)))?;

        Ok(CachedToken::from_expires_in(
            body.access_token,
            body.expires_in,
            (self.clock)(),
        ))
    }
}
