//! Credential manager for the OAuth-secured gateway.
//!
//! Tokens are fetched with a client-credentials request against
//! `{endpoint}/oauth/token` and memoized per
//! (key, secret, namespace, endpoint). The cache-miss path is
//! single-flight: concurrent callers sharing a key trigger at most one
//! fetch, and cached reads take no exclusive lock. Tokens are kept for
//! the process lifetime; a failed fetch leaves the slot empty so a
//! later call retries.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("Token endpoint returned {status}: {reason}")]
    Rejected { status: u16, reason: String },

    #[error("Token response missing access_token field")]
    MissingToken,
}

/// Cache key for one credential set against one token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenKey {
    pub oauth_key: String,
    pub oauth_secret: String,
    pub namespace: Option<String>,
    pub endpoint: String,
}

#[derive(Debug, Clone)]
pub struct TokenCacheEntry {
    pub token: String,
    pub fetched_at: DateTime<Utc>,
}

/// Acquires and caches bearer tokens for the secured gateway.
pub struct TokenManager {
    http: reqwest::Client,
    cache: DashMap<TokenKey, Arc<OnceCell<TokenCacheEntry>>>,
}

impl TokenManager {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            cache: DashMap::new(),
        }
    }

    /// Return the cached token for `key`, fetching it on first use.
    pub async fn get_token(
        &self,
        key: &TokenKey,
        use_ssl: bool,
        timeout: Duration,
    ) -> Result<String, AuthError> {
        let cell = self.cache.entry(key.clone()).or_default().clone();
        let entry = cell
            .get_or_try_init(|| self.fetch(key, use_ssl, timeout))
            .await?;
        Ok(entry.token.clone())
    }

    /// Cached entry for `key`, if a fetch has completed.
    pub fn cached(&self, key: &TokenKey) -> Option<TokenCacheEntry> {
        self.cache.get(key).and_then(|cell| cell.get().cloned())
    }

    async fn fetch(
        &self,
        key: &TokenKey,
        use_ssl: bool,
        timeout: Duration,
    ) -> Result<TokenCacheEntry, AuthError> {
        let scheme = if use_ssl { "https" } else { "http" };
        let url = format!("{}://{}/oauth/token", scheme, key.endpoint);
        debug!("Fetching OAuth token from {}", url);

        let response = self
            .http
            .post(&url)
            .timeout(timeout)
            .basic_auth(&key.oauth_key, Some(&key.oauth_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| {
                warn!("Token fetch against {} failed: {}", url, e);
                AuthError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Token endpoint {} returned {}", url, status);
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AuthError::Unreachable(e.to_string()))?;
        let token = body
            .get("access_token")
            .and_then(serde_json::Value::as_str)
            .ok_or(AuthError::MissingToken)?;

        debug!("Cached OAuth token for endpoint {}", key.endpoint);
        Ok(TokenCacheEntry {
            token: token.to_string(),
            fetched_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(endpoint: &str) -> TokenKey {
        TokenKey {
            oauth_key: "key".into(),
            oauth_secret: "secret".into(),
            namespace: None,
            endpoint: endpoint.into(),
        }
    }

    #[test]
    fn test_cache_keys_distinguish_endpoints() {
        let a = key("localhost:8002");
        let b = key("localhost:9002");
        assert_ne!(a, b);
        assert_eq!(a, key("localhost:8002"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_auth_error() {
        let manager = TokenManager::new(reqwest::Client::new());
        // Nothing listens on a closed port; the failure must come back
        // as an error value, not a panic.
        let err = manager
            .get_token(&key("127.0.0.1:1"), false, Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unreachable(_)));
        assert!(manager.cached(&key("127.0.0.1:1")).is_none());
    }
}
