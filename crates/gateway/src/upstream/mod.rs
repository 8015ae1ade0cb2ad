//! REST client for the upstream commerce platform.
//!
//! The upstream is the system of record for products, orders, categories,
//! and shipping methods. Every call authenticates with Basic auth built
//! from a per-store consumer key/secret pair and hits versioned JSON
//! endpoints under `wp-json/wc/v3`.
//!
//! This layer performs no retries; order creation is not idempotent, so
//! retrying is the caller's decision (see [`crate::retry`]).

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Method;
use reqwest::header::HeaderValue;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::UpstreamDefaults;

pub mod catalog;
pub mod orders;
pub mod pagination;
pub mod products;
pub mod tracking;
pub mod types;

/// Versioned API root appended to every store's base URL.
const API_ROOT: &str = "wp-json/wc/v3";

/// Errors from talking to the upstream commerce platform.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The store credential is missing a required field. Surfaced to the
    /// client as a configuration problem, never as an upstream outage.
    #[error("store credential is not configured: missing {0}")]
    Config(&'static str),

    /// The HTTP request itself failed (connect, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream answered with a non-2xx status.
    #[error("upstream returned status {status}")]
    Status { status: u16, body: String },

    /// The response body was not the JSON shape we expected.
    #[error("upstream protocol error: {0}")]
    Protocol(String),
}

impl UpstreamError {
    /// Whether this error is a credential-configuration problem rather
    /// than an upstream outage.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// A fully resolved store credential, possibly assembled from a directory
/// row merged over environment defaults.
#[derive(Clone, Default)]
pub struct StoreCredential {
    /// Upstream base URL, e.g. `https://shop.example.com`
    pub base_url: String,
    /// Consumer key
    pub api_key: String,
    /// Consumer secret
    pub api_secret: String,
}

impl std::fmt::Debug for StoreCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCredential")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl StoreCredential {
    /// Merge this credential over environment defaults: an explicit
    /// non-empty field wins, otherwise the default fills in, otherwise the
    /// field stays empty and [`UpstreamClient::new`] rejects it.
    #[must_use]
    pub fn merged_with(self, defaults: &UpstreamDefaults) -> Self {
        fn pick(explicit: String, default: Option<&String>) -> String {
            if explicit.trim().is_empty() {
                default.cloned().unwrap_or_default()
            } else {
                explicit
            }
        }

        Self {
            base_url: pick(self.base_url, defaults.base_url.as_ref()),
            api_key: pick(self.api_key, defaults.api_key.as_ref()),
            api_secret: pick(self.api_secret, defaults.api_secret.as_ref()),
        }
    }
}

/// Stateless REST client bound to one store's credential.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    auth: HeaderValue,
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("base_url", &self.base_url)
            .field("auth", &"[REDACTED]")
            .finish()
    }
}

impl UpstreamClient {
    /// Build a client for one store.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Config`] when any credential field is
    /// blank; a partially configured store must fail fast, distinct from
    /// a network or upstream error.
    pub fn new(credential: &StoreCredential, http: reqwest::Client) -> Result<Self, UpstreamError> {
        if credential.base_url.trim().is_empty() {
            return Err(UpstreamError::Config("base URL"));
        }
        if credential.api_key.trim().is_empty() {
            return Err(UpstreamError::Config("API key"));
        }
        if credential.api_secret.trim().is_empty() {
            return Err(UpstreamError::Config("API secret"));
        }

        let token = BASE64.encode(format!("{}:{}", credential.api_key, credential.api_secret));
        let mut auth = HeaderValue::from_str(&format!("Basic {token}"))
            .map_err(|e| UpstreamError::Protocol(format!("invalid credential bytes: {e}")))?;
        auth.set_sensitive(true);

        Ok(Self {
            http,
            base_url: credential.base_url.trim_end_matches('/').to_owned(),
            auth,
        })
    }

    /// Issue a request and return the raw response after the status check.
    ///
    /// Pagination needs response headers, so the typed wrappers below are
    /// built on top of this.
    pub(crate) async fn send(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, UpstreamError> {
        let url = format!("{}/{API_ROOT}/{endpoint}", self.base_url);

        let mut request = self
            .http
            .request(method, &url)
            .header(reqwest::header::AUTHORIZATION, self.auth.clone())
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %url, "upstream request failed");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// Issue a request and decode the JSON response body.
    pub(crate) async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<T, UpstreamError> {
        let response = self.send(method, endpoint, query, body).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Protocol(e.to_string()))
    }

    /// GET a typed resource.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        self.request(Method::GET, endpoint, query, None).await
    }

    /// POST a JSON body, decoding the typed response.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<T, UpstreamError> {
        self.request(Method::POST, endpoint, &[], Some(body)).await
    }

    /// PUT a JSON body, decoding the typed response.
    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<T, UpstreamError> {
        self.request(Method::PUT, endpoint, &[], Some(body)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn full_credential() -> StoreCredential {
        StoreCredential {
            base_url: "https://shop.example.com".to_string(),
            api_key: "ck_123".to_string(),
            api_secret: "cs_456".to_string(),
        }
    }

    #[test]
    fn test_new_rejects_blank_fields() {
        let http = reqwest::Client::new();

        let mut cred = full_credential();
        cred.api_secret = String::new();
        let err = UpstreamClient::new(&cred, http.clone()).unwrap_err();
        assert!(matches!(err, UpstreamError::Config("API secret")));

        let mut cred = full_credential();
        cred.base_url = "   ".to_string();
        let err = UpstreamClient::new(&cred, http).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let mut cred = full_credential();
        cred.base_url = "https://shop.example.com/".to_string();
        let client = UpstreamClient::new(&cred, reqwest::Client::new()).unwrap();
        assert_eq!(client.base_url, "https://shop.example.com");
    }

    #[test]
    fn test_merge_explicit_wins() {
        let defaults = UpstreamDefaults {
            base_url: Some("https://default.example.com".to_string()),
            api_key: Some("ck_default".to_string()),
            api_secret: Some("cs_default".to_string()),
        };

        let merged = StoreCredential {
            base_url: "https://explicit.example.com".to_string(),
            api_key: String::new(),
            api_secret: "cs_explicit".to_string(),
        }
        .merged_with(&defaults);

        assert_eq!(merged.base_url, "https://explicit.example.com");
        assert_eq!(merged.api_key, "ck_default");
        assert_eq!(merged.api_secret, "cs_explicit");
    }

    #[test]
    fn test_merge_without_defaults_leaves_blank() {
        let merged = StoreCredential::default().merged_with(&UpstreamDefaults::default());
        assert!(merged.base_url.is_empty());
        assert!(UpstreamClient::new(&merged, reqwest::Client::new()).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", full_credential());
        assert!(!debug.contains("cs_456"));
        assert!(debug.contains("[REDACTED]"));
    }
}
