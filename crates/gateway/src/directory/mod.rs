//! Client for the tenant directory store.
//!
//! The directory is a PostgREST-style relational store holding store
//! credentials and tenant profiles, queried with row filters like
//! `?id=eq.{value}&limit=1`. Every call from the repositories in this
//! module carries an owner equality filter; the directory itself is the
//! only tenant-isolation boundary the gateway has.

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::DirectoryConfig;

pub mod profiles;
pub mod stores;

pub use profiles::{Profile, ProfileRepository};
pub use stores::{NewStore, StoreRecord, StoreRepository, StoreUpdate};

/// Errors from talking to the tenant directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The HTTP request itself failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The directory answered with a non-2xx status.
    #[error("directory returned status {status}")]
    Status { status: u16, body: String },

    /// The response body did not decode.
    #[error("directory response parse error: {0}")]
    Parse(String),
}

/// One row filter in a directory query (`column=eq.value`).
pub(crate) struct Filter<'a> {
    pub column: &'a str,
    pub value: &'a str,
}

impl Filter<'_> {
    fn encode(&self) -> String {
        format!("{}=eq.{}", self.column, urlencoding::encode(self.value))
    }
}

/// Thin REST client for the directory.
#[derive(Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    url: String,
    headers: HeaderMap,
}

impl std::fmt::Debug for DirectoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryClient")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl DirectoryClient {
    /// Build a directory client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Parse`] if the service key contains
    /// bytes that cannot form a header value.
    pub fn new(config: &DirectoryConfig, http: reqwest::Client) -> Result<Self, DirectoryError> {
        let mut key = HeaderValue::from_str(config.service_key.expose_secret())
            .map_err(|e| DirectoryError::Parse(format!("invalid service key: {e}")))?;
        key.set_sensitive(true);
        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {}", config.service_key.expose_secret()))
                .map_err(|e| DirectoryError::Parse(format!("invalid service key: {e}")))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);

        Ok(Self {
            http,
            url: config.url.trim_end_matches('/').to_owned(),
            headers,
        })
    }

    /// Query rows from a table.
    pub(crate) async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[Filter<'_>],
        limit: Option<u32>,
    ) -> Result<Vec<T>, DirectoryError> {
        let response = self
            .send(Method::GET, table, filters, limit, None, &[])
            .await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| DirectoryError::Parse(e.to_string()))
    }

    /// Insert rows, returning the inserted representation.
    pub(crate) async fn insert<T: DeserializeOwned>(
        &self,
        table: &str,
        rows: &serde_json::Value,
        extra_headers: &[(&'static str, &'static str)],
    ) -> Result<Vec<T>, DirectoryError> {
        let mut headers = vec![("Prefer", "return=representation")];
        headers.extend_from_slice(extra_headers);
        let response = self
            .send(Method::POST, table, &[], None, Some(rows), &headers)
            .await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| DirectoryError::Parse(e.to_string()))
    }

    /// Patch rows matched by `filters`.
    pub(crate) async fn update(
        &self,
        table: &str,
        filters: &[Filter<'_>],
        patch: &serde_json::Value,
    ) -> Result<(), DirectoryError> {
        self.send(Method::PATCH, table, filters, None, Some(patch), &[])
            .await
            .map(|_| ())
    }

    /// Delete rows matched by `filters`.
    pub(crate) async fn delete(
        &self,
        table: &str,
        filters: &[Filter<'_>],
    ) -> Result<(), DirectoryError> {
        self.send(Method::DELETE, table, filters, None, None, &[])
            .await
            .map(|_| ())
    }

    async fn send(
        &self,
        method: Method,
        table: &str,
        filters: &[Filter<'_>],
        limit: Option<u32>,
        body: Option<&serde_json::Value>,
        extra_headers: &[(&'static str, &'static str)],
    ) -> Result<reqwest::Response, DirectoryError> {
        let mut query: Vec<String> = filters.iter().map(Filter::encode).collect();
        if let Some(limit) = limit {
            query.push(format!("limit={limit}"));
        }
        let url = if query.is_empty() {
            format!("{}/rest/v1/{table}", self.url)
        } else {
            format!("{}/rest/v1/{table}?{}", self.url, query.join("&"))
        };

        let mut request = self.http.request(method, &url).headers(self.headers.clone());
        for (name, value) in extra_headers {
            request = request.header(*name, *value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), table, "directory request failed");
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_encodes_value() {
        let filter = Filter {
            column: "owner",
            value: "user+tag@example.com",
        };
        assert_eq!(filter.encode(), "owner=eq.user%2Btag%40example.com");
    }
}
