//! Pagination over upstream collection endpoints.
//!
//! Two contracts: aggregate every page into one list, or fetch a single
//! page together with a total count taken from the `X-WP-Total` response
//! header.

use reqwest::Method;
use serde::de::DeserializeOwned;

use super::{UpstreamClient, UpstreamError};

/// Page size used for full aggregation (the upstream maximum).
pub const AGGREGATE_PER_PAGE: usize = 100;

/// Response header carrying the collection's total item count.
pub const TOTAL_HEADER: &str = "X-WP-Total";

/// One page of items plus the collection total.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total item count from the [`TOTAL_HEADER`] header. Defaults to 0
    /// when the header is absent, in which case it is not authoritative
    /// even if `items` is non-empty.
    pub total: u64,
}

impl UpstreamClient {
    /// Fetch every page of `endpoint` into one list, in upstream order.
    ///
    /// Pages are requested sequentially with `per_page=100`; the loop
    /// terminates on the first page shorter than 100 items. An upstream
    /// that pads its last page to exactly 100 would keep this looping;
    /// the pagination contract is trusted, not defended against.
    ///
    /// # Errors
    ///
    /// Returns the first [`UpstreamError`] encountered; partial results
    /// are discarded.
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<Vec<T>, UpstreamError> {
        let mut items = Vec::new();

        for page in 1u32.. {
            let batch: Vec<T> = self
                .get(
                    endpoint,
                    &[
                        ("per_page", AGGREGATE_PER_PAGE.to_string()),
                        ("page", page.to_string()),
                    ],
                )
                .await?;

            let short = batch.len() < AGGREGATE_PER_PAGE;
            items.extend(batch);
            if short {
                break;
            }
        }

        Ok(items)
    }

    /// Fetch one page of `endpoint` with an optional search term.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the request fails or the body does not
    /// decode as a JSON array of `T`.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        page: u32,
        per_page: u32,
        search: Option<&str>,
    ) -> Result<Page<T>, UpstreamError> {
        let mut query = vec![
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(search) = search.filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }

        let response = self.send(Method::GET, endpoint, &query, None).await?;

        let total = response
            .headers()
            .get(TOTAL_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        let bytes = response.bytes().await?;
        let items: Vec<T> =
            serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Protocol(e.to_string()))?;

        Ok(Page { items, total })
    }
}
