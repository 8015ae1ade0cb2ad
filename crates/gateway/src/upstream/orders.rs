//! Order operations against the upstream.

use reqwest::Method;
use storedeck_core::OrderId;

use super::types::{Order, OrderNote};
use super::{UpstreamClient, UpstreamError};

impl UpstreamClient {
    /// Fetch one order, metadata included.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Status`] with a 404 when the order does
    /// not exist.
    pub async fn order(&self, id: OrderId) -> Result<Order, UpstreamError> {
        self.get(&format!("orders/{id}"), &[]).await
    }

    /// Create an order from a caller-assembled body (line items, customer
    /// address block, note).
    ///
    /// Not idempotent: never retried automatically.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the upstream rejects the order.
    pub async fn create_order(&self, body: &serde_json::Value) -> Result<Order, UpstreamError> {
        self.post("orders", body).await
    }

    /// Update an order (status, addresses, metadata, ...).
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the update is rejected.
    pub async fn update_order(
        &self,
        id: OrderId,
        body: &serde_json::Value,
    ) -> Result<Order, UpstreamError> {
        self.put(&format!("orders/{id}"), body).await
    }

    /// Permanently delete an order (`force=true`; the upstream trash bin
    /// is not used by the dashboard).
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the delete is rejected.
    pub async fn delete_order(&self, id: OrderId) -> Result<Order, UpstreamError> {
        self.request(
            Method::DELETE,
            &format!("orders/{id}"),
            &[("force", "true".to_string())],
            None,
        )
        .await
    }

    /// Fetch the notes attached to an order.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the request fails.
    pub async fn order_notes(&self, id: OrderId) -> Result<Vec<OrderNote>, UpstreamError> {
        self.get(&format!("orders/{id}/notes"), &[]).await
    }
}
