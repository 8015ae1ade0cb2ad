//! Product operations against the upstream.

use serde_json::json;
use storedeck_core::ProductId;

use super::types::Product;
use super::{UpstreamClient, UpstreamError};

impl UpstreamClient {
    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Status`] with a 404 when the product does
    /// not exist.
    pub async fn product(&self, id: ProductId) -> Result<Product, UpstreamError> {
        self.get(&format!("products/{id}"), &[]).await
    }

    /// Partially patch a product. Only the fields present in `patch` are
    /// updated; the body is forwarded as-is since the gateway never
    /// originates product data.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the update is rejected.
    pub async fn update_product(
        &self,
        id: ProductId,
        patch: &serde_json::Value,
    ) -> Result<Product, UpstreamError> {
        self.put(&format!("products/{id}"), patch).await
    }

    /// Reconcile a product's stock quantity.
    ///
    /// This is the one mutating call wrapped in the retry policy by its
    /// caller; the operation itself is a plain idempotent PUT.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the update is rejected.
    pub async fn set_stock(
        &self,
        id: ProductId,
        stock_quantity: i64,
    ) -> Result<Product, UpstreamError> {
        self.put(
            &format!("products/{id}"),
            &json!({ "stock_quantity": stock_quantity }),
        )
        .await
    }
}
