//! Catalog lookups: product categories and shipping carriers.

use super::types::{Category, ShippingMethod};
use super::{UpstreamClient, UpstreamError};

impl UpstreamClient {
    /// Fetch every product category (all pages).
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if any page fails.
    pub async fn categories(&self) -> Result<Vec<Category>, UpstreamError> {
        self.fetch_all("products/categories").await
    }

    /// Fetch the configured shipping methods.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the request fails.
    pub async fn shipping_methods(&self) -> Result<Vec<ShippingMethod>, UpstreamError> {
        self.get("shipping_methods", &[]).await
    }

    /// Carrier display names derived from the shipping methods.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the request fails.
    pub async fn carriers(&self) -> Result<Vec<String>, UpstreamError> {
        let methods = self.shipping_methods().await?;
        Ok(methods.iter().map(ShippingMethod::carrier_name).collect())
    }
}
