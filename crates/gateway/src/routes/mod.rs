//! HTTP route handlers for the gateway.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Health check
//!
//! # Stores (tenant directory)
//! GET    /api/stores                    - List the tenant's stores
//! POST   /api/stores                    - Register a store
//! PUT    /api/stores/{id}               - Edit a store
//! DELETE /api/stores/{id}               - Remove a store
//!
//! # Profile (tenant directory)
//! GET  /api/profile                     - Tenant profile (empty default)
//! POST /api/profile                     - Upsert profile wholesale
//!
//! # Products (upstream, tenant-scoped via ?storeId=)
//! GET  /api/products                    - All products, or one page with
//!                                         ?page=&per_page=&search=
//! GET  /api/products/{id}               - One product
//! PUT  /api/products/{id}               - Partial patch
//! POST /api/products/{id}/stock         - Stock reconciliation (retried)
//!
//! # Orders (upstream, tenant-scoped via ?storeId=)
//! GET    /api/orders                    - All orders
//! POST   /api/orders                    - Create order
//! GET    /api/orders/{id}               - One order
//! PUT    /api/orders/{id}               - Update order
//! DELETE /api/orders/{id}               - Delete order (permanent)
//! GET    /api/orders/{id}/notes         - Order notes
//! POST   /api/orders/{id}/send-email    - Templated order email (stub)
//!
//! # Tracking ledger (order metadata slot)
//! GET    /api/orders/{id}/tracking      - List tracking entries
//! POST   /api/orders/{id}/tracking      - Append entry (whole-array write)
//! DELETE /api/orders/{id}/tracking      - Remove entry by ?trackingId=
//!
//! # Catalog (upstream, tenant-scoped via ?storeId=)
//! GET  /api/categories                  - Product categories
//! GET  /api/carriers                    - Shipping carrier names
//! ```
//!
//! Every upstream-backed endpoint runs the same pipeline: authenticate
//! tenant, resolve the store credential (owner-scoped), build the
//! upstream client, invoke, normalize, respond.

use axum::Router;
use serde::Deserialize;

use storedeck_core::{Email, StoreId};

use crate::error::AppError;
use crate::state::AppState;
use crate::upstream::UpstreamClient;

pub mod catalog;
pub mod orders;
pub mod products;
pub mod profile;
pub mod stores;
pub mod tracking;

/// Build the gateway router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(stores::router())
        .merge(profile::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(tracking::router())
        .merge(catalog::router())
}

/// Query parameters shared by every upstream-backed endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct StoreQuery {
    #[serde(rename = "storeId")]
    pub store_id: Option<String>,
}

/// Resolve the tenant's store and build an upstream client for it.
///
/// The pipeline prefix every upstream-backed handler shares: a missing
/// `storeId` is a validation error, an unknown or foreign store id is a
/// plain not-found, and only then is the credential merged with the
/// environment defaults and checked for completeness.
pub(crate) async fn resolve_upstream(
    state: &AppState,
    tenant: &Email,
    store_id: Option<&str>,
) -> Result<UpstreamClient, AppError> {
    let store_id = store_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing storeId".to_string()))?;
    let store_id = StoreId::from(store_id);

    let repo = crate::directory::StoreRepository::new(state.directory());
    let record = repo
        .resolve(tenant, &store_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Store not found".to_string()))?;

    let credential = record
        .credential()
        .merged_with(&state.config().upstream_defaults);

    Ok(UpstreamClient::new(&credential, state.http().clone())?)
}
