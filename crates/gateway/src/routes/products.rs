//! Product endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use storedeck_core::ProductId;

use crate::error::AppError;
use crate::fallback;
use crate::middleware::Tenant;
use crate::retry::RetryPolicy;
use crate::state::AppState;
use crate::upstream::types::{Product, ProductSummary};

use super::{StoreQuery, resolve_upstream};

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product).put(update_product))
        .route("/api/products/{id}/stock", post(sync_stock))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(rename = "storeId")]
    store_id: Option<String>,
    page: Option<u32>,
    #[serde(rename = "perPage", alias = "per_page")]
    per_page: Option<u32>,
    search: Option<String>,
}

/// One page of products plus the collection total.
#[derive(Debug, Serialize)]
struct ProductPage {
    items: Vec<ProductSummary>,
    total: u64,
}

/// List products: the full aggregated collection, or one page with a
/// total when `page` is given.
///
/// Read path: upstream failures degrade to the fixed fallback list (with
/// `total` matching its length) instead of surfacing an error.
async fn list_products(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let upstream = resolve_upstream(&state, &tenant, query.store_id.as_deref()).await?;

    if let Some(page) = query.page {
        let per_page = query.per_page.unwrap_or(50);
        let result = upstream
            .fetch_page::<Product>("products", page, per_page, query.search.as_deref())
            .await
            .map(|p| ProductPage {
                items: p.items.into_iter().map(ProductSummary::from).collect(),
                total: p.total,
            });

        let sourced = fallback::or_fallback(result, || {
            let items = fallback::products();
            let total = items.len() as u64;
            ProductPage { items, total }
        })?;
        return Ok(Json(serde_json::to_value(sourced.into_inner()).map_err(
            |e| AppError::Internal(e.to_string()),
        )?));
    }

    let result = upstream
        .fetch_all::<Product>("products")
        .await
        .map(|items| items.into_iter().map(ProductSummary::from).collect::<Vec<_>>());

    let sourced = fallback::or_fallback(result, fallback::products)?;
    Ok(Json(serde_json::to_value(sourced.into_inner()).map_err(
        |e| AppError::Internal(e.to_string()),
    )?))
}

/// Fetch one product.
async fn get_product(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<ProductSummary>, AppError> {
    let upstream = resolve_upstream(&state, &tenant, query.store_id.as_deref()).await?;

    let product = upstream.product(ProductId::new(id)).await.map_err(|e| {
        if matches!(&e, crate::upstream::UpstreamError::Status { status: 404, .. }) {
            AppError::NotFound("Product not found".to_string())
        } else {
            AppError::Upstream(e)
        }
    })?;

    Ok(Json(ProductSummary::from(product)))
}

/// Partially patch a product. Write path: failures propagate.
async fn update_product(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<StoreQuery>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<ProductSummary>, AppError> {
    let upstream = resolve_upstream(&state, &tenant, query.store_id.as_deref()).await?;
    let updated = upstream.update_product(ProductId::new(id), &patch).await?;
    Ok(Json(ProductSummary::from(updated)))
}

#[derive(Debug, Deserialize)]
struct StockBody {
    stock_quantity: i64,
}

/// Reconcile a product's stock under the retry policy. Write path: an
/// exhausted retry budget surfaces as a failure, never masked.
async fn sync_stock(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<StoreQuery>,
    Json(body): Json<StockBody>,
) -> Result<Json<ProductSummary>, AppError> {
    let upstream = resolve_upstream(&state, &tenant, query.store_id.as_deref()).await?;

    let product = RetryPolicy::default()
        .run(|| upstream.set_stock(ProductId::new(id), body.stock_quantity))
        .await?;

    Ok(Json(ProductSummary::from(product)))
}
