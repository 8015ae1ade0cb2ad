//! Catalog endpoints: product categories and shipping carriers.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::error::AppError;
use crate::fallback;
use crate::middleware::Tenant;
use crate::state::AppState;
use crate::upstream::types::Category;

use super::{StoreQuery, resolve_upstream};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(list_categories))
        .route("/api/carriers", get(list_carriers))
}

/// List every product category. Read path: degrades to the fixed sample
/// categories on upstream failure.
async fn list_categories(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<Vec<Category>>, AppError> {
    let upstream = resolve_upstream(&state, &tenant, query.store_id.as_deref()).await?;
    let sourced = fallback::or_fallback(upstream.categories().await, fallback::categories)?;
    Ok(Json(sourced.into_inner()))
}

/// List the carrier names offered by the store's shipping methods. Read
/// path: degrades to an empty list so the tracking form still renders
/// with free-text entry.
async fn list_carriers(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let upstream = resolve_upstream(&state, &tenant, query.store_id.as_deref()).await?;
    let sourced = fallback::or_fallback(upstream.carriers().await, Vec::new)?;
    Ok(Json(sourced.into_inner()))
}
