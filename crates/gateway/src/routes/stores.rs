//! Store-credential management endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};

use storedeck_core::StoreId;

use crate::directory::{NewStore, StoreRecord, StoreRepository, StoreUpdate};
use crate::error::AppError;
use crate::middleware::Tenant;
use crate::state::AppState;

/// Build the stores router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stores", get(list_stores).post(create_store))
        .route("/api/stores/{id}", put(update_store).delete(delete_store))
}

/// List every store the tenant owns. Credentials are returned to their
/// owner; this is the tenant's own data.
async fn list_stores(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
) -> Result<Json<Vec<StoreRecord>>, AppError> {
    let stores = StoreRepository::new(state.directory()).list(&tenant).await?;
    Ok(Json(stores))
}

/// Register a store for the tenant.
async fn create_store(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Json(body): Json<NewStore>,
) -> Result<Json<StoreRecord>, AppError> {
    let created = StoreRepository::new(state.directory())
        .create(&tenant, &body)
        .await?;
    Ok(Json(created))
}

/// Edit a store. The owner filter makes a foreign id a no-op.
async fn update_store(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StoreUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    StoreRepository::new(state.directory())
        .update(&tenant, &StoreId::from(id), &body)
        .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Remove a store. Hard delete, no referential check against in-flight
/// requests.
async fn delete_store(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    StoreRepository::new(state.directory())
        .delete(&tenant, &StoreId::from(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
