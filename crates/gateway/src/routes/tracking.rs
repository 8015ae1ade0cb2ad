//! Shipment-tracking endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;

use storedeck_core::OrderId;

use crate::error::AppError;
use crate::middleware::Tenant;
use crate::state::AppState;
use crate::upstream::tracking::{TrackingEntry, TrackingLedger};
use crate::upstream::UpstreamError;

use super::{StoreQuery, resolve_upstream};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/orders/{id}/tracking",
        get(list_tracking).post(add_tracking).delete(remove_tracking),
    )
}

fn not_found_or(e: UpstreamError) -> AppError {
    if matches!(&e, UpstreamError::Status { status: 404, .. }) {
        AppError::NotFound("Order not found".to_string())
    } else {
        AppError::Upstream(e)
    }
}

/// List the tracking entries on an order.
async fn list_tracking(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<Vec<TrackingEntry>>, AppError> {
    let upstream = resolve_upstream(&state, &tenant, query.store_id.as_deref()).await?;
    let entries = TrackingLedger::new(&upstream)
        .list(OrderId::new(id))
        .await
        .map_err(not_found_or)?;
    Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddTrackingBody {
    provider: String,
    tracking_number: String,
    #[serde(default)]
    date_shipped: Option<String>,
    /// Also transition the order to its fulfilled status.
    #[serde(default)]
    mark_completed: bool,
}

/// Append a tracking entry. Write path: failures propagate so a lost
/// entry is never reported as recorded.
async fn add_tracking(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<StoreQuery>,
    Json(body): Json<AddTrackingBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.provider.is_empty() || body.tracking_number.is_empty() {
        return Err(AppError::BadRequest(
            "Missing provider or tracking number".to_string(),
        ));
    }

    let upstream = resolve_upstream(&state, &tenant, query.store_id.as_deref()).await?;

    let date_shipped = body
        .date_shipped
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string());
    let entry = TrackingEntry::new(body.provider, body.tracking_number, date_shipped);
    let entry_id = entry.id.clone();

    TrackingLedger::new(&upstream)
        .append(OrderId::new(id), entry, body.mark_completed)
        .await
        .map_err(not_found_or)?;

    Ok(Json(json!({ "success": true, "id": entry_id })))
}

#[derive(Debug, Deserialize)]
struct RemoveTrackingQuery {
    #[serde(rename = "storeId")]
    store_id: Option<String>,
    #[serde(rename = "trackingId")]
    tracking_id: Option<String>,
}

/// Remove a tracking entry by its id.
async fn remove_tracking(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<RemoveTrackingQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tracking_id = query
        .tracking_id
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing trackingId".to_string()))?;

    let upstream = resolve_upstream(&state, &tenant, query.store_id.as_deref()).await?;

    TrackingLedger::new(&upstream)
        .remove(OrderId::new(id), &tracking_id)
        .await
        .map_err(not_found_or)?;

    Ok(Json(json!({ "success": true })))
}
