//! Order endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;

use storedeck_core::{OrderId, OrderStatus};

use crate::error::AppError;
use crate::fallback;
use crate::middleware::Tenant;
use crate::state::AppState;
use crate::upstream::UpstreamError;
use crate::upstream::types::{Order, OrderNote, OrderSummary};

use super::{StoreQuery, resolve_upstream};

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list_orders).post(create_order))
        .route(
            "/api/orders/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/api/orders/{id}/notes", get(order_notes))
        .route("/api/orders/{id}/send-email", post(send_order_email))
}

fn not_found_or(e: UpstreamError, what: &str) -> AppError {
    if matches!(&e, UpstreamError::Status { status: 404, .. }) {
        AppError::NotFound(format!("{what} not found"))
    } else {
        AppError::Upstream(e)
    }
}

/// List every order (all pages). Read path: degrades to the fixed
/// fallback orders on upstream failure.
async fn list_orders(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<Vec<OrderSummary>>, AppError> {
    let upstream = resolve_upstream(&state, &tenant, query.store_id.as_deref()).await?;

    let result = upstream
        .fetch_all::<Order>("orders")
        .await
        .map(|orders| orders.into_iter().map(OrderSummary::from).collect::<Vec<_>>());

    let sourced = fallback::or_fallback(result, fallback::orders)?;
    Ok(Json(sourced.into_inner()))
}

#[derive(Debug, Deserialize)]
struct CreateOrderBody {
    #[serde(default)]
    items: Vec<CreateOrderItem>,
    #[serde(default)]
    customer: Option<serde_json::Value>,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateOrderItem {
    product_id: i64,
    quantity: i64,
}

/// Create an order. Write path: failures propagate (a masked create
/// would hand the operator an order id that does not exist).
async fn create_order(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Query(query): Query<StoreQuery>,
    Json(body): Json<CreateOrderBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.items.is_empty() {
        return Err(AppError::BadRequest("Order needs at least one item".to_string()));
    }

    let upstream = resolve_upstream(&state, &tenant, query.store_id.as_deref()).await?;

    let line_items: Vec<serde_json::Value> = body
        .items
        .iter()
        .map(|item| json!({ "product_id": item.product_id, "quantity": item.quantity }))
        .collect();

    let mut payload = json!({
        "status": OrderStatus::Pending.as_upstream(),
        "line_items": line_items,
    });
    if let Some(customer) = body.customer {
        payload["billing"] = customer.clone();
        payload["shipping"] = customer;
    }
    if let Some(note) = body.note {
        payload["customer_note"] = json!(note);
    }

    let order = upstream.create_order(&payload).await?;
    Ok(Json(json!({ "id": order.id })))
}

/// Fetch one order.
async fn get_order(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<OrderSummary>, AppError> {
    let upstream = resolve_upstream(&state, &tenant, query.store_id.as_deref()).await?;
    let order = upstream
        .order(OrderId::new(id))
        .await
        .map_err(|e| not_found_or(e, "Order"))?;
    Ok(Json(OrderSummary::from(order)))
}

/// Update an order (status transitions, address edits). The body is
/// forwarded upstream; a canonical `status` field is validated first so
/// the dashboard cannot write vocabulary the upstream does not know.
async fn update_order(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<StoreQuery>,
    Json(mut body): Json<serde_json::Value>,
) -> Result<Json<OrderSummary>, AppError> {
    if let Some(status) = body.get("status").and_then(|s| s.as_str()) {
        let canonical = OrderStatus::from_upstream(status)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown order status: {status}")))?;
        body["status"] = json!(canonical.as_upstream());
    }

    let upstream = resolve_upstream(&state, &tenant, query.store_id.as_deref()).await?;
    let order = upstream
        .update_order(OrderId::new(id), &body)
        .await
        .map_err(|e| not_found_or(e, "Order"))?;
    Ok(Json(OrderSummary::from(order)))
}

/// Delete an order permanently. Write path: failures propagate.
async fn delete_order(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<StoreQuery>,
) -> Result<StatusCode, AppError> {
    let upstream = resolve_upstream(&state, &tenant, query.store_id.as_deref()).await?;
    upstream
        .delete_order(OrderId::new(id))
        .await
        .map_err(|e| not_found_or(e, "Order"))?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the notes on an order.
async fn order_notes(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<Vec<OrderNote>>, AppError> {
    let upstream = resolve_upstream(&state, &tenant, query.store_id.as_deref()).await?;
    let notes = upstream
        .order_notes(OrderId::new(id))
        .await
        .map_err(|e| not_found_or(e, "Order"))?;
    Ok(Json(notes))
}

#[derive(Debug, Deserialize)]
struct SendEmailBody {
    template: String,
}

/// Send a templated order email.
///
/// Stub: the mail pipeline does not exist yet. Inputs are validated and
/// the store resolved so the endpoint's contract (auth, storeId, 404
/// semantics) is already the real one, then the request is logged and
/// acknowledged.
async fn send_order_email(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<StoreQuery>,
    Json(body): Json<SendEmailBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.template.is_empty() {
        return Err(AppError::BadRequest("Missing template".to_string()));
    }

    let upstream = resolve_upstream(&state, &tenant, query.store_id.as_deref()).await?;
    // Confirm the order exists so the stub has real 404 semantics.
    upstream
        .order(OrderId::new(id))
        .await
        .map_err(|e| not_found_or(e, "Order"))?;

    tracing::info!(order = id, template = %body.template, "order email requested (stub)");
    Ok(Json(json!({ "success": true })))
}
