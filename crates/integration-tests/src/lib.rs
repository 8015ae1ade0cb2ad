//! Integration test harness for the Storedeck gateway.
//!
//! Everything runs in-process: the gateway router and two mock services
//! (the tenant directory and an upstream commerce platform) are spawned
//! on ephemeral loopback ports, so the tests exercise real HTTP without
//! any external dependencies.
//!
//! # Test Categories
//!
//! - `gateway_tenancy` - Session tokens and tenant isolation
//! - `gateway_products` - Pagination, degraded reads, credential checks
//! - `gateway_tracking` - Tracking ledger write-backs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
};
use secrecy::SecretString;
use serde_json::{Value, json};

use storedeck_core::Email;
use storedeck_gateway::config::{DirectoryConfig, GatewayConfig, UpstreamDefaults};
use storedeck_gateway::middleware::mint_token;
use storedeck_gateway::routes;
use storedeck_gateway::state::AppState;

/// Serve `app` on an ephemeral loopback port, returning its base URL.
pub async fn spawn_app(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server error");
    });
    format!("http://{addr}")
}

/// Parse `key=value` pairs out of a raw query string.
fn query_pairs(query: Option<&str>) -> Vec<(String, String)> {
    query
        .unwrap_or_default()
        .split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let value = urlencoding::decode(value).ok()?;
            Some((key.to_string(), value.into_owned()))
        })
        .collect()
}

fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    query_pairs(query)
        .into_iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}

// ============================================================================
// Mock tenant directory (PostgREST-style)
// ============================================================================

#[derive(Default)]
struct DirectoryState {
    stores: Vec<Value>,
    profiles: Vec<Value>,
}

/// In-memory stand-in for the tenant directory REST store.
#[derive(Clone)]
pub struct MockDirectory {
    state: Arc<Mutex<DirectoryState>>,
    url: String,
}

impl MockDirectory {
    pub async fn spawn() -> Self {
        let state = Arc::new(Mutex::new(DirectoryState::default()));
        let app = Router::new()
            .route(
                "/rest/v1/stores",
                get(list_stores)
                    .post(insert_store)
                    .patch(patch_stores)
                    .delete(delete_stores),
            )
            .route("/rest/v1/profiles", get(list_profiles).post(insert_profile))
            .with_state(Arc::clone(&state));
        let url = spawn_app(app).await;
        Self { state, url }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Seed a store credential row.
    pub fn add_store(&self, id: &str, owner: &str, upstream_url: &str) {
        self.add_store_row(json!({
            "id": id,
            "owner": owner,
            "name": format!("Store {id}"),
            "base_url": upstream_url,
            "api_key": "ck_test",
            "api_secret": "cs_test",
        }));
    }

    /// Seed an arbitrary store row (for incomplete-credential cases).
    pub fn add_store_row(&self, row: Value) {
        self.state
            .lock()
            .expect("directory state poisoned")
            .stores
            .push(row);
    }

    #[must_use]
    pub fn store_count(&self) -> usize {
        self.state
            .lock()
            .expect("directory state poisoned")
            .stores
            .len()
    }
}

/// Apply `column=eq.value` filters and `limit` to a row set.
fn apply_filters(rows: &[Value], query: Option<&str>) -> Vec<Value> {
    let pairs = query_pairs(query);
    let mut out: Vec<Value> = rows
        .iter()
        .filter(|row| {
            pairs.iter().all(|(key, value)| {
                if key == "limit" {
                    return true;
                }
                let Some(expected) = value.strip_prefix("eq.") else {
                    return true;
                };
                row.get(key).and_then(Value::as_str) == Some(expected)
            })
        })
        .cloned()
        .collect();
    if let Some(limit) = query_param(query, "limit").and_then(|l| l.parse::<usize>().ok()) {
        out.truncate(limit);
    }
    out
}

async fn list_stores(
    State(state): State<Arc<Mutex<DirectoryState>>>,
    RawQuery(query): RawQuery,
) -> Json<Vec<Value>> {
    let state = state.lock().expect("directory state poisoned");
    Json(apply_filters(&state.stores, query.as_deref()))
}

async fn insert_store(
    State(state): State<Arc<Mutex<DirectoryState>>>,
    Json(body): Json<Value>,
) -> Json<Vec<Value>> {
    let rows = match body {
        Value::Array(rows) => rows,
        row => vec![row],
    };
    let mut state = state.lock().expect("directory state poisoned");
    let mut inserted = Vec::new();
    for mut row in rows {
        if row.get("id").is_none() {
            row["id"] = json!(uuid::Uuid::new_v4().to_string());
        }
        state.stores.push(row.clone());
        inserted.push(row);
    }
    Json(inserted)
}

async fn patch_stores(
    State(state): State<Arc<Mutex<DirectoryState>>>,
    RawQuery(query): RawQuery,
    Json(patch): Json<Value>,
) -> StatusCode {
    let mut state = state.lock().expect("directory state poisoned");
    let matched: Vec<Value> = apply_filters(&state.stores, query.as_deref());
    for row in &mut state.stores {
        if matched.iter().any(|m| m.get("id") == row.get("id"))
            && let Some(fields) = patch.as_object()
        {
            for (key, value) in fields {
                row[key] = value.clone();
            }
        }
    }
    StatusCode::NO_CONTENT
}

async fn delete_stores(
    State(state): State<Arc<Mutex<DirectoryState>>>,
    RawQuery(query): RawQuery,
) -> StatusCode {
    let mut state = state.lock().expect("directory state poisoned");
    let matched: Vec<Value> = apply_filters(&state.stores, query.as_deref());
    state
        .stores
        .retain(|row| !matched.iter().any(|m| m.get("id") == row.get("id")));
    StatusCode::NO_CONTENT
}

async fn list_profiles(
    State(state): State<Arc<Mutex<DirectoryState>>>,
    RawQuery(query): RawQuery,
) -> Json<Vec<Value>> {
    let state = state.lock().expect("directory state poisoned");
    Json(apply_filters(&state.profiles, query.as_deref()))
}

async fn insert_profile(
    State(state): State<Arc<Mutex<DirectoryState>>>,
    Json(body): Json<Value>,
) -> Json<Vec<Value>> {
    let rows = match body {
        Value::Array(rows) => rows,
        row => vec![row],
    };
    let mut state = state.lock().expect("directory state poisoned");
    for row in &rows {
        // Upsert semantics: replace an existing row for the same owner.
        state.profiles.retain(|p| p.get("owner") != row.get("owner"));
        state.profiles.push(row.clone());
    }
    Json(rows)
}

// ============================================================================
// Mock upstream commerce platform
// ============================================================================

#[derive(Default)]
pub struct UpstreamState {
    pub products: Vec<Value>,
    pub orders: HashMap<i64, Value>,
    pub categories: Vec<Value>,
    /// When set, every read answers 500.
    pub fail_reads: bool,
    /// When set, collection responses omit the total-count header.
    pub omit_total_header: bool,
    /// Raw query strings seen by `GET /products`.
    pub product_queries: Vec<String>,
    /// Bodies seen by `PUT /orders/{id}`.
    pub order_updates: Vec<(i64, Value)>,
}

/// In-memory stand-in for a store's commerce platform REST API.
#[derive(Clone)]
pub struct MockUpstream {
    state: Arc<Mutex<UpstreamState>>,
    url: String,
}

impl MockUpstream {
    pub async fn spawn() -> Self {
        let state = Arc::new(Mutex::new(UpstreamState::default()));
        let app = Router::new()
            .route("/wp-json/wc/v3/products", get(upstream_products))
            .route("/wp-json/wc/v3/products/categories", get(upstream_categories))
            .route(
                "/wp-json/wc/v3/orders/{id}",
                get(upstream_get_order).put(upstream_put_order),
            )
            .with_state(Arc::clone(&state));
        let url = spawn_app(app).await;
        Self { state, url }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Seed `count` minimal products with ids `1..=count`.
    pub fn seed_products(&self, count: i64) {
        let mut state = self.state.lock().expect("upstream state poisoned");
        state.products = (1..=count)
            .map(|id| {
                json!({
                    "id": id,
                    "name": format!("Product {id}"),
                    "stock_quantity": id * 2,
                    "price": "10.00",
                    "sku": format!("SKU-{id}"),
                })
            })
            .collect();
    }

    /// Seed an order row.
    pub fn seed_order(&self, order: Value) {
        let id = order
            .get("id")
            .and_then(Value::as_i64)
            .expect("seeded order needs an id");
        self.state
            .lock()
            .expect("upstream state poisoned")
            .orders
            .insert(id, order);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().expect("upstream state poisoned").fail_reads = fail;
    }

    pub fn set_omit_total_header(&self, omit: bool) {
        self.state
            .lock()
            .expect("upstream state poisoned")
            .omit_total_header = omit;
    }

    #[must_use]
    pub fn product_queries(&self) -> Vec<String> {
        self.state
            .lock()
            .expect("upstream state poisoned")
            .product_queries
            .clone()
    }

    #[must_use]
    pub fn order_updates(&self) -> Vec<(i64, Value)> {
        self.state
            .lock()
            .expect("upstream state poisoned")
            .order_updates
            .clone()
    }
}

/// The upstream rejects unauthenticated calls; the gateway always sends
/// Basic auth, so a missing header means a broken client.
fn check_basic_auth(headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    let ok = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));
    if ok {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "code": "woocommerce_rest_cannot_view" })),
        ))
    }
}

async fn upstream_products(
    State(state): State<Arc<Mutex<UpstreamState>>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(denied) = check_basic_auth(&headers) {
        return denied.into_response();
    }

    let mut state = state.lock().expect("upstream state poisoned");
    state.product_queries.push(query.clone().unwrap_or_default());

    if state.fail_reads {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "code": "internal_server_error" })),
        )
            .into_response();
    }

    let page = query_param(query.as_deref(), "page")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(1);
    let per_page = query_param(query.as_deref(), "per_page")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(10);

    let total = state.products.len();
    let items: Vec<Value> = state
        .products
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();

    if state.omit_total_header {
        return Json(items).into_response();
    }
    ([("X-WP-Total", total.to_string())], Json(items)).into_response()
}

async fn upstream_categories(
    State(state): State<Arc<Mutex<UpstreamState>>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(denied) = check_basic_auth(&headers) {
        return denied.into_response();
    }
    let state = state.lock().expect("upstream state poisoned");
    if state.fail_reads {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "code": "internal_server_error" })),
        )
            .into_response();
    }
    (
        [("X-WP-Total", state.categories.len().to_string())],
        Json(state.categories.clone()),
    )
        .into_response()
}

async fn upstream_get_order(
    State(state): State<Arc<Mutex<UpstreamState>>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(denied) = check_basic_auth(&headers) {
        return denied.into_response();
    }
    let state = state.lock().expect("upstream state poisoned");
    match state.orders.get(&id) {
        Some(order) => Json(order.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "code": "woocommerce_rest_shop_order_invalid_id" })),
        )
            .into_response(),
    }
}

/// Apply an order update the way the platform does: `status` replaces,
/// `meta_data` entries replace matching keys or append.
async fn upstream_put_order(
    State(state): State<Arc<Mutex<UpstreamState>>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if let Err(denied) = check_basic_auth(&headers) {
        return denied.into_response();
    }
    let mut state = state.lock().expect("upstream state poisoned");
    state.order_updates.push((id, body.clone()));

    let Some(order) = state.orders.get_mut(&id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "code": "woocommerce_rest_shop_order_invalid_id" })),
        )
            .into_response();
    };

    if let Some(status) = body.get("status") {
        order["status"] = status.clone();
    }
    if let Some(entries) = body.get("meta_data").and_then(Value::as_array) {
        for entry in entries {
            let key = entry.get("key").cloned().unwrap_or_default();
            let existing = order
                .get_mut("meta_data")
                .and_then(Value::as_array_mut)
                .and_then(|list| list.iter_mut().find(|m| m.get("key") == Some(&key)));
            match existing {
                Some(slot) => slot["value"] = entry.get("value").cloned().unwrap_or_default(),
                None => {
                    if order.get("meta_data").is_none() {
                        order["meta_data"] = json!([]);
                    }
                    if let Some(list) = order.get_mut("meta_data").and_then(Value::as_array_mut) {
                        list.push(entry.clone());
                    }
                }
            }
        }
    }

    Json(order.clone()).into_response()
}

// ============================================================================
// Gateway under test
// ============================================================================

/// A gateway instance wired to mock services.
pub struct TestContext {
    pub gateway_url: String,
    pub client: reqwest::Client,
    pub directory: MockDirectory,
    pub upstream: MockUpstream,
    session_secret: SecretString,
}

impl TestContext {
    /// Spawn the directory mock, the upstream mock, and the gateway.
    pub async fn spawn() -> Self {
        let directory = MockDirectory::spawn().await;
        let upstream = MockUpstream::spawn().await;

        let session_secret = SecretString::from("it-7c1f9a2e4b8d3650-session-secret");
        let config = GatewayConfig {
            host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
            port: 0,
            session_secret: session_secret.clone(),
            directory: DirectoryConfig {
                url: directory.url().to_string(),
                service_key: SecretString::from("it-service-key"),
            },
            upstream_defaults: UpstreamDefaults::default(),
            sentry_dsn: None,
            sentry_environment: None,
        };

        let state = AppState::new(config).expect("Failed to build gateway state");
        let app = routes::routes().with_state(state);
        let gateway_url = spawn_app(app).await;

        Self {
            gateway_url,
            client: reqwest::Client::new(),
            directory,
            upstream,
            session_secret,
        }
    }

    /// Mint a session token for a tenant, valid for an hour.
    #[must_use]
    pub fn token_for(&self, tenant: &str) -> String {
        let tenant = Email::parse(tenant).expect("invalid test tenant email");
        mint_token(
            &tenant,
            chrono::Utc::now() + chrono::Duration::hours(1),
            &self.session_secret,
        )
    }

    /// Seed a store for `owner` pointing at the mock upstream.
    pub fn add_store(&self, id: &str, owner: &str) {
        self.directory.add_store(id, owner, self.upstream.url());
    }

    /// GET a gateway path with a bearer token.
    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.gateway_url))
            .bearer_auth(token)
            .send()
            .await
            .expect("gateway request failed")
    }

    /// POST a JSON body to a gateway path with a bearer token.
    pub async fn post(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.gateway_url))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("gateway request failed")
    }

    /// DELETE a gateway path with a bearer token.
    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{path}", self.gateway_url))
            .bearer_auth(token)
            .send()
            .await
            .expect("gateway request failed")
    }
}
