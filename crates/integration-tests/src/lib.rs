//! Integration tests for Optic Desk.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p optic-desk-integration-tests
//! ```
//!
//! Each test starts a [`FakeBackend`]: an in-memory axum server on an
//! ephemeral localhost port that speaks the same JSON API as the store
//! backend. Tests drive it through the real [`ApiClient`] and inspect what it
//! received.
//!
//! # Test Categories
//!
//! - `api_client` - Endpoint paths, bodies, lenient responses, error mapping
//! - `customer_resolver` - Debounced search-or-create over HTTP
//! - `checkout` - Composed sale to stored sale, with attached prescription
//! - `prescriptions` - Save and list round trip

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use optic_desk_admin::{ApiClient, ApiConfig};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

type Shared = Arc<BackendState>;
type JsonResult = Result<Json<Value>, StatusCode>;

/// One request as the backend saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Method and path, e.g. `GET /customers`.
    pub route: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Default)]
struct Store {
    next_id: i64,
    customers: Vec<Value>,
    prescriptions: Vec<Value>,
    products: Vec<Value>,
    services: Vec<Value>,
    sales: Vec<Value>,
    payments: Vec<Value>,
    expenses: Vec<Value>,
}

#[derive(Clone, Copy)]
enum Table {
    Customers,
    Products,
    Services,
    Sales,
    Payments,
    Expenses,
}

impl Store {
    /// Store a record under a fresh id.
    fn insert(&mut self, table: Table, mut record: Value) -> i64 {
        self.next_id += 1;
        let id = self.next_id;
        if let Value::Object(map) = &mut record {
            map.insert("id".to_string(), json!(id));
        }
        let rows = match table {
            Table::Customers => &mut self.customers,
            Table::Products => &mut self.products,
            Table::Services => &mut self.services,
            Table::Sales => &mut self.sales,
            Table::Payments => &mut self.payments,
            Table::Expenses => &mut self.expenses,
        };
        rows.push(record);
        id
    }
}

#[derive(Default)]
struct Faults {
    status_for: HashMap<String, StatusCode>,
    search_delay: HashMap<String, Duration>,
    hide_created_customers: bool,
}

#[derive(Default)]
struct BackendState {
    store: Mutex<Store>,
    faults: Mutex<Faults>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl BackendState {
    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory store backend served over HTTP.
pub struct FakeBackend {
    state: Shared,
    addr: SocketAddr,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[allow(clippy::expect_used)]
    pub async fn start() -> Self {
        let state = Shared::default();
        let app = router(Arc::clone(&state));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Failed to read local address");
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake backend stopped");
            }
        });
        Self {
            state,
            addr,
            server,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the local address does not form a valid URL.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(&self.base_url())
            .expect("Fake backend URL is valid")
            .with_timeout(Duration::from_secs(2))
    }

    /// A client pointing at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.api_config()).expect("Failed to build API client")
    }

    /// Answer every request to `route` (e.g. `POST /sales`) with `status`.
    pub fn fail(&self, route: &str, status: StatusCode) {
        self.state.faults().status_for.insert(route.to_string(), status);
    }

    /// Stop failing `route`.
    pub fn recover(&self, route: &str) {
        self.state.faults().status_for.remove(route);
    }

    /// Hold the customer search for `query` for `delay` before answering.
    pub fn delay_search(&self, query: &str, delay: Duration) {
        self.state
            .faults()
            .search_delay
            .insert(query.to_string(), delay);
    }

    /// Acknowledge customer creation without storing the customer.
    pub fn hide_created_customers(&self) {
        self.state.faults().hide_created_customers = true;
    }

    pub fn seed_customer(&self, name: &str, phone: &str) -> i64 {
        let record = json!({ "name": name, "phone": phone, "gender": null, "dob": null, "notes": null });
        self.state.store().insert(Table::Customers, record)
    }

    /// Store a customer row exactly as given, readable or not.
    pub fn seed_customer_record(&self, record: Value) -> i64 {
        self.state.store().insert(Table::Customers, record)
    }

    /// Store a product row exactly as given.
    pub fn seed_product_record(&self, record: Value) -> i64 {
        self.state.store().insert(Table::Products, record)
    }

    pub fn seed_product(&self, name: &str, category: &str, price: f64, sku: Option<&str>) -> i64 {
        let record = json!({ "name": name, "type": category, "price": price, "sku": sku });
        self.state.store().insert(Table::Products, record)
    }

    pub fn seed_service(&self, name: &str, price: f64) -> i64 {
        let record = json!({ "name": name, "price": price, "description": null });
        self.state.store().insert(Table::Services, record)
    }

    #[must_use]
    pub fn customers(&self) -> Vec<Value> {
        self.state.store().customers.clone()
    }

    #[must_use]
    pub fn products(&self) -> Vec<Value> {
        self.state.store().products.clone()
    }

    #[must_use]
    pub fn prescriptions(&self) -> Vec<Value> {
        self.state.store().prescriptions.clone()
    }

    #[must_use]
    pub fn sales(&self) -> Vec<Value> {
        self.state.store().sales.clone()
    }

    #[must_use]
    pub fn payments(&self) -> Vec<Value> {
        self.state.store().payments.clone()
    }

    #[must_use]
    pub fn expenses(&self) -> Vec<Value> {
        self.state.store().expenses.clone()
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests received for one route.
    #[must_use]
    pub fn requests_to(&self, route: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.route == route)
            .collect()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/customers", get(search_customers).post(create_customer))
        .route("/customers/{id}", get(get_customer).put(update_customer))
        .route("/customers/{id}/prescriptions", get(customer_prescriptions))
        .route("/prescriptions", post(create_prescription))
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", delete(delete_product))
        .route("/services", get(list_services).post(create_service))
        .route("/services/{id}", delete(delete_service))
        .route("/sales", get(list_sales).post(create_sale))
        .route("/sales/{id}", get(get_sale))
        .route("/payments", post(create_payment))
        .route("/expenses", post(create_expense))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), record))
        .with_state(state)
}

/// Log the request and apply any configured failure.
async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let route = format!("{} {}", request.method(), request.uri().path());
    let recorded = RecordedRequest {
        route: route.clone(),
        query: request.uri().query().map(str::to_owned),
        content_type: request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    };
    state
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(recorded);

    let fault = state.faults().status_for.get(&route).copied();
    match fault {
        Some(status) => status.into_response(),
        None => next.run(request).await,
    }
}

fn find(records: &[Value], id: i64) -> Option<&Value> {
    records.iter().find(|r| r["id"] == json!(id))
}

fn created(id: i64, message: &str) -> Json<Value> {
    Json(json!({ "id": id, "message": message }))
}

fn text(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_lowercase()
}

// =============================================================================
// Customers
// =============================================================================

async fn search_customers(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let query = params.get("q").cloned().unwrap_or_default();
    let delay = state.faults().search_delay.get(&query).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let needle = query.to_lowercase();
    let matches: Vec<Value> = state
        .store()
        .customers
        .iter()
        .filter(|c| text(&c["name"]).contains(&needle) || text(&c["phone"]).contains(&needle))
        .cloned()
        .collect();
    Json(Value::Array(matches))
}

async fn create_customer(State(state): State<Shared>, Json(body): Json<Value>) -> JsonResult {
    if text(&body["name"]).is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    if state.faults().hide_created_customers {
        return Ok(Json(json!({ "message": "Customer created" })));
    }
    let id = state.store().insert(Table::Customers, body);
    Ok(created(id, "Customer created"))
}

async fn get_customer(State(state): State<Shared>, Path(id): Path<i64>) -> JsonResult {
    find(&state.store().customers, id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_customer(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> JsonResult {
    let mut store = state.store();
    let customer = store
        .customers
        .iter_mut()
        .find(|c| c["id"] == json!(id))
        .ok_or(StatusCode::NOT_FOUND)?;
    if let (Value::Object(current), Value::Object(changes)) = (customer, body) {
        current.extend(changes);
    }
    Ok(Json(json!({ "message": "Customer updated" })))
}

async fn customer_prescriptions(State(state): State<Shared>, Path(id): Path<i64>) -> Json<Value> {
    let records = state
        .store()
        .prescriptions
        .iter()
        .filter(|p| p["customer_id"] == json!(id))
        .cloned()
        .collect();
    Json(Value::Array(records))
}

async fn create_prescription(State(state): State<Shared>, Json(body): Json<Value>) -> JsonResult {
    if body["customer_id"].is_null() {
        return Err(StatusCode::BAD_REQUEST);
    }
    // Prescription ids are chosen by the optician; no server id is assigned.
    state.store().prescriptions.push(body);
    Ok(Json(json!({ "message": "Prescription saved" })))
}

// =============================================================================
// Catalog
// =============================================================================

async fn list_products(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(state.store().products.clone()))
}

async fn create_product(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let id = state.store().insert(Table::Products, body);
    created(id, "Product created")
}

async fn delete_product(State(state): State<Shared>, Path(id): Path<i64>) -> StatusCode {
    let mut store = state.store();
    let before = store.products.len();
    store.products.retain(|p| p["id"] != json!(id));
    if store.products.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn list_services(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(state.store().services.clone()))
}

async fn create_service(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let id = state.store().insert(Table::Services, body);
    created(id, "Service created")
}

async fn delete_service(State(state): State<Shared>, Path(id): Path<i64>) -> StatusCode {
    let mut store = state.store();
    let before = store.services.len();
    store.services.retain(|s| s["id"] != json!(id));
    if store.services.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

// =============================================================================
// Sales and cashbook
// =============================================================================

fn customer_field(store: &Store, sale: &Value, field: &str) -> Value {
    sale["customer_id"]
        .as_i64()
        .and_then(|id| find(&store.customers, id))
        .map_or(Value::Null, |c| c[field].clone())
}

fn sale_summary(store: &Store, sale: &Value) -> Value {
    json!({
        "id": sale["id"],
        "date": sale["date"],
        "customer_name": customer_field(store, sale, "name"),
        "items_count": sale["items"].as_array().map_or(0, Vec::len),
        "discount": sale["discount"],
        "net_amount": sale["net_amount"],
        "status": sale["status"],
    })
}

async fn list_sales(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let store = state.store();
    let wanted = |key: &str| params.get(key).map(String::as_str);
    let rows = store
        .sales
        .iter()
        .filter(|s| wanted("start_date").is_none_or(|d| s["date"].as_str() >= Some(d)))
        .filter(|s| wanted("end_date").is_none_or(|d| s["date"].as_str() <= Some(d)))
        .filter(|s| wanted("status").is_none_or(|st| s["status"].as_str() == Some(st)))
        .map(|s| sale_summary(&store, s))
        .filter(|row| {
            wanted("customer_name")
                .is_none_or(|name| text(&row["customer_name"]).contains(&name.to_lowercase()))
        })
        .collect();
    Json(Value::Array(rows))
}

async fn get_sale(State(state): State<Shared>, Path(id): Path<i64>) -> JsonResult {
    let store = state.store();
    let sale = find(&store.sales, id).ok_or(StatusCode::NOT_FOUND)?;
    let mut detail = sale.clone();
    if let Value::Object(map) = &mut detail {
        map.insert("customer_name".to_string(), customer_field(&store, sale, "name"));
        map.insert("customer_phone".to_string(), customer_field(&store, sale, "phone"));
    }
    Ok(Json(detail))
}

async fn create_sale(State(state): State<Shared>, Json(body): Json<Value>) -> JsonResult {
    let mut store = state.store();
    let known_customer = body["customer_id"]
        .as_i64()
        .is_some_and(|id| find(&store.customers, id).is_some());
    if !known_customer {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let id = store.insert(Table::Sales, body);
    Ok(created(id, "Sale created"))
}

async fn create_payment(State(state): State<Shared>, Json(body): Json<Value>) -> JsonResult {
    let mut store = state.store();
    let sale_id = body["sale_id"].as_i64().ok_or(StatusCode::BAD_REQUEST)?;
    if find(&store.sales, sale_id).is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    let id = store.insert(Table::Payments, body);
    Ok(created(id, "Payment recorded"))
}

async fn create_expense(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let id = state.store().insert(Table::Expenses, body);
    created(id, "Expense recorded")
}
