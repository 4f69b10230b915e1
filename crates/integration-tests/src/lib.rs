//! Integration-test harness for the TutorHub client.
//!
//! Spins up an in-process mock of the platform API on a random loopback port
//! and hands out [`TutorHub`] clients wired against it over in-memory
//! storage. Tests drive the real request pipeline end to end: bearer
//! injection, envelope decoding, failure classification, and multipart
//! payment submission all cross a real HTTP boundary.
//!
//! # Usage
//!
//! ```rust,ignore
//! let platform = MockPlatform::spawn().await;
//! platform.add_account("Dana", "dana@example.com", "pw", Role::Parent);
//!
//! let (hub, _storage) = platform.client();
//! hub.restore().unwrap();
//! hub.login("dana@example.com", "pw").await.unwrap();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
// Test harness: panics are assertion failures.
#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};
use url::Url;

use tutorhub_client::storage::{KeyValueStore, MemoryStore};
use tutorhub_client::{ClientConfig, TutorHub};
use tutorhub_core::Role;

/// Poll fast so pending-approval scenarios finish in milliseconds.
const TEST_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Short entitlement cache so tests observe server-side status changes.
const TEST_CACHE_TTL: Duration = Duration::from_millis(5);

#[derive(Clone)]
struct Account {
    id: i64,
    name: String,
    email: String,
    password: String,
    role: String,
}

impl Account {
    fn user_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "role": self.role,
        })
    }
}

/// Multipart fields captured by the payment endpoint, exactly as received.
#[derive(Debug, Clone, Default)]
pub struct ReceivedPayment {
    /// The `package_id` form field, raw.
    pub package_id: Option<String>,
    /// Filename of the `payment_slip` part.
    pub file_name: Option<String>,
    /// Content type of the `payment_slip` part.
    pub content_type: Option<String>,
}

struct PlatformState {
    accounts: Vec<Account>,
    next_account_id: i64,
    tokens: HashMap<String, i64>,
    entitlement_status: String,
    entitlement_fetches: u64,
    tokens_revoked: bool,
    logout_fails: bool,
    classes_forbidden: bool,
    received_payment: Option<ReceivedPayment>,
}

impl Default for PlatformState {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            next_account_id: 1,
            tokens: HashMap::new(),
            entitlement_status: "pending".to_owned(),
            entitlement_fetches: 0,
            tokens_revoked: false,
            logout_fails: false,
            classes_forbidden: false,
            received_payment: None,
        }
    }
}

type SharedState = Arc<Mutex<PlatformState>>;

/// An in-process mock of the platform API.
///
/// Cheaply cloneable; all clones control the same server.
#[derive(Clone)]
pub struct MockPlatform {
    state: SharedState,
    base_url: Url,
}

impl MockPlatform {
    /// Bind the mock API to a random loopback port and start serving.
    pub async fn spawn() -> Self {
        let state: SharedState = Arc::default();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = router(Arc::clone(&state));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = Url::parse(&format!("http://{addr}/api/")).unwrap();
        Self { state, base_url }
    }

    /// Base URL of the mock API, with the `/api/` prefix.
    #[must_use]
    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    /// Client configuration pointed at the mock API, with fast polling.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url(), "unused-by-tests")
            .with_poll_interval(TEST_POLL_INTERVAL)
            .with_entitlement_cache_ttl(TEST_CACHE_TTL)
    }

    /// A client over fresh in-memory storage.
    ///
    /// The storage handle is returned so tests can assert on durable state
    /// and simulate restarts via [`Self::client_over`].
    #[must_use]
    pub fn client(&self) -> (TutorHub, Arc<MemoryStore>) {
        let storage = Arc::new(MemoryStore::new());
        let hub = self.client_over(Arc::clone(&storage));
        (hub, storage)
    }

    /// A client over existing storage, simulating an app restart on the same
    /// device.
    #[must_use]
    pub fn client_over(&self, storage: Arc<MemoryStore>) -> TutorHub {
        TutorHub::with_storage(self.config(), storage as Arc<dyn KeyValueStore>)
    }

    /// Register an account that can sign in.
    pub fn add_account(&self, name: &str, email: &str, password: &str, role: Role) {
        let mut state = self.lock();
        let id = state.next_account_id;
        state.next_account_id += 1;
        state.accounts.push(Account {
            id,
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
            role: role.to_string(),
        });
    }

    /// Set the status the entitlement endpoint reports.
    pub fn set_entitlement_status(&self, status: &str) {
        self.lock().entitlement_status = status.to_owned();
    }

    /// Number of times the entitlement endpoint has been hit.
    #[must_use]
    pub fn entitlement_fetches(&self) -> u64 {
        self.lock().entitlement_fetches
    }

    /// Make every issued token invalid, so authenticated endpoints 401.
    pub fn revoke_tokens(&self) {
        self.lock().tokens_revoked = true;
    }

    /// Make the logout endpoint fail with a server error.
    pub fn fail_logout(&self) {
        self.lock().logout_fails = true;
    }

    /// Make the classes endpoint respond 403 with the subscription marker.
    pub fn forbid_classes(&self) {
        self.lock().classes_forbidden = true;
    }

    /// The last payment submission received, if any.
    #[must_use]
    pub fn received_payment(&self) -> Option<ReceivedPayment> {
        self.lock().received_payment.clone()
    }

    fn lock(&self) -> MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/subscriptions/my-subscription", get(my_subscription))
        .route("/api/subscriptions/packages", get(packages))
        .route("/api/subscriptions/payments", post(submit_payment))
        .route("/api/classes", get(classes))
        .with_state(state)
}

fn lock(state: &SharedState) -> MutexGuard<'_, PlatformState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(ToOwned::to_owned)
}

fn authorized_account(state: &PlatformState, headers: &HeaderMap) -> Option<Account> {
    if state.tokens_revoked {
        return None;
    }
    let token = bearer(headers)?;
    let account_id = state.tokens.get(&token)?;
    state.accounts.iter().find(|a| a.id == *account_id).cloned()
}

fn ok(data: Value) -> Response {
    (StatusCode::OK, Json(json!({ "success": true, "data": data }))).into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "message": "Unauthenticated" })),
    )
        .into_response()
}

async fn login(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let mut state = lock(&state);
    let Some(account) = state
        .accounts
        .iter()
        .find(|a| a.email == email && a.password == password)
        .cloned()
    else {
        return unauthorized();
    };

    let token = uuid::Uuid::new_v4().to_string();
    state.tokens.insert(token.clone(), account.id);

    ok(json!({ "token": token, "user": account.user_json() }))
}

async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut state = lock(&state);
    if state.logout_fails {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": "Internal server error" })),
        )
            .into_response();
    }
    if let Some(token) = bearer(&headers) {
        state.tokens.remove(&token);
    }
    ok(json!({}))
}

async fn my_subscription(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut state = lock(&state);
    if authorized_account(&state, &headers).is_none() {
        return unauthorized();
    }
    state.entitlement_fetches += 1;

    ok(json!({
        "status": state.entitlement_status,
        "student_count": 0,
    }))
}

async fn packages(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if authorized_account(&lock(&state), &headers).is_none() {
        return unauthorized();
    }
    ok(json!([
        {
            "id": 1,
            "name": "Starter",
            "price": 29.0,
            "student_limit": 1,
            "allows_one_on_one": false,
            "active": true,
        },
        {
            "id": 2,
            "name": "Family",
            "price": 49.0,
            "student_limit": 3,
            "allows_one_on_one": true,
            "active": true,
        },
        {
            "id": 3,
            "name": "Legacy",
            "price": 19.0,
            "student_limit": 1,
            "allows_one_on_one": false,
            "active": false,
        },
    ]))
}

async fn submit_payment(
    State(state): State<SharedState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if authorized_account(&lock(&state), &headers).is_none() {
        return unauthorized();
    }

    let mut received = ReceivedPayment::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(ToOwned::to_owned);
        match name.as_deref() {
            Some("package_id") => received.package_id = field.text().await.ok(),
            Some("payment_slip") => {
                received.file_name = field.file_name().map(ToOwned::to_owned);
                received.content_type = field.content_type().map(ToOwned::to_owned);
                let _ = field.bytes().await;
            }
            _ => {}
        }
    }

    let package_id: i64 = received
        .package_id
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    lock(&state).received_payment = Some(received);

    ok(json!({
        "id": 11,
        "package_id": package_id,
        "amount": 49.0,
        "status": "pending",
        "created_at": "2026-08-01T10:00:00Z",
    }))
}

/// A subscription-gated resource. Used to exercise the gateway's 403
/// classification against the real wire format.
async fn classes(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    if authorized_account(&state, &headers).is_none() {
        return unauthorized();
    }
    if state.classes_forbidden {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "success": false,
                "message": "An active subscription is required",
                "redirect_to": "/subscription/packages",
            })),
        )
            .into_response();
    }
    ok(json!([]))
}
