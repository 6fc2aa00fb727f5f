use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::json;
use tokio::net::TcpListener;
use url::Url;

/// Token the fake array accepts at login
pub const FAKE_API_TOKEN: &str = "T-0123";
/// API version the fake array serves resources under
pub const FAKE_API_VERSION: &str = "1.12";

const SESSION: &str = "session-abc";
const GIB: u64 = 1024 * 1024 * 1024;

/// A fake management API on an ephemeral localhost port.
///
/// Serves one fixed account:
/// * `teamA` owns buckets `b1` (2 GiB) and `b2` (1 GiB)
/// * `teamA/alice` is its only user and holds full-access
/// * the array defines full-access, object-read and object-write
///
/// Listing buckets for the account `broken` answers with a 500. Every other
/// account is empty.
pub struct FakeArrayServer {
    url: Url,
    state: Shared,
}

#[derive(Default)]
struct FakeArrayState {
    /// (verb, member_names, policy_names)
    mutations: Mutex<Vec<(String, String, String)>>,
    filters: Mutex<Vec<String>>,
    logged_out: Mutex<bool>,
}

type Shared = Arc<FakeArrayState>;

impl FakeArrayServer {
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(FakeArrayState::default());
        let versioned = |path: &str| format!("/api/{}/{}", FAKE_API_VERSION, path);
        let app = Router::new()
            .route("/api/login", post(login))
            .route("/api/logout", post(logout))
            .route(&versioned("buckets"), get(buckets))
            .route(&versioned("object-store-users"), get(users))
            .route(&versioned("object-store-access-policies"), get(policies))
            .route(
                &versioned("object-store-access-policies/object-store-users"),
                get(list_members).post(add_member).delete(remove_member),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake array listener");
        let addr = listener.local_addr().expect("fake array address");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("fake array server error: {}", e);
            }
        });

        let url = Url::parse(&format!("http://{}/", addr)).expect("fake array url");
        Self { url, state }
    }

    /// Array root to hand to `ArrayClient::new`
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Policy attach (`add`) and detach (`remove`) calls as
    /// (verb, member_names, policy_names), in order
    pub fn mutations(&self) -> Vec<(String, String, String)> {
        self.state.mutations.lock().clone()
    }

    /// Every `filter` query parameter received, in order
    pub fn filters(&self) -> Vec<String> {
        self.state.filters.lock().clone()
    }

    /// Whether a session was closed through `/api/logout`
    pub fn logged_out(&self) -> bool {
        *self.state.logged_out.lock()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("x-auth-token").and_then(|v| v.to_str().ok()) == Some(SESSION)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "missing session").into_response()
}

async fn login(headers: HeaderMap) -> Response {
    match headers.get("api-token").and_then(|v| v.to_str().ok()) {
        Some(FAKE_API_TOKEN) => (
            StatusCode::OK,
            [("x-auth-token", SESSION)],
            Json(json!({ "username": "pureuser" })),
        )
            .into_response(),
        _ => (StatusCode::UNAUTHORIZED, "invalid api token").into_response(),
    }
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    *state.logged_out.lock() = true;
    StatusCode::OK.into_response()
}

async fn buckets(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let filter = params.get("filter").cloned().unwrap_or_default();
    state.filters.lock().push(filter.clone());

    match filter.as_str() {
        "account.name='teamA'" => Json(json!({
            "items": [
                { "name": "b1", "account": { "name": "teamA" }, "space": { "virtual": 2 * GIB, "total_physical": 10 } },
                { "name": "b2", "account": { "name": "teamA" }, "space": { "virtual": GIB } },
            ],
            "pagination_info": { "continuation_token": null, "total_item_count": 2 }
        }))
        .into_response(),
        "account.name='broken'" => {
            (StatusCode::INTERNAL_SERVER_ERROR, "listing unavailable").into_response()
        }
        _ => Json(json!({ "items": [] })).into_response(),
    }
}

async fn users(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let filter = params.get("filter").cloned().unwrap_or_default();
    state.filters.lock().push(filter.clone());

    if filter == "name='teamA/*'" {
        Json(json!({ "items": [{ "name": "teamA/alice", "created": 0 }] })).into_response()
    } else {
        Json(json!({ "items": [] })).into_response()
    }
}

async fn policies(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "items": [
            { "name": "pure:policy/full-access" },
            { "name": "pure:policy/object-read" },
            { "name": "pure:policy/object-write" },
        ]
    }))
    .into_response()
}

async fn list_members(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let member = params.get("member_names").cloned().unwrap_or_default();
    Json(json!({
        "items": [
            { "member": { "name": member }, "policy": { "name": "pure:policy/full-access" } },
        ]
    }))
    .into_response()
}

fn record(state: &Shared, verb: &str, params: &HashMap<String, String>) {
    state.mutations.lock().push((
        verb.to_string(),
        params.get("member_names").cloned().unwrap_or_default(),
        params.get("policy_names").cloned().unwrap_or_default(),
    ));
}

async fn add_member(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    record(&state, "add", &params);
    Json(json!({ "items": [] })).into_response()
}

async fn remove_member(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    record(&state, "remove", &params);
    StatusCode::OK.into_response()
}
