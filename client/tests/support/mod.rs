//! Shared stub API for integration tests.
//!
//! `StubApi` plays the SkillSwap server: it honours a session flag, answers
//! refreshes and records every request it sees.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mockable::DefaultClock;
use serde_json::{Value, json};
use skillswap_client::api::{ApiClient, endpoints};
use skillswap_client::domain::ports::{
    ApiRequest, ApiResponse, HttpTransport, Method, TransportError,
};
use skillswap_client::domain::{DEFAULT_TOAST_TTL, LoginCredentials, Toasts};
use skillswap_client::stores::AuthStore;

/// One request as the stub saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub method: Method,
    pub path: String,
    pub retried: bool,
}

/// In-memory SkillSwap server.
pub struct StubApi {
    session_valid: AtomicBool,
    refresh_succeeds: AtomicBool,
    hold_refresh_until: AtomicUsize,
    unauthorized: AtomicUsize,
    seen: Mutex<Vec<Seen>>,
    notifications: Mutex<Vec<Value>>,
}

impl StubApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            session_valid: AtomicBool::new(false),
            refresh_succeeds: AtomicBool::new(true),
            hold_refresh_until: AtomicUsize::new(0),
            unauthorized: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
        })
    }

    /// Expire the access token; the next authenticated call gets `401`.
    pub fn expire_access_token(&self) {
        self.session_valid.store(false, Ordering::SeqCst);
    }

    /// Make `auth/refresh` answer `401`.
    pub fn revoke_refresh_token(&self) {
        self.refresh_succeeds.store(false, Ordering::SeqCst);
    }

    /// Keep the refresh response pending until `count` requests have been
    /// rejected with `401`.
    pub fn hold_refresh_until_rejected(&self, count: usize) {
        self.hold_refresh_until.store(count, Ordering::SeqCst);
    }

    pub fn seed_notifications(&self, count: usize) {
        let items = (0..count)
            .map(|index| {
                json!({
                    "id": uuid::Uuid::new_v4(),
                    "message": format!("Swap request {index}"),
                    "timestamp": "2026-03-01T09:30:00Z",
                    "isRead": false,
                    "senderName": "Grace",
                })
            })
            .collect();
        *self.notifications.lock().expect("notifications") = items;
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().expect("seen").clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.seen()
            .iter()
            .filter(|seen| seen.method == method && seen.path == path)
            .count()
    }

    pub fn stored_notifications(&self) -> Vec<Value> {
        self.notifications.lock().expect("notifications").clone()
    }

    fn unauthorized(&self) -> ApiResponse {
        self.unauthorized.fetch_add(1, Ordering::SeqCst);
        ApiResponse::new(401, "")
    }

    async fn refresh(&self) -> ApiResponse {
        let wanted = self.hold_refresh_until.load(Ordering::SeqCst);
        let held = tokio::time::timeout(Duration::from_secs(5), async {
            while self.unauthorized.load(Ordering::SeqCst) < wanted {
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(held.is_ok(), "expected {wanted} rejected requests before refresh");
        if self.refresh_succeeds.load(Ordering::SeqCst) {
            self.session_valid.store(true, Ordering::SeqCst);
            ApiResponse::new(200, "")
        } else {
            ApiResponse::new(401, "")
        }
    }

    fn authenticated(&self, request: &ApiRequest) -> ApiResponse {
        if !self.session_valid.load(Ordering::SeqCst) {
            return self.unauthorized();
        }
        let mut notifications = self.notifications.lock().expect("notifications");
        match (request.method, request.path.as_str()) {
            (Method::Get, endpoints::NOTIFICATIONS) => {
                ApiResponse::new(200, Value::Array(notifications.clone()).to_string())
            }
            (Method::Put, endpoints::NOTIFICATIONS_READ_ALL) => {
                for item in notifications.iter_mut() {
                    item["isRead"] = Value::Bool(true);
                }
                ApiResponse::new(204, "")
            }
            (Method::Delete, endpoints::NOTIFICATIONS) => {
                notifications.clear();
                ApiResponse::new(204, "")
            }
            (Method::Get, endpoints::MY_LISTINGS) => ApiResponse::new(200, "[]"),
            (Method::Get, endpoints::PROFILE) => ApiResponse::new(200, user().to_string()),
            _ => ApiResponse::new(404, r#"{"message":"Not found"}"#),
        }
    }
}

#[async_trait]
impl HttpTransport for StubApi {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.seen.lock().expect("seen").push(Seen {
            method: request.method,
            path: request.path.clone(),
            retried: request.retried,
        });
        let response = match (request.method, request.path.as_str()) {
            (Method::Post, endpoints::LOGIN) => {
                self.session_valid.store(true, Ordering::SeqCst);
                ApiResponse::new(200, user().to_string())
            }
            (Method::Post, endpoints::LOGOUT) => {
                self.session_valid.store(false, Ordering::SeqCst);
                ApiResponse::new(204, "")
            }
            (Method::Post, endpoints::REFRESH) => self.refresh().await,
            _ => self.authenticated(request),
        };
        Ok(response)
    }
}

pub fn user() -> Value {
    json!({
        "id": "6f1c2d3e-4b5a-4c6d-8e7f-9a0b1c2d3e4f",
        "email": "ada@example.com",
        "firstName": "Ada",
        "lastName": "Lovelace",
    })
}

/// Client wired to `stub` with a signed-in session store.
pub async fn signed_in(stub: &Arc<StubApi>) -> (Arc<ApiClient>, Arc<AuthStore>, Toasts) {
    let transport: Arc<dyn HttpTransport> = stub.clone();
    let api = Arc::new(ApiClient::new(transport));
    let toasts = Toasts::new(Arc::new(DefaultClock), DEFAULT_TOAST_TTL);
    let auth = AuthStore::new(Arc::clone(&api), toasts.clone());
    let credentials =
        LoginCredentials::try_from_parts("ada@example.com", "hunter22").expect("credentials");
    auth.login(&credentials).await.expect("login");
    (api, auth, toasts)
}
