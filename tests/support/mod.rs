//! In-process admin backend used by the integration tests. It issues access
//! cookies from the refresh endpoint, rejects business calls that do not carry
//! the current one, and counts every call so tests can assert on traffic.

#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use gymdesk::{
    client::ApiClient,
    config::ClientConfig,
    session::{MemoryStore, RecordingNavigator, Session, SessionStore, UserRecord},
};
use serde_json::{json, Value};
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, AtomicU16, AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};
use tokio::{net::TcpListener, task::JoinHandle, time::sleep};

pub const ACCESS_COOKIE: &str = "access_token";
pub const RESOURCE_PATH: &str = "/admin/subscriptions";
pub const BROKEN_PATH: &str = "/admin/broken";
pub const OTP_PATH: &str = "/admin/auth/verify-otp";

pub struct BackendState {
    pub refresh_calls: AtomicUsize,
    pub resource_hits: AtomicUsize,
    pub user_verify_calls: AtomicUsize,
    pub admin_verify_calls: AtomicUsize,
    pub refresh_status: AtomicU16,
    pub refresh_delay_ms: AtomicU64,
    pub verify_status: AtomicU16,
    pub always_unauthorized: AtomicBool,
    pub verify_body: Mutex<Value>,
    valid_token: Mutex<String>,
    issued: AtomicUsize,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            refresh_calls: AtomicUsize::new(0),
            resource_hits: AtomicUsize::new(0),
            user_verify_calls: AtomicUsize::new(0),
            admin_verify_calls: AtomicUsize::new(0),
            refresh_status: AtomicU16::new(200),
            refresh_delay_ms: AtomicU64::new(0),
            verify_status: AtomicU16::new(200),
            always_unauthorized: AtomicBool::new(false),
            verify_body: Mutex::new(json!({"status": 200, "message": "verified"})),
            valid_token: Mutex::new("token-0".to_string()),
            issued: AtomicUsize::new(0),
        }
    }
}

impl BackendState {
    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn hits(&self) -> usize {
        self.resource_hits.load(Ordering::SeqCst)
    }

    /// Invalidates the current access cookie, as an expiry would.
    pub fn revoke_access(&self) {
        *lock(&self.valid_token) = "revoked".to_string();
    }

    pub fn set_verify_body(&self, body: Value) {
        *lock(&self.verify_body) = body;
    }

    fn valid_token(&self) -> String {
        lock(&self.valid_token).clone()
    }

    fn rotate(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("token-{n}");
        *lock(&self.valid_token) = token.clone();
        token
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn access_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == ACCESS_COOKIE)
        .map(|(_, value)| value.to_string())
}

async fn resource(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    state.resource_hits.fetch_add(1, Ordering::SeqCst);

    let authorized = !state.always_unauthorized.load(Ordering::SeqCst)
        && access_cookie(&headers).as_deref() == Some(state.valid_token().as_str());
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"status": 401, "message": "jwt expired"})),
        )
            .into_response();
    }

    Json(json!({
        "success": true,
        "data": {
            "rows": [{"id": 1, "plan": "gold"}],
            "pagination": {"page": 1, "limit": 10, "total": 1}
        }
    }))
    .into_response()
}

async fn broken() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response()
}

async fn verify_response(state: &BackendState) -> Response {
    let status = StatusCode::from_u16(state.verify_status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = lock(&state.verify_body).clone();
    if status == StatusCode::OK {
        (status, Json(body)).into_response()
    } else {
        (status, Json(json!({"status": status.as_u16(), "message": "invalid session"})))
            .into_response()
    }
}

async fn user_verify(State(state): State<Arc<BackendState>>) -> Response {
    state.user_verify_calls.fetch_add(1, Ordering::SeqCst);
    verify_response(&state).await
}

async fn admin_verify(State(state): State<Arc<BackendState>>) -> Response {
    state.admin_verify_calls.fetch_add(1, Ordering::SeqCst);
    verify_response(&state).await
}

async fn refresh(State(state): State<Arc<BackendState>>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        sleep(Duration::from_millis(delay)).await;
    }

    let status = StatusCode::from_u16(state.refresh_status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status != StatusCode::OK {
        return (status, Json(json!({"status": status.as_u16(), "message": "refresh denied"})))
            .into_response();
    }

    let token = state.rotate();
    (
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            format!("{ACCESS_COOKIE}={token}; Path=/; HttpOnly"),
        )],
        Json(json!({"status": 200})),
    )
        .into_response()
}

async fn otp() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"status": 401, "message": "invalid otp"})),
    )
        .into_response()
}

pub struct Backend {
    pub addr: SocketAddr,
    pub state: Arc<BackendState>,
    server: JoinHandle<()>,
}

impl Drop for Backend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl Backend {
    pub async fn start() -> Result<Self> {
        let state = Arc::new(BackendState::default());

        let app = Router::new()
            .route(RESOURCE_PATH, get(resource))
            .route(BROKEN_PATH, get(broken))
            .route("/auth/verify", get(user_verify))
            .route("/admin/auth/verify", get(admin_verify))
            .route("/admin/auth/refresh-cookie", post(refresh))
            .route(OTP_PATH, post(otp))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind mock backend")?;
        let addr = listener.local_addr().context("Failed to read local port")?;

        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Client against a backend plus the pieces tests inspect.
pub struct Harness {
    pub client: ApiClient,
    pub store: Arc<MemoryStore>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    /// Client with a cached admin user and no access cookie, so the first
    /// business call answers 401.
    pub fn new(base_url: &str) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let session = Session::with_navigator(store.clone(), navigator.clone(), "/");
        session.save_user(&UserRecord::new("u-1", "admin"))?;

        let config = ClientConfig::new(base_url).with_settle_delay(Duration::from_millis(10));
        let client = ApiClient::new(&config, session)?;

        Ok(Self {
            client,
            store,
            navigator,
        })
    }

    pub fn cached_user(&self) -> Result<Option<String>> {
        Ok(self.store.get(gymdesk::session::USER_KEY)?)
    }
}

/// A local port with nothing listening on it.
pub async fn closed_port_url() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}"))
}
