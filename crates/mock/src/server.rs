//! HTTP adapter serving one interception router
//!
//! The browser layer forwards each intercepted storefront call here. Every
//! path except the health probe falls through to the router, so what is
//! matched and what is left unhandled is decided in one place.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use parking_lot::Mutex;
use pizza_common::Identity;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::error::{MockError, MockResult};
use crate::router::{InterceptionRouter, MockRequest};
use crate::session::Session;

/// Header set on responses for calls the router left unhandled
pub const UNHANDLED_HEADER: &str = "x-pizza-mock";

/// Readiness probe, answered outside the router
pub const HEALTH_PATH: &str = "/__mock/health";

type SharedRouter = Arc<Mutex<InterceptionRouter>>;

/// Build the axum app around `router`
pub fn mock_router(router: InterceptionRouter) -> Router {
    app(Arc::new(Mutex::new(router)))
}

fn app(state: SharedRouter) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .fallback(intercept_handler)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "pizza-mock"
    }))
}

async fn intercept_handler(
    State(state): State<SharedRouter>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let path = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string());
    let body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(&body).ok()
    };
    let request = MockRequest { method, path, body };

    let response = state.lock().handle(&request);
    match response {
        Some(r) => (r.status, Json(r.body)).into_response(),
        None => (
            StatusCode::NOT_IMPLEMENTED,
            [(UNHANDLED_HEADER, "unhandled")],
            Json(json!({ "message": "unhandled by mock" })),
        )
            .into_response(),
    }
}

/// Configuration for a mock server
#[derive(Debug, Clone)]
pub struct MockServerConfig {
    /// Address to listen on (port 0 = any free port)
    pub bind_addr: SocketAddr,

    /// Identity the session starts authenticated as
    pub seed: Option<Identity>,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            seed: None,
        }
    }
}

/// Handle to a running mock server. One per scenario; dropping it releases
/// the listener even when the scenario bails out early.
pub struct MockServer {
    local_addr: SocketAddr,
    base_url: String,
    state: SharedRouter,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl MockServer {
    /// Bind and start serving a fresh router
    pub async fn start(config: MockServerConfig) -> MockResult<Self> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|source| MockError::Bind {
                addr: config.bind_addr,
                source,
            })?;
        let local_addr = listener.local_addr()?;
        let base_url = format!("http://{}", local_addr);

        let seeded = config.seed.as_ref().map(|i| i.email.clone());
        let state = Arc::new(Mutex::new(InterceptionRouter::new(config.seed)));
        let app = app(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!(
            "Mock backend listening on {} (seed: {})",
            base_url,
            seeded.as_deref().unwrap_or("anonymous")
        );

        Ok(Self {
            local_addr,
            base_url,
            state,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.state.lock().session().clone()
    }

    /// Stop serving and wait for in-flight calls to finish
    pub async fn shutdown(mut self) -> MockResult<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            match task.await {
                Ok(result) => result?,
                Err(e) => {
                    return Err(MockError::Io(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        e,
                    )))
                }
            }
        }
        debug!("Mock backend on {} stopped", self.local_addr);
        Ok(())
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            warn!("Mock backend on {} dropped without shutdown", self.local_addr);
            task.abort();
        }
    }
}
