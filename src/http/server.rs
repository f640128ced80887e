//! HTTP server setup and the guard/proxy pipeline.
//!
//! # Responsibilities
//! - Create the Axum Router (dashboard API + catch-all proxy)
//! - Wire up middleware (guard, timeout, tracing)
//! - Run the two-phase decision protocol around every forwarded request
//! - Forward allowed requests to the origin application
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::uri::{Authority, Scheme};
use axum::http::{header, Request, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::GuardConfig;
use crate::detection::heuristics::Threshold;
use crate::detection::{
    RequestDecision, RequestGate, ResponseDecision, ResponseGate, TrackerStore,
};
use crate::http::{dashboard, reject};
use crate::observability::metrics;
use crate::store::{ActivityLog, BlockLedger, SqliteStore};

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub request_gate: Arc<RequestGate>,
    pub response_gate: Arc<ResponseGate>,
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
    pub store: Arc<SqliteStore>,
}

/// The security gateway server.
pub struct GuardServer {
    router: Router,
}

impl GuardServer {
    /// Wire up trackers, ledger, gates, and the upstream client.
    pub fn new(config: GuardConfig, store: Arc<SqliteStore>) -> Self {
        let trackers = Arc::new(TrackerStore::new());
        let ledger = Arc::new(BlockLedger::new(store.clone(), config.detection.fail_open));
        let activity = Arc::new(ActivityLog::new(store.clone()));
        let block_duration = Duration::from_secs(config.thresholds.block_duration_secs);

        let request_gate = Arc::new(RequestGate::new(
            ledger.clone(),
            trackers.clone(),
            Threshold::rate(&config.thresholds),
            block_duration,
            config.detection.dashboard_prefix.clone(),
        ));
        let response_gate = Arc::new(ResponseGate::new(
            ledger,
            activity,
            trackers,
            Threshold::failed_login(&config.thresholds),
            Threshold::not_found(&config.thresholds),
            block_duration,
            config.detection.login_path.clone(),
        ));

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let upstream = config
            .upstream
            .address
            .parse::<Authority>()
            .unwrap_or_else(|e| {
                tracing::error!(
                    upstream = %config.upstream.address,
                    error = %e,
                    "Invalid upstream address, falling back to default"
                );
                Authority::from_static("127.0.0.1:8080")
            });

        let state = AppState {
            request_gate,
            response_gate,
            client,
            upstream,
            store,
        };

        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GuardConfig, state: AppState) -> Router {
        Router::new()
            .nest(
                &config.detection.dashboard_prefix,
                dashboard::dashboard_router(),
            )
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state.clone())
            .layer(middleware::from_fn_with_state(state, guard_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// The two-phase decision protocol around every request.
///
/// Pre-phase: ledger check + rate heuristic. Post-phase: failed-login and
/// 404-scan heuristics on the origin's response. Dashboard traffic skips
/// both phases.
async fn guard_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let identity = addr.ip().to_string();
    let path = request.uri().path().to_string();
    let method = request.method().clone();

    match state.request_gate.inspect(&identity, &path, Instant::now()) {
        RequestDecision::Bypass => next.run(request).await,
        RequestDecision::Reject(message) => {
            tracing::warn!(client = %identity, path = %path, "Request rejected");
            metrics::record_blocked("request_gate");
            reject::forbidden(message)
        }
        RequestDecision::Allow => {
            let response = next.run(request).await;
            let status = response.status();
            metrics::record_request(method.as_str(), status.as_u16());

            match state
                .response_gate
                .inspect(&identity, &method, &path, status, Instant::now())
            {
                ResponseDecision::PassThrough => response,
                ResponseDecision::Override(message) => {
                    tracing::warn!(client = %identity, path = %path, status = %status, "Response overridden");
                    metrics::record_blocked("response_gate");
                    reject::forbidden(message)
                }
            }
        }
    }
}

/// Catch-all reverse proxy to the origin application.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let (mut parts, body) = request.into_parts();

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        path = %parts.uri.path(),
        "Proxying request"
    );

    // Rewrite the URI to point at the origin
    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.upstream.clone());
    let uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream URI");
            return (StatusCode::BAD_GATEWAY, "Invalid upstream request").into_response();
        }
    };
    parts.uri = uri;

    // The origin sees its own host, plus the request ID for correlation
    if let Ok(host) = header::HeaderValue::from_str(state.upstream.as_str()) {
        parts.headers.insert(header::HOST, host);
    }
    if let Ok(id) = header::HeaderValue::from_str(&request_id) {
        parts.headers.insert("x-request-id", id);
    }

    let upstream_request = Request::from_parts(parts, body);

    match state.client.request(upstream_request).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body)).into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            if e.is_connect() {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Cannot connect to origin application",
                )
                    .into_response()
            } else {
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
            }
        }
    }
}

/// Wait for Ctrl+C or a coordinated shutdown signal.
async fn shutdown_signal(mut shutdown: broadcast::Receiver<()>) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if result.is_err() {
                tracing::error!("Failed to install Ctrl+C handler");
            }
        }
        _ = shutdown.recv() => {}
    }
    tracing::info!("Shutdown signal received");
}
