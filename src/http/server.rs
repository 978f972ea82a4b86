//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the host application (demo routes, or one supplied by the embedder)
//! - Attach signaling with the configured adapter
//! - Wire up middleware (tracing, request ID, timeout)
//! - Serve with graceful shutdown and close every session afterwards

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{AdapterKind, SignalingConfig};
use crate::http::interception::InterceptionAdapter;
use crate::http::middleware;
use crate::http::request::X_REQUEST_ID;
use crate::routing::SignalingRouter;
use crate::session::SessionRegistry;

/// Signaling attached to a host application on one listener.
pub struct SignalingServer {
    app: Router,
    config: SignalingConfig,
    registry: Arc<SessionRegistry>,
}

impl SignalingServer {
    /// Serve signaling next to the built-in demo host routes.
    pub fn new(config: SignalingConfig, registry: Arc<SessionRegistry>) -> Self {
        let host = Self::demo_host(registry.clone());
        Self::with_host(config, registry, host)
    }

    /// Serve signaling next to an existing host router.
    pub fn with_host(config: SignalingConfig, registry: Arc<SessionRegistry>, host: Router) -> Self {
        let router = Arc::new(SignalingRouter::new(registry.clone(), &config));

        let app = match config.signaling.adapter {
            AdapterKind::Middleware => middleware::attach(host, router),
            AdapterKind::Interception => {
                Router::new().fallback_service(InterceptionAdapter::new(router).with_service(host))
            }
        };

        let app = Self::with_layers(app, &config);
        Self {
            app,
            config,
            registry,
        }
    }

    fn demo_host(registry: Arc<SessionRegistry>) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/health", get(health))
            .fallback(not_found)
            .with_state(registry)
    }

    #[allow(deprecated)]
    fn with_layers(app: Router, config: &SignalingConfig) -> Router {
        app.layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), MakeRequestUuid))
    }

    /// Run the server until the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            base_path = %self.config.signaling.base_path(),
            adapter = ?self.config.signaling.adapter,
            "Signaling server starting"
        );

        let app = self.app.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        let closed = self.registry.close_all().await;
        tracing::info!(closed_sessions = closed, "HTTP server stopped");
        Ok(())
    }

    /// The fully layered application, for in-process use.
    pub fn into_router(self) -> Router {
        self.app
    }

    pub fn config(&self) -> &SignalingConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }
}

async fn index() -> &'static str {
    "WebRTC HTTP signaling\n\
     \n\
     Endpoints (under the configured prefix):\n\
     - POST {base}/connections                          create session, returns offer\n\
     - POST {base}/connections/{id}/remote-description  apply answer\n\
     - GET  {base}/connections/{id}/additional-candidates  drain candidates\n\
     - POST {base}/connections/{id}/close                close session\n"
}

async fn health(State(registry): State<Arc<SessionRegistry>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "sessions": registry.len(),
    }))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
