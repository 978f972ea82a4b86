//! Signaling Router.
//!
//! # Responsibilities
//! - Apply CORS to every claimed response and answer pre-flights
//! - Resolve the operation, read the body only when the operation needs it
//! - Drive the session registry and render the HTTP response
//!
//! # Design Decisions
//! - Stateless per request; all shared state lives in the registry
//! - Every failure becomes a status code, nothing propagates out of `handle`
//! - Unknown id on a well-formed path is 404, a malformed id is 400

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::config::SignalingConfig;
use crate::error::SignalingError;
use crate::http::body::{parse_json, read_body};
use crate::http::request::RequestIdExt;
use crate::observability::metrics;
use crate::peer::SessionDescription;
use crate::routing::matcher::{Operation, Route, RouteTable};
use crate::security::CorsPolicy;
use crate::session::{SessionId, SessionRegistry};

/// Body of a successful create response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse<'a> {
    pub user_data: &'a Value,
    pub id: &'a SessionId,
    pub local_description: &'a SessionDescription,
}

/// Logs when a handler future is dropped before it produced a response,
/// which happens when the client goes away mid-request.
struct InFlight {
    operation: &'static str,
    request_id: String,
    done: bool,
}

impl InFlight {
    fn new(operation: &'static str, request_id: &str) -> Self {
        Self {
            operation,
            request_id: request_id.to_string(),
            done: false,
        }
    }

    fn finish(mut self) {
        self.done = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.done {
            tracing::debug!(
                request_id = %self.request_id,
                operation = self.operation,
                "Client disconnected before response was written"
            );
        }
    }
}

/// The protocol state machine shared by both HTTP adapters.
#[derive(Debug)]
pub struct SignalingRouter {
    routes: RouteTable,
    registry: Arc<SessionRegistry>,
    cors: CorsPolicy,
    max_body_bytes: usize,
}

impl SignalingRouter {
    pub fn new(registry: Arc<SessionRegistry>, config: &SignalingConfig) -> Self {
        Self {
            routes: RouteTable::new(&config.signaling),
            registry,
            cors: CorsPolicy::from_config(&config.cors),
            max_body_bytes: config.limits.max_body_bytes,
        }
    }

    /// Whether this router claims the path. Unclaimed requests belong to the host.
    pub fn owns(&self, path: &str) -> bool {
        self.routes.owns(path)
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Handle a claimed request. Never fails; every outcome is a response.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let cors_source = request.headers().clone();

        if request.method() == Method::OPTIONS {
            return self.finish("preflight", StatusCode::OK.into_response(), &cors_source, start);
        }

        let resolved = self.routes.resolve(request.method(), request.uri().path());
        let label = resolved
            .as_ref()
            .map(|route| route.operation.as_str())
            .unwrap_or("unmatched");

        let guard = InFlight::new(label, request.request_id());
        let response = match resolved {
            Ok(route) => match self.dispatch(route, request).await {
                Ok(response) => response,
                Err(e) => self.failure(label, e),
            },
            Err(e) => self.failure(label, e),
        };
        guard.finish();

        self.finish(label, response, &cors_source, start)
    }

    /// Headers shared by every claimed response, pre-flights included.
    fn finish(
        &self,
        operation: &'static str,
        mut response: Response,
        request_headers: &HeaderMap,
        start: Instant,
    ) -> Response {
        self.cors.apply(request_headers, response.headers_mut());
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        metrics::record_request(operation, response.status().as_u16(), start);
        response
    }

    fn failure(&self, operation: &'static str, error: SignalingError) -> Response {
        match &error {
            SignalingError::Internal(_) => {
                tracing::error!(operation, error = %error, "Signaling request failed")
            }
            _ => tracing::debug!(operation, error = %error, "Signaling request rejected"),
        }
        error.into_response()
    }

    async fn dispatch(&self, route: Route, request: Request<Body>) -> Result<Response, SignalingError> {
        match (route.operation, route.session) {
            (Operation::Create, _) => self.create(request).await,
            (Operation::SetRemoteDescription, Some(id)) => self.set_remote_description(id, request).await,
            (Operation::PollCandidates, Some(id)) => self.poll_candidates(id),
            (Operation::Close, Some(id)) => self.close(id).await,
            // Member routes always carry an id; the matcher guarantees it.
            (_, None) => Err(SignalingError::MalformedId),
        }
    }

    async fn create(&self, request: Request<Body>) -> Result<Response, SignalingError> {
        let (parts, _body) = request.into_parts();
        let authorization = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let session = self.registry.create_connection(authorization, &parts).await?;
        tracing::debug!(
            request_id = %parts.request_id(),
            session_id = %session.id(),
            "Connection offered"
        );

        Ok(Json(CreateResponse {
            user_data: session.user_data(),
            id: session.id(),
            local_description: session.local_description(),
        })
        .into_response())
    }

    async fn set_remote_description(
        &self,
        id: SessionId,
        request: Request<Body>,
    ) -> Result<Response, SignalingError> {
        let bytes = read_body(request.into_body(), self.max_body_bytes).await?;

        let session = self
            .registry
            .get_connection(&id)
            .ok_or_else(|| SignalingError::SessionNotFound(id.clone()))?;

        let description: SessionDescription = parse_json(&bytes)?;
        session.set_remote_description(description).await?;

        tracing::debug!(session_id = %id, "Remote description applied");
        Ok(StatusCode::OK.into_response())
    }

    fn poll_candidates(&self, id: SessionId) -> Result<Response, SignalingError> {
        let session = self
            .registry
            .get_connection(&id)
            .ok_or(SignalingError::SessionNotFound(id))?;

        let candidates = session.drain_candidates();
        metrics::record_candidates_delivered(candidates.len());
        Ok(Json(candidates).into_response())
    }

    async fn close(&self, id: SessionId) -> Result<Response, SignalingError> {
        if !self.registry.close_connection(&id).await {
            tracing::debug!(session_id = %id, "Close for unknown session");
        }
        Ok(StatusCode::OK.into_response())
    }
}
