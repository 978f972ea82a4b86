//! Interception Adapter.
//!
//! Owns the host listener's request stream. Claimed paths go to the
//! signaling router and are never forwarded; everything else is offered to
//! an explicit, ordered list of fallbacks.
//!
//! ```text
//! request ──▶ router.owns(path)? ──yes──▶ SignalingRouter::handle
//!                  │
//!                  no
//!                  ▼
//!            fallback[0] ──declined──▶ fallback[1] ──declined──▶ … ──▶ 404
//!                  │handled                │handled
//!                  ▼                       ▼
//!               response                response
//! ```

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Service, ServiceExt};

use crate::routing::SignalingRouter;

/// What a fallback did with a request.
pub enum Forwarded {
    /// The fallback produced the response.
    Handled(Response),
    /// The fallback passed; the request moves on unchanged.
    Declined(Request<Body>),
}

/// A host handler that unclaimed requests are forwarded to.
#[async_trait]
pub trait Fallback: Send + Sync {
    async fn forward(&self, request: Request<Body>) -> Forwarded;
}

/// Adapts any infallible tower service (an axum `Router`, say) into a
/// fallback that always handles.
#[derive(Clone)]
pub struct ServiceFallback<S>(pub S);

#[async_trait]
impl<S> Fallback for ServiceFallback<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Future: Send,
{
    async fn forward(&self, request: Request<Body>) -> Forwarded {
        match self.0.clone().oneshot(request).await {
            Ok(response) => Forwarded::Handled(response),
            Err(never) => match never {},
        }
    }
}

/// Tower service that shares one listener between signaling and the host.
#[derive(Clone)]
pub struct InterceptionAdapter {
    router: Arc<SignalingRouter>,
    fallbacks: Arc<Vec<Arc<dyn Fallback>>>,
}

impl InterceptionAdapter {
    pub fn new(router: Arc<SignalingRouter>) -> Self {
        Self {
            router,
            fallbacks: Arc::new(Vec::new()),
        }
    }

    /// Append a fallback. Fallbacks are tried in the order they were added.
    pub fn with_fallback(mut self, fallback: impl Fallback + 'static) -> Self {
        Arc::make_mut(&mut self.fallbacks).push(Arc::new(fallback));
        self
    }

    /// Append a tower service (e.g. the host's axum `Router`) as a fallback.
    pub fn with_service<S>(self, service: S) -> Self
    where
        S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
        S::Future: Send,
    {
        self.with_fallback(ServiceFallback(service))
    }

    pub fn router(&self) -> &Arc<SignalingRouter> {
        &self.router
    }

    async fn dispatch(
        router: Arc<SignalingRouter>,
        fallbacks: Arc<Vec<Arc<dyn Fallback>>>,
        request: Request<Body>,
    ) -> Response {
        if router.owns(request.uri().path()) {
            return router.handle(request).await;
        }

        let mut request = request;
        for fallback in fallbacks.iter() {
            match fallback.forward(request).await {
                Forwarded::Handled(response) => return response,
                Forwarded::Declined(returned) => request = returned,
            }
        }

        tracing::debug!(path = %request.uri().path(), "No fallback handled request");
        StatusCode::NOT_FOUND.into_response()
    }
}

impl Service<Request<Body>> for InterceptionAdapter {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let router = self.router.clone();
        let fallbacks = self.fallbacks.clone();
        Box::pin(async move { Ok(Self::dispatch(router, fallbacks, request).await) })
    }
}
