//! Middleware Adapter.
//! Claims signaling paths in front of a host axum router; everything else
//! continues down the chain untouched.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    Router,
};
use std::sync::Arc;

use crate::routing::SignalingRouter;

pub async fn signaling_middleware(
    State(router): State<Arc<SignalingRouter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !router.owns(request.uri().path()) {
        return next.run(request).await;
    }
    router.handle(request).await
}

/// Layer the signaling middleware onto a host router.
///
/// Add host routes and any custom fallback before calling this; layers only
/// wrap what the router already contains.
pub fn attach<S>(host: Router<S>, router: Arc<SignalingRouter>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    host.layer(middleware::from_fn_with_state(router, signaling_middleware))
}
