//! Request identification.
//!
//! # Responsibilities
//! - Name the request-id header shared by the server layers and logs
//! - Read the id back out of a request for structured logging
//!
//! # Design Decisions
//! - Ids are generated by `tower_http::request_id` as early as possible
//! - A missing id is logged as "unknown", never an error

use axum::http::{request::Parts, HeaderMap, HeaderName, Request};

/// Header carrying the per-request id.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Access to the request id set by `SetRequestIdLayer`.
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

fn from_headers(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        from_headers(self.headers())
    }
}

impl RequestIdExt for Parts {
    fn request_id(&self) -> &str {
        from_headers(&self.headers)
    }
}
