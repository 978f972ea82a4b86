//! CORS Applier.
//!
//! # Responsibilities
//! - Set the CORS response headers on every in-scope response
//! - Resolve the allowed origin: fixed value, or reflection of a listed origin
//!
//! # Design Decisions
//! - Stateless: a policy is compiled once from config and shared
//! - An unlisted origin simply gets no `Access-Control-Allow-Origin`
//! - Pre-flight handling itself lives in the router, not here

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_REQUEST_METHOD, ORIGIN, VARY,
};
use axum::http::{HeaderMap, HeaderValue};

use crate::config::CorsConfig;

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origin: HeaderValue,
    allowed_origins: Vec<HeaderValue>,
    allow_headers: HeaderValue,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Self {
        let origin = HeaderValue::from_str(&config.origin).unwrap_or_else(|_| {
            tracing::warn!(origin = %config.origin, "Invalid CORS origin, falling back to '*'");
            HeaderValue::from_static("*")
        });

        let allowed_origins = config
            .allowed_origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o.trim_end_matches('/')).ok())
            .collect();

        let allow_headers = if config.allow_authorization {
            HeaderValue::from_static("authorization, content-type")
        } else {
            HeaderValue::from_static("content-type")
        };

        Self {
            origin,
            allowed_origins,
            allow_headers,
        }
    }

    /// Write the CORS headers for a request into its response headers.
    pub fn apply(&self, request: &HeaderMap, response: &mut HeaderMap) {
        if self.allowed_origins.is_empty() {
            response.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.origin.clone());
        } else {
            response.append(VARY, HeaderValue::from_static("origin"));
            if let Some(origin) = request
                .get(ORIGIN)
                .filter(|origin| self.allowed_origins.contains(origin))
            {
                response.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            }
        }

        response.insert(ACCESS_CONTROL_REQUEST_METHOD, HeaderValue::from_static("*"));
        response.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("OPTIONS, GET, POST"),
        );
        response.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::from_config(&CorsConfig::default())
    }
}
