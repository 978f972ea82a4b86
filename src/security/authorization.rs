//! Authorization collaborator.
//!
//! # Responsibilities
//! - Decide whether a caller may open a session
//! - Attach opaque user data to granted sessions
//! - Adapt collaborator-supplied status codes into the HTTP status space

use async_trait::async_trait;
use axum::http::{request::Parts, StatusCode};
use serde_json::Value;

/// Result of an authorization check.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    /// Caller may proceed; the value is echoed back in the creation response.
    Granted(Value),
    /// Caller is refused with 401.
    Denied,
    /// Caller is refused with a collaborator-chosen status (validated).
    Rejected(i64),
}

/// Decides whether a session may be created.
///
/// Receives the raw `Authorization` header value and the request head
/// (headers, URI, extensions such as `ConnectInfo`). May suspend.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, authorization: Option<&str>, request: &Parts) -> AuthOutcome;
}

/// Grants every request with `null` user data.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl Authorizer for AllowAll {
    async fn authorize(&self, _authorization: Option<&str>, _request: &Parts) -> AuthOutcome {
        AuthOutcome::Granted(Value::Null)
    }
}

/// Requires `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BearerToken {
    expected: String,
}

impl BearerToken {
    pub fn new(token: impl AsRef<str>) -> Self {
        Self {
            expected: format!("Bearer {}", token.as_ref()),
        }
    }
}

#[async_trait]
impl Authorizer for BearerToken {
    async fn authorize(&self, authorization: Option<&str>, _request: &Parts) -> AuthOutcome {
        match authorization {
            Some(value) if value == self.expected => AuthOutcome::Granted(Value::Null),
            _ => AuthOutcome::Denied,
        }
    }
}

/// Map a collaborator-supplied code to a status: kept if in `[100, 600)`, else 500.
pub fn external_status(code: i64) -> StatusCode {
    if (100..600).contains(&code) {
        u16::try_from(code)
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
