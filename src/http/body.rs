//! Body Reader.
//!
//! # Responsibilities
//! - Buffer a request body up to a configured limit
//! - Decode JSON payloads
//!
//! # Design Decisions
//! - The body is consumed by value; nothing else can read it afterwards
//! - Over-limit and transport failures are both read errors (client errors)

use axum::body::{Body, Bytes};
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    /// Stream failed, or the body exceeded the limit.
    #[error("failed to read request body: {0}")]
    Read(#[source] axum::Error),

    /// Body was read but is not the expected JSON.
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Buffer the whole body, failing if it exceeds `limit` bytes.
pub async fn read_body(body: Body, limit: usize) -> Result<Bytes, BodyError> {
    axum::body::to_bytes(body, limit).await.map_err(BodyError::Read)
}

/// Decode already-buffered bytes as JSON.
pub fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, BodyError> {
    Ok(serde_json::from_slice(bytes)?)
}
