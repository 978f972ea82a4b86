//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate route prefix shape and version segment
//! - Validate addresses, origins and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SignalingConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::SignalingConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &SignalingConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let prefix = &config.signaling.prefix;
    if !prefix.starts_with('/') {
        errors.push(ValidationError::new("signaling.prefix", "must start with '/'"));
    }
    if prefix.len() > 1 && prefix.ends_with('/') {
        errors.push(ValidationError::new("signaling.prefix", "must not end with '/'"));
    }
    if prefix == "/" {
        errors.push(ValidationError::new(
            "signaling.prefix",
            "must not be the root path; every host route would be claimed",
        ));
    }

    if let Some(version) = &config.signaling.version {
        if version.is_empty() || version.contains('/') {
            errors.push(ValidationError::new(
                "signaling.version",
                "must be a single non-empty path segment",
            ));
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    for origin in &config.cors.allowed_origins {
        if Url::parse(origin).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_origins",
                format!("'{}' is not a valid origin URL", origin),
            ));
        }
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be greater than 0"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
