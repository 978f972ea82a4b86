//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! signaling server. All types derive Serde traits for deserialization from
//! config files, and every field has a default.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SignalingConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route prefix and adapter selection.
    pub signaling: ProtocolConfig,

    /// CORS policy for in-scope responses.
    pub cors: CorsConfig,

    /// Request limits.
    pub limits: LimitsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Built-in authorization settings.
    pub auth: AuthConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// How the signaling routes share the host's HTTP listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// Chain-style middleware in front of the host router.
    #[default]
    Middleware,
    /// Owns the request stream and forwards unclaimed requests to fallbacks.
    Interception,
}

/// Route prefix configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Ownership root. Every path under it is claimed by signaling.
    pub prefix: String,

    /// Optional version segment between the prefix and `connections`.
    pub version: Option<String>,

    /// Attachment strategy used by the bundled server.
    pub adapter: AdapterKind,
}

impl ProtocolConfig {
    /// Prefix plus version segment: the base of the four operation paths.
    pub fn base_path(&self) -> String {
        match self.version.as_deref() {
            Some(version) if !version.is_empty() => format!("{}/{}", self.prefix, version),
            _ => self.prefix.clone(),
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            prefix: "/.wrtc".to_string(),
            version: Some("v2".to_string()),
            adapter: AdapterKind::default(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Fixed `Access-Control-Allow-Origin` value.
    pub origin: String,

    /// When non-empty, reflect the request `Origin` if it is listed here
    /// (and ignore `origin`).
    pub allowed_origins: Vec<String>,

    /// Allow the `authorization` request header.
    pub allow_authorization: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origin: "*".to_string(),
            allowed_origins: Vec::new(),
            allow_authorization: false,
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Built-in authorization configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer token required to create sessions. Empty allows everyone.
    pub bearer_token: String,
}
