//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SignalingConfig (validated, immutable)
//!     → route table, CORS policy and limits compiled from it at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdapterKind, AuthConfig, CorsConfig, LimitsConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, ProtocolConfig, SignalingConfig, TimeoutConfig,
};
