//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Claimed request:
//!     → cors.rs (response headers, every in-scope response)
//!     → authorization.rs (create only: grant, deny, or custom status)
//!     → Pass to session registry
//! ```
//!
//! # Design Decisions
//! - Authentication schemes are delegated to the `Authorizer` collaborator
//! - Collaborator status codes are range-checked before reaching the wire

pub mod authorization;
pub mod cors;

pub use authorization::{AllowAll, AuthOutcome, Authorizer, BearerToken};
pub use cors::CorsPolicy;
