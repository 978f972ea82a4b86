//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Claimed request (method, path)
//!     → matcher.rs (ownership, shape, id extraction)
//!     → router.rs (CORS, body, dispatch to registry)
//!     → HTTP response
//!
//! Route Compilation (at startup):
//!     ProtocolConfig
//!     → RouteTable (four (method, shape) entries)
//!     → Freeze as immutable SignalingRouter
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always resolves to the same operation

pub mod matcher;
pub mod router;

pub use matcher::{Operation, Route, RouteTable};
pub use router::SignalingRouter;
