//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, trace, timeout)
//!     → interception.rs | middleware.rs (who owns this path?)
//!         ├─ not ours → host routes / fallbacks, untouched
//!         └─ ours     → routing::SignalingRouter
//!                          → body.rs (only for remote-description)
//!     → Send to client
//! ```

pub mod body;
pub mod interception;
pub mod middleware;
pub mod request;
pub mod server;

pub use body::BodyError;
pub use interception::{Fallback, Forwarded, InterceptionAdapter, ServiceFallback};
pub use middleware::signaling_middleware;
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::SignalingServer;
