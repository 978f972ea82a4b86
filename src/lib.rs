//! WebRTC HTTP Signaling Library
//!
//! Four HTTP operations under one configurable path prefix let a browser
//! negotiate a WebRTC session with this server: create a session and receive
//! an offer, post back the answer, poll trickled ICE candidates, and close.
//! Signaling attaches to an existing host application either as axum
//! middleware or as an intercepting service that forwards foreign traffic.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod peer;
pub mod routing;
pub mod security;
pub mod session;

pub use config::SignalingConfig;
pub use error::SignalingError;
pub use http::{InterceptionAdapter, SignalingServer};
pub use lifecycle::Shutdown;
pub use routing::SignalingRouter;
pub use session::{SessionId, SessionRegistry};
