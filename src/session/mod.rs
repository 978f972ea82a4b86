//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! create:  Authorizer → reserve id → PeerFactory → Session (Live)
//! get:     id → Arc<Session>
//! poll:    Session::drain_candidates (read-and-clear)
//! close:   remove from map → PeerConnection::close
//! ```
//!
//! # Design Decisions
//! - The registry exclusively owns the map; sessions never point back at it
//! - Sessions are shared as `Arc<Session>` so handlers never hold map locks
//! - Candidate delivery is at-most-once: each drain takes the whole buffer

pub mod id;
pub mod registry;
#[allow(clippy::module_inception)]
pub mod session;

pub use id::{InvalidSessionId, SessionId, SESSION_ID_LEN};
pub use registry::{DisconnectHandle, SessionRegistry};
pub use session::{CandidateSink, Session};
