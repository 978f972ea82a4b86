//! Peer-resource capability interface.
//!
//! # Data Flow
//! ```text
//! SessionRegistry::create_connection
//!     → PeerFactory::create(PeerContext { id, candidates, disconnect })
//!     → PeerConnection::local_description()   (offer returned to client)
//!
//! Later, per request:
//!     remote-description → PeerConnection::set_remote_description()
//!     close              → PeerConnection::close()
//!
//! Out of band, from the transport engine:
//!     CandidateSink::push()      (polled by additional-candidates)
//!     DisconnectHandle::notify() (engine-side teardown)
//! ```
//!
//! # Design Decisions
//! - The core never names a concrete transport; engines implement these traits
//! - Description errors are client errors (400), never server faults
//! - `loopback` ships an in-process engine for demos and tests

pub mod loopback;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::session::{CandidateSink, DisconnectHandle, SessionId};

pub use loopback::LoopbackFactory;

/// Role of a session description in the offer/answer exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

/// A session description as exchanged over the wire: `{ "sdp": ..., "type": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    pub sdp: String,
    #[serde(rename = "type")]
    pub kind: SdpType,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self { sdp: sdp.into(), kind: SdpType::Offer }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self { sdp: sdp.into(), kind: SdpType::Answer }
    }
}

/// A reachability candidate discovered after the initial negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
}

/// Errors reported by a peer resource.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// The description was malformed or incompatible with local state.
    #[error("invalid session description: {0}")]
    InvalidDescription(String),

    /// The peer resource has already been closed.
    #[error("peer connection closed")]
    Closed,

    /// Any other failure inside the transport engine.
    #[error("transport engine error: {0}")]
    Engine(String),
}

/// Everything a newly created peer resource is handed by the registry.
#[derive(Debug, Clone)]
pub struct PeerContext {
    /// Identifier allocated for the session this peer belongs to.
    pub id: SessionId,
    /// Where asynchronously discovered candidates are appended.
    pub candidates: CandidateSink,
    /// Lets the engine report its own teardown.
    pub disconnect: DisconnectHandle,
}

/// One transport attempt, exclusively owned by its session.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Produce the locally generated description (the offer).
    async fn local_description(&self) -> Result<SessionDescription, PeerError>;

    /// Apply the counterpart's description. Fails on malformed input.
    async fn set_remote_description(&self, description: SessionDescription) -> Result<(), PeerError>;

    /// Release transport resources. Called at most once by the session.
    async fn close(&self);
}

/// Constructs peer resources for new sessions.
#[async_trait]
pub trait PeerFactory: Send + Sync {
    async fn create(&self, context: PeerContext) -> Result<Box<dyn PeerConnection>, PeerError>;
}
