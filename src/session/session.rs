//! The Session entity and its candidate buffer.

use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::peer::{IceCandidate, PeerConnection, PeerError, SessionDescription};
use crate::session::SessionId;

/// Append-only buffer of candidates, drained atomically on each poll.
///
/// Cloned handles share the same buffer: the peer engine pushes through one,
/// the session drains through another.
#[derive(Debug, Clone, Default)]
pub struct CandidateSink {
    buffer: Arc<Mutex<Vec<IceCandidate>>>,
}

impl CandidateSink {
    /// Append a newly discovered candidate.
    pub fn push(&self, candidate: IceCandidate) {
        self.buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(candidate);
    }

    /// Take every buffered candidate, leaving the buffer empty.
    pub fn drain(&self) -> Vec<IceCandidate> {
        std::mem::take(&mut *self.buffer.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One negotiated transport attempt.
///
/// Owns its peer resource. `set_remote_description` and `close` are
/// serialized by an async mutex; once closed, further descriptions fail
/// with [`PeerError::Closed`] and the peer is never closed twice.
pub struct Session {
    id: SessionId,
    local_description: SessionDescription,
    user_data: Value,
    candidates: CandidateSink,
    peer: Box<dyn PeerConnection>,
    /// `true` once the peer has been closed.
    negotiation: tokio::sync::Mutex<bool>,
    created_at: Instant,
}

impl Session {
    pub(crate) fn new(
        id: SessionId,
        local_description: SessionDescription,
        user_data: Value,
        candidates: CandidateSink,
        peer: Box<dyn PeerConnection>,
    ) -> Self {
        Self {
            id,
            local_description,
            user_data,
            candidates,
            peer,
            negotiation: tokio::sync::Mutex::new(false),
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn local_description(&self) -> &SessionDescription {
        &self.local_description
    }

    pub fn user_data(&self) -> &Value {
        &self.user_data
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Pass the counterpart's description to the peer resource.
    pub async fn set_remote_description(&self, description: SessionDescription) -> Result<(), PeerError> {
        let closed = self.negotiation.lock().await;
        if *closed {
            return Err(PeerError::Closed);
        }
        self.peer.set_remote_description(description).await
    }

    /// Read and clear the candidate buffer.
    pub fn drain_candidates(&self) -> Vec<IceCandidate> {
        self.candidates.drain()
    }

    /// Close the peer resource. Returns `false` if it was already closed.
    pub(crate) async fn close(&self) -> bool {
        let mut closed = self.negotiation.lock().await;
        if *closed {
            return false;
        }
        *closed = true;
        self.peer.close().await;
        true
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("pending_candidates", &self.candidates.len())
            .field("age", &self.age())
            .finish_non_exhaustive()
    }
}
