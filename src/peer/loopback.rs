//! In-process peer engine.
//!
//! Produces a fixed data-channel offer, accepts exactly one `answer`
//! description and then reports a single host candidate. Nothing is ever
//! sent on the network; this exists so the signaling surface can be driven
//! end to end without a real transport stack.

use async_trait::async_trait;
use rand::Rng;
use std::sync::Mutex;

use super::{
    IceCandidate, PeerConnection, PeerContext, PeerError, PeerFactory, SdpType, SessionDescription,
};
use crate::session::{CandidateSink, SessionId};

/// Factory for [`LoopbackPeer`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopbackFactory;

#[async_trait]
impl PeerFactory for LoopbackFactory {
    async fn create(&self, context: PeerContext) -> Result<Box<dyn PeerConnection>, PeerError> {
        tracing::debug!(session_id = %context.id, "Creating loopback peer");
        Ok(Box::new(LoopbackPeer::new(context.id, context.candidates)))
    }
}

#[derive(Debug, Default)]
struct LoopbackState {
    remote: Option<SessionDescription>,
    closed: bool,
}

/// A peer that negotiates with nobody.
#[derive(Debug)]
pub struct LoopbackPeer {
    id: SessionId,
    port: u16,
    candidates: CandidateSink,
    state: Mutex<LoopbackState>,
}

impl LoopbackPeer {
    pub fn new(id: SessionId, candidates: CandidateSink) -> Self {
        Self {
            id,
            port: rand::thread_rng().gen_range(49152..65535),
            candidates,
            state: Mutex::new(LoopbackState::default()),
        }
    }

    fn offer_sdp(&self) -> String {
        format!(
            "v=0\r\n\
             o=- {session} 2 IN IP4 127.0.0.1\r\n\
             s=-\r\n\
             t=0 0\r\n\
             a=group:BUNDLE 0\r\n\
             m=application 9 UDP/DTLS/SCTP webrtc-datachannel\r\n\
             c=IN IP4 0.0.0.0\r\n\
             a=mid:0\r\n\
             a=sctp-port:5000\r\n",
            session = self.id
        )
    }

    fn host_candidate(&self) -> IceCandidate {
        IceCandidate {
            candidate: format!("candidate:1 1 UDP 2122252543 127.0.0.1 {} typ host", self.port),
            sdp_mid: Some("0".to_string()),
            sdp_m_line_index: Some(0),
        }
    }
}

#[async_trait]
impl PeerConnection for LoopbackPeer {
    async fn local_description(&self) -> Result<SessionDescription, PeerError> {
        Ok(SessionDescription::offer(self.offer_sdp()))
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<(), PeerError> {
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.closed {
                return Err(PeerError::Closed);
            }
            if description.kind != SdpType::Answer {
                return Err(PeerError::InvalidDescription(format!(
                    "expected an answer, got {:?}",
                    description.kind
                )));
            }
            if !description.sdp.starts_with("v=0") {
                return Err(PeerError::InvalidDescription("missing protocol version line".into()));
            }
            if state.remote.is_some() {
                return Err(PeerError::InvalidDescription("remote description already applied".into()));
            }
            state.remote = Some(description);
        }

        self.candidates.push(self.host_candidate());
        Ok(())
    }

    async fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.closed = true;
        tracing::debug!(session_id = %self.id, "Loopback peer closed");
    }
}
