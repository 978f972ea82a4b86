//! Session Registry.
//!
//! # Responsibilities
//! - Authorize, allocate and open new sessions
//! - Resolve identifiers to live sessions
//! - Close sessions on request, on engine disconnect, and at shutdown
//!
//! # Design Decisions
//! - `DashMap` shards the identifier map, so work on different ids never
//!   contends on a single lock
//! - Identifiers are reserved through the entry API before the peer is
//!   built; two concurrent creations can never share an id
//! - A reservation is a drop guard: a cancelled creation releases its id
//!   and closes any peer it already built
//! - No map guard is ever held across an `.await`

use axum::http::{request::Parts, StatusCode};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use crate::error::SignalingError;
use crate::observability::metrics;
use crate::peer::{PeerConnection, PeerContext, PeerFactory};
use crate::security::authorization::{external_status, AuthOutcome, Authorizer};
use crate::session::{CandidateSink, Session, SessionId};

/// A map entry: either an id claimed by an in-flight creation, or a live session.
#[derive(Debug)]
enum Slot {
    /// Creation in progress. `disconnected` records an engine teardown
    /// reported before the session was published.
    Reserved { disconnected: bool },
    Live(Arc<Session>),
}

/// The identifier map plus a count of its live entries.
#[derive(Debug, Default)]
struct Sessions {
    map: DashMap<SessionId, Slot>,
    live: AtomicUsize,
}

impl Sessions {
    /// Remove `id` only if it refers to a live session.
    fn take_live(&self, id: &SessionId) -> Option<Arc<Session>> {
        match self.map.remove_if(id, |_, slot| matches!(slot, Slot::Live(_))) {
            Some((_, Slot::Live(session))) => {
                self.live.fetch_sub(1, Ordering::Relaxed);
                Some(session)
            }
            _ => None,
        }
    }

    fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

/// Run a peer close on the current runtime without waiting for it.
fn spawn_close(id: &SessionId, close: impl Future<Output = ()> + Send + 'static) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(close);
        }
        Err(_) => {
            tracing::warn!(session_id = %id, "No runtime available, peer close skipped");
        }
    }
}

/// Handed to a peer engine so it can report its own teardown.
///
/// Holds only a weak reference to the identifier map; once the registry is
/// gone, notifying is a no-op.
#[derive(Debug, Clone)]
pub struct DisconnectHandle {
    id: SessionId,
    sessions: Weak<Sessions>,
}

impl DisconnectHandle {
    /// Remove the session from the registry and close it in the background.
    ///
    /// Safe to call from inside engine callbacks: the close runs on a
    /// separate task and never re-enters the caller. A notification that
    /// arrives while the session is still being created fails that creation.
    pub fn notify(&self) {
        let Some(sessions) = self.sessions.upgrade() else {
            return;
        };

        if let Some(mut slot) = sessions.map.get_mut(&self.id) {
            if let Slot::Reserved { disconnected } = slot.value_mut() {
                *disconnected = true;
                tracing::info!(session_id = %self.id, "Peer reported disconnect during creation");
                return;
            }
        }

        let Some(session) = sessions.take_live(&self.id) else {
            return;
        };

        tracing::info!(session_id = %self.id, "Peer reported disconnect");
        metrics::record_session_closed("peer");

        spawn_close(&self.id, async move {
            session.close().await;
        });
    }
}

/// An id claimed for a creation in progress.
///
/// Dropping an unpublished reservation frees the id and closes the peer it
/// holds, if any.
struct Reservation {
    id: SessionId,
    sessions: Arc<Sessions>,
    peer: Option<Box<dyn PeerConnection>>,
    published: bool,
}

impl Reservation {
    fn new(sessions: &Arc<Sessions>) -> Self {
        loop {
            let id = SessionId::generate();
            if let Entry::Vacant(slot) = sessions.map.entry(id.clone()) {
                slot.insert(Slot::Reserved { disconnected: false });
                return Self {
                    id,
                    sessions: sessions.clone(),
                    peer: None,
                    published: false,
                };
            }
        }
    }

    /// Turn the reservation into a live entry. Returns `false` without
    /// publishing if the engine disconnected in the meantime.
    fn publish(&mut self, session: &Arc<Session>) -> bool {
        self.published = true;
        match self.sessions.map.entry(self.id.clone()) {
            Entry::Occupied(mut entry) => {
                let healthy = matches!(entry.get(), Slot::Reserved { disconnected: false });
                if healthy {
                    entry.insert(Slot::Live(session.clone()));
                    self.sessions.live.fetch_add(1, Ordering::Relaxed);
                } else {
                    entry.remove();
                }
                healthy
            }
            Entry::Vacant(_) => false,
        }
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        self.sessions
            .map
            .remove_if(&self.id, |_, slot| matches!(slot, Slot::Reserved { .. }));

        if let Some(peer) = self.peer.take() {
            tracing::debug!(session_id = %self.id, "Creation abandoned, closing peer");
            spawn_close(&self.id, async move {
                peer.close().await;
            });
        }
    }
}

/// Owns the identifier → session mapping.
pub struct SessionRegistry {
    sessions: Arc<Sessions>,
    factory: Arc<dyn PeerFactory>,
    authorizer: Arc<dyn Authorizer>,
}

impl SessionRegistry {
    pub fn new(factory: impl PeerFactory + 'static, authorizer: impl Authorizer + 'static) -> Self {
        Self::from_parts(Arc::new(factory), Arc::new(authorizer))
    }

    pub fn from_parts(factory: Arc<dyn PeerFactory>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            sessions: Arc::new(Sessions::default()),
            factory,
            authorizer,
        }
    }

    /// Authorize the caller and open a new session.
    ///
    /// Authorization failures surface the collaborator's status when it is
    /// a valid HTTP status, 500 otherwise. Engine failures yield 500.
    pub async fn create_connection(
        &self,
        authorization: Option<&str>,
        request: &Parts,
    ) -> Result<Arc<Session>, SignalingError> {
        let user_data = match self.authorizer.authorize(authorization, request).await {
            AuthOutcome::Granted(user_data) => user_data,
            AuthOutcome::Denied => {
                tracing::debug!("Authorization denied");
                return Err(SignalingError::Rejected(StatusCode::UNAUTHORIZED));
            }
            AuthOutcome::Rejected(code) => {
                let status = external_status(code);
                tracing::debug!(code, status = %status, "Authorization rejected");
                return Err(SignalingError::Rejected(status));
            }
        };

        let mut reservation = Reservation::new(&self.sessions);
        let id = reservation.id.clone();

        let session = match self.open(&mut reservation, user_data).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(session_id = %id, error = %e, "Session creation failed");
                return Err(e);
            }
        };

        if !reservation.publish(&session) {
            session.close().await;
            tracing::warn!(session_id = %id, "Peer disconnected before session was published");
            return Err(SignalingError::Internal("peer disconnected during creation".into()));
        }

        tracing::info!(session_id = %id, "Session created");
        metrics::record_session_created();
        Ok(session)
    }

    async fn open(
        &self,
        reservation: &mut Reservation,
        user_data: serde_json::Value,
    ) -> Result<Arc<Session>, SignalingError> {
        let id = reservation.id.clone();
        let candidates = CandidateSink::default();
        let context = PeerContext {
            id: id.clone(),
            candidates: candidates.clone(),
            disconnect: DisconnectHandle {
                id: id.clone(),
                sessions: Arc::downgrade(&self.sessions),
            },
        };

        let peer = self
            .factory
            .create(context)
            .await
            .map_err(|e| SignalingError::Internal(format!("peer creation failed: {e}")))?;
        let described = reservation.peer.insert(peer).local_description().await;

        let failure = match described {
            Ok(description) if !description.sdp.trim().is_empty() => {
                let Some(peer) = reservation.peer.take() else {
                    return Err(SignalingError::Internal("peer released during creation".into()));
                };
                return Ok(Arc::new(Session::new(id, description, user_data, candidates, peer)));
            }
            Ok(_) => SignalingError::Internal("empty local description".into()),
            Err(e) => SignalingError::Internal(format!("local description failed: {e}")),
        };

        if let Some(peer) = reservation.peer.take() {
            peer.close().await;
        }
        Err(failure)
    }

    /// Look up a live session. Never creates.
    pub fn get_connection(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.map.get(id).and_then(|slot| match slot.value() {
            Slot::Live(session) => Some(session.clone()),
            Slot::Reserved { .. } => None,
        })
    }

    /// Close and remove a session. Closing an absent id is a no-op.
    pub async fn close_connection(&self, id: &SessionId) -> bool {
        let Some(session) = self.sessions.take_live(id) else {
            return false;
        };
        session.close().await;
        tracing::info!(session_id = %id, "Session closed");
        metrics::record_session_closed("client");
        true
    }

    /// Close every live session. Returns how many were closed.
    pub async fn close_all(&self) -> usize {
        let ids: Vec<SessionId> = self
            .sessions
            .map
            .iter()
            .filter(|entry| matches!(entry.value(), Slot::Live(_)))
            .map(|entry| entry.key().clone())
            .collect();

        let mut closed = 0;
        for id in ids {
            if let Some(session) = self.sessions.take_live(&id) {
                session.close().await;
                closed += 1;
            }
        }
        metrics::record_sessions_drained(closed);
        tracing::info!(closed, "All sessions closed");
        closed
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.live()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map entries, including ids reserved by creations in progress.
    #[cfg(test)]
    fn entries(&self) -> usize {
        self.sessions.map.len()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("live", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::{
        IceCandidate, LoopbackFactory, PeerConnection, PeerError, SessionDescription,
    };
    use crate::security::authorization::AllowAll;
    use async_trait::async_trait;
    use axum::http::Request;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn parts() -> Parts {
        Request::builder()
            .method("POST")
            .uri("/.wrtc/v2/connections")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    struct FixedOutcome(fn() -> AuthOutcome);

    #[async_trait]
    impl Authorizer for FixedOutcome {
        async fn authorize(&self, _authorization: Option<&str>, _request: &Parts) -> AuthOutcome {
            (self.0)()
        }
    }

    /// Counts closes and keeps each context so tests can drive the engine side.
    #[derive(Default)]
    struct ProbeFactory {
        closes: Arc<AtomicUsize>,
        contexts: Arc<Mutex<Vec<PeerContext>>>,
        empty_offer: bool,
        offer_delay: Option<Duration>,
        disconnect_on_create: bool,
    }

    struct ProbePeer {
        closes: Arc<AtomicUsize>,
        empty_offer: bool,
        offer_delay: Option<Duration>,
    }

    #[async_trait]
    impl PeerConnection for ProbePeer {
        async fn local_description(&self) -> Result<SessionDescription, PeerError> {
            if let Some(delay) = self.offer_delay {
                tokio::time::sleep(delay).await;
            }
            if self.empty_offer {
                Ok(SessionDescription::offer(""))
            } else {
                Ok(SessionDescription::offer("v=0\r\n"))
            }
        }

        async fn set_remote_description(&self, _d: SessionDescription) -> Result<(), PeerError> {
            Ok(())
        }

        async fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl PeerFactory for ProbeFactory {
        async fn create(&self, context: PeerContext) -> Result<Box<dyn PeerConnection>, PeerError> {
            if self.disconnect_on_create {
                context.disconnect.notify();
            }
            self.contexts.lock().unwrap().push(context);
            Ok(Box::new(ProbePeer {
                closes: self.closes.clone(),
                empty_offer: self.empty_offer,
                offer_delay: self.offer_delay,
            }))
        }
    }

    #[tokio::test]
    async fn test_create_get_close() {
        let registry = SessionRegistry::new(LoopbackFactory, AllowAll);
        let session = registry.create_connection(None, &parts()).await.unwrap();
        let id = session.id().clone();

        assert!(SessionId::is_valid(id.as_str()));
        assert!(!session.local_description().sdp.is_empty());
        assert!(registry.get_connection(&id).is_some());
        assert_eq!(registry.len(), 1);

        assert!(registry.close_connection(&id).await);
        assert!(registry.get_connection(&id).is_none());
        assert!(!registry.close_connection(&id).await, "second close is a no-op");
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_denied_maps_to_401() {
        let registry = SessionRegistry::new(LoopbackFactory, FixedOutcome(|| AuthOutcome::Denied));
        let err = registry.create_connection(None, &parts()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_status_passthrough_and_bounds() {
        let registry = SessionRegistry::new(LoopbackFactory, FixedOutcome(|| AuthOutcome::Rejected(403)));
        let err = registry.create_connection(None, &parts()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let registry = SessionRegistry::new(LoopbackFactory, FixedOutcome(|| AuthOutcome::Rejected(600)));
        let err = registry.create_connection(None, &parts()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let registry = SessionRegistry::new(LoopbackFactory, FixedOutcome(|| AuthOutcome::Rejected(-1)));
        let err = registry.create_connection(None, &parts()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_empty_offer_is_internal_error_and_peer_closed() {
        let factory = ProbeFactory { empty_offer: true, ..Default::default() };
        let closes = factory.closes.clone();
        let registry = SessionRegistry::new(factory, AllowAll);

        let err = registry.create_connection(None, &parts()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_close_closes_peer_once() {
        let factory = ProbeFactory::default();
        let closes = factory.closes.clone();
        let registry = SessionRegistry::new(factory, AllowAll);

        let session = registry.create_connection(None, &parts()).await.unwrap();
        registry.close_connection(session.id()).await;
        // Closing the detached session again must not reach the peer.
        assert!(!session.close().await);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_engine_candidates_reach_session() {
        let factory = ProbeFactory::default();
        let contexts = factory.contexts.clone();
        let registry = SessionRegistry::new(factory, AllowAll);

        let session = registry.create_connection(None, &parts()).await.unwrap();
        let sink = contexts.lock().unwrap()[0].candidates.clone();
        sink.push(IceCandidate {
            candidate: "candidate:1 1 UDP 1 10.0.0.2 4000 typ host".into(),
            sdp_mid: None,
            sdp_m_line_index: None,
        });

        assert_eq!(session.drain_candidates().len(), 1);
        assert!(session.drain_candidates().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_notification_removes_session() {
        let factory = ProbeFactory::default();
        let contexts = factory.contexts.clone();
        let closes = factory.closes.clone();
        let registry = SessionRegistry::new(factory, AllowAll);

        let session = registry.create_connection(None, &parts()).await.unwrap();
        let handle = contexts.lock().unwrap()[0].disconnect.clone();
        handle.notify();

        assert!(registry.get_connection(session.id()).is_none());
        // Close runs on a spawned task.
        for _ in 0..50 {
            if closes.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        // A second notification is harmless.
        handle.notify();
    }

    #[tokio::test]
    async fn test_close_all() {
        let registry = SessionRegistry::new(LoopbackFactory, AllowAll);
        for _ in 0..5 {
            registry.create_connection(None, &parts()).await.unwrap();
        }
        assert_eq!(registry.close_all().await, 5);
        assert!(registry.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_get_distinct_ids() {
        let registry = Arc::new(SessionRegistry::new(LoopbackFactory, AllowAll));
        let tasks: Vec<_> = (0..200)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    registry.create_connection(None, &parts()).await.unwrap().id().clone()
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for task in tasks {
            ids.insert(task.await.unwrap());
        }
        assert_eq!(ids.len(), 200);
        assert_eq!(registry.len(), 200);
    }

    #[tokio::test]
    async fn test_cancelled_create_releases_id_and_closes_peer() {
        let factory = ProbeFactory {
            offer_delay: Some(Duration::from_secs(10)),
            ..Default::default()
        };
        let closes = factory.closes.clone();
        let registry = SessionRegistry::new(factory, AllowAll);

        for _ in 0..5 {
            let attempt = tokio::time::timeout(
                Duration::from_millis(20),
                registry.create_connection(None, &parts()),
            )
            .await;
            assert!(attempt.is_err(), "creation should still be pending");
        }

        assert_eq!(registry.entries(), 0, "reserved ids must be released");
        assert!(registry.is_empty());

        // Abandoned peers are closed on spawned tasks.
        for _ in 0..50 {
            if closes.load(Ordering::SeqCst) == 5 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(closes.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_disconnect_during_creation_fails_create() {
        let factory = ProbeFactory {
            disconnect_on_create: true,
            ..Default::default()
        };
        let closes = factory.closes.clone();
        let contexts = factory.contexts.clone();
        let registry = SessionRegistry::new(factory, AllowAll);

        let err = registry.create_connection(None, &parts()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(registry.entries(), 0);
        assert!(registry.is_empty());

        let id = contexts.lock().unwrap()[0].id.clone();
        assert!(registry.get_connection(&id).is_none());
    }

    #[tokio::test]
    async fn test_live_count_follows_every_removal_path() {
        let factory = ProbeFactory::default();
        let contexts = factory.contexts.clone();
        let registry = SessionRegistry::new(factory, AllowAll);

        let first = registry.create_connection(None, &parts()).await.unwrap();
        registry.create_connection(None, &parts()).await.unwrap();
        registry.create_connection(None, &parts()).await.unwrap();
        assert_eq!(registry.len(), 3);

        registry.close_connection(first.id()).await;
        assert_eq!(registry.len(), 2);

        let handle = contexts.lock().unwrap()[1].disconnect.clone();
        handle.notify();
        handle.notify();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.entries(), 1);

        assert_eq!(registry.close_all().await, 1);
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.entries(), 0);
    }
}
