//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceExt;

use rtc_signaling::config::SignalingConfig;
use rtc_signaling::lifecycle::Shutdown;
use rtc_signaling::peer::{
    IceCandidate, PeerConnection, PeerContext, PeerError, PeerFactory, SdpType,
    SessionDescription,
};
use rtc_signaling::security::AllowAll;
use rtc_signaling::{SessionRegistry, SignalingServer};

pub const BASE: &str = "/.wrtc/v2";

/// A test double engine. Every peer it creates is recorded so tests can
/// push candidates or fire disconnects from the "engine side".
#[derive(Clone, Default)]
pub struct ScriptedFactory {
    pub contexts: Arc<Mutex<Vec<PeerContext>>>,
    pub closed: Arc<Mutex<Vec<String>>>,
    pub empty_offer: bool,
}

impl ScriptedFactory {
    pub fn context(&self, id: &str) -> PeerContext {
        self.contexts
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id.as_str() == id)
            .cloned()
            .expect("no peer created for id")
    }

    pub fn closed_ids(&self) -> Vec<String> {
        self.closed.lock().unwrap().clone()
    }
}

#[async_trait]
impl PeerFactory for ScriptedFactory {
    async fn create(&self, context: PeerContext) -> Result<Box<dyn PeerConnection>, PeerError> {
        self.contexts.lock().unwrap().push(context.clone());
        Ok(Box::new(ScriptedPeer {
            context,
            closed: self.closed.clone(),
            empty_offer: self.empty_offer,
        }))
    }
}

struct ScriptedPeer {
    context: PeerContext,
    closed: Arc<Mutex<Vec<String>>>,
    empty_offer: bool,
}

#[async_trait]
impl PeerConnection for ScriptedPeer {
    async fn local_description(&self) -> Result<SessionDescription, PeerError> {
        if self.empty_offer {
            return Ok(SessionDescription::offer(""));
        }
        Ok(SessionDescription::offer("v=0\r\no=- 1 2 IN IP4 127.0.0.1\r\n"))
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<(), PeerError> {
        if description.kind != SdpType::Answer {
            return Err(PeerError::InvalidDescription("expected an answer".into()));
        }
        self.context.candidates.push(candidate("candidate:1 1 UDP 1 127.0.0.1 5000 typ host"));
        Ok(())
    }

    async fn close(&self) {
        self.closed.lock().unwrap().push(self.context.id.to_string());
    }
}

pub fn candidate(text: &str) -> IceCandidate {
    IceCandidate {
        candidate: text.to_string(),
        sdp_mid: Some("0".to_string()),
        sdp_m_line_index: Some(0),
    }
}

pub fn registry(factory: &ScriptedFactory) -> Arc<SessionRegistry> {
    Arc::new(SessionRegistry::new(factory.clone(), AllowAll))
}

/// The fully layered application with demo host routes.
pub fn app(config: SignalingConfig, registry: Arc<SessionRegistry>) -> Router {
    SignalingServer::new(config, registry).into_router()
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
    Reply { status, headers, body }
}

pub fn post(path: &str, body: impl Into<Body>) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub fn get(path: &str) -> Request<Body> {
    Request::get(path).body(Body::empty()).unwrap()
}

/// Create a session in-process and return its id.
pub async fn create(app: &Router) -> String {
    let reply = send(app, post(&format!("{BASE}/connections"), Body::empty())).await;
    assert_eq!(reply.status, StatusCode::OK);
    reply.json()["id"].as_str().unwrap().to_string()
}

/// Start a real server on an ephemeral port.
pub async fn start_server(
    config: SignalingConfig,
    registry: Arc<SessionRegistry>,
) -> (SocketAddr, Shutdown, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = SignalingServer::new(config, registry);
    let handle = tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown, handle)
}
