//! Full negotiation over a real listener with the client SDK.

use std::sync::Arc;
use std::time::Duration;

use signaling_client::{ClientError, SessionDescription, SignalingClient};

use rtc_signaling::config::{AdapterKind, SignalingConfig};
use rtc_signaling::peer::LoopbackFactory;
use rtc_signaling::security::{AllowAll, BearerToken};
use rtc_signaling::SessionRegistry;

mod common;
use common::{start_server, BASE};

fn answer_for(offer: &SessionDescription) -> SessionDescription {
    SessionDescription {
        sdp: offer.sdp.replace("o=-", "o=answerer"),
        kind: "answer".to_string(),
    }
}

#[tokio::test]
async fn test_loopback_negotiation_over_http() {
    for adapter in [AdapterKind::Middleware, AdapterKind::Interception] {
        let mut config = SignalingConfig::default();
        config.signaling.adapter = adapter;
        let registry = Arc::new(SessionRegistry::new(LoopbackFactory, AllowAll));
        let (addr, shutdown, handle) = start_server(config, registry.clone()).await;
        let client = SignalingClient::new(&format!("http://{addr}{BASE}"));

        let created = client.create().await.unwrap();
        assert_eq!(created.id.len(), 24);
        assert_eq!(created.local_description.kind, "offer");

        assert!(client.poll_candidates(&created.id).await.unwrap().is_empty());

        client
            .set_remote_description(&created.id, &answer_for(&created.local_description))
            .await
            .unwrap();

        let candidates = client.poll_candidates(&created.id).await.unwrap();
        assert_eq!(candidates.len(), 1, "{adapter:?}");
        assert!(candidates[0].candidate.contains("typ host"));
        assert!(client.poll_candidates(&created.id).await.unwrap().is_empty());

        // A second answer is rejected by the engine.
        let again = client
            .set_remote_description(&created.id, &answer_for(&created.local_description))
            .await;
        assert!(matches!(again, Err(ClientError::Status(400))));

        client.close(&created.id).await.unwrap();
        let gone = client.poll_candidates(&created.id).await;
        assert!(matches!(gone, Err(ClientError::Status(404))));

        let host = reqwest::get(format!("http://{addr}/health")).await.unwrap();
        assert_eq!(host.status(), 200);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_shutdown_closes_open_sessions() {
    let registry = Arc::new(SessionRegistry::new(LoopbackFactory, AllowAll));
    let (addr, shutdown, handle) = start_server(SignalingConfig::default(), registry.clone()).await;
    let client = SignalingClient::new(&format!("http://{addr}{BASE}"));

    for _ in 0..3 {
        client.create().await.unwrap();
    }
    assert_eq!(registry.len(), 3);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_bearer_token_over_http() {
    let registry = Arc::new(SessionRegistry::new(LoopbackFactory, BearerToken::new("s3cret")));
    let (addr, shutdown, _handle) = start_server(SignalingConfig::default(), registry).await;
    let base = format!("http://{addr}{BASE}");

    let anonymous = SignalingClient::new(&base).create().await;
    assert!(matches!(anonymous, Err(ClientError::Status(401))));

    let authorized = SignalingClient::new(&base)
        .with_authorization("Bearer s3cret")
        .create()
        .await;
    assert!(authorized.is_ok());

    shutdown.trigger();
}

#[tokio::test]
async fn test_cors_preflight_over_http() {
    let mut config = SignalingConfig::default();
    config.cors.allowed_origins = vec!["https://game.example".to_string()];
    config.cors.allow_authorization = true;
    let registry = Arc::new(SessionRegistry::new(LoopbackFactory, AllowAll));
    let (addr, shutdown, _handle) = start_server(config, registry).await;

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("http://{addr}{BASE}/connections"))
        .header("origin", "https://game.example")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "https://game.example");
    assert_eq!(headers["access-control-allow-headers"], "authorization, content-type");

    shutdown.trigger();
}
