//! WebRTC HTTP Signaling Server
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser                 ┌──────────────────────────────────────────────┐
//!     ───────────────────────▶│ http::server (trace, request id, timeout)    │
//!                             │       │                                      │
//!                             │       ▼                                      │
//!                             │ adapter: middleware | interception           │
//!                             │       │ owned path?          │ no            │
//!                             │       ▼                      ▼               │
//!                             │ routing::SignalingRouter   host routes       │
//!                             │       │                                      │
//!                             │       ▼                                      │
//!                             │ session::SessionRegistry ──▶ peer engine     │
//!                             │   (DashMap of sessions)      (PeerFactory)   │
//!                             └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use rtc_signaling::config::{load_config, SignalingConfig};
use rtc_signaling::lifecycle::{wait_for_signal, Shutdown};
use rtc_signaling::observability::{logging, metrics};
use rtc_signaling::peer::LoopbackFactory;
use rtc_signaling::security::{AllowAll, BearerToken};
use rtc_signaling::session::SessionRegistry;
use rtc_signaling::SignalingServer;

#[derive(Parser, Debug)]
#[command(name = "rtc-signaling", version, about = "WebRTC HTTP signaling server")]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SignalingConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rtc-signaling starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = if config.auth.bearer_token.is_empty() {
        SessionRegistry::new(LoopbackFactory, AllowAll)
    } else {
        tracing::info!("Bearer token authorization enabled");
        SessionRegistry::new(LoopbackFactory, BearerToken::new(&config.auth.bearer_token))
    };
    let registry = Arc::new(registry);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    SignalingServer::new(config, registry).run(listener, shutdown_rx).await?;

    tracing::info!("rtc-signaling stopped");
    Ok(())
}
