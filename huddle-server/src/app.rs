use crate::config::{ServerConfig, TlsConfig};
use crate::relay::{Relay, RelayCommand};
use crate::signaling::{ConnectionRegistry, SignalingService, ws_handler};
use anyhow::Context;
use axum::Router;
use axum::routing::get;
use huddle_core::IceServerConfig;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

const RELAY_QUEUE: usize = 256;

/// Spawns the relay actor and returns the handle WebSocket handlers share.
pub fn start_relay(ice_servers: Vec<IceServerConfig>) -> (SignalingService, JoinHandle<()>) {
    let (relay_tx, relay_rx) = mpsc::channel::<RelayCommand>(RELAY_QUEUE);
    let registry = ConnectionRegistry::new();

    let relay = Relay::new(relay_rx, Arc::new(registry.clone()));
    let handle = tokio::spawn(relay.run());

    (SignalingService::new(registry, relay_tx, ice_servers), handle)
}

pub fn build_router(service: SignalingService, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .fallback_service(
            ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html"))),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let (service, _relay) = start_relay(config.ice_servers.clone());
    let app = build_router(service, &config.static_dir);

    match &config.tls {
        Some(tls) => serve_tls(app, &config, tls).await,
        None => {
            let listener = TcpListener::bind(config.addr)
                .await
                .with_context(|| format!("failed to bind {}", config.addr))?;
            info!("Signaling server listening on http://{}", config.addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("server error")
        }
    }
}

async fn serve_tls(app: Router, config: &ServerConfig, tls: &TlsConfig) -> anyhow::Result<()> {
    use axum_server::Handle;
    use axum_server::tls_rustls::RustlsConfig;

    let rustls = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .with_context(|| {
            format!(
                "failed to load TLS certificate {} / key {}",
                tls.cert_path.display(),
                tls.key_path.display()
            )
        })?;

    let handle = Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        async move {
            shutdown_signal().await;
            handle.graceful_shutdown(None);
        }
    });

    info!("Signaling server listening on https://{}", config.addr);
    axum_server::bind_rustls(config.addr, rustls)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
