// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use std::net::SocketAddr;
use std::sync::Arc;

use freebox_exporter::{
    AppState, ApplicationIdentity, Config, HttpTransport, MetricsRegistry, Result, Session,
    Transport, create_router, start_collection_loop,
};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    setup_tracing();

    let config = Config::from_env();
    tracing::info!(
        "Polling {} endpoint(s) on {}",
        config.poll_endpoints.len(),
        config.base_url
    );
    for endpoint in &config.poll_endpoints {
        tracing::info!("  - {}", config.endpoint_url(endpoint));
    }

    // Startup-fatal: host name lookup, token, trust store, first login
    let identity = Arc::new(ApplicationIdentity::resolve(&config.identity).map_err(|e| {
        tracing::error!("Cannot resolve application identity: {}", e);
        e
    })?);
    tracing::info!(
        "Application identity: {} ({}) on {}",
        identity.app_name,
        identity.app_id,
        identity.device_name
    );

    let app_token = config.load_app_token().map_err(|e| {
        tracing::error!("Cannot load app token: {}", e);
        e
    })?;

    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::new(&config.transport).map_err(|e| {
            tracing::error!("Cannot build HTTPS transport: {}", e);
            e
        })?);

    let session = Arc::new(
        Session::new(
            transport,
            identity,
            app_token,
            &config.base_url,
            &config.retry,
        )
        .await
        .map_err(|e| {
            tracing::error!("Initial Freebox login failed: {}", e);
            e
        })?,
    );

    let metrics = MetricsRegistry::new();

    let state = Arc::new(AppState {
        config: config.clone(),
        metrics: metrics.clone(),
        session: session.clone(),
    });

    // Graceful shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn({
        let shutdown_tx = shutdown_tx.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
        }
    });

    let collection = start_collection_loop(
        shutdown_rx.clone(),
        Arc::new(config.clone()),
        metrics,
        session,
    );

    let app = create_router(state);

    let addr: SocketAddr = config.server_addr.parse().map_err(|e| {
        tracing::error!("Invalid server address: {}", e);
        e
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind address: {}", e);
        e
    })?;

    tracing::info!("Freebox Exporter starting on {}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  - GET /health  - Session health");
    tracing::info!("  - GET /metrics - Prometheus metrics");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.clone().changed().await;
            tracing::info!("HTTP server shutting down");
        })
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            e
        })?;

    let _ = collection.await;
    Ok(())
}

fn setup_tracing() {
    // RUST_LOG wins; "info" otherwise
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
