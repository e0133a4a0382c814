//! Multiroom Bridge
//!
//! Bridges an MPC-HC style web-API media player into home automation as a
//! single media-player entity.

use multiroom_bridge::{adapter, bus, config, poller};

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "multiroom_bridge=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Multiroom Bridge v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = config::load_config()?;

    // Create event bus
    let bus = bus::create_bus();

    // Initialize the adapter and enable polling
    let player = Arc::new(adapter::MultiroomAdapter::new(
        config.name.clone(),
        &config.host,
        config.port,
        bus.clone(),
    )?);
    tracing::info!(
        "Multiroom adapter initialized for {}",
        player.endpoint()
    );
    player.turn_on().await;

    // Drive polls at the configured cadence
    let shutdown = CancellationToken::new();
    let poll_task = tokio::spawn(
        poller::Poller::new(player.clone(), bus.clone(), shutdown.clone())
            .run(Duration::from_secs(config.poll_interval_secs)),
    );

    shutdown_signal().await;

    // Cleanup: stop polling, stop the device
    shutdown.cancel();
    let _ = poll_task.await;
    player.turn_off().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
