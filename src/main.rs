//! vzp-gateway server entry point.
//!
//! Restores the persisted state and starts the Axum HTTP server with REST
//! and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use vzp_gateway::api;
use vzp_gateway::app_state::AppState;
use vzp_gateway::config::VzpConfig;
use vzp_gateway::domain::EventBus;
use vzp_gateway::persistence::SnapshotStore;
use vzp_gateway::platform::{AdapterHub, Collaborators, MemberDirectory};
use vzp_gateway::service::VzpService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(VzpConfig::from_env().context("invalid configuration")?);
    tracing::info!(
        addr = %config.listen_addr,
        data_dir = %config.data_dir.display(),
        join_policy = ?config.join_policy,
        "starting vzp-gateway"
    );
    if config.tier_roles.is_empty() {
        tracing::warn!("TIER_ROLES is empty; nobody can sign up");
    }
    if config.admin_roles.is_empty() {
        tracing::warn!("ADMIN_ROLES is empty; operator commands are disabled");
    }

    // Collaborators
    let event_bus = EventBus::new(config.event_bus_capacity);
    let directory = Arc::new(MemberDirectory::new());
    let adapter = Arc::new(AdapterHub::new(
        config.adapter_timeout,
        config.adapter_token.clone(),
    ));
    let collaborators =
        Collaborators::over_adapter(Arc::clone(&directory) as _, Arc::clone(&adapter));

    // Service layer
    let snapshots = Arc::new(SnapshotStore::new(config.data_dir.clone()));
    let vzp_service = Arc::new(VzpService::new(
        Arc::clone(&config),
        event_bus.clone(),
        collaborators,
        snapshots,
    ));
    vzp_service
        .load()
        .await
        .context("failed to restore persisted state")?;

    let app = api::build_app(AppState {
        vzp_service,
        event_bus,
        directory,
        adapter,
    });

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
