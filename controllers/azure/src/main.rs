//! Azure Provider
//!
//! Reconciles Kubernetes custom resources describing Azure resources:
//! - ResourceGroup
//! - Redis caches
//! - MySQL and PostgreSQL servers, their firewall and virtual network rules
//! - CosmosDB accounts
//! - VirtualNetwork, Subnet and SecurityGroup
//!
//! Credentials come from `ProviderConfig` objects pointing at service principal
//! secrets. Metrics and probes are served on `METRICS_PORT`.

mod backoff;
mod config;
mod controller;
mod error;
mod managed;
mod metrics;
mod reconcile_helpers;
mod reconciler;
mod server;
#[cfg(test)]
mod test_utils;
mod watcher;

use anyhow::Context;
use config::Config;
use controller::Controller;
use server::{ServerState, start_server};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if rustls::crypto::ring::default_provider().install_default().is_err()
        && rustls::crypto::CryptoProvider::get_default().is_none()
    {
        anyhow::bail!("Failed to install rustls crypto provider");
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "provider_azure=info".into()),
        )
        .init();

    info!("Starting Azure Provider");

    let config = Config::from_env().context("Invalid configuration")?;
    info!("Configuration:");
    info!("  Poll interval: {:?}", config.poll_interval);
    info!("  Short wait: {:?}", config.short_wait);
    info!("  Reconcile concurrency: {}", config.reconcile_concurrency);
    info!("  Metrics port: {}", config.metrics_port);

    metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_port = config.metrics_port;
    let state = Arc::clone(&server_state);
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, state).await {
            error!("HTTP server error: {}", e);
        }
    });

    let controller = Controller::new(config).await?;
    controller.run(server_state).await?;

    Ok(())
}
