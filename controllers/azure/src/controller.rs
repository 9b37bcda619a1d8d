//! Main controller implementation.
//!
//! The `Controller` owns one watcher task per kind: the twelve managed Azure
//! kinds and `ProviderConfig`. The provider is ready once every watcher has
//! been started and stops as soon as any of them ends.

use crate::config::Config;
use crate::error::ControllerError;
use crate::managed::ManagedKind;
use crate::reconciler::Reconciler;
use crate::server::ServerState;
use crate::watcher::{watch_managed, watch_provider_configs};
use crds::{
    CosmosDBAccount, MySQLServer, MySQLServerFirewallRule, MySQLServerVirtualNetworkRule, PostgreSQLServer,
    PostgreSQLServerFirewallRule, PostgreSQLServerVirtualNetworkRule, Redis, ResourceGroup, SecurityGroup, Subnet,
    VirtualNetwork,
};
use futures::future::select_all;
use kube::Client;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::task::JoinHandle;
use tracing::{error, info};

type WatcherTask = JoinHandle<Result<(), ControllerError>>;

/// Main controller for Azure managed resources.
pub struct Controller {
    client: Client,
    reconciler: Arc<Reconciler>,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("reconciler", &self.reconciler)
            .finish_non_exhaustive()
    }
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Initializing Azure provider");
        let client = Client::try_default().await?;
        let reconciler = Arc::new(Reconciler::new(client.clone(), config));
        Ok(Self { client, reconciler })
    }

    fn spawn<K: ManagedKind>(&self) -> (String, WatcherTask) {
        let client = self.client.clone();
        let reconciler = Arc::clone(&self.reconciler);
        let task = tokio::spawn(async move { watch_managed::<K>(client, reconciler).await });
        (K::kind(&()).to_string(), task)
    }

    /// Start every watcher and run until one of them stops
    pub async fn run(self, state: Arc<ServerState>) -> Result<(), ControllerError> {
        let mut watchers = vec![
            self.spawn::<ResourceGroup>(),
            self.spawn::<Redis>(),
            self.spawn::<MySQLServer>(),
            self.spawn::<PostgreSQLServer>(),
            self.spawn::<MySQLServerFirewallRule>(),
            self.spawn::<PostgreSQLServerFirewallRule>(),
            self.spawn::<MySQLServerVirtualNetworkRule>(),
            self.spawn::<PostgreSQLServerVirtualNetworkRule>(),
            self.spawn::<CosmosDBAccount>(),
            self.spawn::<VirtualNetwork>(),
            self.spawn::<Subnet>(),
            self.spawn::<SecurityGroup>(),
        ];
        let client = self.client.clone();
        let reconciler = Arc::clone(&self.reconciler);
        watchers.push((
            "ProviderConfig".to_string(),
            tokio::spawn(async move { watch_provider_configs(client, reconciler).await }),
        ));

        let (kinds, tasks): (Vec<String>, Vec<WatcherTask>) = watchers.into_iter().unzip();
        state.is_ready.store(true, Ordering::Relaxed);
        info!("Azure provider running with {} watchers", tasks.len());

        // Watchers run forever; the first one to return ends the provider
        let (result, index, _remaining) = select_all(tasks).await;
        state.is_ready.store(false, Ordering::Relaxed);
        let kind = &kinds[index];

        match result {
            Ok(Ok(())) => Err(ControllerError::Watch(format!("{} watcher stopped", kind))),
            Ok(Err(e)) => {
                error!("{} watcher failed: {}", kind, e);
                Err(e)
            }
            Err(e) => Err(ControllerError::Watch(format!("{} watcher panicked: {}", kind, e))),
        }
    }
}
