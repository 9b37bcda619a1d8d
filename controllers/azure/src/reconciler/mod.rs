//! Reconciliation logic for Azure managed resources.
//!
//! This module is organized by Azure service:
//! - `resource_group`: Resource groups
//! - `redis`: Azure Cache for Redis
//! - `sql_server`, `firewall_rule`, `virtual_network_rule`: MySQL/PostgreSQL servers and their rules
//! - `cosmosdb`: CosmosDB accounts
//! - `virtual_network`, `subnet`, `security_group`: Networking
//! - `provider_config`: Credential checks for ProviderConfigs
//!
//! Each kind implements [`ManagedKind`]; the lifecycle itself lives in
//! [`crate::managed`].

pub mod cosmosdb;
#[cfg(test)]
mod cosmosdb_test;
pub mod firewall_rule;
pub mod provider_config;
pub mod redis;
pub mod resource_group;
pub mod security_group;
pub mod sql_server;
#[cfg(test)]
mod sql_server_test;
pub mod subnet;
pub mod virtual_network;
pub mod virtual_network_rule;

use crate::backoff::BackoffTracker;
use crate::config::Config;
use crate::error::ControllerError;
use crate::managed::{
    Connector, KubeConnector, KubeReferenceLookup, KubeStore, ManagedKind, ManagedReconciler,
    ReconcileOutcome, ReferenceLookup,
};
use crate::metrics;
use azure_client::AzureError;
use kube::{Client, Resource, ResourceExt};
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Turn an Azure 404 into `None`
pub(crate) fn found<T>(result: Result<T, AzureError>) -> Result<Option<T>, ControllerError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Key identifying a resource in backoff state and logs
pub(crate) fn resource_key<R: Resource<DynamicType = ()>>(resource: &R) -> String {
    format!("{}/{}", R::kind(&()), resource.name_any())
}

/// Reconciles Azure managed resources.
pub struct Reconciler {
    pub(crate) client: Client,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) references: Arc<dyn ReferenceLookup>,
    pub(crate) config: Config,
    /// Retry delays of failing resources (kind/name -> backoff)
    backoff: BackoffTracker,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(client: Client, config: Config) -> Self {
        Self {
            connector: Arc::new(KubeConnector::new(client.clone())),
            references: Arc::new(KubeReferenceLookup::new(client.clone())),
            client,
            config,
            backoff: BackoffTracker::default(),
        }
    }

    /// Run one pass of the managed lifecycle for a resource of any kind
    pub async fn reconcile_managed<R: ManagedKind>(&self, resource: &R) -> Result<Action, ControllerError> {
        let key = resource_key(resource);
        let kind = R::kind(&()).to_string();
        let started = Instant::now();

        let store = KubeStore::<R>::new(self.client.clone());
        let reconciler = ManagedReconciler {
            connector: self.connector.as_ref(),
            store: &store,
            references: self.references.as_ref(),
            poll_interval: self.config.poll_interval,
            short_wait: self.config.short_wait,
        };
        let result = reconciler.reconcile(resource).await;
        metrics::record_reconciliation(&kind, result.is_ok(), started.elapsed().as_secs_f64());

        let outcome = result?;
        debug!("Reconciled {}: {:?}", key, outcome);
        Ok(action_for(outcome))
    }

    /// Delay before retrying a resource whose reconciliation failed
    pub fn error_backoff(&self, key: &str) -> Duration {
        self.backoff.next_for(key)
    }

    /// Forget past failures of a resource that reconciled successfully
    pub fn reset_backoff(&self, key: &str) {
        self.backoff.reset(key);
    }
}

/// Map a lifecycle outcome to a controller action
pub(crate) fn action_for(outcome: ReconcileOutcome) -> Action {
    match outcome {
        ReconcileOutcome::Requeue(after) => Action::requeue(after),
        ReconcileOutcome::Done => Action::await_change(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_maps_not_found_to_none() {
        let missing: Result<u32, AzureError> = Err(AzureError::NotFound("gone".to_string()));
        assert_eq!(found(missing).unwrap(), None);

        let present: Result<u32, AzureError> = Ok(7);
        assert_eq!(found(present).unwrap(), Some(7));
    }

    #[test]
    fn test_found_keeps_other_errors() {
        let failed: Result<u32, AzureError> = Err(AzureError::Api {
            status: 500,
            code: "InternalServerError".to_string(),
            message: "boom".to_string(),
        });
        assert!(matches!(found(failed), Err(ControllerError::Azure(_))));
    }

    #[test]
    fn test_action_for_outcome() {
        assert_eq!(
            action_for(ReconcileOutcome::Requeue(Duration::from_secs(30))),
            Action::requeue(Duration::from_secs(30))
        );
        assert_eq!(action_for(ReconcileOutcome::Done), Action::await_change());
    }

    #[test]
    fn test_resource_key() {
        let group = crate::test_utils::create_test_resource_group("rg", "westeurope");
        assert_eq!(resource_key(&group), "ResourceGroup/rg");
    }
}
