//! Kubernetes resource watchers.
//!
//! Every kind is watched through the generic [`watch_resource`] helper, which
//! runs a `kube_runtime::Controller` with the configured debounce and
//! concurrency. Failed reconciliations are retried with a per-resource
//! Fibonacci backoff; a success resets it.

use crate::error::ControllerError;
use crate::managed::ManagedKind;
use crate::reconciler::{Reconciler, resource_key};
use crds::ProviderConfig;
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use kube::{Api, Client, Resource};
use kube_runtime::controller::{Action, Config as ControllerConfig};
use kube_runtime::{Controller, watcher};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Reconcile function of one kind
type ReconcileFn<K> = fn(Arc<Reconciler>, Arc<K>) -> BoxFuture<'static, Result<Action, ControllerError>>;

/// Watch all objects of one kind and reconcile them until the watch ends.
pub async fn watch_resource<K>(
    api: Api<K>,
    reconciler: Arc<Reconciler>,
    reconcile_fn: ReconcileFn<K>,
) -> Result<(), ControllerError>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static + std::fmt::Debug + serde::de::DeserializeOwned,
{
    let kind = K::kind(&()).to_string();
    info!("Starting {} watcher", kind);

    let error_policy = |obj: Arc<K>, error: &ControllerError, ctx: Arc<Reconciler>| {
        let key = resource_key(obj.as_ref());
        let delay = ctx.error_backoff(&key);
        warn!("Reconciliation of {} failed, retrying in {:?}: {}", key, delay, error);
        Action::requeue(delay)
    };

    let reconcile = move |obj: Arc<K>, ctx: Arc<Reconciler>| async move {
        let key = resource_key(obj.as_ref());
        debug!("Reconciling {}", key);
        let action = reconcile_fn(Arc::clone(&ctx), obj).await?;
        ctx.reset_backoff(&key);
        Ok::<_, ControllerError>(action)
    };

    let controller_config = ControllerConfig::default()
        .debounce(reconciler.config.debounce)
        .concurrency(reconciler.config.reconcile_concurrency);

    Controller::new(api, watcher::Config::default())
        .with_config(controller_config)
        .run(reconcile, error_policy, reconciler)
        .for_each(|res| {
            let kind = kind.clone();
            async move {
                if let Err(e) = res {
                    error!("Controller error for {}: {}", kind, e);
                }
            }
        })
        .await;

    Err(ControllerError::Watch(format!("{} watch stream ended", K::kind(&()))))
}

/// Watch a managed kind, running the managed lifecycle on every object
pub async fn watch_managed<K: ManagedKind>(client: Client, reconciler: Arc<Reconciler>) -> Result<(), ControllerError> {
    let api: Api<K> = Api::all(client);
    watch_resource(api, reconciler, |ctx, obj| {
        async move { ctx.reconcile_managed(obj.as_ref()).await }.boxed()
    })
    .await
}

/// Watch ProviderConfigs, checking their credentials
pub async fn watch_provider_configs(client: Client, reconciler: Arc<Reconciler>) -> Result<(), ControllerError> {
    let api: Api<ProviderConfig> = Api::all(client);
    watch_resource(api, reconciler, |ctx, obj| {
        async move { ctx.reconcile_provider_config(obj.as_ref()).await }.boxed()
    })
    .await
}
