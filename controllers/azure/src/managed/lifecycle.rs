//! Generic managed resource reconciliation
//!
//! One pass of the loop, identical for every kind:
//!
//! 1. Deletion: orphan, or delete the external resource and wait for it to go away
//! 2. Resolve references and persist the resolved spec
//! 3. Add the finalizer
//! 4. Connect to Azure with the resource's ProviderConfig
//! 5. Observe the external resource
//! 6. Create it when it does not exist
//! 7. Persist late-initialized spec fields
//! 8. Publish connection details
//! 9. Update it when it is not up to date
//!
//! Every failure is recorded as `Synced=False` before being returned to the watcher.

use super::{ConnectionDetails, Connector, ExternalClient, ManagedKind, ManagedStore, ReferenceLookup};
use crate::error::ControllerError;
use crate::metrics;
use crds::{Condition, DeletionPolicy, Managed};
use kube::ResourceExt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What the watcher should do after a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Reconcile again after the given delay
    Requeue(Duration),
    /// Nothing left to do until the resource changes
    Done,
}

/// Runs the managed lifecycle for one kind
pub struct ManagedReconciler<'a, R: ManagedKind> {
    pub connector: &'a dyn Connector,
    pub store: &'a dyn ManagedStore<R>,
    pub references: &'a dyn ReferenceLookup,
    /// Requeue delay once in sync
    pub poll_interval: Duration,
    /// Requeue delay while Azure is creating or deleting
    pub short_wait: Duration,
}

impl<R: ManagedKind> std::fmt::Debug for ManagedReconciler<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedReconciler")
            .field("poll_interval", &self.poll_interval)
            .field("short_wait", &self.short_wait)
            .finish_non_exhaustive()
    }
}

/// A resource together with the status last persisted for it
struct Tracked<R: Managed> {
    resource: R,
    persisted: Option<R::Status>,
}

impl<'a, R: ManagedKind> ManagedReconciler<'a, R> {
    /// Reconcile one resource
    pub async fn reconcile(&self, resource: &R) -> Result<ReconcileOutcome, ControllerError> {
        let mut tracked = Tracked {
            resource: resource.clone(),
            persisted: resource.managed_status().cloned(),
        };

        if tracked.resource.is_being_deleted() {
            return self.reconcile_delete(&mut tracked).await;
        }

        // References
        match tracked.resource.resolve_references(self.references).await {
            Ok(true) => {
                if let Err(e) = self.store.update_spec(&tracked.resource).await {
                    return Err(self.fail(&mut tracked, e).await);
                }
            }
            Ok(false) => {}
            Err(e) => return Err(self.fail(&mut tracked, e).await),
        }

        if let Err(e) = self.store.add_finalizer(&mut tracked.resource).await {
            return Err(self.fail(&mut tracked, e).await);
        }

        let external = match self.connect(&tracked.resource).await {
            Ok(external) => external,
            Err(e) => return Err(self.fail(&mut tracked, e).await),
        };

        let observation = match self.observe(external.as_ref(), &mut tracked.resource).await {
            Ok(observation) => observation,
            Err(e) => return Err(self.fail(&mut tracked, e).await),
        };

        if !observation.resource_exists {
            return self.reconcile_create(external.as_ref(), &mut tracked).await;
        }

        if observation.resource_late_initialized {
            if let Err(e) = self.store.update_spec(&tracked.resource).await {
                return Err(self.fail(&mut tracked, e).await);
            }
        }

        if let Err(e) = self.publish(&tracked.resource, &observation.connection_details).await {
            return Err(self.fail(&mut tracked, e).await);
        }

        if observation.resource_up_to_date {
            debug!("{} {} is up to date", kind::<R>(), tracked.resource.name_any());
        } else {
            info!("Updating {} {} in Azure", kind::<R>(), tracked.resource.name_any());
            let result = external.update(&mut tracked.resource).await;
            metrics::record_external_operation(&kind::<R>(), "Update", result.is_ok());
            if let Err(e) = result {
                return Err(self.fail(&mut tracked, e).await);
            }
        }

        tracked.resource.set_conditions([Condition::reconcile_success()]);
        self.save(&mut tracked).await?;
        Ok(ReconcileOutcome::Requeue(self.poll_interval))
    }

    async fn reconcile_delete(&self, tracked: &mut Tracked<R>) -> Result<ReconcileOutcome, ControllerError> {
        let name = tracked.resource.name_any();

        if tracked.resource.deletion_policy() == DeletionPolicy::Orphan {
            info!("{} {} is orphaned, leaving the Azure resource in place", kind::<R>(), name);
            self.store.remove_finalizer(&mut tracked.resource).await?;
            return Ok(ReconcileOutcome::Done);
        }

        let external = match self.connect(&tracked.resource).await {
            Ok(external) => external,
            Err(e) => return Err(self.fail(tracked, e).await),
        };

        let observation = match self.observe(external.as_ref(), &mut tracked.resource).await {
            Ok(observation) => observation,
            Err(e) => return Err(self.fail(tracked, e).await),
        };

        if observation.resource_exists {
            info!("Deleting {} {} from Azure", kind::<R>(), name);
            tracked.resource.set_conditions([Condition::deleting()]);
            let result = external.delete(&mut tracked.resource).await;
            metrics::record_external_operation(&kind::<R>(), "Delete", result.is_ok());
            if let Err(e) = result {
                return Err(self.fail(tracked, e).await);
            }
            tracked.resource.set_conditions([Condition::reconcile_success()]);
            self.save(tracked).await?;
            return Ok(ReconcileOutcome::Requeue(self.short_wait));
        }

        info!("{} {} is gone from Azure, releasing the object", kind::<R>(), name);
        self.store.unpublish_connection(&tracked.resource).await?;
        self.store.remove_finalizer(&mut tracked.resource).await?;
        Ok(ReconcileOutcome::Done)
    }

    async fn reconcile_create(
        &self,
        external: &dyn ExternalClient<R>,
        tracked: &mut Tracked<R>,
    ) -> Result<ReconcileOutcome, ControllerError> {
        info!("Creating {} {} in Azure", kind::<R>(), tracked.resource.name_any());
        tracked.resource.set_conditions([Condition::creating()]);

        let result = external.create(&mut tracked.resource).await;
        metrics::record_external_operation(&kind::<R>(), "Create", result.is_ok());
        let creation = match result {
            Ok(creation) => creation,
            Err(e) => return Err(self.fail(tracked, e).await),
        };

        if let Err(e) = self.publish(&tracked.resource, &creation.connection_details).await {
            return Err(self.fail(tracked, e).await);
        }

        tracked.resource.set_conditions([Condition::reconcile_success()]);
        self.save(tracked).await?;
        Ok(ReconcileOutcome::Requeue(self.short_wait))
    }

    async fn connect(&self, resource: &R) -> Result<Box<dyn ExternalClient<R>>, ControllerError> {
        let azure = self.connector.connect(resource.provider_config_name()).await?;
        Ok(R::external_client(azure))
    }

    async fn observe(
        &self,
        external: &dyn ExternalClient<R>,
        resource: &mut R,
    ) -> Result<super::ExternalObservation, ControllerError> {
        let result = external.observe(resource).await;
        metrics::record_external_operation(&kind::<R>(), "Observe", result.is_ok());
        result
    }

    async fn publish(&self, resource: &R, details: &ConnectionDetails) -> Result<(), ControllerError> {
        if details.is_empty() {
            return Ok(());
        }
        self.store.publish_connection(resource, details).await
    }

    /// Persist the status if it changed since it was last persisted
    async fn save(&self, tracked: &mut Tracked<R>) -> Result<(), ControllerError> {
        let current = tracked.resource.managed_status();
        if current == tracked.persisted.as_ref() {
            return Ok(());
        }
        self.store
            .update_status(tracked.persisted.as_ref(), &tracked.resource)
            .await?;
        tracked.persisted = current.cloned();
        Ok(())
    }

    /// Record a reconcile error in status and hand the error back
    async fn fail(&self, tracked: &mut Tracked<R>, error: ControllerError) -> ControllerError {
        warn!(
            "Reconciling {} {} failed: {}",
            kind::<R>(),
            tracked.resource.name_any(),
            error
        );
        tracked
            .resource
            .set_conditions([Condition::reconcile_error(error.to_string())]);
        if let Err(e) = self.save(tracked).await {
            warn!("Failed to record error on {} {}: {}", kind::<R>(), tracked.resource.name_any(), e);
        }
        error
    }
}

fn kind<R: ManagedKind>() -> String {
    R::kind(&()).to_string()
}
