//! Persistence of managed resources
//!
//! The lifecycle never writes to the API server directly; it goes through a
//! [`ManagedStore`] so that tests can run it against an in-memory store.

use super::{ConnectionDetails, FINALIZER};
use crate::error::ControllerError;
use crds::Managed;
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{DeleteParams, ObjectMeta, Patch, PatchParams, PostParams};
use kube::{Api, Client, Resource, ResourceExt};
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use tracing::{debug, info};

/// Secret type of connection secrets
pub const CONNECTION_SECRET_TYPE: &str = "connection.crossplane.io/v1alpha1";

/// Reads and writes managed resources and their connection secrets
#[async_trait::async_trait]
pub trait ManagedStore<R: Managed>: Send + Sync {
    /// Persist the status of `resource`; `previous` is the last persisted status
    async fn update_status(&self, previous: Option<&R::Status>, resource: &R) -> Result<(), ControllerError>;

    /// Persist the spec of `resource` (resolved references, late initialization)
    async fn update_spec(&self, resource: &R) -> Result<(), ControllerError>;

    async fn add_finalizer(&self, resource: &mut R) -> Result<(), ControllerError>;

    async fn remove_finalizer(&self, resource: &mut R) -> Result<(), ControllerError>;

    /// Merge connection details into the connection secret, creating it if needed
    async fn publish_connection(&self, resource: &R, details: &ConnectionDetails) -> Result<(), ControllerError>;

    /// Delete the connection secret
    async fn unpublish_connection(&self, resource: &R) -> Result<(), ControllerError>;
}

/// Whether the resource carries the finalizer
pub fn has_finalizer<R: Managed>(resource: &R) -> bool {
    resource.finalizers().iter().any(|f| f == FINALIZER)
}

/// JSON merge patch turning `old` into `new`.
///
/// Fields present in `old` and missing from `new` are set to null, so that
/// fields skipped when `None` (such as a cleared `lastOperation`) are removed.
pub fn merge_patch(old: &Value, new: &Value) -> Value {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            let mut patch = serde_json::Map::new();
            for (key, value) in new_map {
                let entry = match old_map.get(key) {
                    Some(old_value) => merge_patch(old_value, value),
                    None => value.clone(),
                };
                patch.insert(key.clone(), entry);
            }
            for key in old_map.keys() {
                if !new_map.contains_key(key) {
                    patch.insert(key.clone(), Value::Null);
                }
            }
            Value::Object(patch)
        }
        _ => new.clone(),
    }
}

/// Store backed by the Kubernetes API
pub struct KubeStore<R> {
    client: Client,
    _kind: PhantomData<fn() -> R>,
}

impl<R> std::fmt::Debug for KubeStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

impl<R> Clone for KubeStore<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _kind: PhantomData,
        }
    }
}

impl<R: Managed> KubeStore<R> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    fn api(&self) -> Api<R> {
        Api::all(self.client.clone())
    }

    async fn patch_finalizers(&self, resource: &mut R, finalizers: Vec<String>) -> Result<(), ControllerError> {
        let patch = serde_json::json!({
            "metadata": {
                "finalizers": finalizers
            }
        });
        self.api()
            .patch(&resource.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        resource.meta_mut().finalizers = Some(finalizers);
        Ok(())
    }
}

#[async_trait::async_trait]
impl<R: Managed> ManagedStore<R> for KubeStore<R> {
    async fn update_status(&self, previous: Option<&R::Status>, resource: &R) -> Result<(), ControllerError> {
        let old = serde_json::to_value(previous)?;
        let new = serde_json::to_value(resource.managed_status())?;
        let patch = serde_json::json!({ "status": merge_patch(&old, &new) });

        self.api()
            .patch_status(&resource.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn update_spec(&self, resource: &R) -> Result<(), ControllerError> {
        let value = serde_json::to_value(resource)?;
        let patch = serde_json::json!({ "spec": value.get("spec").cloned().unwrap_or(Value::Null) });

        self.api()
            .patch(&resource.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        info!("Updated spec of {} {}", R::kind(&()), resource.name_any());
        Ok(())
    }

    async fn add_finalizer(&self, resource: &mut R) -> Result<(), ControllerError> {
        if has_finalizer(resource) {
            return Ok(());
        }
        let mut finalizers = resource.finalizers().to_vec();
        finalizers.push(FINALIZER.to_string());
        self.patch_finalizers(resource, finalizers).await?;
        debug!("Added finalizer to {} {}", R::kind(&()), resource.name_any());
        Ok(())
    }

    async fn remove_finalizer(&self, resource: &mut R) -> Result<(), ControllerError> {
        if !has_finalizer(resource) {
            return Ok(());
        }
        let finalizers = resource
            .finalizers()
            .iter()
            .filter(|f| *f != FINALIZER)
            .cloned()
            .collect();
        self.patch_finalizers(resource, finalizers).await?;
        debug!("Removed finalizer from {} {}", R::kind(&()), resource.name_any());
        Ok(())
    }

    async fn publish_connection(&self, resource: &R, details: &ConnectionDetails) -> Result<(), ControllerError> {
        let Some(target) = resource.connection_secret_ref() else {
            return Ok(());
        };
        if details.is_empty() {
            return Ok(());
        }

        let data: BTreeMap<String, ByteString> = details
            .iter()
            .map(|(k, v)| (k.clone(), ByteString(v.clone())))
            .collect();
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &target.namespace);

        match secrets.get_opt(&target.name).await? {
            None => {
                let secret = Secret {
                    metadata: ObjectMeta {
                        name: Some(target.name.clone()),
                        namespace: Some(target.namespace.clone()),
                        owner_references: resource.controller_owner_ref(&()).map(|r| vec![r]),
                        ..Default::default()
                    },
                    type_: Some(CONNECTION_SECRET_TYPE.to_string()),
                    data: Some(data),
                    ..Default::default()
                };
                secrets.create(&PostParams::default(), &secret).await?;
                info!(
                    "Created connection secret {}/{} for {} {}",
                    target.namespace,
                    target.name,
                    R::kind(&()),
                    resource.name_any()
                );
            }
            Some(existing) => {
                let current = existing.data.unwrap_or_default();
                if data.iter().all(|(k, v)| current.get(k) == Some(v)) {
                    return Ok(());
                }
                let patch = serde_json::json!({ "data": data });
                secrets
                    .patch(&target.name, &PatchParams::default(), &Patch::Merge(&patch))
                    .await?;
                debug!("Updated connection secret {}/{}", target.namespace, target.name);
            }
        }
        Ok(())
    }

    async fn unpublish_connection(&self, resource: &R) -> Result<(), ControllerError> {
        let Some(target) = resource.connection_secret_ref() else {
            return Ok(());
        };
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &target.namespace);
        if secrets.get_opt(&target.name).await?.is_some() {
            secrets.delete(&target.name, &DeleteParams::default()).await?;
            info!("Deleted connection secret {}/{}", target.namespace, target.name);
        }
        Ok(())
    }
}
