//! Managed resource lifecycle
//!
//! Every Azure kind is reconciled by the same loop (`lifecycle.rs`); what differs
//! per kind is the [`ExternalClient`] that talks to ARM and the references the
//! kind resolves before doing so.
//!
//! - `lifecycle.rs` - The generic Observe/Create/Update/Delete loop
//! - `store.rs` - Status, spec, finalizer and connection secret persistence
//! - `connector.rs` - ProviderConfig → credentials → Azure client
//! - `references.rs` - Resolution of `*Ref` fields against other managed resources
//! - `async_op.rs` - Tracking of ARM long-running operations in status

pub mod async_op;
pub mod connector;
pub mod lifecycle;
pub mod references;
pub mod store;

#[cfg(test)]
mod lifecycle_test;

pub use connector::{Connector, KubeConnector};
pub use lifecycle::{ManagedReconciler, ReconcileOutcome};
pub use references::{KubeReferenceLookup, ReferenceLookup};
pub use store::{KubeStore, ManagedStore};

use crate::error::ControllerError;
use azure_client::AzureClientTrait;
use crds::Managed;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Finalizer guarding the deletion of the external resource
pub const FINALIZER: &str = "finalizer.managedresource.crossplane.io";

/// Connection secret keys
pub const CONNECTION_ENDPOINT_KEY: &str = "endpoint";
pub const CONNECTION_PORT_KEY: &str = "port";
pub const CONNECTION_USERNAME_KEY: &str = "username";
pub const CONNECTION_PASSWORD_KEY: &str = "password";

/// Key/value pairs written to the connection secret of a resource
pub type ConnectionDetails = BTreeMap<String, Vec<u8>>;

/// What Observe learned about the external resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalObservation {
    /// The resource exists in Azure (or is being created and must not be created again)
    pub resource_exists: bool,
    /// The Azure resource matches the desired state
    pub resource_up_to_date: bool,
    /// Unset spec fields were filled from the Azure resource
    pub resource_late_initialized: bool,
    /// Connection details derived from the Azure resource
    pub connection_details: ConnectionDetails,
}

impl ExternalObservation {
    /// The external resource does not exist
    pub fn absent() -> Self {
        Self::default()
    }

    /// The external resource exists
    pub fn exists(up_to_date: bool) -> Self {
        Self {
            resource_exists: true,
            resource_up_to_date: up_to_date,
            ..Default::default()
        }
    }

    pub fn with_late_init(mut self, late_initialized: bool) -> Self {
        self.resource_late_initialized = late_initialized;
        self
    }

    pub fn with_connection_details(mut self, details: ConnectionDetails) -> Self {
        self.connection_details = details;
        self
    }
}

/// What Create returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalCreation {
    /// Connection details only known at creation time, such as a generated password
    pub connection_details: ConnectionDetails,
}

/// Observe/Create/Update/Delete against ARM for one kind.
///
/// Implementations may mutate the resource: Observe writes `atProvider` and the
/// Ready condition and may late-initialize the spec, Create and Update record the
/// long-running operation they started.
#[async_trait::async_trait]
pub trait ExternalClient<R: Managed>: Send + Sync {
    async fn observe(&self, resource: &mut R) -> Result<ExternalObservation, ControllerError>;
    async fn create(&self, resource: &mut R) -> Result<ExternalCreation, ControllerError>;
    async fn update(&self, resource: &mut R) -> Result<(), ControllerError>;
    async fn delete(&self, resource: &mut R) -> Result<(), ControllerError>;
}

/// A managed resource kind reconciled by this provider
#[async_trait::async_trait]
pub trait ManagedKind: Managed {
    /// External client operating with the given Azure client
    fn external_client(azure: Arc<dyn AzureClientTrait>) -> Box<dyn ExternalClient<Self>>;

    /// Fill `*Name`/`*Id` fields from their `*Ref` counterparts.
    ///
    /// Returns true when the spec changed.
    async fn resolve_references(&mut self, _lookup: &dyn ReferenceLookup) -> Result<bool, ControllerError> {
        Ok(false)
    }
}

/// Build a connection details map from string values
pub fn connection_details<'a>(pairs: impl IntoIterator<Item = (&'a str, String)>) -> ConnectionDetails {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.into_bytes()))
        .collect()
}
