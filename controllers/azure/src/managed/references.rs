//! Cross-resource references
//!
//! `resourceGroupNameRef`, `serverNameRef`, `virtualNetworkNameRef` and
//! `virtualNetworkSubnetIdRef` name another managed resource; resolving them fills
//! the matching plain field from that resource's external name or observed ID.

use crate::error::ControllerError;
use azure_client::ServerFlavor;
use crds::{Managed, MySQLServer, PostgreSQLServer, Reference, ResourceGroup, Subnet, VirtualNetwork};
use kube::{Api, Client};
use tracing::debug;

/// Looks up the values referenced by `*Ref` fields
#[async_trait::async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// Azure name of a ResourceGroup object
    async fn resource_group_name(&self, name: &str) -> Result<String, ControllerError>;

    /// Azure name of a MySQLServer or PostgreSQLServer object
    async fn server_name(&self, flavor: ServerFlavor, name: &str) -> Result<String, ControllerError>;

    /// Azure name of a VirtualNetwork object
    async fn virtual_network_name(&self, name: &str) -> Result<String, ControllerError>;

    /// ARM ID of a Subnet object; only known once the subnet has been observed
    async fn subnet_id(&self, name: &str) -> Result<String, ControllerError>;
}

/// Reference lookup against the cluster
#[derive(Clone)]
pub struct KubeReferenceLookup {
    client: Client,
}

impl std::fmt::Debug for KubeReferenceLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeReferenceLookup").finish_non_exhaustive()
    }
}

impl KubeReferenceLookup {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get<R: Managed>(&self, name: &str) -> Result<R, ControllerError> {
        let api: Api<R> = Api::all(self.client.clone());
        api.get_opt(name).await?.ok_or_else(|| {
            ControllerError::ReferenceNotReady(format!("{} {} not found", R::kind(&()), name))
        })
    }
}

#[async_trait::async_trait]
impl ReferenceLookup for KubeReferenceLookup {
    async fn resource_group_name(&self, name: &str) -> Result<String, ControllerError> {
        Ok(self.get::<ResourceGroup>(name).await?.external_name())
    }

    async fn server_name(&self, flavor: ServerFlavor, name: &str) -> Result<String, ControllerError> {
        match flavor {
            ServerFlavor::MySql => Ok(self.get::<MySQLServer>(name).await?.external_name()),
            ServerFlavor::PostgreSql => Ok(self.get::<PostgreSQLServer>(name).await?.external_name()),
        }
    }

    async fn virtual_network_name(&self, name: &str) -> Result<String, ControllerError> {
        Ok(self.get::<VirtualNetwork>(name).await?.external_name())
    }

    async fn subnet_id(&self, name: &str) -> Result<String, ControllerError> {
        let subnet = self.get::<Subnet>(name).await?;
        subnet
            .status
            .and_then(|s| s.at_provider)
            .and_then(|p| p.id)
            .ok_or_else(|| ControllerError::ReferenceNotReady(format!("Subnet {} has no ID yet", name)))
    }
}

/// Set `target` to `value`, returning true when it changed
pub fn assign(target: &mut Option<String>, value: String) -> bool {
    if target.as_deref() == Some(value.as_str()) {
        return false;
    }
    debug!("Resolved reference to {}", value);
    *target = Some(value);
    true
}

/// Resolve `resourceGroupNameRef` into `resourceGroupName`
pub async fn resolve_resource_group(
    lookup: &dyn ReferenceLookup,
    reference: Option<&Reference>,
    target: &mut Option<String>,
) -> Result<bool, ControllerError> {
    match reference {
        Some(r) => Ok(assign(target, lookup.resource_group_name(&r.name).await?)),
        None => Ok(false),
    }
}

/// Resolve `serverNameRef` into `serverName`
pub async fn resolve_server(
    lookup: &dyn ReferenceLookup,
    flavor: ServerFlavor,
    reference: Option<&Reference>,
    target: &mut Option<String>,
) -> Result<bool, ControllerError> {
    match reference {
        Some(r) => Ok(assign(target, lookup.server_name(flavor, &r.name).await?)),
        None => Ok(false),
    }
}

/// Resolve `virtualNetworkNameRef` into `virtualNetworkName`
pub async fn resolve_virtual_network(
    lookup: &dyn ReferenceLookup,
    reference: Option<&Reference>,
    target: &mut Option<String>,
) -> Result<bool, ControllerError> {
    match reference {
        Some(r) => Ok(assign(target, lookup.virtual_network_name(&r.name).await?)),
        None => Ok(false),
    }
}

/// Resolve `virtualNetworkSubnetIdRef` into `virtualNetworkSubnetId`
pub async fn resolve_subnet_id(
    lookup: &dyn ReferenceLookup,
    reference: Option<&Reference>,
    target: &mut Option<String>,
) -> Result<bool, ControllerError> {
    match reference {
        Some(r) => Ok(assign(target, lookup.subnet_id(&r.name).await?)),
        None => Ok(false),
    }
}

/// A required name that is neither set nor resolvable
pub fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ControllerError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ControllerError::InvalidConfig(format!("{} is not set", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StaticReferences;

    #[tokio::test]
    async fn test_resolve_sets_and_reports_change() {
        let lookup = StaticReferences::default().with_resource_group("rg-object", "rg-azure");
        let reference = Reference::new("rg-object");
        let mut target = None;

        assert!(resolve_resource_group(&lookup, Some(&reference), &mut target).await.unwrap());
        assert_eq!(target.as_deref(), Some("rg-azure"));

        assert!(!resolve_resource_group(&lookup, Some(&reference), &mut target).await.unwrap());
    }

    #[tokio::test]
    async fn test_resolve_without_reference_keeps_value() {
        let lookup = StaticReferences::default();
        let mut target = Some("explicit".to_string());

        assert!(!resolve_resource_group(&lookup, None, &mut target).await.unwrap());
        assert_eq!(target.as_deref(), Some("explicit"));
    }

    #[tokio::test]
    async fn test_resolve_missing_reference_is_not_ready() {
        let lookup = StaticReferences::default();
        let reference = Reference::new("missing");
        let mut target = None;

        let err = resolve_subnet_id(&lookup, Some(&reference), &mut target).await.unwrap_err();
        assert!(matches!(err, ControllerError::ReferenceNotReady(_)));
        assert!(target.is_none());
    }

    #[test]
    fn test_required() {
        assert_eq!(required(Some("rg"), "resourceGroupName").unwrap(), "rg");
        assert!(required(Some(""), "resourceGroupName").is_err());
        assert!(required(None, "resourceGroupName").is_err());
    }
}
