//! VirtualNetwork external client

use super::found;
use crate::error::ControllerError;
use crate::managed::async_op::{self, NotFound};
use crate::managed::references::{required, resolve_resource_group};
use crate::managed::{ExternalClient, ExternalCreation, ExternalObservation, ManagedKind, ReferenceLookup};
use crate::reconcile_helpers::{STATE_DELETING, provisioning_condition, state_is, tags_match};
use azure_client::{AzureClientTrait, VirtualNetworkPropertiesFormat};
use crds::{Managed, VirtualNetwork, VirtualNetworkObservation, VirtualNetworkParameters};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

#[async_trait::async_trait]
impl ManagedKind for VirtualNetwork {
    fn external_client(azure: Arc<dyn AzureClientTrait>) -> Box<dyn ExternalClient<Self>> {
        Box::new(VirtualNetworkExternal { azure })
    }

    async fn resolve_references(&mut self, lookup: &dyn ReferenceLookup) -> Result<bool, ControllerError> {
        let params = &mut self.spec.for_provider;
        resolve_resource_group(
            lookup,
            params.resource_group_name_ref.as_ref(),
            &mut params.resource_group_name,
        )
        .await
    }
}

pub struct VirtualNetworkExternal {
    azure: Arc<dyn AzureClientTrait>,
}

/// PUT body of the virtual network
pub fn desired_network(params: &VirtualNetworkParameters) -> azure_client::VirtualNetwork {
    let props = &params.properties;
    azure_client::VirtualNetwork {
        location: params.location.clone(),
        tags: params.tags.clone(),
        properties: VirtualNetworkPropertiesFormat {
            address_space: Some(azure_client::AddressSpace {
                address_prefixes: props.address_space.address_prefixes.clone(),
            }),
            enable_ddos_protection: Some(props.enable_ddos_protection),
            enable_vm_protection: Some(props.enable_vm_protection),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Whether the virtual network matches the parameters; prefix order is irrelevant
pub fn is_up_to_date(params: &VirtualNetworkParameters, vnet: &azure_client::VirtualNetwork) -> bool {
    let props = &params.properties;
    let observed = &vnet.properties;

    let desired_prefixes: BTreeSet<&str> = props
        .address_space
        .address_prefixes
        .iter()
        .map(String::as_str)
        .collect();
    let observed_prefixes: BTreeSet<&str> = observed
        .address_space
        .iter()
        .flat_map(|s| s.address_prefixes.iter().map(String::as_str))
        .collect();

    desired_prefixes == observed_prefixes
        && observed.enable_ddos_protection.unwrap_or(false) == props.enable_ddos_protection
        && observed.enable_vm_protection.unwrap_or(false) == props.enable_vm_protection
        && tags_match(params.tags.as_ref(), vnet.tags.as_ref())
}

fn observation(vnet: &azure_client::VirtualNetwork) -> VirtualNetworkObservation {
    VirtualNetworkObservation {
        state: vnet.properties.provisioning_state.clone(),
        id: vnet.id.clone(),
        etag: vnet.etag.clone(),
        resource_guid: vnet.properties.resource_guid.clone(),
        last_operation: None,
    }
}

fn at_provider(cr: &VirtualNetwork) -> Option<&VirtualNetworkObservation> {
    cr.status.as_ref().and_then(|s| s.at_provider.as_ref())
}

fn resource_group(cr: &VirtualNetwork) -> Result<String, ControllerError> {
    Ok(required(cr.spec.for_provider.resource_group_name.as_deref(), "resourceGroupName")?.to_string())
}

impl VirtualNetworkExternal {
    async fn put(&self, cr: &mut VirtualNetwork) -> Result<(), ControllerError> {
        let name = cr.external_name();
        let resource_group = resource_group(cr)?;
        let result = self
            .azure
            .create_or_update_virtual_network(&resource_group, &name, &desired_network(&cr.spec.for_provider))
            .await?;
        let at_provider = cr
            .managed_status_mut()
            .at_provider
            .get_or_insert_with(VirtualNetworkObservation::default);
        if let Some(vnet) = result.resource.as_ref() {
            *at_provider = observation(vnet);
        }
        at_provider.last_operation = result.operation.map(async_op::track);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ExternalClient<VirtualNetwork> for VirtualNetworkExternal {
    async fn observe(&self, cr: &mut VirtualNetwork) -> Result<ExternalObservation, ControllerError> {
        let name = cr.external_name();
        let resource_group = resource_group(cr)?;

        let Some(vnet) = found(self.azure.get_virtual_network(&resource_group, &name).await)? else {
            let last_operation = cr
                .status
                .as_mut()
                .and_then(|s| s.at_provider.as_mut())
                .map(|p| &mut p.last_operation);
            let outcome = async_op::interpret_missing(self.azure.as_ref(), last_operation).await?;
            if outcome == NotFound::CreationInProgress {
                debug!("Virtual network {} is still being created", name);
            }
            return Ok(outcome.observation(cr));
        };

        let mut operation = at_provider(cr).and_then(|p| p.last_operation.clone());
        async_op::refresh(self.azure.as_ref(), &mut operation).await?;
        cr.managed_status_mut().at_provider = Some(VirtualNetworkObservation {
            last_operation: operation,
            ..observation(&vnet)
        });
        cr.set_conditions([provisioning_condition(vnet.properties.provisioning_state.as_deref())]);
        Ok(ExternalObservation::exists(is_up_to_date(&cr.spec.for_provider, &vnet)))
    }

    async fn create(&self, cr: &mut VirtualNetwork) -> Result<ExternalCreation, ControllerError> {
        self.put(cr).await?;
        info!("Requested creation of virtual network {}", cr.external_name());
        Ok(ExternalCreation::default())
    }

    async fn update(&self, cr: &mut VirtualNetwork) -> Result<(), ControllerError> {
        self.put(cr).await?;
        debug!("Updated virtual network {}", cr.external_name());
        Ok(())
    }

    async fn delete(&self, cr: &mut VirtualNetwork) -> Result<(), ControllerError> {
        let name = cr.external_name();
        let state = at_provider(cr).and_then(|p| p.state.as_deref());
        if state_is(state, STATE_DELETING) {
            debug!("Virtual network {} is already being deleted", name);
            return Ok(());
        }

        let resource_group = resource_group(cr)?;
        self.azure.delete_virtual_network(&resource_group, &name).await?;
        Ok(())
    }
}
