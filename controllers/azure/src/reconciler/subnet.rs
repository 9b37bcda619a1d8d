//! Subnet external client

use super::found;
use crate::error::ControllerError;
use crate::managed::async_op::{self, NotFound};
use crate::managed::references::{required, resolve_resource_group, resolve_virtual_network};
use crate::managed::{ExternalClient, ExternalCreation, ExternalObservation, ManagedKind, ReferenceLookup};
use crate::reconcile_helpers::{STATE_DELETING, provisioning_condition, state_is};
use azure_client::{AzureClientTrait, SubnetPropertiesFormat};
use crds::{Managed, Subnet, SubnetObservation, SubnetParameters};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

#[async_trait::async_trait]
impl ManagedKind for Subnet {
    fn external_client(azure: Arc<dyn AzureClientTrait>) -> Box<dyn ExternalClient<Self>> {
        Box::new(SubnetExternal { azure })
    }

    async fn resolve_references(&mut self, lookup: &dyn ReferenceLookup) -> Result<bool, ControllerError> {
        let params = &mut self.spec.for_provider;
        let mut changed = resolve_resource_group(
            lookup,
            params.resource_group_name_ref.as_ref(),
            &mut params.resource_group_name,
        )
        .await?;
        changed |= resolve_virtual_network(
            lookup,
            params.virtual_network_name_ref.as_ref(),
            &mut params.virtual_network_name,
        )
        .await?;
        Ok(changed)
    }
}

pub struct SubnetExternal {
    azure: Arc<dyn AzureClientTrait>,
}

/// PUT body of the subnet
pub fn desired_subnet(params: &SubnetParameters) -> azure_client::Subnet {
    let props = &params.properties;
    let service_endpoints = props
        .service_endpoints
        .iter()
        .map(|e| azure_client::ServiceEndpoint {
            service: e.service.clone(),
            ..Default::default()
        })
        .collect();

    azure_client::Subnet {
        properties: SubnetPropertiesFormat {
            address_prefix: Some(props.address_prefix.clone()),
            service_endpoints: Some(service_endpoints),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Whether the subnet matches the parameters; service endpoints compare as a set
pub fn is_up_to_date(params: &SubnetParameters, subnet: &azure_client::Subnet) -> bool {
    let observed = &subnet.properties;
    let desired_services: BTreeSet<&str> = params
        .properties
        .service_endpoints
        .iter()
        .map(|e| e.service.as_str())
        .collect();
    let observed_services: BTreeSet<&str> = observed
        .service_endpoints
        .iter()
        .flatten()
        .map(|e| e.service.as_str())
        .collect();

    observed.address_prefix.as_deref() == Some(params.properties.address_prefix.as_str())
        && desired_services == observed_services
}

fn observation(subnet: &azure_client::Subnet) -> SubnetObservation {
    SubnetObservation {
        state: subnet.properties.provisioning_state.clone(),
        id: subnet.id.clone(),
        etag: subnet.etag.clone(),
        purpose: subnet.properties.purpose.clone(),
        last_operation: None,
    }
}

fn at_provider(cr: &Subnet) -> Option<&SubnetObservation> {
    cr.status.as_ref().and_then(|s| s.at_provider.as_ref())
}

/// Resource group and virtual network holding the subnet
fn location(cr: &Subnet) -> Result<(String, String), ControllerError> {
    let params = &cr.spec.for_provider;
    let resource_group = required(params.resource_group_name.as_deref(), "resourceGroupName")?;
    let virtual_network = required(params.virtual_network_name.as_deref(), "virtualNetworkName")?;
    Ok((resource_group.to_string(), virtual_network.to_string()))
}

impl SubnetExternal {
    async fn put(&self, cr: &mut Subnet) -> Result<(), ControllerError> {
        let name = cr.external_name();
        let (resource_group, virtual_network) = location(cr)?;
        let result = self
            .azure
            .create_or_update_subnet(
                &resource_group,
                &virtual_network,
                &name,
                &desired_subnet(&cr.spec.for_provider),
            )
            .await?;
        let at_provider = cr
            .managed_status_mut()
            .at_provider
            .get_or_insert_with(SubnetObservation::default);
        if let Some(subnet) = result.resource.as_ref() {
            *at_provider = observation(subnet);
        }
        at_provider.last_operation = result.operation.map(async_op::track);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ExternalClient<Subnet> for SubnetExternal {
    async fn observe(&self, cr: &mut Subnet) -> Result<ExternalObservation, ControllerError> {
        let name = cr.external_name();
        let (resource_group, virtual_network) = location(cr)?;

        let result = self.azure.get_subnet(&resource_group, &virtual_network, &name).await;
        let Some(subnet) = found(result)? else {
            let last_operation = cr
                .status
                .as_mut()
                .and_then(|s| s.at_provider.as_mut())
                .map(|p| &mut p.last_operation);
            let outcome = async_op::interpret_missing(self.azure.as_ref(), last_operation).await?;
            if outcome == NotFound::CreationInProgress {
                debug!("Subnet {} is still being created", name);
            }
            return Ok(outcome.observation(cr));
        };

        let mut operation = at_provider(cr).and_then(|p| p.last_operation.clone());
        async_op::refresh(self.azure.as_ref(), &mut operation).await?;
        cr.managed_status_mut().at_provider = Some(SubnetObservation {
            last_operation: operation,
            ..observation(&subnet)
        });
        cr.set_conditions([provisioning_condition(subnet.properties.provisioning_state.as_deref())]);
        Ok(ExternalObservation::exists(is_up_to_date(&cr.spec.for_provider, &subnet)))
    }

    async fn create(&self, cr: &mut Subnet) -> Result<ExternalCreation, ControllerError> {
        self.put(cr).await?;
        info!("Requested creation of subnet {}", cr.external_name());
        Ok(ExternalCreation::default())
    }

    async fn update(&self, cr: &mut Subnet) -> Result<(), ControllerError> {
        self.put(cr).await?;
        debug!("Updated subnet {}", cr.external_name());
        Ok(())
    }

    async fn delete(&self, cr: &mut Subnet) -> Result<(), ControllerError> {
        let name = cr.external_name();
        let state = at_provider(cr).and_then(|p| p.state.as_deref());
        if state_is(state, STATE_DELETING) {
            debug!("Subnet {} is already being deleted", name);
            return Ok(());
        }

        let (resource_group, virtual_network) = location(cr)?;
        self.azure.delete_subnet(&resource_group, &virtual_network, &name).await?;
        Ok(())
    }
}
