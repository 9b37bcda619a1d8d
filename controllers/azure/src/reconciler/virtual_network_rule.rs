//! MySQL and PostgreSQL server virtual network rule external client

use super::found;
use crate::error::ControllerError;
use crate::managed::async_op::{self, NotFound};
use crate::managed::references::{required, resolve_resource_group, resolve_server, resolve_subnet_id};
use crate::managed::{ExternalClient, ExternalCreation, ExternalObservation, ManagedKind, ReferenceLookup};
use crate::reconcile_helpers::{STATE_DELETING, state_is};
use azure_client::{AzureClientTrait, LongRunning, ServerFlavor, VirtualNetworkRule};
use crds::{
    Condition, Managed, MySQLServerVirtualNetworkRule, PostgreSQLServerVirtualNetworkRule,
    VirtualNetworkRuleObservation, VirtualNetworkRuleParameters, VirtualNetworkRuleStatus,
};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

/// `state` of a rule that is in effect
pub const RULE_STATE_READY: &str = "Ready";

/// A virtual network rule kind and the server flavor it belongs to
pub trait VirtualNetworkRuleKind: ManagedKind + Managed<Status = VirtualNetworkRuleStatus> {
    const FLAVOR: ServerFlavor;

    fn parameters(&self) -> &VirtualNetworkRuleParameters;
}

macro_rules! virtual_network_rule_kind {
    ($kind:ty, $flavor:expr) => {
        impl VirtualNetworkRuleKind for $kind {
            const FLAVOR: ServerFlavor = $flavor;

            fn parameters(&self) -> &VirtualNetworkRuleParameters {
                &self.spec.for_provider
            }
        }

        #[async_trait::async_trait]
        impl ManagedKind for $kind {
            fn external_client(azure: Arc<dyn AzureClientTrait>) -> Box<dyn ExternalClient<Self>> {
                Box::new(VirtualNetworkRuleExternal::<$kind>::new(azure))
            }

            async fn resolve_references(&mut self, lookup: &dyn ReferenceLookup) -> Result<bool, ControllerError> {
                let params = &mut self.spec.for_provider;
                let mut changed = resolve_resource_group(
                    lookup,
                    params.resource_group_name_ref.as_ref(),
                    &mut params.resource_group_name,
                )
                .await?;
                changed |= resolve_server(
                    lookup,
                    $flavor,
                    params.server_name_ref.as_ref(),
                    &mut params.server_name,
                )
                .await?;
                let properties = &mut params.properties;
                changed |= resolve_subnet_id(
                    lookup,
                    properties.virtual_network_subnet_id_ref.as_ref(),
                    &mut properties.virtual_network_subnet_id,
                )
                .await?;
                Ok(changed)
            }
        }
    };
}

virtual_network_rule_kind!(MySQLServerVirtualNetworkRule, ServerFlavor::MySql);
virtual_network_rule_kind!(PostgreSQLServerVirtualNetworkRule, ServerFlavor::PostgreSql);

pub struct VirtualNetworkRuleExternal<R> {
    azure: Arc<dyn AzureClientTrait>,
    kind: PhantomData<fn() -> R>,
}

impl<R> VirtualNetworkRuleExternal<R> {
    pub fn new(azure: Arc<dyn AzureClientTrait>) -> Self {
        Self {
            azure,
            kind: PhantomData,
        }
    }
}

/// PUT body of the rule
pub fn desired_rule(params: &VirtualNetworkRuleParameters) -> Result<VirtualNetworkRule, ControllerError> {
    let subnet_id = required(
        params.properties.virtual_network_subnet_id.as_deref(),
        "virtualNetworkSubnetId",
    )?;
    Ok(VirtualNetworkRule {
        properties: azure_client::VirtualNetworkRuleProperties {
            virtual_network_subnet_id: subnet_id.to_string(),
            ignore_missing_vnet_service_endpoint: Some(params.properties.ignore_missing_vnet_service_endpoint),
            state: None,
        },
        ..Default::default()
    })
}

/// Whether the rule admits the desired subnet.
///
/// ARM IDs are case-insensitive and ARM may return them with different casing.
pub fn is_up_to_date(params: &VirtualNetworkRuleParameters, rule: &VirtualNetworkRule) -> bool {
    let observed = &rule.properties;
    let subnet_matches = params
        .properties
        .virtual_network_subnet_id
        .as_deref()
        .is_some_and(|id| id.eq_ignore_ascii_case(&observed.virtual_network_subnet_id));

    subnet_matches
        && observed.ignore_missing_vnet_service_endpoint.unwrap_or(false)
            == params.properties.ignore_missing_vnet_service_endpoint
}

/// Ready condition from the rule `state`
pub fn rule_condition(state: Option<&str>) -> Condition {
    if state_is(state, RULE_STATE_READY) {
        Condition::available()
    } else if state_is(state, STATE_DELETING) {
        Condition::deleting()
    } else {
        Condition::unavailable()
    }
}

fn location<R: VirtualNetworkRuleKind>(cr: &R) -> Result<(String, String), ControllerError> {
    let params = cr.parameters();
    let resource_group = required(params.resource_group_name.as_deref(), "resourceGroupName")?;
    let server = required(params.server_name.as_deref(), "serverName")?;
    Ok((resource_group.to_string(), server.to_string()))
}

fn observation(rule: &VirtualNetworkRule) -> VirtualNetworkRuleObservation {
    VirtualNetworkRuleObservation {
        state: rule.properties.state.clone(),
        id: rule.id.clone(),
        type_: rule.type_.clone(),
        last_operation: None,
    }
}

fn record<R: VirtualNetworkRuleKind>(cr: &mut R, result: LongRunning<VirtualNetworkRule>) {
    let at_provider = cr
        .managed_status_mut()
        .at_provider
        .get_or_insert_with(VirtualNetworkRuleObservation::default);
    if let Some(rule) = result.resource.as_ref() {
        *at_provider = observation(rule);
    }
    at_provider.last_operation = result.operation.map(async_op::track);
}

#[async_trait::async_trait]
impl<R: VirtualNetworkRuleKind> ExternalClient<R> for VirtualNetworkRuleExternal<R> {
    async fn observe(&self, cr: &mut R) -> Result<ExternalObservation, ControllerError> {
        let name = cr.external_name();
        let (resource_group, server) = location(cr)?;

        let result = self
            .azure
            .get_virtual_network_rule(R::FLAVOR, &resource_group, &server, &name)
            .await;
        let Some(rule) = found(result)? else {
            let Some(at_provider) = cr.managed_status_mut().at_provider.as_mut() else {
                return Ok(ExternalObservation::absent());
            };
            let outcome = async_op::interpret_not_found(self.azure.as_ref(), &mut at_provider.last_operation).await?;
            return match outcome {
                NotFound::CreationInProgress => {
                    cr.set_conditions([Condition::creating()]);
                    Ok(ExternalObservation::exists(true))
                }
                NotFound::Absent => Ok(ExternalObservation::absent()),
            };
        };

        let mut operation = cr
            .managed_status()
            .and_then(|s| s.at_provider.as_ref())
            .and_then(|p| p.last_operation.clone());
        async_op::refresh(self.azure.as_ref(), &mut operation).await?;

        cr.managed_status_mut().at_provider = Some(VirtualNetworkRuleObservation {
            last_operation: operation,
            ..observation(&rule)
        });
        cr.set_conditions([rule_condition(rule.properties.state.as_deref())]);

        Ok(ExternalObservation::exists(is_up_to_date(cr.parameters(), &rule)))
    }

    async fn create(&self, cr: &mut R) -> Result<ExternalCreation, ControllerError> {
        let name = cr.external_name();
        let (resource_group, server) = location(cr)?;
        let rule = desired_rule(cr.parameters())?;
        let result = self
            .azure
            .create_or_update_virtual_network_rule(R::FLAVOR, &resource_group, &server, &name, &rule)
            .await?;
        info!("Requested creation of {} virtual network rule {} on server {}", R::FLAVOR, name, server);
        record(cr, result);
        Ok(ExternalCreation::default())
    }

    async fn update(&self, cr: &mut R) -> Result<(), ControllerError> {
        let name = cr.external_name();
        let (resource_group, server) = location(cr)?;
        let rule = desired_rule(cr.parameters())?;
        let result = self
            .azure
            .create_or_update_virtual_network_rule(R::FLAVOR, &resource_group, &server, &name, &rule)
            .await?;
        debug!("Updated {} virtual network rule {}", R::FLAVOR, name);
        record(cr, result);
        Ok(())
    }

    async fn delete(&self, cr: &mut R) -> Result<(), ControllerError> {
        let name = cr.external_name();
        let state = cr
            .managed_status()
            .and_then(|s| s.at_provider.as_ref())
            .and_then(|p| p.state.as_deref());
        if state_is(state, STATE_DELETING) {
            debug!("{} virtual network rule {} is already being deleted", R::FLAVOR, name);
            return Ok(());
        }

        let (resource_group, server) = location(cr)?;
        let operation = self
            .azure
            .delete_virtual_network_rule(R::FLAVOR, &resource_group, &server, &name)
            .await?;
        if let Some(at_provider) = cr.managed_status_mut().at_provider.as_mut() {
            at_provider.last_operation = operation.map(async_op::track);
        }
        Ok(())
    }
}
