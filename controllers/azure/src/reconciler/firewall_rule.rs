//! MySQL and PostgreSQL server firewall rule external client

use super::found;
use crate::error::ControllerError;
use crate::managed::async_op::{self, NotFound};
use crate::managed::references::{required, resolve_resource_group, resolve_server};
use crate::managed::{ExternalClient, ExternalCreation, ExternalObservation, ManagedKind, ReferenceLookup};
use azure_client::{AzureClientTrait, FirewallRule, LongRunning, ServerFlavor};
use crds::{
    Condition, FirewallRuleObservation, FirewallRuleParameters, FirewallRuleStatus, Managed,
    MySQLServerFirewallRule, PostgreSQLServerFirewallRule,
};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

/// A firewall rule kind and the server flavor it belongs to
pub trait FirewallRuleKind: ManagedKind + Managed<Status = FirewallRuleStatus> {
    const FLAVOR: ServerFlavor;

    fn parameters(&self) -> &FirewallRuleParameters;
}

macro_rules! firewall_rule_kind {
    ($kind:ty, $flavor:expr) => {
        impl FirewallRuleKind for $kind {
            const FLAVOR: ServerFlavor = $flavor;

            fn parameters(&self) -> &FirewallRuleParameters {
                &self.spec.for_provider
            }
        }

        #[async_trait::async_trait]
        impl ManagedKind for $kind {
            fn external_client(azure: Arc<dyn AzureClientTrait>) -> Box<dyn ExternalClient<Self>> {
                Box::new(FirewallRuleExternal::<$kind>::new(azure))
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
                Ok(changed)
            }
        }
    };
}

firewall_rule_kind!(MySQLServerFirewallRule, ServerFlavor::MySql);
firewall_rule_kind!(PostgreSQLServerFirewallRule, ServerFlavor::PostgreSql);

pub struct FirewallRuleExternal<R> {
    azure: Arc<dyn AzureClientTrait>,
    kind: PhantomData<fn() -> R>,
}

impl<R> FirewallRuleExternal<R> {
    pub fn new(azure: Arc<dyn AzureClientTrait>) -> Self {
        Self {
            azure,
            kind: PhantomData,
        }
    }
}

/// PUT body of the rule
pub fn desired_rule(params: &FirewallRuleParameters) -> FirewallRule {
    FirewallRule {
        properties: azure_client::FirewallRuleProperties {
            start_ip_address: params.properties.start_ip_address.clone(),
            end_ip_address: params.properties.end_ip_address.clone(),
        },
        ..Default::default()
    }
}

/// Whether the rule admits the desired IP range
pub fn is_up_to_date(params: &FirewallRuleParameters, rule: &FirewallRule) -> bool {
    rule.properties.start_ip_address == params.properties.start_ip_address
        && rule.properties.end_ip_address == params.properties.end_ip_address
}

/// Server and resource group names, which must be set or resolved
fn location<R: FirewallRuleKind>(cr: &R) -> Result<(String, String), ControllerError> {
    let params = cr.parameters();
    let resource_group = required(params.resource_group_name.as_deref(), "resourceGroupName")?;
    let server = required(params.server_name.as_deref(), "serverName")?;
    Ok((resource_group.to_string(), server.to_string()))
}

fn record<R: FirewallRuleKind>(cr: &mut R, result: LongRunning<FirewallRule>) {
    let at_provider = cr
        .managed_status_mut()
        .at_provider
        .get_or_insert_with(FirewallRuleObservation::default);
    if let Some(rule) = result.resource {
        at_provider.id = rule.id;
        at_provider.type_ = rule.type_;
    }
    at_provider.last_operation = result.operation.map(async_op::track);
}

#[async_trait::async_trait]
impl<R: FirewallRuleKind> ExternalClient<R> for FirewallRuleExternal<R> {
    async fn observe(&self, cr: &mut R) -> Result<ExternalObservation, ControllerError> {
        let name = cr.external_name();
        let (resource_group, server) = location(cr)?;

        let result = self
            .azure
            .get_firewall_rule(R::FLAVOR, &resource_group, &server, &name)
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

        cr.managed_status_mut().at_provider = Some(FirewallRuleObservation {
            id: rule.id.clone(),
            type_: rule.type_.clone(),
            last_operation: operation,
        });
        cr.set_conditions([Condition::available()]);

        Ok(ExternalObservation::exists(is_up_to_date(cr.parameters(), &rule)))
    }

    async fn create(&self, cr: &mut R) -> Result<ExternalCreation, ControllerError> {
        let name = cr.external_name();
        let (resource_group, server) = location(cr)?;
        let result = self
            .azure
            .create_or_update_firewall_rule(R::FLAVOR, &resource_group, &server, &name, &desired_rule(cr.parameters()))
            .await?;
        info!("Requested creation of {} firewall rule {} on server {}", R::FLAVOR, name, server);
        record(cr, result);
        Ok(ExternalCreation::default())
    }

    async fn update(&self, cr: &mut R) -> Result<(), ControllerError> {
        let name = cr.external_name();
        let (resource_group, server) = location(cr)?;
        let result = self
            .azure
            .create_or_update_firewall_rule(R::FLAVOR, &resource_group, &server, &name, &desired_rule(cr.parameters()))
            .await?;
        debug!("Updated {} firewall rule {}", R::FLAVOR, name);
        record(cr, result);
        Ok(())
    }

    async fn delete(&self, cr: &mut R) -> Result<(), ControllerError> {
        let name = cr.external_name();
        let (resource_group, server) = location(cr)?;
        let operation = self
            .azure
            .delete_firewall_rule(R::FLAVOR, &resource_group, &server, &name)
            .await?;
        if let Some(at_provider) = cr.managed_status_mut().at_provider.as_mut() {
            at_provider.last_operation = operation.map(async_op::track);
        }
        Ok(())
    }
}
