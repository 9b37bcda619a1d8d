//! SecurityGroup external client
//!
//! Security rules are managed inline: the group is PUT with the full rule set
//! and drift in any rule triggers a new PUT.

use super::found;
use crate::error::ControllerError;
use crate::managed::async_op::{self, NotFound};
use crate::managed::references::{required, resolve_resource_group};
use crate::managed::{ExternalClient, ExternalCreation, ExternalObservation, ManagedKind, ReferenceLookup};
use crate::reconcile_helpers::{STATE_DELETING, optional_matches, provisioning_condition, state_is, tags_match};
use azure_client::{AzureClientTrait, NetworkSecurityGroup, SecurityGroupPropertiesFormat, SecurityRulePropertiesFormat};
use crds::{Managed, SecurityGroup, SecurityGroupObservation, SecurityGroupParameters, SecurityRule};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

#[async_trait::async_trait]
impl ManagedKind for SecurityGroup {
    fn external_client(azure: Arc<dyn AzureClientTrait>) -> Box<dyn ExternalClient<Self>> {
        Box::new(SecurityGroupExternal { azure })
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

pub struct SecurityGroupExternal {
    azure: Arc<dyn AzureClientTrait>,
}

fn desired_rule(rule: &SecurityRule) -> azure_client::SecurityRule {
    let props = &rule.properties;
    azure_client::SecurityRule {
        id: None,
        name: rule.name.clone(),
        properties: SecurityRulePropertiesFormat {
            protocol: props.protocol.clone(),
            source_port_range: props.source_port_range.clone(),
            destination_port_range: props.destination_port_range.clone(),
            source_address_prefix: props.source_address_prefix.clone(),
            destination_address_prefix: props.destination_address_prefix.clone(),
            access: props.access.clone(),
            priority: props.priority,
            direction: props.direction.clone(),
            description: props.description.clone(),
            provisioning_state: None,
        },
    }
}

/// PUT body of the security group
pub fn desired_group(params: &SecurityGroupParameters) -> NetworkSecurityGroup {
    NetworkSecurityGroup {
        location: params.location.clone(),
        tags: params.tags.clone(),
        properties: SecurityGroupPropertiesFormat {
            security_rules: Some(params.security_rules.iter().map(desired_rule).collect()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Whether an observed rule carries the desired settings. Enum-like values
/// compare case-insensitively since ARM normalizes their casing.
pub fn rule_matches(desired: &SecurityRule, observed: &azure_client::SecurityRule) -> bool {
    let d = &desired.properties;
    let o = &observed.properties;
    d.protocol.eq_ignore_ascii_case(&o.protocol)
        && d.access.eq_ignore_ascii_case(&o.access)
        && d.direction.eq_ignore_ascii_case(&o.direction)
        && d.priority == o.priority
        && optional_matches(d.source_port_range.as_deref(), o.source_port_range.as_deref())
        && optional_matches(d.destination_port_range.as_deref(), o.destination_port_range.as_deref())
        && optional_matches(d.source_address_prefix.as_deref(), o.source_address_prefix.as_deref())
        && optional_matches(
            d.destination_address_prefix.as_deref(),
            o.destination_address_prefix.as_deref(),
        )
        && optional_matches(d.description.as_deref(), o.description.as_deref())
}

/// Whether the group holds exactly the desired rules with matching settings
pub fn is_up_to_date(params: &SecurityGroupParameters, group: &NetworkSecurityGroup) -> bool {
    let observed: BTreeMap<&str, &azure_client::SecurityRule> = group
        .properties
        .security_rules
        .iter()
        .flatten()
        .map(|r| (r.name.as_str(), r))
        .collect();

    observed.len() == params.security_rules.len()
        && params
            .security_rules
            .iter()
            .all(|d| observed.get(d.name.as_str()).is_some_and(|o| rule_matches(d, o)))
        && tags_match(params.tags.as_ref(), group.tags.as_ref())
}

fn observation(group: &NetworkSecurityGroup) -> SecurityGroupObservation {
    SecurityGroupObservation {
        state: group.properties.provisioning_state.clone(),
        id: group.id.clone(),
        etag: group.etag.clone(),
        resource_guid: group.properties.resource_guid.clone(),
        last_operation: None,
    }
}

fn at_provider(cr: &SecurityGroup) -> Option<&SecurityGroupObservation> {
    cr.status.as_ref().and_then(|s| s.at_provider.as_ref())
}

fn resource_group(cr: &SecurityGroup) -> Result<String, ControllerError> {
    Ok(required(cr.spec.for_provider.resource_group_name.as_deref(), "resourceGroupName")?.to_string())
}

impl SecurityGroupExternal {
    async fn put(&self, cr: &mut SecurityGroup) -> Result<(), ControllerError> {
        let name = cr.external_name();
        let resource_group = resource_group(cr)?;
        let result = self
            .azure
            .create_or_update_security_group(&resource_group, &name, &desired_group(&cr.spec.for_provider))
            .await?;
        let at_provider = cr
            .managed_status_mut()
            .at_provider
            .get_or_insert_with(SecurityGroupObservation::default);
        if let Some(group) = result.resource.as_ref() {
            *at_provider = observation(group);
        }
        at_provider.last_operation = result.operation.map(async_op::track);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ExternalClient<SecurityGroup> for SecurityGroupExternal {
    async fn observe(&self, cr: &mut SecurityGroup) -> Result<ExternalObservation, ControllerError> {
        let name = cr.external_name();
        let resource_group = resource_group(cr)?;

        let Some(group) = found(self.azure.get_security_group(&resource_group, &name).await)? else {
            let last_operation = cr
                .status
                .as_mut()
                .and_then(|s| s.at_provider.as_mut())
                .map(|p| &mut p.last_operation);
            let outcome = async_op::interpret_missing(self.azure.as_ref(), last_operation).await?;
            if outcome == NotFound::CreationInProgress {
                debug!("Security group {} is still being created", name);
            }
            return Ok(outcome.observation(cr));
        };

        let mut operation = at_provider(cr).and_then(|p| p.last_operation.clone());
        async_op::refresh(self.azure.as_ref(), &mut operation).await?;
        cr.managed_status_mut().at_provider = Some(SecurityGroupObservation {
            last_operation: operation,
            ..observation(&group)
        });
        cr.set_conditions([provisioning_condition(group.properties.provisioning_state.as_deref())]);
        Ok(ExternalObservation::exists(is_up_to_date(&cr.spec.for_provider, &group)))
    }

    async fn create(&self, cr: &mut SecurityGroup) -> Result<ExternalCreation, ControllerError> {
        self.put(cr).await?;
        info!("Requested creation of security group {}", cr.external_name());
        Ok(ExternalCreation::default())
    }

    async fn update(&self, cr: &mut SecurityGroup) -> Result<(), ControllerError> {
        self.put(cr).await?;
        debug!("Updated security group {}", cr.external_name());
        Ok(())
    }

    async fn delete(&self, cr: &mut SecurityGroup) -> Result<(), ControllerError> {
        let name = cr.external_name();
        let state = at_provider(cr).and_then(|p| p.state.as_deref());
        if state_is(state, STATE_DELETING) {
            debug!("Security group {} is already being deleted", name);
            return Ok(());
        }

        let resource_group = resource_group(cr)?;
        self.azure.delete_security_group(&resource_group, &name).await?;
        Ok(())
    }
}
