//! CosmosDBAccount external client

use super::found;
use crate::error::ControllerError;
use crate::managed::async_op::{self, NotFound};
use crate::managed::references::{required, resolve_resource_group};
use crate::managed::{
    CONNECTION_ENDPOINT_KEY, CONNECTION_PASSWORD_KEY, ConnectionDetails, ExternalClient, ExternalCreation,
    ExternalObservation, ManagedKind, ReferenceLookup, connection_details,
};
use crate::reconcile_helpers::{
    STATE_DELETING, STATE_SUCCEEDED, optional_matches, provisioning_condition, state_is, tags_match,
};
use azure_client::{
    AzureClientTrait, DatabaseAccount, DatabaseAccountLocation, DatabaseAccountProperties, LongRunning,
};
use crds::{CosmosDBAccount, CosmosDBAccountObservation, CosmosDBAccountParameters, DatabaseAccountKind, Managed};
use std::sync::Arc;
use tracing::{debug, info};

#[async_trait::async_trait]
impl ManagedKind for CosmosDBAccount {
    fn external_client(azure: Arc<dyn AzureClientTrait>) -> Box<dyn ExternalClient<Self>> {
        Box::new(CosmosDBExternal { azure })
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

pub struct CosmosDBExternal {
    azure: Arc<dyn AzureClientTrait>,
}

fn kind(kind: DatabaseAccountKind) -> &'static str {
    match kind {
        DatabaseAccountKind::GlobalDocumentDB => "GlobalDocumentDB",
        DatabaseAccountKind::MongoDB => "MongoDB",
        DatabaseAccountKind::Parse => "Parse",
    }
}

/// ARM reports display names ("West Europe") where requests use "westeurope"
fn normalize_location(location: &str) -> String {
    location
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// PUT body of the account
pub fn desired_account(params: &CosmosDBAccountParameters) -> DatabaseAccount {
    let props = &params.properties;
    DatabaseAccount {
        location: params.location.clone(),
        kind: Some(kind(params.kind).to_string()),
        tags: params.tags.clone(),
        properties: DatabaseAccountProperties {
            database_account_offer_type: Some(props.database_account_offer_type.clone()),
            enable_automatic_failover: props.enable_automatic_failover,
            enable_multiple_write_locations: props.enable_multiple_write_locations,
            is_virtual_network_filter_enabled: props.is_virtual_network_filter_enabled,
            locations: Some(
                props
                    .locations
                    .iter()
                    .map(|l| DatabaseAccountLocation {
                        location_name: l.location_name.clone(),
                        failover_priority: l.failover_priority,
                        is_zone_redundant: l.is_zone_redundant,
                    })
                    .collect(),
            ),
            consistency_policy: props.consistency_policy.as_ref().map(|c| azure_client::ConsistencyPolicy {
                default_consistency_level: c.default_consistency_level.clone(),
                max_staleness_prefix: c.max_staleness_prefix,
                max_interval_in_seconds: c.max_interval_in_seconds,
            }),
            ip_range_filter: props.ip_range_filter.clone(),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn locations_match(params: &CosmosDBAccountParameters, observed: Option<&Vec<DatabaseAccountLocation>>) -> bool {
    let observed = observed.map(Vec::as_slice).unwrap_or_default();
    if observed.len() != params.properties.locations.len() {
        return false;
    }

    let mut observed: Vec<&DatabaseAccountLocation> = observed.iter().collect();
    observed.sort_by_key(|l| l.failover_priority);
    let mut desired: Vec<_> = params.properties.locations.iter().collect();
    desired.sort_by_key(|l| l.failover_priority);

    desired.iter().zip(observed).all(|(d, o)| {
        normalize_location(&d.location_name) == normalize_location(&o.location_name)
            && d.failover_priority == o.failover_priority
            && optional_matches(d.is_zone_redundant.as_ref(), o.is_zone_redundant.as_ref())
    })
}

/// Whether the account matches the parameters
pub fn is_up_to_date(params: &CosmosDBAccountParameters, account: &DatabaseAccount) -> bool {
    let desired = &params.properties;
    let observed = &account.properties;

    let consistency_matches = match desired.consistency_policy.as_ref() {
        None => true,
        Some(d) => observed.consistency_policy.as_ref().is_some_and(|o| {
            d.default_consistency_level.eq_ignore_ascii_case(&o.default_consistency_level)
                && optional_matches(d.max_staleness_prefix.as_ref(), o.max_staleness_prefix.as_ref())
                && optional_matches(d.max_interval_in_seconds.as_ref(), o.max_interval_in_seconds.as_ref())
        }),
    };

    account.kind.as_deref() == Some(kind(params.kind))
        && observed.database_account_offer_type.as_deref() == Some(desired.database_account_offer_type.as_str())
        && optional_matches(
            desired.enable_automatic_failover.as_ref(),
            observed.enable_automatic_failover.as_ref(),
        )
        && optional_matches(
            desired.enable_multiple_write_locations.as_ref(),
            observed.enable_multiple_write_locations.as_ref(),
        )
        && optional_matches(
            desired.is_virtual_network_filter_enabled.as_ref(),
            observed.is_virtual_network_filter_enabled.as_ref(),
        )
        && consistency_matches
        && locations_match(params, observed.locations.as_ref())
        && optional_matches(desired.ip_range_filter.as_deref(), observed.ip_range_filter.as_deref())
        && tags_match(params.tags.as_ref(), account.tags.as_ref())
}

fn observation(account: &DatabaseAccount) -> CosmosDBAccountObservation {
    CosmosDBAccountObservation {
        id: account.id.clone(),
        state: account.properties.provisioning_state.clone(),
        document_endpoint: account.properties.document_endpoint.clone(),
        last_operation: None,
    }
}

fn at_provider(cr: &CosmosDBAccount) -> Option<&CosmosDBAccountObservation> {
    cr.status.as_ref().and_then(|s| s.at_provider.as_ref())
}

/// Record the response of a PUT and the operation it started
fn record(cr: &mut CosmosDBAccount, result: LongRunning<DatabaseAccount>) {
    let at_provider = cr
        .managed_status_mut()
        .at_provider
        .get_or_insert_with(CosmosDBAccountObservation::default);
    if let Some(account) = result.resource.as_ref() {
        *at_provider = observation(account);
    }
    at_provider.last_operation = result.operation.map(async_op::track);
}

fn resource_group(cr: &CosmosDBAccount) -> Result<String, ControllerError> {
    Ok(required(cr.spec.for_provider.resource_group_name.as_deref(), "resourceGroupName")?.to_string())
}

impl CosmosDBExternal {
    async fn connection(
        &self,
        resource_group: &str,
        name: &str,
        account: &DatabaseAccount,
    ) -> Result<ConnectionDetails, ControllerError> {
        let keys = self.azure.list_database_account_keys(resource_group, name).await?;
        let mut pairs = vec![(CONNECTION_PASSWORD_KEY, keys.primary_master_key)];
        if let Some(endpoint) = account.properties.document_endpoint.clone() {
            pairs.push((CONNECTION_ENDPOINT_KEY, endpoint));
        }
        Ok(connection_details(pairs))
    }
}

#[async_trait::async_trait]
impl ExternalClient<CosmosDBAccount> for CosmosDBExternal {
    async fn observe(&self, cr: &mut CosmosDBAccount) -> Result<ExternalObservation, ControllerError> {
        let name = cr.external_name();
        let resource_group = resource_group(cr)?;

        let Some(account) = found(self.azure.get_database_account(&resource_group, &name).await)? else {
            let last_operation = cr
                .status
                .as_mut()
                .and_then(|s| s.at_provider.as_mut())
                .map(|p| &mut p.last_operation);
            let outcome = async_op::interpret_missing(self.azure.as_ref(), last_operation).await?;
            if outcome == NotFound::CreationInProgress {
                debug!("CosmosDB account {} is still being created", name);
            }
            return Ok(outcome.observation(cr));
        };

        let mut operation = at_provider(cr).and_then(|p| p.last_operation.clone());
        async_op::refresh(self.azure.as_ref(), &mut operation).await?;
        cr.managed_status_mut().at_provider = Some(CosmosDBAccountObservation {
            last_operation: operation,
            ..observation(&account)
        });
        let state = account.properties.provisioning_state.as_deref();
        cr.set_conditions([provisioning_condition(state)]);

        let mut result = ExternalObservation::exists(is_up_to_date(&cr.spec.for_provider, &account));
        if state_is(state, STATE_SUCCEEDED) {
            result = result.with_connection_details(self.connection(&resource_group, &name, &account).await?);
        }
        Ok(result)
    }

    async fn create(&self, cr: &mut CosmosDBAccount) -> Result<ExternalCreation, ControllerError> {
        let name = cr.external_name();
        let resource_group = resource_group(cr)?;
        let result = self
            .azure
            .create_or_update_database_account(&resource_group, &name, &desired_account(&cr.spec.for_provider))
            .await?;
        info!("Requested creation of CosmosDB account {} in {}", name, resource_group);

        record(cr, result);
        Ok(ExternalCreation::default())
    }

    async fn update(&self, cr: &mut CosmosDBAccount) -> Result<(), ControllerError> {
        let name = cr.external_name();
        let resource_group = resource_group(cr)?;
        let result = self
            .azure
            .create_or_update_database_account(&resource_group, &name, &desired_account(&cr.spec.for_provider))
            .await?;
        debug!("Updated CosmosDB account {}", name);

        record(cr, result);
        Ok(())
    }

    async fn delete(&self, cr: &mut CosmosDBAccount) -> Result<(), ControllerError> {
        let name = cr.external_name();
        let state = at_provider(cr).and_then(|p| p.state.as_deref());
        if state_is(state, STATE_DELETING) {
            debug!("CosmosDB account {} is already being deleted", name);
            return Ok(());
        }

        let resource_group = resource_group(cr)?;
        self.azure.delete_database_account(&resource_group, &name).await?;
        Ok(())
    }
}
