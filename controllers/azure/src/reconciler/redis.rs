//! Redis external client
//!
//! Azure Cache for Redis accepts a PUT only once; later changes go through
//! PATCH, which ARM rejects while the cache is not `Succeeded`.

use super::found;
use crate::error::ControllerError;
use crate::managed::async_op::{self, NotFound};
use crate::managed::references::{required, resolve_resource_group};
use crate::managed::{
    CONNECTION_ENDPOINT_KEY, CONNECTION_PASSWORD_KEY, CONNECTION_PORT_KEY, ConnectionDetails,
    ExternalClient, ExternalCreation, ExternalObservation, ManagedKind, ReferenceLookup,
    connection_details,
};
use crate::reconcile_helpers::{
    STATE_DELETING, STATE_SUCCEEDED, late_init, map_contains, optional_matches,
    provisioning_condition, state_is, tags_match,
};
use azure_client::{AzureClientTrait, RedisResource};
use crds::{Managed, Redis, RedisObservation, RedisParameters, RedisSkuFamily, RedisSkuName};
use std::sync::Arc;
use tracing::{debug, info};

#[async_trait::async_trait]
impl ManagedKind for Redis {
    fn external_client(azure: Arc<dyn AzureClientTrait>) -> Box<dyn ExternalClient<Self>> {
        Box::new(RedisExternal { azure })
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

pub struct RedisExternal {
    azure: Arc<dyn AzureClientTrait>,
}

fn sku(params: &RedisParameters) -> azure_client::RedisSku {
    let name = match params.sku.name {
        RedisSkuName::Basic => "Basic",
        RedisSkuName::Standard => "Standard",
        RedisSkuName::Premium => "Premium",
    };
    let family = match params.sku.family {
        RedisSkuFamily::C => "C",
        RedisSkuFamily::P => "P",
    };
    azure_client::RedisSku {
        name: name.to_string(),
        family: family.to_string(),
        capacity: params.sku.capacity,
    }
}

/// Create request for a new cache
pub fn new_cache(params: &RedisParameters) -> RedisResource {
    RedisResource {
        location: params.location.clone(),
        tags: params.tags.clone(),
        zones: params.zones.clone(),
        properties: azure_client::RedisProperties {
            sku: sku(params),
            redis_configuration: params.redis_configuration.clone(),
            enable_non_ssl_port: params.enable_non_ssl_port,
            tenant_settings: params.tenant_settings.clone(),
            shard_count: params.shard_count,
            minimum_tls_version: params.minimum_tls_version.clone(),
            subnet_id: params.subnet_id.clone(),
            static_ip: params.static_ip.clone(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// PATCH body bringing an existing cache to the desired state
pub fn update_parameters(params: &RedisParameters) -> azure_client::RedisUpdateParameters {
    azure_client::RedisUpdateParameters {
        tags: params.tags.clone(),
        properties: azure_client::RedisUpdateProperties {
            sku: sku(params),
            redis_configuration: params.redis_configuration.clone(),
            enable_non_ssl_port: params.enable_non_ssl_port,
            tenant_settings: params.tenant_settings.clone(),
            shard_count: params.shard_count,
            minimum_tls_version: params.minimum_tls_version.clone(),
        },
    }
}

/// Whether the cache matches the parameters
pub fn is_up_to_date(params: &RedisParameters, cache: &RedisResource) -> bool {
    let observed = &cache.properties;
    observed.sku == sku(params)
        && optional_matches(params.enable_non_ssl_port.as_ref(), observed.enable_non_ssl_port.as_ref())
        && optional_matches(params.shard_count.as_ref(), observed.shard_count.as_ref())
        && optional_matches(
            params.minimum_tls_version.as_deref(),
            observed.minimum_tls_version.as_deref(),
        )
        && map_contains(params.redis_configuration.as_ref(), observed.redis_configuration.as_ref())
        && tags_match(params.tags.as_ref(), cache.tags.as_ref())
}

/// Fill unset parameters from the cache, returning true when any changed
pub fn late_initialize(params: &mut RedisParameters, cache: &RedisResource) -> bool {
    let observed = &cache.properties;
    let mut changed = late_init(&mut params.enable_non_ssl_port, observed.enable_non_ssl_port.as_ref());
    changed |= late_init(&mut params.minimum_tls_version, observed.minimum_tls_version.as_ref());
    changed |= late_init(&mut params.shard_count, observed.shard_count.as_ref());
    changed |= late_init(&mut params.subnet_id, observed.subnet_id.as_ref());
    changed |= late_init(&mut params.static_ip, observed.static_ip.as_ref());
    changed |= late_init(&mut params.zones, cache.zones.as_ref());
    changed
}

fn observation(cache: &RedisResource) -> RedisObservation {
    let props = &cache.properties;
    RedisObservation {
        id: cache.id.clone(),
        provisioning_state: props.provisioning_state.clone(),
        host_name: props.host_name.clone(),
        port: props.port,
        ssl_port: props.ssl_port,
        redis_version: props.redis_version.clone(),
        linked_servers: props
            .linked_servers
            .iter()
            .flatten()
            .map(|s| s.id.clone())
            .collect(),
        last_operation: None,
    }
}

fn at_provider(cr: &Redis) -> Option<&RedisObservation> {
    cr.status.as_ref().and_then(|s| s.at_provider.as_ref())
}

fn provisioning_state(cr: &Redis) -> Option<&str> {
    at_provider(cr).and_then(|p| p.provisioning_state.as_deref())
}

impl RedisExternal {
    async fn connection(
        &self,
        resource_group: &str,
        name: &str,
        cache: &RedisResource,
    ) -> Result<ConnectionDetails, ControllerError> {
        let keys = self.azure.list_redis_keys(resource_group, name).await?;
        let mut pairs = vec![(CONNECTION_PASSWORD_KEY, keys.primary_key)];
        if let Some(host) = cache.properties.host_name.clone() {
            pairs.push((CONNECTION_ENDPOINT_KEY, host));
        }
        if let Some(port) = cache.properties.ssl_port {
            pairs.push((CONNECTION_PORT_KEY, port.to_string()));
        }
        Ok(connection_details(pairs))
    }
}

#[async_trait::async_trait]
impl ExternalClient<Redis> for RedisExternal {
    async fn observe(&self, cr: &mut Redis) -> Result<ExternalObservation, ControllerError> {
        let name = cr.external_name();
        let resource_group = required(
            cr.spec.for_provider.resource_group_name.as_deref(),
            "resourceGroupName",
        )?
        .to_string();

        let Some(cache) = found(self.azure.get_redis(&resource_group, &name).await)? else {
            let last_operation = cr
                .status
                .as_mut()
                .and_then(|s| s.at_provider.as_mut())
                .map(|p| &mut p.last_operation);
            let outcome = async_op::interpret_missing(self.azure.as_ref(), last_operation).await?;
            if outcome == NotFound::CreationInProgress {
                debug!("Redis {} is still being created", name);
            }
            return Ok(outcome.observation(cr));
        };

        let mut operation = at_provider(cr).and_then(|p| p.last_operation.clone());
        async_op::refresh(self.azure.as_ref(), &mut operation).await?;
        cr.managed_status_mut().at_provider = Some(RedisObservation {
            last_operation: operation,
            ..observation(&cache)
        });
        let state = cache.properties.provisioning_state.as_deref();
        cr.set_conditions([provisioning_condition(state)]);

        let late_initialized = late_initialize(&mut cr.spec.for_provider, &cache);
        let up_to_date = is_up_to_date(&cr.spec.for_provider, &cache);

        let mut result = ExternalObservation::exists(up_to_date).with_late_init(late_initialized);
        if state_is(state, STATE_SUCCEEDED) {
            result = result.with_connection_details(self.connection(&resource_group, &name, &cache).await?);
        }
        Ok(result)
    }

    async fn create(&self, cr: &mut Redis) -> Result<ExternalCreation, ControllerError> {
        let name = cr.external_name();
        let params = &cr.spec.for_provider;
        let resource_group = required(params.resource_group_name.as_deref(), "resourceGroupName")?.to_string();
        let result = self
            .azure
            .create_redis(&resource_group, &name, &new_cache(params))
            .await?;
        info!("Requested creation of Redis {} in {}", name, resource_group);

        let at_provider = result.resource.as_ref().map(observation).unwrap_or_default();
        cr.managed_status_mut().at_provider = Some(RedisObservation {
            last_operation: result.operation.map(async_op::track),
            ..at_provider
        });
        Ok(ExternalCreation::default())
    }

    async fn update(&self, cr: &mut Redis) -> Result<(), ControllerError> {
        let name = cr.external_name();
        if !state_is(provisioning_state(cr), STATE_SUCCEEDED) {
            debug!("Redis {} is not ready for updates yet", name);
            return Ok(());
        }

        let params = &cr.spec.for_provider;
        let resource_group = required(params.resource_group_name.as_deref(), "resourceGroupName")?.to_string();
        let cache = self
            .azure
            .update_redis(&resource_group, &name, &update_parameters(params))
            .await?;
        cr.managed_status_mut().at_provider = Some(observation(&cache));
        Ok(())
    }

    async fn delete(&self, cr: &mut Redis) -> Result<(), ControllerError> {
        let name = cr.external_name();
        if state_is(provisioning_state(cr), STATE_DELETING) {
            debug!("Redis {} is already being deleted", name);
            return Ok(());
        }

        let resource_group = required(
            cr.spec.for_provider.resource_group_name.as_deref(),
            "resourceGroupName",
        )?
        .to_string();
        self.azure.delete_redis(&resource_group, &name).await?;
        Ok(())
    }
}
