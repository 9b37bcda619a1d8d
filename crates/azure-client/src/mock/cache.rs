//! Redis operations for MockAzureClient

use super::MockAzureClient;
use crate::error::AzureError;
use crate::models::*;

pub async fn get_redis(client: &MockAzureClient, resource_group: &str, name: &str) -> Result<RedisResource, AzureError> {
    client.begin("get_redis", name)?;
    client.load(&client.redis_path(resource_group, name))
}

pub async fn create_redis(
    client: &MockAzureClient,
    resource_group: &str,
    name: &str,
    cache: &RedisResource,
) -> Result<LongRunning<RedisResource>, AzureError> {
    client.begin("create_redis", name)?;
    let path = client.redis_path(resource_group, name);

    let mut stored = cache.clone();
    stored.id = Some(path.clone());
    stored.name = Some(name.to_string());
    let props = &mut stored.properties;
    props.provisioning_state = Some("Succeeded".to_string());
    props.host_name = Some(format!("{}.redis.cache.windows.net", name));
    props.port = Some(6379);
    props.ssl_port = Some(6380);
    props.redis_version = Some("4.0.14".to_string());
    props.enable_non_ssl_port.get_or_insert(false);
    props.minimum_tls_version.get_or_insert_with(|| "1.0".to_string());

    client.write("PUT", &path, stored)
}

pub async fn update_redis(
    client: &MockAzureClient,
    resource_group: &str,
    name: &str,
    update: &RedisUpdateParameters,
) -> Result<RedisResource, AzureError> {
    client.begin("update_redis", name)?;
    let path = client.redis_path(resource_group, name);
    let mut stored: RedisResource = client.load(&path)?;

    let props = &mut stored.properties;
    props.sku = update.properties.sku.clone();
    if update.properties.redis_configuration.is_some() {
        props.redis_configuration = update.properties.redis_configuration.clone();
    }
    if update.properties.enable_non_ssl_port.is_some() {
        props.enable_non_ssl_port = update.properties.enable_non_ssl_port;
    }
    if update.properties.tenant_settings.is_some() {
        props.tenant_settings = update.properties.tenant_settings.clone();
    }
    if update.properties.shard_count.is_some() {
        props.shard_count = update.properties.shard_count;
    }
    if update.properties.minimum_tls_version.is_some() {
        props.minimum_tls_version = update.properties.minimum_tls_version.clone();
    }
    if update.tags.is_some() {
        stored.tags = update.tags.clone();
    }

    client.store(&path, &stored)?;
    Ok(stored)
}

pub async fn delete_redis(
    client: &MockAzureClient,
    resource_group: &str,
    name: &str,
) -> Result<Option<LongRunningOperation>, AzureError> {
    client.begin("delete_redis", name)?;
    Ok(client.remove(&client.redis_path(resource_group, name)))
}

pub async fn list_redis_keys(
    client: &MockAzureClient,
    resource_group: &str,
    name: &str,
) -> Result<RedisAccessKeys, AzureError> {
    client.begin("list_redis_keys", name)?;
    let _: RedisResource = client.load(&client.redis_path(resource_group, name))?;
    Ok(RedisAccessKeys {
        primary_key: format!("{}-primary-key", name),
        secondary_key: format!("{}-secondary-key", name),
    })
}
