//! Resource group operations for MockAzureClient

use super::MockAzureClient;
use crate::error::AzureError;
use crate::models::*;

pub async fn get_resource_group(client: &MockAzureClient, name: &str) -> Result<ResourceGroup, AzureError> {
    client.begin("get_resource_group", name)?;
    client.load(&client.resource_group_path(name))
}

pub async fn create_or_update_resource_group(
    client: &MockAzureClient,
    name: &str,
    group: &ResourceGroup,
) -> Result<ResourceGroup, AzureError> {
    client.begin("create_or_update_resource_group", name)?;
    let path = client.resource_group_path(name);

    let mut stored = group.clone();
    stored.id = Some(path.clone());
    stored.name = Some(name.to_string());
    stored.properties = Some(ResourceGroupProperties {
        provisioning_state: Some("Succeeded".to_string()),
    });
    client.store(&path, &stored)?;
    Ok(stored)
}

pub async fn delete_resource_group(
    client: &MockAzureClient,
    name: &str,
) -> Result<Option<LongRunningOperation>, AzureError> {
    client.begin("delete_resource_group", name)?;
    Ok(client.remove(&client.resource_group_path(name)))
}
