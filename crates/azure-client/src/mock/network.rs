//! Network operations for MockAzureClient
//!
//! Handles virtual networks, subnets and network security groups

use super::MockAzureClient;
use crate::error::AzureError;
use crate::models::*;
use std::sync::atomic::Ordering;

fn etag(client: &MockAzureClient) -> String {
    format!("W/\"{:08x}\"", client.next_operation.load(Ordering::SeqCst))
}

fn resource_guid(name: &str) -> String {
    format!("00000000-0000-0000-0000-{:0>12}", name.len())
}

pub async fn get_virtual_network(
    client: &MockAzureClient,
    resource_group: &str,
    name: &str,
) -> Result<VirtualNetwork, AzureError> {
    client.begin("get_virtual_network", name)?;
    client.load(&client.virtual_network_path(resource_group, name))
}

pub async fn create_or_update_virtual_network(
    client: &MockAzureClient,
    resource_group: &str,
    name: &str,
    vnet: &VirtualNetwork,
) -> Result<LongRunning<VirtualNetwork>, AzureError> {
    client.begin("create_or_update_virtual_network", name)?;
    let path = client.virtual_network_path(resource_group, name);

    let mut stored = vnet.clone();
    stored.id = Some(path.clone());
    stored.name = Some(name.to_string());
    stored.etag = Some(etag(client));
    stored.properties.provisioning_state = Some("Succeeded".to_string());
    stored.properties.resource_guid = Some(resource_guid(name));
    client.write("PUT", &path, stored)
}

pub async fn delete_virtual_network(
    client: &MockAzureClient,
    resource_group: &str,
    name: &str,
) -> Result<Option<LongRunningOperation>, AzureError> {
    client.begin("delete_virtual_network", name)?;
    Ok(client.remove(&client.virtual_network_path(resource_group, name)))
}

pub async fn get_subnet(
    client: &MockAzureClient,
    resource_group: &str,
    virtual_network: &str,
    name: &str,
) -> Result<Subnet, AzureError> {
    client.begin("get_subnet", name)?;
    client.load(&client.subnet_path(resource_group, virtual_network, name))
}

pub async fn create_or_update_subnet(
    client: &MockAzureClient,
    resource_group: &str,
    virtual_network: &str,
    name: &str,
    subnet: &Subnet,
) -> Result<LongRunning<Subnet>, AzureError> {
    client.begin("create_or_update_subnet", name)?;
    let path = client.subnet_path(resource_group, virtual_network, name);

    let mut stored = subnet.clone();
    stored.id = Some(path.clone());
    stored.name = Some(name.to_string());
    stored.etag = Some(etag(client));
    stored.properties.provisioning_state = Some("Succeeded".to_string());
    if let Some(endpoints) = stored.properties.service_endpoints.as_mut() {
        for endpoint in endpoints {
            endpoint.provisioning_state = Some("Succeeded".to_string());
        }
    }
    client.write("PUT", &path, stored)
}

pub async fn delete_subnet(
    client: &MockAzureClient,
    resource_group: &str,
    virtual_network: &str,
    name: &str,
) -> Result<Option<LongRunningOperation>, AzureError> {
    client.begin("delete_subnet", name)?;
    Ok(client.remove(&client.subnet_path(resource_group, virtual_network, name)))
}

pub async fn get_security_group(
    client: &MockAzureClient,
    resource_group: &str,
    name: &str,
) -> Result<NetworkSecurityGroup, AzureError> {
    client.begin("get_security_group", name)?;
    client.load(&client.security_group_path(resource_group, name))
}

pub async fn create_or_update_security_group(
    client: &MockAzureClient,
    resource_group: &str,
    name: &str,
    group: &NetworkSecurityGroup,
) -> Result<LongRunning<NetworkSecurityGroup>, AzureError> {
    client.begin("create_or_update_security_group", name)?;
    let path = client.security_group_path(resource_group, name);

    let mut stored = group.clone();
    stored.id = Some(path.clone());
    stored.name = Some(name.to_string());
    stored.etag = Some(etag(client));
    stored.properties.provisioning_state = Some("Succeeded".to_string());
    stored.properties.resource_guid = Some(resource_guid(name));
    if let Some(rules) = stored.properties.security_rules.as_mut() {
        for rule in rules {
            rule.id = Some(format!("{}/securityRules/{}", path, rule.name));
            rule.properties.provisioning_state = Some("Succeeded".to_string());
        }
    }
    client.write("PUT", &path, stored)
}

pub async fn delete_security_group(
    client: &MockAzureClient,
    resource_group: &str,
    name: &str,
) -> Result<Option<LongRunningOperation>, AzureError> {
    client.begin("delete_security_group", name)?;
    Ok(client.remove(&client.security_group_path(resource_group, name)))
}
