//! ARM resource paths

use crate::models::ServerFlavor;

/// `/subscriptions/{sub}/resourceGroups/{rg}`
pub fn resource_group(subscription_id: &str, resource_group: &str) -> String {
    format!("/subscriptions/{}/resourceGroups/{}", subscription_id, resource_group)
}

/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}`
pub fn provider_resource(
    subscription_id: &str,
    resource_group_name: &str,
    namespace: &str,
    resource_type: &str,
    name: &str,
) -> String {
    format!(
        "{}/providers/{}/{}/{}",
        resource_group(subscription_id, resource_group_name),
        namespace,
        resource_type,
        name
    )
}

/// A child resource below a parent path, e.g. `{server}/firewallRules/{name}`
pub fn child_resource(parent: &str, child_type: &str, name: &str) -> String {
    format!("{}/{}/{}", parent, child_type, name)
}

/// Redis cache
pub fn redis(subscription_id: &str, resource_group: &str, name: &str) -> String {
    provider_resource(subscription_id, resource_group, "Microsoft.Cache", "Redis", name)
}

/// MySQL or PostgreSQL server
pub fn server(subscription_id: &str, flavor: ServerFlavor, resource_group: &str, name: &str) -> String {
    provider_resource(subscription_id, resource_group, flavor.provider_namespace(), "servers", name)
}

/// Firewall rule of a server
pub fn firewall_rule(
    subscription_id: &str,
    flavor: ServerFlavor,
    resource_group: &str,
    server_name: &str,
    name: &str,
) -> String {
    child_resource(&server(subscription_id, flavor, resource_group, server_name), "firewallRules", name)
}

/// Virtual network rule of a server
pub fn virtual_network_rule(
    subscription_id: &str,
    flavor: ServerFlavor,
    resource_group: &str,
    server_name: &str,
    name: &str,
) -> String {
    child_resource(
        &server(subscription_id, flavor, resource_group, server_name),
        "virtualNetworkRules",
        name,
    )
}

/// CosmosDB database account
pub fn database_account(subscription_id: &str, resource_group: &str, name: &str) -> String {
    provider_resource(subscription_id, resource_group, "Microsoft.DocumentDB", "databaseAccounts", name)
}

/// Virtual network
pub fn virtual_network(subscription_id: &str, resource_group: &str, name: &str) -> String {
    provider_resource(subscription_id, resource_group, "Microsoft.Network", "virtualNetworks", name)
}

/// Subnet of a virtual network
pub fn subnet(subscription_id: &str, resource_group: &str, virtual_network_name: &str, name: &str) -> String {
    child_resource(
        &virtual_network(subscription_id, resource_group, virtual_network_name),
        "subnets",
        name,
    )
}

/// Network security group
pub fn security_group(subscription_id: &str, resource_group: &str, name: &str) -> String {
    provider_resource(subscription_id, resource_group, "Microsoft.Network", "networkSecurityGroups", name)
}

/// Name of the resource group segment of an ARM resource ID
pub fn resource_group_of(resource_id: &str) -> Option<&str> {
    let mut segments = resource_id.split('/');
    while let Some(segment) = segments.next() {
        if segment.eq_ignore_ascii_case("resourceGroups") {
            return segments.next().filter(|s| !s.is_empty());
        }
    }
    None
}
