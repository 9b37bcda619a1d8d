//! Database operations for MockAzureClient
//!
//! Handles MySQL/PostgreSQL servers, firewall rules, virtual network rules and CosmosDB accounts

use super::MockAzureClient;
use crate::error::AzureError;
use crate::models::*;

pub async fn get_server(
    client: &MockAzureClient,
    flavor: ServerFlavor,
    resource_group: &str,
    name: &str,
) -> Result<Server, AzureError> {
    client.begin("get_server", name)?;
    client.load(&client.server_path(flavor, resource_group, name))
}

pub async fn create_server(
    client: &MockAzureClient,
    flavor: ServerFlavor,
    resource_group: &str,
    name: &str,
    params: &ServerCreateParameters,
) -> Result<LongRunning<Server>, AzureError> {
    client.begin("create_server", name)?;
    let path = client.server_path(flavor, resource_group, name);

    let mut storage_profile = params.properties.storage_profile.clone().unwrap_or_default();
    storage_profile.backup_retention_days.get_or_insert(7);
    storage_profile
        .geo_redundant_backup
        .get_or_insert_with(|| "Disabled".to_string());
    storage_profile
        .storage_autogrow
        .get_or_insert_with(|| "Enabled".to_string());

    let server = Server {
        id: Some(path.clone()),
        name: Some(name.to_string()),
        type_: Some(format!("{}/servers", flavor.provider_namespace())),
        location: params.location.clone(),
        tags: params.tags.clone(),
        sku: Some(params.sku.clone()),
        properties: ServerProperties {
            administrator_login: Some(params.properties.administrator_login.clone()),
            version: params.properties.version.clone(),
            ssl_enforcement: params.properties.ssl_enforcement.clone(),
            minimal_tls_version: params
                .properties
                .minimal_tls_version
                .clone()
                .or_else(|| Some("TLSEnforcementDisabled".to_string())),
            public_network_access: params
                .properties
                .public_network_access
                .clone()
                .or_else(|| Some("Enabled".to_string())),
            user_visible_state: Some("Ready".to_string()),
            fully_qualified_domain_name: Some(format!("{}.{}", name, flavor.dns_suffix())),
            storage_profile: Some(storage_profile),
            master_server_id: None,
        },
    };

    client.write("PUT", &path, server)
}

pub async fn update_server(
    client: &MockAzureClient,
    flavor: ServerFlavor,
    resource_group: &str,
    name: &str,
    params: &ServerUpdateParameters,
) -> Result<LongRunning<Server>, AzureError> {
    client.begin("update_server", name)?;
    let path = client.server_path(flavor, resource_group, name);
    let mut server: Server = client.load(&path)?;

    if params.sku.is_some() {
        server.sku = params.sku.clone();
    }
    if params.tags.is_some() {
        server.tags = params.tags.clone();
    }
    let props = &params.properties;
    if props.version.is_some() {
        server.properties.version = props.version.clone();
    }
    if props.ssl_enforcement.is_some() {
        server.properties.ssl_enforcement = props.ssl_enforcement.clone();
    }
    if props.minimal_tls_version.is_some() {
        server.properties.minimal_tls_version = props.minimal_tls_version.clone();
    }
    if props.public_network_access.is_some() {
        server.properties.public_network_access = props.public_network_access.clone();
    }
    if props.storage_profile.is_some() {
        server.properties.storage_profile = props.storage_profile.clone();
    }

    client.write("PATCH", &path, server)
}

pub async fn delete_server(
    client: &MockAzureClient,
    flavor: ServerFlavor,
    resource_group: &str,
    name: &str,
) -> Result<Option<LongRunningOperation>, AzureError> {
    client.begin("delete_server", name)?;
    Ok(client.remove(&client.server_path(flavor, resource_group, name)))
}

pub async fn get_firewall_rule(
    client: &MockAzureClient,
    flavor: ServerFlavor,
    resource_group: &str,
    server: &str,
    name: &str,
) -> Result<FirewallRule, AzureError> {
    client.begin("get_firewall_rule", name)?;
    client.load(&client.firewall_rule_path(flavor, resource_group, server, name))
}

pub async fn create_or_update_firewall_rule(
    client: &MockAzureClient,
    flavor: ServerFlavor,
    resource_group: &str,
    server: &str,
    name: &str,
    rule: &FirewallRule,
) -> Result<LongRunning<FirewallRule>, AzureError> {
    client.begin("create_or_update_firewall_rule", name)?;
    let path = client.firewall_rule_path(flavor, resource_group, server, name);

    let mut stored = rule.clone();
    stored.id = Some(path.clone());
    stored.name = Some(name.to_string());
    stored.type_ = Some(format!("{}/servers/firewallRules", flavor.provider_namespace()));
    client.write("PUT", &path, stored)
}

pub async fn delete_firewall_rule(
    client: &MockAzureClient,
    flavor: ServerFlavor,
    resource_group: &str,
    server: &str,
    name: &str,
) -> Result<Option<LongRunningOperation>, AzureError> {
    client.begin("delete_firewall_rule", name)?;
    Ok(client.remove(&client.firewall_rule_path(flavor, resource_group, server, name)))
}

pub async fn get_virtual_network_rule(
    client: &MockAzureClient,
    flavor: ServerFlavor,
    resource_group: &str,
    server: &str,
    name: &str,
) -> Result<VirtualNetworkRule, AzureError> {
    client.begin("get_virtual_network_rule", name)?;
    client.load(&client.virtual_network_rule_path(flavor, resource_group, server, name))
}

pub async fn create_or_update_virtual_network_rule(
    client: &MockAzureClient,
    flavor: ServerFlavor,
    resource_group: &str,
    server: &str,
    name: &str,
    rule: &VirtualNetworkRule,
) -> Result<LongRunning<VirtualNetworkRule>, AzureError> {
    client.begin("create_or_update_virtual_network_rule", name)?;
    let path = client.virtual_network_rule_path(flavor, resource_group, server, name);

    let mut stored = rule.clone();
    stored.id = Some(path.clone());
    stored.name = Some(name.to_string());
    stored.type_ = Some(format!("{}/servers/virtualNetworkRules", flavor.provider_namespace()));
    stored.properties.state = Some("Ready".to_string());
    client.write("PUT", &path, stored)
}

pub async fn delete_virtual_network_rule(
    client: &MockAzureClient,
    flavor: ServerFlavor,
    resource_group: &str,
    server: &str,
    name: &str,
) -> Result<Option<LongRunningOperation>, AzureError> {
    client.begin("delete_virtual_network_rule", name)?;
    Ok(client.remove(&client.virtual_network_rule_path(flavor, resource_group, server, name)))
}

pub async fn get_database_account(
    client: &MockAzureClient,
    resource_group: &str,
    name: &str,
) -> Result<DatabaseAccount, AzureError> {
    client.begin("get_database_account", name)?;
    client.load(&client.database_account_path(resource_group, name))
}

pub async fn create_or_update_database_account(
    client: &MockAzureClient,
    resource_group: &str,
    name: &str,
    account: &DatabaseAccount,
) -> Result<LongRunning<DatabaseAccount>, AzureError> {
    client.begin("create_or_update_database_account", name)?;
    let path = client.database_account_path(resource_group, name);

    let mut stored = account.clone();
    stored.id = Some(path.clone());
    stored.name = Some(name.to_string());
    stored.kind.get_or_insert_with(|| "GlobalDocumentDB".to_string());
    stored.properties.provisioning_state = Some("Succeeded".to_string());
    stored.properties.document_endpoint = Some(format!("https://{}.documents.azure.com:443/", name));
    client.write("PUT", &path, stored)
}

pub async fn delete_database_account(
    client: &MockAzureClient,
    resource_group: &str,
    name: &str,
) -> Result<Option<LongRunningOperation>, AzureError> {
    client.begin("delete_database_account", name)?;
    Ok(client.remove(&client.database_account_path(resource_group, name)))
}

pub async fn list_database_account_keys(
    client: &MockAzureClient,
    resource_group: &str,
    name: &str,
) -> Result<DatabaseAccountKeys, AzureError> {
    client.begin("list_database_account_keys", name)?;
    let _: DatabaseAccount = client.load(&client.database_account_path(resource_group, name))?;
    Ok(DatabaseAccountKeys {
        primary_master_key: format!("{}-primary-master-key", name),
        secondary_master_key: format!("{}-secondary-master-key", name),
        primary_readonly_master_key: format!("{}-primary-readonly-key", name),
        secondary_readonly_master_key: format!("{}-secondary-readonly-key", name),
    })
}
