//! AzureClient trait for mocking
//!
//! This trait abstracts the AzureClient to enable mocking in unit tests.
//! The concrete AzureClient implements this trait, and tests can use the mock implementation.

use crate::error::AzureError;
use crate::models::*;

/// Trait for Azure Resource Manager operations
///
/// Write operations that ARM may complete asynchronously return the
/// [`LongRunningOperation`] to poll with [`AzureClientTrait::fetch_async_operation`].
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait AzureClientTrait: Send + Sync {
    /// Subscription the client operates on
    fn subscription_id(&self) -> &str;

    /// Validate the credentials by reading the subscription
    async fn validate_credentials(&self) -> Result<(), AzureError>;

    /// Poll a long-running operation
    async fn fetch_async_operation(&self, operation: &LongRunningOperation) -> Result<OperationState, AzureError>;

    // Resource groups
    async fn get_resource_group(&self, name: &str) -> Result<ResourceGroup, AzureError>;
    async fn create_or_update_resource_group(&self, name: &str, group: &ResourceGroup) -> Result<ResourceGroup, AzureError>;
    async fn delete_resource_group(&self, name: &str) -> Result<Option<LongRunningOperation>, AzureError>;

    // Redis
    async fn get_redis(&self, resource_group: &str, name: &str) -> Result<RedisResource, AzureError>;
    async fn create_redis(&self, resource_group: &str, name: &str, cache: &RedisResource) -> Result<LongRunning<RedisResource>, AzureError>;
    async fn update_redis(&self, resource_group: &str, name: &str, update: &RedisUpdateParameters) -> Result<RedisResource, AzureError>;
    async fn delete_redis(&self, resource_group: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError>;
    async fn list_redis_keys(&self, resource_group: &str, name: &str) -> Result<RedisAccessKeys, AzureError>;

    // MySQL / PostgreSQL servers
    async fn get_server(&self, flavor: ServerFlavor, resource_group: &str, name: &str) -> Result<Server, AzureError>;
    async fn create_server(&self, flavor: ServerFlavor, resource_group: &str, name: &str, params: &ServerCreateParameters) -> Result<LongRunning<Server>, AzureError>;
    async fn update_server(&self, flavor: ServerFlavor, resource_group: &str, name: &str, params: &ServerUpdateParameters) -> Result<LongRunning<Server>, AzureError>;
    async fn delete_server(&self, flavor: ServerFlavor, resource_group: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError>;

    async fn get_firewall_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str) -> Result<FirewallRule, AzureError>;
    async fn create_or_update_firewall_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str, rule: &FirewallRule) -> Result<LongRunning<FirewallRule>, AzureError>;
    async fn delete_firewall_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError>;

    async fn get_virtual_network_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str) -> Result<VirtualNetworkRule, AzureError>;
    async fn create_or_update_virtual_network_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str, rule: &VirtualNetworkRule) -> Result<LongRunning<VirtualNetworkRule>, AzureError>;
    async fn delete_virtual_network_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError>;

    // CosmosDB
    async fn get_database_account(&self, resource_group: &str, name: &str) -> Result<DatabaseAccount, AzureError>;
    async fn create_or_update_database_account(&self, resource_group: &str, name: &str, account: &DatabaseAccount) -> Result<LongRunning<DatabaseAccount>, AzureError>;
    async fn delete_database_account(&self, resource_group: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError>;
    async fn list_database_account_keys(&self, resource_group: &str, name: &str) -> Result<DatabaseAccountKeys, AzureError>;

    // Network
    async fn get_virtual_network(&self, resource_group: &str, name: &str) -> Result<VirtualNetwork, AzureError>;
    async fn create_or_update_virtual_network(&self, resource_group: &str, name: &str, network: &VirtualNetwork) -> Result<LongRunning<VirtualNetwork>, AzureError>;
    async fn delete_virtual_network(&self, resource_group: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError>;

    async fn get_subnet(&self, resource_group: &str, virtual_network: &str, name: &str) -> Result<Subnet, AzureError>;
    async fn create_or_update_subnet(&self, resource_group: &str, virtual_network: &str, name: &str, subnet: &Subnet) -> Result<LongRunning<Subnet>, AzureError>;
    async fn delete_subnet(&self, resource_group: &str, virtual_network: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError>;

    async fn get_security_group(&self, resource_group: &str, name: &str) -> Result<NetworkSecurityGroup, AzureError>;
    async fn create_or_update_security_group(&self, resource_group: &str, name: &str, group: &NetworkSecurityGroup) -> Result<LongRunning<NetworkSecurityGroup>, AzureError>;
    async fn delete_security_group(&self, resource_group: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError>;
}
