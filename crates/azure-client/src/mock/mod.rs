//! Mock AzureClient for unit testing
//!
//! This module provides a mock implementation of AzureClientTrait that can be used
//! in unit tests without an Azure subscription.
//!
//! Resources are stored in memory keyed by ARM resource ID. Write operations
//! return a long-running operation whose status tests can inspect and change:
//! - `resources.rs` - Resource groups
//! - `cache.rs` - Redis caches
//! - `database.rs` - MySQL/PostgreSQL servers and their rules, CosmosDB accounts
//! - `network.rs` - Virtual networks, subnets, security groups

mod cache;
mod database;
mod network;
mod resources;

use crate::azure_trait::AzureClientTrait;
use crate::common::paths;
use crate::error::AzureError;
use crate::models::*;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Base of the polling URLs handed out by the mock
pub const MOCK_OPERATION_BASE_URL: &str = "https://management.azure.com/mock/operations";

/// Mock AzureClient for testing
///
/// This mock stores resources in memory and can be configured to return
/// specific responses for testing different scenarios.
#[derive(Clone)]
pub struct MockAzureClient {
    pub(crate) subscription_id: String,
    // In-memory storage, keyed by ARM resource ID
    pub(crate) resources: Arc<Mutex<HashMap<String, serde_json::Value>>>,
    // Long-running operation state, keyed by polling URL
    pub(crate) operations: Arc<Mutex<HashMap<String, OperationState>>>,
    // Creations waiting for their operation to complete: polling URL -> (resource ID, resource)
    pub(crate) pending: Arc<Mutex<HashMap<String, (String, serde_json::Value)>>>,
    // Injected failures: operation name -> (HTTP status, message)
    pub(crate) failures: Arc<Mutex<HashMap<String, (u16, String)>>>,
    pub(crate) calls: Arc<Mutex<Vec<String>>>,
    pub(crate) deferred: Arc<AtomicBool>,
    pub(crate) next_operation: Arc<AtomicU64>,
}

impl MockAzureClient {
    /// Create a new mock client
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resources: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(HashMap::new())),
            pending: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            deferred: Arc::new(AtomicBool::new(false)),
            next_operation: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Store a resource (for test setup)
    pub fn insert<T: Serialize>(&self, resource_id: &str, resource: &T) {
        let value = serde_json::to_value(resource).unwrap();
        self.resources.lock().unwrap().insert(resource_id.to_string(), value);
    }

    /// Read back a stored resource
    pub fn stored<T: DeserializeOwned>(&self, resource_id: &str) -> Option<T> {
        self.resources
            .lock()
            .unwrap()
            .get(resource_id)
            .cloned()
            .map(|v| serde_json::from_value(v).unwrap())
    }

    /// Whether a resource with the given ID exists
    pub fn contains(&self, resource_id: &str) -> bool {
        self.resources.lock().unwrap().contains_key(resource_id)
    }

    /// When enabled, creations stay in progress (and the resource stays absent)
    /// until [`MockAzureClient::complete_operation`] or [`MockAzureClient::fail_operation`] is called.
    pub fn set_deferred_creation(&self, deferred: bool) {
        self.deferred.store(deferred, Ordering::SeqCst);
    }

    /// Complete a deferred creation: the resource appears and the operation succeeds
    pub fn complete_operation(&self, polling_url: &str) {
        if let Some((resource_id, value)) = self.pending.lock().unwrap().remove(polling_url) {
            self.resources.lock().unwrap().insert(resource_id, value);
        }
        self.set_operation_state(polling_url, OperationState::succeeded());
    }

    /// Fail a deferred creation: the resource never appears
    pub fn fail_operation(&self, polling_url: &str, message: impl Into<String>) {
        self.pending.lock().unwrap().remove(polling_url);
        self.set_operation_state(polling_url, OperationState::failed(message));
    }

    /// Override the state reported for an operation
    pub fn set_operation_state(&self, polling_url: &str, state: OperationState) {
        self.operations
            .lock()
            .unwrap()
            .insert(polling_url.to_string(), state);
    }

    /// Polling URL of the most recent operation handed out
    pub fn last_operation_url(&self) -> Option<String> {
        let next = self.next_operation.load(Ordering::SeqCst);
        (next > 1).then(|| format!("{}/{}", MOCK_OPERATION_BASE_URL, next - 1))
    }

    /// Make every call of `operation` (a trait method name, e.g. `create_redis`) fail
    pub fn fail_with(&self, operation: &str, status: u16, message: impl Into<String>) {
        self.failures
            .lock()
            .unwrap()
            .insert(operation.to_string(), (status, message.into()));
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// All calls made so far, as `"{operation} {target}"`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls of the given operation
    pub fn call_count(&self, operation: &str) -> usize {
        let prefix = format!("{} ", operation);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    pub fn resource_group_path(&self, name: &str) -> String {
        paths::resource_group(&self.subscription_id, name)
    }

    pub fn redis_path(&self, resource_group: &str, name: &str) -> String {
        paths::redis(&self.subscription_id, resource_group, name)
    }

    pub fn server_path(&self, flavor: ServerFlavor, resource_group: &str, name: &str) -> String {
        paths::server(&self.subscription_id, flavor, resource_group, name)
    }

    pub fn firewall_rule_path(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str) -> String {
        paths::firewall_rule(&self.subscription_id, flavor, resource_group, server, name)
    }

    pub fn virtual_network_rule_path(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str) -> String {
        paths::virtual_network_rule(&self.subscription_id, flavor, resource_group, server, name)
    }

    pub fn database_account_path(&self, resource_group: &str, name: &str) -> String {
        paths::database_account(&self.subscription_id, resource_group, name)
    }

    pub fn virtual_network_path(&self, resource_group: &str, name: &str) -> String {
        paths::virtual_network(&self.subscription_id, resource_group, name)
    }

    pub fn subnet_path(&self, resource_group: &str, virtual_network: &str, name: &str) -> String {
        paths::subnet(&self.subscription_id, resource_group, virtual_network, name)
    }

    pub fn security_group_path(&self, resource_group: &str, name: &str) -> String {
        paths::security_group(&self.subscription_id, resource_group, name)
    }

    /// Record a call and return the injected failure for it, if any
    pub(crate) fn begin(&self, operation: &str, target: &str) -> Result<(), AzureError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", operation, target));

        match self.failures.lock().unwrap().get(operation) {
            None => Ok(()),
            Some((404, message)) => Err(AzureError::NotFound(message.clone())),
            Some((status @ (401 | 403), message)) => Err(AzureError::Authentication(format!(
                "{} returned {}: {}",
                operation, status, message
            ))),
            Some((status, message)) => Err(AzureError::Api {
                status: *status,
                code: "MockFailure".to_string(),
                message: message.clone(),
            }),
        }
    }

    pub(crate) fn load<T: DeserializeOwned>(&self, resource_id: &str) -> Result<T, AzureError> {
        let value = self
            .resources
            .lock()
            .unwrap()
            .get(resource_id)
            .cloned()
            .ok_or_else(|| AzureError::NotFound(format!("Resource {} not found", resource_id)))?;
        Ok(serde_json::from_value(value)?)
    }

    pub(crate) fn store<T: Serialize>(&self, resource_id: &str, resource: &T) -> Result<(), AzureError> {
        let value = serde_json::to_value(resource)?;
        self.resources
            .lock()
            .unwrap()
            .insert(resource_id.to_string(), value);
        Ok(())
    }

    fn next_operation_url(&self) -> String {
        let id = self.next_operation.fetch_add(1, Ordering::SeqCst);
        format!("{}/{}", MOCK_OPERATION_BASE_URL, id)
    }

    /// Apply a write and hand out a long-running operation for it.
    ///
    /// With deferred creation enabled, a PUT of a resource that does not exist yet
    /// stays pending and the response carries no body.
    pub(crate) fn write<T: Serialize>(
        &self,
        method: &str,
        resource_id: &str,
        resource: T,
    ) -> Result<LongRunning<T>, AzureError> {
        let url = self.next_operation_url();
        let operation = Some(LongRunningOperation::new(method, url.clone()));

        if method == "PUT" && self.deferred.load(Ordering::SeqCst) && !self.contains(resource_id) {
            let value = serde_json::to_value(&resource)?;
            self.pending
                .lock()
                .unwrap()
                .insert(url.clone(), (resource_id.to_string(), value));
            self.set_operation_state(&url, OperationState::in_progress());
            return Ok(LongRunning {
                resource: None,
                operation,
            });
        }

        self.store(resource_id, &resource)?;
        self.set_operation_state(&url, OperationState::succeeded());
        Ok(LongRunning {
            resource: Some(resource),
            operation,
        })
    }

    /// Remove a resource; an absent resource is already deleted
    pub(crate) fn remove(&self, resource_id: &str) -> Option<LongRunningOperation> {
        let removed = self.resources.lock().unwrap().remove(resource_id);
        removed.map(|_| {
            let url = self.next_operation_url();
            self.set_operation_state(&url, OperationState::succeeded());
            LongRunningOperation::new("DELETE", url)
        })
    }
}

#[async_trait::async_trait]
impl AzureClientTrait for MockAzureClient {
    fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    async fn validate_credentials(&self) -> Result<(), AzureError> {
        self.begin("validate_credentials", &self.subscription_id)
    }

    async fn fetch_async_operation(&self, operation: &LongRunningOperation) -> Result<OperationState, AzureError> {
        self.begin("fetch_async_operation", &operation.polling_url)?;
        self.operations
            .lock()
            .unwrap()
            .get(&operation.polling_url)
            .cloned()
            .ok_or_else(|| AzureError::NotFound(format!("Operation {} not found", operation.polling_url)))
    }

    // Resource groups
    async fn get_resource_group(&self, name: &str) -> Result<ResourceGroup, AzureError> {
        resources::get_resource_group(self, name).await
    }

    async fn create_or_update_resource_group(&self, name: &str, group: &ResourceGroup) -> Result<ResourceGroup, AzureError> {
        resources::create_or_update_resource_group(self, name, group).await
    }

    async fn delete_resource_group(&self, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        resources::delete_resource_group(self, name).await
    }

    // Redis
    async fn get_redis(&self, resource_group: &str, name: &str) -> Result<RedisResource, AzureError> {
        cache::get_redis(self, resource_group, name).await
    }

    async fn create_redis(&self, resource_group: &str, name: &str, cache: &RedisResource) -> Result<LongRunning<RedisResource>, AzureError> {
        cache::create_redis(self, resource_group, name, cache).await
    }

    async fn update_redis(&self, resource_group: &str, name: &str, update: &RedisUpdateParameters) -> Result<RedisResource, AzureError> {
        cache::update_redis(self, resource_group, name, update).await
    }

    async fn delete_redis(&self, resource_group: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        cache::delete_redis(self, resource_group, name).await
    }

    async fn list_redis_keys(&self, resource_group: &str, name: &str) -> Result<RedisAccessKeys, AzureError> {
        cache::list_redis_keys(self, resource_group, name).await
    }

    // MySQL / PostgreSQL servers
    async fn get_server(&self, flavor: ServerFlavor, resource_group: &str, name: &str) -> Result<Server, AzureError> {
        database::get_server(self, flavor, resource_group, name).await
    }

    async fn create_server(&self, flavor: ServerFlavor, resource_group: &str, name: &str, params: &ServerCreateParameters) -> Result<LongRunning<Server>, AzureError> {
        database::create_server(self, flavor, resource_group, name, params).await
    }

    async fn update_server(&self, flavor: ServerFlavor, resource_group: &str, name: &str, params: &ServerUpdateParameters) -> Result<LongRunning<Server>, AzureError> {
        database::update_server(self, flavor, resource_group, name, params).await
    }

    async fn delete_server(&self, flavor: ServerFlavor, resource_group: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        database::delete_server(self, flavor, resource_group, name).await
    }

    async fn get_firewall_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str) -> Result<FirewallRule, AzureError> {
        database::get_firewall_rule(self, flavor, resource_group, server, name).await
    }

    async fn create_or_update_firewall_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str, rule: &FirewallRule) -> Result<LongRunning<FirewallRule>, AzureError> {
        database::create_or_update_firewall_rule(self, flavor, resource_group, server, name, rule).await
    }

    async fn delete_firewall_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        database::delete_firewall_rule(self, flavor, resource_group, server, name).await
    }

    async fn get_virtual_network_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str) -> Result<VirtualNetworkRule, AzureError> {
        database::get_virtual_network_rule(self, flavor, resource_group, server, name).await
    }

    async fn create_or_update_virtual_network_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str, rule: &VirtualNetworkRule) -> Result<LongRunning<VirtualNetworkRule>, AzureError> {
        database::create_or_update_virtual_network_rule(self, flavor, resource_group, server, name, rule).await
    }

    async fn delete_virtual_network_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        database::delete_virtual_network_rule(self, flavor, resource_group, server, name).await
    }

    // CosmosDB
    async fn get_database_account(&self, resource_group: &str, name: &str) -> Result<DatabaseAccount, AzureError> {
        database::get_database_account(self, resource_group, name).await
    }

    async fn create_or_update_database_account(&self, resource_group: &str, name: &str, account: &DatabaseAccount) -> Result<LongRunning<DatabaseAccount>, AzureError> {
        database::create_or_update_database_account(self, resource_group, name, account).await
    }

    async fn delete_database_account(&self, resource_group: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        database::delete_database_account(self, resource_group, name).await
    }

    async fn list_database_account_keys(&self, resource_group: &str, name: &str) -> Result<DatabaseAccountKeys, AzureError> {
        database::list_database_account_keys(self, resource_group, name).await
    }

    // Network
    async fn get_virtual_network(&self, resource_group: &str, name: &str) -> Result<VirtualNetwork, AzureError> {
        network::get_virtual_network(self, resource_group, name).await
    }

    async fn create_or_update_virtual_network(&self, resource_group: &str, name: &str, vnet: &VirtualNetwork) -> Result<LongRunning<VirtualNetwork>, AzureError> {
        network::create_or_update_virtual_network(self, resource_group, name, vnet).await
    }

    async fn delete_virtual_network(&self, resource_group: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        network::delete_virtual_network(self, resource_group, name).await
    }

    async fn get_subnet(&self, resource_group: &str, virtual_network: &str, name: &str) -> Result<Subnet, AzureError> {
        network::get_subnet(self, resource_group, virtual_network, name).await
    }

    async fn create_or_update_subnet(&self, resource_group: &str, virtual_network: &str, name: &str, subnet: &Subnet) -> Result<LongRunning<Subnet>, AzureError> {
        network::create_or_update_subnet(self, resource_group, virtual_network, name, subnet).await
    }

    async fn delete_subnet(&self, resource_group: &str, virtual_network: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        network::delete_subnet(self, resource_group, virtual_network, name).await
    }

    async fn get_security_group(&self, resource_group: &str, name: &str) -> Result<NetworkSecurityGroup, AzureError> {
        network::get_security_group(self, resource_group, name).await
    }

    async fn create_or_update_security_group(&self, resource_group: &str, name: &str, group: &NetworkSecurityGroup) -> Result<LongRunning<NetworkSecurityGroup>, AzureError> {
        network::create_or_update_security_group(self, resource_group, name, group).await
    }

    async fn delete_security_group(&self, resource_group: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        network::delete_security_group(self, resource_group, name).await
    }
}
