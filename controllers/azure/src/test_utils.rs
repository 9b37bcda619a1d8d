//! Test utilities for unit testing reconcilers
//!
//! This module provides in-memory stand-ins for the cluster (store, connector,
//! reference lookups) and helpers for creating test resources.

use crate::error::ControllerError;
use crate::managed::store::has_finalizer;
use crate::managed::{
    ConnectionDetails, Connector, FINALIZER, ManagedKind, ManagedReconciler, ManagedStore,
    ReconcileOutcome, ReferenceLookup,
};
use azure_client::{AzureClientTrait, MockAzureClient, ServerFlavor};
use crds::*;
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use kube::Resource;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Subscription of the test credentials
pub const TEST_SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000001";

/// Requeue intervals used by [`Harness`]
pub const TEST_POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const TEST_SHORT_WAIT: Duration = Duration::from_secs(30);

fn meta(name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        uid: Some(format!("uid-{}", name)),
        ..Default::default()
    }
}

/// Secret reference for connection details
pub fn connection_secret_ref(namespace: &str, name: &str) -> SecretReference {
    SecretReference {
        name: name.to_string(),
        namespace: namespace.to_string(),
    }
}

/// Mark a resource as being deleted
pub fn mark_deleted<R: Resource>(resource: &mut R) {
    let timestamp: Time = serde_json::from_value(serde_json::json!("2026-01-01T00:00:00Z")).unwrap();
    resource.meta_mut().deletion_timestamp = Some(timestamp);
}

/// Add the managed finalizer, as a previous pass would have
pub fn with_finalizer<R: Resource>(mut resource: R) -> R {
    resource.meta_mut().finalizers = Some(vec![FINALIZER.to_string()]);
    resource
}

/// Helper to create a test credentials secret holding `az ad sp create-for-rbac --sdk-auth` output
pub fn create_test_credentials_secret(name: &str, key: &str) -> Secret {
    let credentials = serde_json::json!({
        "clientId": "11111111-1111-1111-1111-111111111111",
        "clientSecret": "secret",
        "subscriptionId": TEST_SUBSCRIPTION,
        "tenantId": "22222222-2222-2222-2222-222222222222",
        "activeDirectoryEndpointUrl": "https://login.microsoftonline.com",
        "resourceManagerEndpointUrl": "https://management.azure.com/"
    });
    let mut data = BTreeMap::new();
    data.insert(key.to_string(), ByteString(credentials.to_string().into_bytes()));

    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("crossplane-system".to_string()),
            resource_version: Some("1".to_string()),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    }
}

/// Helper to create a test ProviderConfig; `secret` is `(namespace, name, key)`
pub fn create_test_provider_config(name: &str, secret: Option<(&str, &str, &str)>) -> ProviderConfig {
    ProviderConfig {
        metadata: meta(name),
        spec: ProviderConfigSpec {
            credentials: ProviderCredentials {
                source: CredentialsSource::Secret,
                secret_ref: secret.map(|(namespace, name, key)| SecretKeySelector {
                    name: name.to_string(),
                    namespace: namespace.to_string(),
                    key: key.to_string(),
                }),
            },
        },
        status: None,
    }
}

/// Helper to create a test ResourceGroup CRD
pub fn create_test_resource_group(name: &str, location: &str) -> ResourceGroup {
    ResourceGroup {
        metadata: meta(name),
        spec: ResourceGroupSpec {
            resource_spec: ResourceSpec::default(),
            location: location.to_string(),
            tags: None,
        },
        status: None,
    }
}

/// Helper to create a test Redis CRD
pub fn create_test_redis(name: &str, resource_group: &str) -> Redis {
    Redis {
        metadata: meta(name),
        spec: RedisSpec {
            resource_spec: ResourceSpec::default(),
            for_provider: RedisParameters {
                resource_group_name: Some(resource_group.to_string()),
                location: "westeurope".to_string(),
                sku: RedisSku {
                    name: RedisSkuName::Standard,
                    family: RedisSkuFamily::C,
                    capacity: 1,
                },
                ..Default::default()
            },
        },
        status: None,
    }
}

/// Parameters of a General Purpose Gen5 server with 2 vCores
pub fn create_test_sql_parameters(resource_group: &str) -> SqlServerParameters {
    SqlServerParameters {
        resource_group_name: Some(resource_group.to_string()),
        resource_group_name_ref: None,
        location: "westeurope".to_string(),
        administrator_login: "dbadmin".to_string(),
        sku: SqlServerSku {
            tier: SkuTier::GeneralPurpose,
            capacity: 2,
            family: "Gen5".to_string(),
            size: None,
        },
        version: "5.7".to_string(),
        ssl_enforcement: SslEnforcement::Enabled,
        minimal_tls_version: None,
        public_network_access: None,
        storage_profile: StorageProfile {
            storage_mb: 51200,
            backup_retention_days: None,
            geo_redundant_backup: None,
            storage_autogrow: None,
        },
        tags: None,
    }
}

/// Helper to create a test MySQLServer CRD
pub fn create_test_mysql_server(name: &str, resource_group: &str) -> MySQLServer {
    MySQLServer {
        metadata: meta(name),
        spec: MySQLServerSpec {
            resource_spec: ResourceSpec::default(),
            for_provider: create_test_sql_parameters(resource_group),
        },
        status: None,
    }
}

/// Helper to create a test PostgreSQLServer CRD
pub fn create_test_postgresql_server(name: &str, resource_group: &str) -> PostgreSQLServer {
    let mut parameters = create_test_sql_parameters(resource_group);
    parameters.version = "11".to_string();
    PostgreSQLServer {
        metadata: meta(name),
        spec: PostgreSQLServerSpec {
            resource_spec: ResourceSpec::default(),
            for_provider: parameters,
        },
        status: None,
    }
}

fn firewall_rule_parameters(resource_group: &str, server: &str) -> FirewallRuleParameters {
    FirewallRuleParameters {
        server_name: Some(server.to_string()),
        server_name_ref: None,
        resource_group_name: Some(resource_group.to_string()),
        resource_group_name_ref: None,
        properties: FirewallRuleProperties {
            start_ip_address: "10.0.0.1".to_string(),
            end_ip_address: "10.0.0.10".to_string(),
        },
    }
}

/// Helper to create a test MySQLServerFirewallRule CRD
pub fn create_test_mysql_firewall_rule(name: &str, resource_group: &str, server: &str) -> MySQLServerFirewallRule {
    MySQLServerFirewallRule {
        metadata: meta(name),
        spec: MySQLServerFirewallRuleSpec {
            resource_spec: ResourceSpec::default(),
            for_provider: firewall_rule_parameters(resource_group, server),
        },
        status: None,
    }
}

/// Helper to create a test PostgreSQLServerFirewallRule CRD
pub fn create_test_postgresql_firewall_rule(
    name: &str,
    resource_group: &str,
    server: &str,
) -> PostgreSQLServerFirewallRule {
    PostgreSQLServerFirewallRule {
        metadata: meta(name),
        spec: PostgreSQLServerFirewallRuleSpec {
            resource_spec: ResourceSpec::default(),
            for_provider: firewall_rule_parameters(resource_group, server),
        },
        status: None,
    }
}

fn virtual_network_rule_parameters(resource_group: &str, server: &str, subnet_id: &str) -> VirtualNetworkRuleParameters {
    VirtualNetworkRuleParameters {
        server_name: Some(server.to_string()),
        server_name_ref: None,
        resource_group_name: Some(resource_group.to_string()),
        resource_group_name_ref: None,
        properties: VirtualNetworkRuleProperties {
            virtual_network_subnet_id: Some(subnet_id.to_string()),
            virtual_network_subnet_id_ref: None,
            ignore_missing_vnet_service_endpoint: false,
        },
    }
}

/// Helper to create a test MySQLServerVirtualNetworkRule CRD
pub fn create_test_mysql_virtual_network_rule(
    name: &str,
    resource_group: &str,
    server: &str,
    subnet_id: &str,
) -> MySQLServerVirtualNetworkRule {
    MySQLServerVirtualNetworkRule {
        metadata: meta(name),
        spec: MySQLServerVirtualNetworkRuleSpec {
            resource_spec: ResourceSpec::default(),
            for_provider: virtual_network_rule_parameters(resource_group, server, subnet_id),
        },
        status: None,
    }
}

/// Helper to create a test PostgreSQLServerVirtualNetworkRule CRD
pub fn create_test_postgresql_virtual_network_rule(
    name: &str,
    resource_group: &str,
    server: &str,
    subnet_id: &str,
) -> PostgreSQLServerVirtualNetworkRule {
    PostgreSQLServerVirtualNetworkRule {
        metadata: meta(name),
        spec: PostgreSQLServerVirtualNetworkRuleSpec {
            resource_spec: ResourceSpec::default(),
            for_provider: virtual_network_rule_parameters(resource_group, server, subnet_id),
        },
        status: None,
    }
}

/// Helper to create a test CosmosDBAccount CRD
pub fn create_test_cosmosdb_account(name: &str, resource_group: &str) -> CosmosDBAccount {
    CosmosDBAccount {
        metadata: meta(name),
        spec: CosmosDBAccountSpec {
            resource_spec: ResourceSpec::default(),
            for_provider: CosmosDBAccountParameters {
                resource_group_name: Some(resource_group.to_string()),
                resource_group_name_ref: None,
                kind: DatabaseAccountKind::GlobalDocumentDB,
                location: "westeurope".to_string(),
                properties: CosmosDBAccountProperties {
                    database_account_offer_type: "Standard".to_string(),
                    enable_automatic_failover: None,
                    enable_multiple_write_locations: None,
                    is_virtual_network_filter_enabled: None,
                    locations: vec![CosmosDBLocation {
                        location_name: "westeurope".to_string(),
                        failover_priority: 0,
                        is_zone_redundant: None,
                    }],
                    consistency_policy: Some(ConsistencyPolicy {
                        default_consistency_level: "Session".to_string(),
                        max_staleness_prefix: None,
                        max_interval_in_seconds: None,
                    }),
                    ip_range_filter: None,
                },
                tags: None,
            },
        },
        status: None,
    }
}

/// Helper to create a test VirtualNetwork CRD
pub fn create_test_virtual_network(name: &str, resource_group: &str) -> VirtualNetwork {
    VirtualNetwork {
        metadata: meta(name),
        spec: VirtualNetworkSpec {
            resource_spec: ResourceSpec::default(),
            for_provider: VirtualNetworkParameters {
                resource_group_name: Some(resource_group.to_string()),
                resource_group_name_ref: None,
                location: "westeurope".to_string(),
                properties: VirtualNetworkProperties {
                    address_space: AddressSpace {
                        address_prefixes: vec!["10.0.0.0/16".to_string()],
                    },
                    enable_ddos_protection: false,
                    enable_vm_protection: false,
                },
                tags: None,
            },
        },
        status: None,
    }
}

/// Helper to create a test Subnet CRD
pub fn create_test_subnet(name: &str, resource_group: &str, virtual_network: &str) -> Subnet {
    Subnet {
        metadata: meta(name),
        spec: SubnetSpec {
            resource_spec: ResourceSpec::default(),
            for_provider: SubnetParameters {
                virtual_network_name: Some(virtual_network.to_string()),
                virtual_network_name_ref: None,
                resource_group_name: Some(resource_group.to_string()),
                resource_group_name_ref: None,
                properties: SubnetProperties {
                    address_prefix: "10.0.1.0/24".to_string(),
                    service_endpoints: vec![ServiceEndpoint {
                        service: "Microsoft.Sql".to_string(),
                    }],
                },
            },
        },
        status: None,
    }
}

/// Helper to create a test SecurityGroup CRD with one inbound HTTPS rule
pub fn create_test_security_group(name: &str, resource_group: &str) -> SecurityGroup {
    SecurityGroup {
        metadata: meta(name),
        spec: SecurityGroupSpec {
            resource_spec: ResourceSpec::default(),
            for_provider: SecurityGroupParameters {
                resource_group_name: Some(resource_group.to_string()),
                resource_group_name_ref: None,
                location: "westeurope".to_string(),
                security_rules: vec![SecurityRule {
                    name: "allow-https".to_string(),
                    properties: SecurityRuleProperties {
                        protocol: "Tcp".to_string(),
                        source_port_range: Some("*".to_string()),
                        destination_port_range: Some("443".to_string()),
                        source_address_prefix: Some("*".to_string()),
                        destination_address_prefix: Some("*".to_string()),
                        access: "Allow".to_string(),
                        priority: 100,
                        direction: "Inbound".to_string(),
                        description: None,
                    },
                }],
                tags: None,
            },
        },
        status: None,
    }
}

#[derive(Debug)]
struct MemoryState<R> {
    latest: Option<R>,
    status_updates: usize,
    spec_updates: usize,
    secret: Option<ConnectionDetails>,
    secret_deleted: bool,
}

/// In-memory [`ManagedStore`] recording what the lifecycle persisted
#[derive(Debug)]
pub struct MemoryStore<R> {
    state: Mutex<MemoryState<R>>,
}

impl<R: Managed> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                latest: None,
                status_updates: 0,
                spec_updates: 0,
                secret: None,
                secret_deleted: false,
            }),
        }
    }
}

impl<R: Managed> MemoryStore<R> {
    /// The resource as last written
    pub fn latest(&self) -> Option<R> {
        self.state.lock().unwrap().latest.clone()
    }

    pub fn status_updates(&self) -> usize {
        self.state.lock().unwrap().status_updates
    }

    pub fn spec_updates(&self) -> usize {
        self.state.lock().unwrap().spec_updates
    }

    /// Current content of the connection secret
    pub fn secret(&self) -> Option<ConnectionDetails> {
        self.state.lock().unwrap().secret.clone()
    }

    /// Value of one connection secret key as a string
    pub fn secret_value(&self, key: &str) -> Option<String> {
        self.secret()
            .and_then(|s| s.get(key).cloned())
            .map(|v| String::from_utf8(v).unwrap())
    }

    pub fn secret_deleted(&self) -> bool {
        self.state.lock().unwrap().secret_deleted
    }

    fn keep(&self, resource: &R) {
        self.state.lock().unwrap().latest = Some(resource.clone());
    }
}

#[async_trait::async_trait]
impl<R: Managed> ManagedStore<R> for MemoryStore<R> {
    async fn update_status(&self, _previous: Option<&R::Status>, resource: &R) -> Result<(), ControllerError> {
        self.state.lock().unwrap().status_updates += 1;
        self.keep(resource);
        Ok(())
    }

    async fn update_spec(&self, resource: &R) -> Result<(), ControllerError> {
        self.state.lock().unwrap().spec_updates += 1;
        self.keep(resource);
        Ok(())
    }

    async fn add_finalizer(&self, resource: &mut R) -> Result<(), ControllerError> {
        if !has_finalizer(resource) {
            resource
                .meta_mut()
                .finalizers
                .get_or_insert_with(Vec::new)
                .push(FINALIZER.to_string());
        }
        self.keep(resource);
        Ok(())
    }

    async fn remove_finalizer(&self, resource: &mut R) -> Result<(), ControllerError> {
        if let Some(finalizers) = resource.meta_mut().finalizers.as_mut() {
            finalizers.retain(|f| f != FINALIZER);
        }
        self.keep(resource);
        Ok(())
    }

    async fn publish_connection(&self, resource: &R, details: &ConnectionDetails) -> Result<(), ControllerError> {
        if resource.connection_secret_ref().is_none() {
            return Ok(());
        }
        let mut state = self.state.lock().unwrap();
        let secret = state.secret.get_or_insert_with(BTreeMap::new);
        for (key, value) in details {
            secret.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn unpublish_connection(&self, resource: &R) -> Result<(), ControllerError> {
        if resource.connection_secret_ref().is_none() {
            return Ok(());
        }
        let mut state = self.state.lock().unwrap();
        state.secret = None;
        state.secret_deleted = true;
        Ok(())
    }
}

/// Connector handing out a fixed client, or failing
#[derive(Clone)]
pub struct StaticConnector {
    result: Result<Arc<dyn AzureClientTrait>, String>,
}

impl std::fmt::Debug for StaticConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticConnector").finish_non_exhaustive()
    }
}

impl StaticConnector {
    pub fn new(mock: &MockAzureClient) -> Self {
        Self {
            result: Ok(Arc::new(mock.clone())),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl Connector for StaticConnector {
    async fn connect(&self, _provider_config: &str) -> Result<Arc<dyn AzureClientTrait>, ControllerError> {
        match &self.result {
            Ok(client) => Ok(Arc::clone(client)),
            Err(message) => Err(ControllerError::Credentials(message.clone())),
        }
    }
}

/// Reference lookup over fixed values; unknown names are not ready
#[derive(Debug, Clone, Default)]
pub struct StaticReferences {
    resource_groups: HashMap<String, String>,
    servers: HashMap<(ServerFlavor, String), String>,
    virtual_networks: HashMap<String, String>,
    subnet_ids: HashMap<String, String>,
}

impl StaticReferences {
    pub fn with_resource_group(mut self, object: &str, azure_name: &str) -> Self {
        self.resource_groups.insert(object.to_string(), azure_name.to_string());
        self
    }

    pub fn with_server(mut self, flavor: ServerFlavor, object: &str, azure_name: &str) -> Self {
        self.servers
            .insert((flavor, object.to_string()), azure_name.to_string());
        self
    }

    pub fn with_virtual_network(mut self, object: &str, azure_name: &str) -> Self {
        self.virtual_networks.insert(object.to_string(), azure_name.to_string());
        self
    }

    pub fn with_subnet_id(mut self, object: &str, id: &str) -> Self {
        self.subnet_ids.insert(object.to_string(), id.to_string());
        self
    }
}

fn lookup(values: &HashMap<String, String>, kind: &str, name: &str) -> Result<String, ControllerError> {
    values
        .get(name)
        .cloned()
        .ok_or_else(|| ControllerError::ReferenceNotReady(format!("{} {} not found", kind, name)))
}

#[async_trait::async_trait]
impl ReferenceLookup for StaticReferences {
    async fn resource_group_name(&self, name: &str) -> Result<String, ControllerError> {
        lookup(&self.resource_groups, "ResourceGroup", name)
    }

    async fn server_name(&self, flavor: ServerFlavor, name: &str) -> Result<String, ControllerError> {
        self.servers
            .get(&(flavor, name.to_string()))
            .cloned()
            .ok_or_else(|| ControllerError::ReferenceNotReady(format!("{} server {} not found", flavor, name)))
    }

    async fn virtual_network_name(&self, name: &str) -> Result<String, ControllerError> {
        lookup(&self.virtual_networks, "VirtualNetwork", name)
    }

    async fn subnet_id(&self, name: &str) -> Result<String, ControllerError> {
        lookup(&self.subnet_ids, "Subnet", name)
    }
}

/// Everything needed to run the managed lifecycle against the mock API
pub struct Harness<R> {
    pub mock: MockAzureClient,
    pub connector: StaticConnector,
    pub store: MemoryStore<R>,
    pub references: StaticReferences,
}

impl<R: ManagedKind> Harness<R> {
    pub fn new() -> Self {
        let mock = MockAzureClient::new(TEST_SUBSCRIPTION);
        Self {
            connector: StaticConnector::new(&mock),
            mock,
            store: MemoryStore::default(),
            references: StaticReferences::default(),
        }
    }

    pub fn with_references(mut self, references: StaticReferences) -> Self {
        self.references = references;
        self
    }

    pub fn with_connector(mut self, connector: StaticConnector) -> Self {
        self.connector = connector;
        self
    }

    pub fn reconciler(&self) -> ManagedReconciler<'_, R> {
        ManagedReconciler {
            connector: &self.connector,
            store: &self.store,
            references: &self.references,
            poll_interval: TEST_POLL_INTERVAL,
            short_wait: TEST_SHORT_WAIT,
        }
    }

    pub async fn reconcile(&self, resource: &R) -> Result<ReconcileOutcome, ControllerError> {
        self.reconciler().reconcile(resource).await
    }

    /// Reconcile the resource as the store last saw it, like the next watch event would
    pub async fn reconcile_again(&self) -> Result<ReconcileOutcome, ControllerError> {
        let latest = self.store.latest().expect("resource was never persisted");
        self.reconcile(&latest).await
    }

    /// The resource as last persisted
    pub fn latest(&self) -> R {
        self.store.latest().expect("resource was never persisted")
    }

    /// Reconcile `resource` for `passes` passes while ARM keeps its creation in
    /// flight, then complete the creation and reconcile once more.
    pub async fn reconcile_with_creation_in_flight(&self, resource: &R, passes: usize) -> ReconcileOutcome {
        self.mock.set_deferred_creation(true);
        let outcome = self.reconcile(resource).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Requeue(TEST_SHORT_WAIT));
        let url = self.mock.last_operation_url().expect("creation started no operation");

        for _ in 1..passes {
            self.reconcile_again().await.unwrap();
            let ready = self.latest().condition(ConditionType::Ready).cloned().unwrap();
            assert_eq!(ready.reason, ConditionReason::Creating);
        }

        self.mock.complete_operation(&url);
        self.reconcile_again().await.unwrap()
    }
}
