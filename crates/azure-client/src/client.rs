//! Azure Resource Manager client
//!
//! Implements the ARM REST calls for the resource providers managed by the
//! controllers: Microsoft.Resources, Microsoft.Cache, Microsoft.DBforMySQL,
//! Microsoft.DBforPostgreSQL, Microsoft.DocumentDB and Microsoft.Network.

use crate::auth::TokenProvider;
use crate::azure_trait::AzureClientTrait;
use crate::common::{HttpClient, paths};
use crate::credentials::Credentials;
use crate::error::AzureError;
use crate::models::*;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// api-version of Microsoft.Resources
pub const RESOURCES_API_VERSION: &str = "2019-05-01";
/// api-version of Microsoft.Cache
pub const REDIS_API_VERSION: &str = "2018-03-01";
/// api-version of Microsoft.DBforMySQL and Microsoft.DBforPostgreSQL
pub const SQL_API_VERSION: &str = "2017-12-01";
/// api-version of Microsoft.Network
pub const NETWORK_API_VERSION: &str = "2019-06-01";
/// api-version of Microsoft.DocumentDB
pub const COSMOSDB_API_VERSION: &str = "2019-08-01";
/// api-version used to read the subscription when validating credentials
pub const SUBSCRIPTIONS_API_VERSION: &str = "2020-01-01";

/// Azure Resource Manager client for one subscription
pub struct AzureClient {
    http: HttpClient,
    subscription_id: String,
}

impl AzureClient {
    /// Create a new client from service principal credentials
    pub fn new(credentials: Credentials) -> Result<Self, AzureError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(AzureError::Http)?;

        let subscription_id = credentials.subscription_id.clone();
        let endpoint = credentials.resource_manager_endpoint().to_string();
        let tokens = TokenProvider::new(client.clone(), credentials);

        Ok(Self {
            http: HttpClient::new(client, &endpoint, tokens),
            subscription_id,
        })
    }

    fn resource_group_path(&self, name: &str) -> String {
        paths::resource_group(&self.subscription_id, name)
    }
}

/// Take the resource from a synchronous response, or read it back when ARM returned no body
async fn resource_or_get<T, F>(result: LongRunning<T>, get: F) -> Result<T, AzureError>
where
    F: std::future::Future<Output = Result<T, AzureError>>,
{
    match result.resource {
        Some(resource) => Ok(resource),
        None => get.await,
    }
}

#[async_trait::async_trait]
impl AzureClientTrait for AzureClient {
    fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    async fn validate_credentials(&self) -> Result<(), AzureError> {
        debug!("Validating Azure credentials for subscription {}", self.subscription_id);
        let path = format!("/subscriptions/{}", self.subscription_id);
        let _: serde_json::Value = self.http.get(&path, SUBSCRIPTIONS_API_VERSION).await?;
        Ok(())
    }

    async fn fetch_async_operation(&self, operation: &LongRunningOperation) -> Result<OperationState, AzureError> {
        self.http.poll(operation).await
    }

    // Resource groups

    async fn get_resource_group(&self, name: &str) -> Result<ResourceGroup, AzureError> {
        self.http.get(&self.resource_group_path(name), RESOURCES_API_VERSION).await
    }

    async fn create_or_update_resource_group(&self, name: &str, group: &ResourceGroup) -> Result<ResourceGroup, AzureError> {
        let result = self
            .http
            .put(&self.resource_group_path(name), RESOURCES_API_VERSION, group)
            .await?;
        resource_or_get(result, self.get_resource_group(name)).await
    }

    async fn delete_resource_group(&self, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        self.http.delete(&self.resource_group_path(name), RESOURCES_API_VERSION).await
    }

    // Redis

    async fn get_redis(&self, resource_group: &str, name: &str) -> Result<RedisResource, AzureError> {
        self.http.get(&paths::redis(&self.subscription_id, resource_group, name), REDIS_API_VERSION).await
    }

    async fn create_redis(&self, resource_group: &str, name: &str, cache: &RedisResource) -> Result<LongRunning<RedisResource>, AzureError> {
        self.http.put(&paths::redis(&self.subscription_id, resource_group, name), REDIS_API_VERSION, cache).await
    }

    async fn update_redis(&self, resource_group: &str, name: &str, update: &RedisUpdateParameters) -> Result<RedisResource, AzureError> {
        let result = self
            .http
            .patch(&paths::redis(&self.subscription_id, resource_group, name), REDIS_API_VERSION, update)
            .await?;
        resource_or_get(result, self.get_redis(resource_group, name)).await
    }

    async fn delete_redis(&self, resource_group: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        self.http.delete(&paths::redis(&self.subscription_id, resource_group, name), REDIS_API_VERSION).await
    }

    async fn list_redis_keys(&self, resource_group: &str, name: &str) -> Result<RedisAccessKeys, AzureError> {
        let path = format!("{}/listKeys", paths::redis(&self.subscription_id, resource_group, name));
        self.http.post(&path, REDIS_API_VERSION).await
    }

    // MySQL / PostgreSQL servers

    async fn get_server(&self, flavor: ServerFlavor, resource_group: &str, name: &str) -> Result<Server, AzureError> {
        self.http.get(&paths::server(&self.subscription_id, flavor, resource_group, name), SQL_API_VERSION).await
    }

    async fn create_server(&self, flavor: ServerFlavor, resource_group: &str, name: &str, params: &ServerCreateParameters) -> Result<LongRunning<Server>, AzureError> {
        self.http.put(&paths::server(&self.subscription_id, flavor, resource_group, name), SQL_API_VERSION, params).await
    }

    async fn update_server(&self, flavor: ServerFlavor, resource_group: &str, name: &str, params: &ServerUpdateParameters) -> Result<LongRunning<Server>, AzureError> {
        self.http.patch(&paths::server(&self.subscription_id, flavor, resource_group, name), SQL_API_VERSION, params).await
    }

    async fn delete_server(&self, flavor: ServerFlavor, resource_group: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        self.http.delete(&paths::server(&self.subscription_id, flavor, resource_group, name), SQL_API_VERSION).await
    }

    async fn get_firewall_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str) -> Result<FirewallRule, AzureError> {
        let path = paths::firewall_rule(&self.subscription_id, flavor, resource_group, server, name);
        self.http.get(&path, SQL_API_VERSION).await
    }

    async fn create_or_update_firewall_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str, rule: &FirewallRule) -> Result<LongRunning<FirewallRule>, AzureError> {
        let path = paths::firewall_rule(&self.subscription_id, flavor, resource_group, server, name);
        self.http.put(&path, SQL_API_VERSION, rule).await
    }

    async fn delete_firewall_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        let path = paths::firewall_rule(&self.subscription_id, flavor, resource_group, server, name);
        self.http.delete(&path, SQL_API_VERSION).await
    }

    async fn get_virtual_network_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str) -> Result<VirtualNetworkRule, AzureError> {
        let path = paths::virtual_network_rule(&self.subscription_id, flavor, resource_group, server, name);
        self.http.get(&path, SQL_API_VERSION).await
    }

    async fn create_or_update_virtual_network_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str, rule: &VirtualNetworkRule) -> Result<LongRunning<VirtualNetworkRule>, AzureError> {
        let path = paths::virtual_network_rule(&self.subscription_id, flavor, resource_group, server, name);
        self.http.put(&path, SQL_API_VERSION, rule).await
    }

    async fn delete_virtual_network_rule(&self, flavor: ServerFlavor, resource_group: &str, server: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        let path = paths::virtual_network_rule(&self.subscription_id, flavor, resource_group, server, name);
        self.http.delete(&path, SQL_API_VERSION).await
    }

    // CosmosDB

    async fn get_database_account(&self, resource_group: &str, name: &str) -> Result<DatabaseAccount, AzureError> {
        self.http.get(&paths::database_account(&self.subscription_id, resource_group, name), COSMOSDB_API_VERSION).await
    }

    async fn create_or_update_database_account(&self, resource_group: &str, name: &str, account: &DatabaseAccount) -> Result<LongRunning<DatabaseAccount>, AzureError> {
        self.http
            .put(&paths::database_account(&self.subscription_id, resource_group, name), COSMOSDB_API_VERSION, account)
            .await
    }

    async fn delete_database_account(&self, resource_group: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        self.http.delete(&paths::database_account(&self.subscription_id, resource_group, name), COSMOSDB_API_VERSION).await
    }

    async fn list_database_account_keys(&self, resource_group: &str, name: &str) -> Result<DatabaseAccountKeys, AzureError> {
        let path = format!("{}/listKeys", paths::database_account(&self.subscription_id, resource_group, name));
        self.http.post(&path, COSMOSDB_API_VERSION).await
    }

    // Network

    async fn get_virtual_network(&self, resource_group: &str, name: &str) -> Result<VirtualNetwork, AzureError> {
        self.http
            .get(&paths::virtual_network(&self.subscription_id, resource_group, name), NETWORK_API_VERSION)
            .await
    }

    async fn create_or_update_virtual_network(&self, resource_group: &str, name: &str, network: &VirtualNetwork) -> Result<LongRunning<VirtualNetwork>, AzureError> {
        self.http
            .put(&paths::virtual_network(&self.subscription_id, resource_group, name), NETWORK_API_VERSION, network)
            .await
    }

    async fn delete_virtual_network(&self, resource_group: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        self.http
            .delete(&paths::virtual_network(&self.subscription_id, resource_group, name), NETWORK_API_VERSION)
            .await
    }

    async fn get_subnet(&self, resource_group: &str, virtual_network: &str, name: &str) -> Result<Subnet, AzureError> {
        self.http
            .get(&paths::subnet(&self.subscription_id, resource_group, virtual_network, name), NETWORK_API_VERSION)
            .await
    }

    async fn create_or_update_subnet(&self, resource_group: &str, virtual_network: &str, name: &str, subnet: &Subnet) -> Result<LongRunning<Subnet>, AzureError> {
        self.http
            .put(&paths::subnet(&self.subscription_id, resource_group, virtual_network, name), NETWORK_API_VERSION, subnet)
            .await
    }

    async fn delete_subnet(&self, resource_group: &str, virtual_network: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        self.http
            .delete(&paths::subnet(&self.subscription_id, resource_group, virtual_network, name), NETWORK_API_VERSION)
            .await
    }

    async fn get_security_group(&self, resource_group: &str, name: &str) -> Result<NetworkSecurityGroup, AzureError> {
        self.http
            .get(&paths::security_group(&self.subscription_id, resource_group, name), NETWORK_API_VERSION)
            .await
    }

    async fn create_or_update_security_group(&self, resource_group: &str, name: &str, group: &NetworkSecurityGroup) -> Result<LongRunning<NetworkSecurityGroup>, AzureError> {
        self.http
            .put(&paths::security_group(&self.subscription_id, resource_group, name), NETWORK_API_VERSION, group)
            .await
    }

    async fn delete_security_group(&self, resource_group: &str, name: &str) -> Result<Option<LongRunningOperation>, AzureError> {
        self.http
            .delete(&paths::security_group(&self.subscription_id, resource_group, name), NETWORK_API_VERSION)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    const TOKEN_BODY: &str = r#"{"token_type":"Bearer","expires_in":3600,"access_token":"test-token"}"#;

    /// Read one HTTP request and return its head
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before the request head");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < head_end + length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        head
    }

    /// Serve a token endpoint plus fixed answers for operation URLs
    async fn start_stub() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let head = read_request(&mut socket).await;
                    let (status, body) = if head.contains("/oauth2/v2.0/token") {
                        ("200 OK", TOKEN_BODY)
                    } else if head.contains("/operations/expired") {
                        ("404 Not Found", r#"{"error":{"code":"NotFound","message":"operation gone"}}"#)
                    } else if head.contains("/operations/rejected") {
                        ("400 Bad Request", r#"{"error":{"code":"InvalidParameter","message":"bad sku"}}"#)
                    } else {
                        ("200 OK", r#"{"status":"InProgress"}"#)
                    };
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    socket.write_all(response.as_bytes()).await.unwrap();
                    let _ = socket.shutdown().await;
                });
            }
        });
        base
    }

    fn client_for(base: &str) -> AzureClient {
        let credentials = format!(
            r#"{{"clientId":"c","clientSecret":"s","tenantId":"t","subscriptionId":"sub",
                "activeDirectoryEndpointUrl":"{base}/","resourceManagerEndpointUrl":"{base}/"}}"#
        );
        AzureClient::new(Credentials::from_json(credentials.as_bytes()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_expired_polling_url_is_not_found() {
        let base = start_stub().await;
        let client = client_for(&base);
        let operation = LongRunningOperation::new("PUT", format!("{}/operations/expired", base));

        let err = client.fetch_async_operation(&operation).await.unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {}", err);
    }

    #[tokio::test]
    async fn test_rejected_operation_is_failed() {
        let base = start_stub().await;
        let client = client_for(&base);
        let operation = LongRunningOperation::new("PUT", format!("{}/operations/rejected", base));

        let state = client.fetch_async_operation(&operation).await.unwrap();
        assert_eq!(state.status, OperationStatus::Failed);
        assert_eq!(state.error_message.as_deref(), Some("InvalidParameter: bad sku"));
    }

    #[tokio::test]
    async fn test_reported_status_wins() {
        let base = start_stub().await;
        let client = client_for(&base);
        let operation = LongRunningOperation::new("PUT", format!("{}/operations/running", base));

        let state = client.fetch_async_operation(&operation).await.unwrap();
        assert_eq!(state.status, OperationStatus::InProgress);
    }
}
