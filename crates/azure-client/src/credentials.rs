//! Service principal credentials
//!
//! The credentials secret holds the JSON printed by
//! `az ad sp create-for-rbac --sdk-auth`.

use crate::error::AzureError;
use serde::Deserialize;
use std::fmt;

/// Azure Active Directory endpoint of the public cloud
pub const DEFAULT_ACTIVE_DIRECTORY_ENDPOINT: &str = "https://login.microsoftonline.com/";
/// Resource Manager endpoint of the public cloud
pub const DEFAULT_RESOURCE_MANAGER_ENDPOINT: &str = "https://management.azure.com/";

/// Service principal credentials for one subscription
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub subscription_id: String,
    #[serde(default = "default_active_directory_endpoint")]
    pub active_directory_endpoint_url: String,
    #[serde(default = "default_resource_manager_endpoint")]
    pub resource_manager_endpoint_url: String,
}

fn default_active_directory_endpoint() -> String {
    DEFAULT_ACTIVE_DIRECTORY_ENDPOINT.to_string()
}

fn default_resource_manager_endpoint() -> String {
    DEFAULT_RESOURCE_MANAGER_ENDPOINT.to_string()
}

impl Credentials {
    /// Parse credentials from the raw bytes of a secret key
    pub fn from_json(data: &[u8]) -> Result<Self, AzureError> {
        let creds: Credentials = serde_json::from_slice(data)
            .map_err(|e| AzureError::Credentials(format!("cannot parse credentials JSON: {}", e)))?;

        for (field, value) in [
            ("clientId", &creds.client_id),
            ("clientSecret", &creds.client_secret),
            ("tenantId", &creds.tenant_id),
            ("subscriptionId", &creds.subscription_id),
        ] {
            if value.trim().is_empty() {
                return Err(AzureError::Credentials(format!("{} is empty", field)));
            }
        }

        Ok(creds)
    }

    /// OAuth2 v2 token endpoint of the tenant
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.active_directory_endpoint_url.trim_end_matches('/'),
            self.tenant_id
        )
    }

    /// Scope requested for Resource Manager tokens
    pub fn scope(&self) -> String {
        format!("{}/.default", self.resource_manager_endpoint_url.trim_end_matches('/'))
    }

    /// Resource Manager base URL without trailing slash
    pub fn resource_manager_endpoint(&self) -> &str {
        self.resource_manager_endpoint_url.trim_end_matches('/')
    }
}

// Keep the client secret out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("subscription_id", &self.subscription_id)
            .field("active_directory_endpoint_url", &self.active_directory_endpoint_url)
            .field("resource_manager_endpoint_url", &self.resource_manager_endpoint_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDK_AUTH: &str = r#"{
        "clientId": "00000000-0000-0000-0000-000000000001",
        "clientSecret": "s3cret",
        "subscriptionId": "00000000-0000-0000-0000-000000000002",
        "tenantId": "00000000-0000-0000-0000-000000000003",
        "activeDirectoryEndpointUrl": "https://login.microsoftonline.com",
        "resourceManagerEndpointUrl": "https://management.azure.com/",
        "activeDirectoryGraphResourceId": "https://graph.windows.net/",
        "sqlManagementEndpointUrl": "https://management.core.windows.net:8443/"
    }"#;

    #[test]
    fn test_parse_sdk_auth_output() {
        let creds = Credentials::from_json(SDK_AUTH.as_bytes()).unwrap();
        assert_eq!(creds.subscription_id, "00000000-0000-0000-0000-000000000002");
        assert_eq!(
            creds.token_url(),
            "https://login.microsoftonline.com/00000000-0000-0000-0000-000000000003/oauth2/v2.0/token"
        );
        assert_eq!(creds.scope(), "https://management.azure.com/.default");
        assert_eq!(creds.resource_manager_endpoint(), "https://management.azure.com");
    }

    #[test]
    fn test_endpoints_default_to_public_cloud() {
        let creds = Credentials::from_json(
            br#"{"clientId":"c","clientSecret":"s","tenantId":"t","subscriptionId":"sub"}"#,
        )
        .unwrap();
        assert_eq!(creds.active_directory_endpoint_url, DEFAULT_ACTIVE_DIRECTORY_ENDPOINT);
        assert_eq!(creds.resource_manager_endpoint_url, DEFAULT_RESOURCE_MANAGER_ENDPOINT);
    }

    #[test]
    fn test_rejects_invalid_credentials() {
        let err = Credentials::from_json(b"not json").unwrap_err();
        assert!(matches!(err, AzureError::Credentials(_)));

        let err = Credentials::from_json(
            br#"{"clientId":"c","clientSecret":"","tenantId":"t","subscriptionId":"sub"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("clientSecret"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::from_json(SDK_AUTH.as_bytes()).unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("s3cret"));
    }
}
