//! ProviderConfig Custom Resource Definition
//!
//! Points the controller at the Azure service principal credentials used by
//! managed resources that reference this config.

use crate::common::{ConditionedStatus, SecretKeySelector};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ProviderConfigSpec defines how to authenticate to Azure
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "azure.crossplane.io",
    version = "v1beta1",
    kind = "ProviderConfig",
    status = "ProviderConfigStatus",
    printcolumn = r#"{"name":"SOURCE", "type":"string", "jsonPath":".spec.credentials.source"}"#,
    printcolumn = r#"{"name":"SECRET-NAME", "type":"string", "jsonPath":".spec.credentials.secretRef.name", "priority": 1}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigSpec {
    /// Credentials used to connect to Azure
    pub credentials: ProviderCredentials,
}

/// Where the Azure credentials come from
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentials {
    /// Source of the credentials
    #[serde(default)]
    pub source: CredentialsSource,

    /// Secret key holding the service principal JSON (`az ad sp create-for-rbac --sdk-auth`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretKeySelector>,
}

/// Supported credential sources
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum CredentialsSource {
    /// Read the credentials from a Kubernetes secret
    #[default]
    Secret,
    /// No credentials; only useful for testing
    None,
}

/// ProviderConfigStatus defines the observed state of a ProviderConfig
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigStatus {
    #[serde(flatten)]
    pub conditioned: ConditionedStatus,
}
