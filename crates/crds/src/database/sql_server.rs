//! MySQLServer and PostgreSQLServer Custom Resource Definitions
//!
//! Both kinds share their parameters and status; they differ only in the
//! Azure resource provider that serves them.

use crate::common::{AsyncOperation, ConditionedStatus, Reference, ResourceSpec};
use crate::managed::{managed_resource, managed_resource_shared_status};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// MySQLServerSpec defines the desired state of an Azure Database for MySQL server
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "database.azure.crossplane.io",
    version = "v1beta1",
    kind = "MySQLServer",
    status = "SqlServerStatus",
    printcolumn = r#"{"name":"READY", "type":"string", "jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED", "type":"string", "jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"STATE", "type":"string", "jsonPath":".status.atProvider.userVisibleState"}"#,
    printcolumn = r#"{"name":"VERSION", "type":"string", "jsonPath":".spec.forProvider.version"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct MySQLServerSpec {
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired Azure parameters
    pub for_provider: SqlServerParameters,
}

/// PostgreSQLServerSpec defines the desired state of an Azure Database for PostgreSQL server
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "database.azure.crossplane.io",
    version = "v1beta1",
    kind = "PostgreSQLServer",
    status = "SqlServerStatus",
    printcolumn = r#"{"name":"READY", "type":"string", "jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED", "type":"string", "jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"STATE", "type":"string", "jsonPath":".status.atProvider.userVisibleState"}"#,
    printcolumn = r#"{"name":"VERSION", "type":"string", "jsonPath":".spec.forProvider.version"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PostgreSQLServerSpec {
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired Azure parameters
    pub for_provider: SqlServerParameters,
}

/// Configurable parameters of a MySQL or PostgreSQL single server
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SqlServerParameters {
    /// Name of the resource group holding the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<String>,

    /// ResourceGroup object whose external name fills `resourceGroupName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name_ref: Option<Reference>,

    /// Azure region
    pub location: String,

    /// Administrator login; the password is generated and published in the connection secret
    pub administrator_login: String,

    /// Compute tier of the server
    pub sku: SqlServerSku,

    /// Server version ("5.6", "5.7", "8.0" for MySQL; "9.5", "9.6", "10", "11" for PostgreSQL)
    pub version: String,

    /// Whether SSL is enforced on connections
    pub ssl_enforcement: SslEnforcement,

    /// Minimum TLS version (TLS1_0, TLS1_1, TLS1_2, TLSEnforcementDisabled)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimal_tls_version: Option<String>,

    /// Whether the server is reachable from public networks (Enabled, Disabled)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_network_access: Option<String>,

    /// Storage settings
    pub storage_profile: StorageProfile,

    /// Resource tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

/// Compute tier of a server
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SqlServerSku {
    /// Pricing tier
    pub tier: SkuTier,

    /// Number of vCores
    pub capacity: i32,

    /// Hardware generation (Gen4, Gen5)
    pub family: String,

    /// Size code, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum SkuTier {
    #[default]
    Basic,
    GeneralPurpose,
    MemoryOptimized,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum SslEnforcement {
    #[default]
    Enabled,
    Disabled,
}

/// Storage settings of a server
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StorageProfile {
    /// Maximum storage in megabytes
    #[serde(rename = "storageMB")]
    pub storage_mb: i32,

    /// Backup retention in days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_retention_days: Option<i32>,

    /// Geo-redundant backups (Enabled, Disabled)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_redundant_backup: Option<String>,

    /// Storage auto-grow (Enabled, Disabled)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_autogrow: Option<String>,
}

/// SqlServerStatus defines the observed state of a MySQL or PostgreSQL server
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SqlServerStatus {
    #[serde(flatten)]
    pub conditioned: ConditionedStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<SqlServerObservation>,
}

/// Fields of the server observed in Azure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SqlServerObservation {
    /// ARM resource ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Server name in Azure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// ARM resource type
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub type_: Option<String>,

    /// State shown in the portal (Ready, Dropping, Disabled)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_visible_state: Option<String>,

    /// Fully qualified domain name of the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fully_qualified_domain_name: Option<String>,

    /// Server version reported by Azure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// ID of the master server, for replicas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_server_id: Option<String>,

    /// Last long-running operation started against the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<AsyncOperation>,
}

managed_resource!(MySQLServer, SqlServerStatus);
managed_resource_shared_status!(PostgreSQLServer, SqlServerStatus);
