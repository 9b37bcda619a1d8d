//! CosmosDBAccount Custom Resource Definition

use crate::common::{AsyncOperation, ConditionedStatus, Reference, ResourceSpec};
use crate::managed::managed_resource;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// CosmosDBAccountSpec defines the desired state of a CosmosDB database account
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "database.azure.crossplane.io",
    version = "v1alpha3",
    kind = "CosmosDBAccount",
    status = "CosmosDBAccountStatus",
    printcolumn = r#"{"name":"READY", "type":"string", "jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED", "type":"string", "jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"KIND", "type":"string", "jsonPath":".spec.forProvider.kind"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CosmosDBAccountSpec {
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    pub for_provider: CosmosDBAccountParameters,
}

/// Configurable parameters of a CosmosDB account
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CosmosDBAccountParameters {
    /// Name of the resource group holding the account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<String>,

    /// ResourceGroup object whose external name fills `resourceGroupName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name_ref: Option<Reference>,

    /// API kind of the account
    #[serde(default)]
    pub kind: DatabaseAccountKind,

    /// Azure region of the account resource
    pub location: String,

    /// Account properties
    pub properties: CosmosDBAccountProperties,

    /// Resource tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum DatabaseAccountKind {
    #[default]
    GlobalDocumentDB,
    MongoDB,
    Parse,
}

/// Properties of a CosmosDB account
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CosmosDBAccountProperties {
    /// Offer type; Azure only supports "Standard"
    #[serde(default = "default_offer_type")]
    pub database_account_offer_type: String,

    /// Automatic failover of the write region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_automatic_failover: Option<bool>,

    /// Multi-region writes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_multiple_write_locations: Option<bool>,

    /// Restrict access to configured virtual network rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_virtual_network_filter_enabled: Option<bool>,

    /// Georeplication locations
    pub locations: Vec<CosmosDBLocation>,

    /// Consistency settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_policy: Option<ConsistencyPolicy>,

    /// Comma separated list of allowed client IPs or CIDR ranges
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_range_filter: Option<String>,
}

fn default_offer_type() -> String {
    "Standard".to_string()
}

/// A georeplication location of a CosmosDB account
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CosmosDBLocation {
    /// Region name
    pub location_name: String,

    /// Failover priority; 0 is the write region
    pub failover_priority: i32,

    /// Zone redundancy in this region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_zone_redundant: Option<bool>,
}

/// Consistency policy of a CosmosDB account
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyPolicy {
    /// Eventual, Session, BoundedStaleness, Strong or ConsistentPrefix
    pub default_consistency_level: String,

    /// Maximum lag in operations (BoundedStaleness only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_staleness_prefix: Option<i64>,

    /// Maximum lag in seconds (BoundedStaleness only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_interval_in_seconds: Option<i32>,
}

/// CosmosDBAccountStatus defines the observed state of a CosmosDB account
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CosmosDBAccountStatus {
    #[serde(flatten)]
    pub conditioned: ConditionedStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<CosmosDBAccountObservation>,
}

/// Fields of the account observed in Azure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CosmosDBAccountObservation {
    /// ARM resource ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Provisioning state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Document endpoint of the account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_endpoint: Option<String>,

    /// Last long-running operation started against the account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<AsyncOperation>,
}

managed_resource!(CosmosDBAccount, CosmosDBAccountStatus);
