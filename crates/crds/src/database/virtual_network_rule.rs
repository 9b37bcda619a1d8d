//! MySQLServerVirtualNetworkRule and PostgreSQLServerVirtualNetworkRule Custom Resource Definitions

use crate::common::{AsyncOperation, ConditionedStatus, Reference, ResourceSpec};
use crate::managed::{managed_resource, managed_resource_shared_status};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// MySQLServerVirtualNetworkRuleSpec defines the desired state of a MySQL server virtual network rule
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "database.azure.crossplane.io",
    version = "v1alpha3",
    kind = "MySQLServerVirtualNetworkRule",
    status = "VirtualNetworkRuleStatus",
    printcolumn = r#"{"name":"READY", "type":"string", "jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED", "type":"string", "jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"STATE", "type":"string", "jsonPath":".status.atProvider.state"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct MySQLServerVirtualNetworkRuleSpec {
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    pub for_provider: VirtualNetworkRuleParameters,
}

/// PostgreSQLServerVirtualNetworkRuleSpec defines the desired state of a PostgreSQL server virtual network rule
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "database.azure.crossplane.io",
    version = "v1alpha3",
    kind = "PostgreSQLServerVirtualNetworkRule",
    status = "VirtualNetworkRuleStatus",
    printcolumn = r#"{"name":"READY", "type":"string", "jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED", "type":"string", "jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"STATE", "type":"string", "jsonPath":".status.atProvider.state"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PostgreSQLServerVirtualNetworkRuleSpec {
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    pub for_provider: VirtualNetworkRuleParameters,
}

/// Parameters of a server virtual network rule
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkRuleParameters {
    /// Name of the server the rule applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,

    /// Server object whose external name fills `serverName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name_ref: Option<Reference>,

    /// Name of the resource group holding the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<String>,

    /// ResourceGroup object whose external name fills `resourceGroupName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name_ref: Option<Reference>,

    /// Subnet the rule admits
    pub properties: VirtualNetworkRuleProperties,
}

/// Properties of a virtual network rule
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkRuleProperties {
    /// ARM ID of the subnet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_network_subnet_id: Option<String>,

    /// Subnet object whose observed ID fills `virtualNetworkSubnetId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_network_subnet_id_ref: Option<Reference>,

    /// Create the rule before the subnet has the Microsoft.Sql service endpoint
    #[serde(default)]
    pub ignore_missing_vnet_service_endpoint: bool,
}

/// VirtualNetworkRuleStatus defines the observed state of a virtual network rule
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkRuleStatus {
    #[serde(flatten)]
    pub conditioned: ConditionedStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<VirtualNetworkRuleObservation>,
}

/// Fields of the virtual network rule observed in Azure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkRuleObservation {
    /// Rule state (Initializing, InProgress, Ready, Deleting, Unknown)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// ARM resource ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// ARM resource type
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub type_: Option<String>,

    /// Last long-running operation started against the rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<AsyncOperation>,
}

managed_resource!(MySQLServerVirtualNetworkRule, VirtualNetworkRuleStatus);
managed_resource_shared_status!(PostgreSQLServerVirtualNetworkRule, VirtualNetworkRuleStatus);
