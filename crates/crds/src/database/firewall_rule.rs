//! MySQLServerFirewallRule and PostgreSQLServerFirewallRule Custom Resource Definitions

use crate::common::{AsyncOperation, ConditionedStatus, Reference, ResourceSpec};
use crate::managed::{managed_resource, managed_resource_shared_status};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// MySQLServerFirewallRuleSpec defines the desired state of a MySQL server firewall rule
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "database.azure.crossplane.io",
    version = "v1alpha3",
    kind = "MySQLServerFirewallRule",
    status = "FirewallRuleStatus",
    printcolumn = r#"{"name":"READY", "type":"string", "jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED", "type":"string", "jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"SERVER", "type":"string", "jsonPath":".spec.forProvider.serverName"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct MySQLServerFirewallRuleSpec {
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    pub for_provider: FirewallRuleParameters,
}

/// PostgreSQLServerFirewallRuleSpec defines the desired state of a PostgreSQL server firewall rule
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "database.azure.crossplane.io",
    version = "v1alpha3",
    kind = "PostgreSQLServerFirewallRule",
    status = "FirewallRuleStatus",
    printcolumn = r#"{"name":"READY", "type":"string", "jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED", "type":"string", "jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"SERVER", "type":"string", "jsonPath":".spec.forProvider.serverName"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PostgreSQLServerFirewallRuleSpec {
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    pub for_provider: FirewallRuleParameters,
}

/// Parameters of a server firewall rule
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRuleParameters {
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

    /// IP range allowed through the firewall
    pub properties: FirewallRuleProperties,
}

/// IP range of a firewall rule
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRuleProperties {
    /// First IPv4 address of the range
    pub start_ip_address: String,

    /// Last IPv4 address of the range
    pub end_ip_address: String,
}

/// FirewallRuleStatus defines the observed state of a firewall rule
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRuleStatus {
    #[serde(flatten)]
    pub conditioned: ConditionedStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<FirewallRuleObservation>,
}

/// Fields of the firewall rule observed in Azure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRuleObservation {
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

managed_resource!(MySQLServerFirewallRule, FirewallRuleStatus);
managed_resource_shared_status!(PostgreSQLServerFirewallRule, FirewallRuleStatus);
