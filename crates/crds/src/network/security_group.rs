//! SecurityGroup Custom Resource Definition
//!
//! Defines a Kubernetes CRD for managing Azure network security groups and
//! their inline security rules.

use crate::common::{AsyncOperation, ConditionedStatus, Reference, ResourceSpec};
use crate::managed::managed_resource;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// SecurityGroupSpec defines the desired state of a network security group
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "network.azure.crossplane.io",
    version = "v1alpha3",
    kind = "SecurityGroup",
    status = "SecurityGroupStatus",
    printcolumn = r#"{"name":"READY", "type":"string", "jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED", "type":"string", "jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"STATE", "type":"string", "jsonPath":".status.atProvider.state"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupSpec {
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    pub for_provider: SecurityGroupParameters,
}

/// Configurable parameters of a network security group
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupParameters {
    /// Name of the resource group holding the security group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<String>,

    /// ResourceGroup object whose external name fills `resourceGroupName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name_ref: Option<Reference>,

    /// Azure region
    pub location: String,

    /// Inline security rules
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_rules: Vec<SecurityRule>,

    /// Resource tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

/// A single rule of a network security group
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRule {
    /// Rule name, unique within the group
    pub name: String,

    /// Rule properties
    pub properties: SecurityRuleProperties,
}

/// Properties of a security rule
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRuleProperties {
    /// Tcp, Udp, Icmp or * for any
    pub protocol: String,

    /// Source port or range, or *
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_port_range: Option<String>,

    /// Destination port or range, or *
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_port_range: Option<String>,

    /// Source CIDR, IP, service tag or *
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_address_prefix: Option<String>,

    /// Destination CIDR, IP, service tag or *
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_address_prefix: Option<String>,

    /// Allow or Deny
    pub access: String,

    /// Priority between 100 and 4096; lower is evaluated first
    pub priority: i32,

    /// Inbound or Outbound
    pub direction: String,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// SecurityGroupStatus defines the observed state of a security group
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupStatus {
    #[serde(flatten)]
    pub conditioned: ConditionedStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<SecurityGroupObservation>,
}

/// Fields of the security group observed in Azure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupObservation {
    /// Provisioning state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// ARM resource ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Entity tag changed on every update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Resource GUID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_guid: Option<String>,

    /// Last long-running operation started against the security group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<AsyncOperation>,
}

managed_resource!(SecurityGroup, SecurityGroupStatus);
