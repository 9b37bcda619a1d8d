//! VirtualNetwork Custom Resource Definition

use crate::common::{AsyncOperation, ConditionedStatus, Reference, ResourceSpec};
use crate::managed::managed_resource;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// VirtualNetworkSpec defines the desired state of an Azure virtual network
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "network.azure.crossplane.io",
    version = "v1alpha3",
    kind = "VirtualNetwork",
    status = "VirtualNetworkStatus",
    printcolumn = r#"{"name":"READY", "type":"string", "jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED", "type":"string", "jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"STATE", "type":"string", "jsonPath":".status.atProvider.state"}"#,
    printcolumn = r#"{"name":"LOCATION", "type":"string", "jsonPath":".spec.forProvider.location"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkSpec {
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    pub for_provider: VirtualNetworkParameters,
}

/// Configurable parameters of a virtual network
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkParameters {
    /// Name of the resource group holding the network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<String>,

    /// ResourceGroup object whose external name fills `resourceGroupName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name_ref: Option<Reference>,

    /// Azure region
    pub location: String,

    /// Network properties
    pub properties: VirtualNetworkProperties,

    /// Resource tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

/// Properties of a virtual network
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkProperties {
    /// Address space of the network
    pub address_space: AddressSpace,

    /// DDoS protection for all protected resources in the network
    #[serde(default)]
    pub enable_ddos_protection: bool,

    /// VM protection for all subnets in the network
    #[serde(default)]
    pub enable_vm_protection: bool,
}

/// Address prefixes in CIDR notation
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    pub address_prefixes: Vec<String>,
}

/// VirtualNetworkStatus defines the observed state of a virtual network
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkStatus {
    #[serde(flatten)]
    pub conditioned: ConditionedStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<VirtualNetworkObservation>,
}

/// Fields of the virtual network observed in Azure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkObservation {
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

    /// Last long-running operation started against the virtual network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<AsyncOperation>,
}

managed_resource!(VirtualNetwork, VirtualNetworkStatus);
