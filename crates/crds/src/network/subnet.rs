//! Subnet Custom Resource Definition

use crate::common::{AsyncOperation, ConditionedStatus, Reference, ResourceSpec};
use crate::managed::managed_resource;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// SubnetSpec defines the desired state of a subnet of an Azure virtual network
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "network.azure.crossplane.io",
    version = "v1alpha3",
    kind = "Subnet",
    status = "SubnetStatus",
    printcolumn = r#"{"name":"READY", "type":"string", "jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED", "type":"string", "jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"STATE", "type":"string", "jsonPath":".status.atProvider.state"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    pub for_provider: SubnetParameters,
}

/// Configurable parameters of a subnet
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubnetParameters {
    /// Name of the virtual network holding the subnet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_network_name: Option<String>,

    /// VirtualNetwork object whose external name fills `virtualNetworkName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_network_name_ref: Option<Reference>,

    /// Name of the resource group holding the virtual network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<String>,

    /// ResourceGroup object whose external name fills `resourceGroupName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name_ref: Option<Reference>,

    /// Subnet properties
    pub properties: SubnetProperties,
}

/// Properties of a subnet
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubnetProperties {
    /// Address prefix in CIDR notation
    pub address_prefix: String,

    /// Service endpoints enabled on the subnet
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_endpoints: Vec<ServiceEndpoint>,
}

/// A service endpoint of a subnet
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpoint {
    /// Service type, e.g. "Microsoft.Sql"
    pub service: String,
}

/// SubnetStatus defines the observed state of a subnet
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetStatus {
    #[serde(flatten)]
    pub conditioned: ConditionedStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<SubnetObservation>,
}

/// Fields of the subnet observed in Azure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetObservation {
    /// Provisioning state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// ARM resource ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Entity tag changed on every update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Purpose set by the service using the subnet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    /// Last long-running operation started against the subnet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<AsyncOperation>,
}

managed_resource!(Subnet, SubnetStatus);
