//! ResourceGroup Custom Resource Definition

use crate::common::{ConditionedStatus, ResourceSpec};
use crate::managed::managed_resource;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ResourceGroupSpec defines the desired state of an Azure resource group
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "azure.crossplane.io",
    version = "v1alpha3",
    kind = "ResourceGroup",
    status = "ResourceGroupStatus",
    printcolumn = r#"{"name":"READY", "type":"string", "jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED", "type":"string", "jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"LOCATION", "type":"string", "jsonPath":".spec.location"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupSpec {
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Azure region of the resource group (e.g. "westeurope")
    pub location: String,

    /// Tags applied to the resource group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

/// ResourceGroupStatus defines the observed state of a resource group
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupStatus {
    #[serde(flatten)]
    pub conditioned: ConditionedStatus,

    /// Observed state in Azure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<ResourceGroupObservation>,
}

/// Fields of the resource group observed in Azure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupObservation {
    /// ARM resource ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Provisioning state reported by Azure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,

    /// Pending long-running operation, usually a delete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<crate::common::AsyncOperation>,
}

managed_resource!(ResourceGroup, ResourceGroupStatus);
