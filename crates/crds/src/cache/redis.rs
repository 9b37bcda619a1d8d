//! Redis Custom Resource Definition
//!
//! Defines a Kubernetes CRD for managing Azure Cache for Redis instances.

use crate::common::{AsyncOperation, ConditionedStatus, Reference, ResourceSpec};
use crate::managed::managed_resource;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// RedisSpec defines the desired state of an Azure Cache for Redis
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "cache.azure.crossplane.io",
    version = "v1beta1",
    kind = "Redis",
    plural = "redis",
    status = "RedisStatus",
    printcolumn = r#"{"name":"READY", "type":"string", "jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED", "type":"string", "jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"STATE", "type":"string", "jsonPath":".status.atProvider.provisioningState"}"#,
    printcolumn = r#"{"name":"VERSION", "type":"string", "jsonPath":".status.atProvider.redisVersion"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RedisSpec {
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired Azure parameters
    pub for_provider: RedisParameters,
}

/// Configurable parameters of an Azure Cache for Redis
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RedisParameters {
    /// Name of the resource group holding the cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<String>,

    /// ResourceGroup object whose external name fills `resourceGroupName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name_ref: Option<Reference>,

    /// Azure region
    pub location: String,

    /// Pricing tier of the cache
    pub sku: RedisSku,

    /// Whether the non-SSL port 6379 is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_non_ssl_port: Option<bool>,

    /// Full resource ID of a subnet to deploy the cache into (Premium only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,

    /// Static IP address inside the subnet (Premium only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_ip: Option<String>,

    /// Redis configuration settings (maxmemory-policy, notify-keyspace-events, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_configuration: Option<BTreeMap<String, String>>,

    /// Tenant settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_settings: Option<BTreeMap<String, String>>,

    /// Number of shards (Premium clustered caches only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_count: Option<i32>,

    /// Minimum TLS version clients must use ("1.0", "1.1", "1.2")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_tls_version: Option<String>,

    /// Availability zones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<String>>,

    /// Resource tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

/// Redis pricing tier
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RedisSku {
    /// SKU name: Basic, Standard or Premium
    pub name: RedisSkuName,

    /// SKU family: C (Basic/Standard) or P (Premium)
    pub family: RedisSkuFamily,

    /// Cache size: 0-6 for C, 1-5 for P
    pub capacity: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum RedisSkuName {
    #[default]
    Basic,
    Standard,
    Premium,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum RedisSkuFamily {
    #[default]
    C,
    P,
}

/// RedisStatus defines the observed state of a Redis cache
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RedisStatus {
    #[serde(flatten)]
    pub conditioned: ConditionedStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<RedisObservation>,
}

/// Fields of the cache observed in Azure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RedisObservation {
    /// ARM resource ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Provisioning state (Creating, Succeeded, Updating, Deleting, Failed, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,

    /// DNS name of the cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,

    /// Non-SSL port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,

    /// SSL port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_port: Option<i32>,

    /// Redis server version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_version: Option<String>,

    /// IDs of linked (geo-replicated) servers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_servers: Vec<String>,

    /// Last long-running operation started against the cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<AsyncOperation>,
}

managed_resource!(Redis, RedisStatus);
