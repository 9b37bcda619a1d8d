//! Types shared by every managed resource
//!
//! Every Azure managed resource carries the same envelope: a reference to the
//! `ProviderConfig` holding credentials, an optional connection secret to publish,
//! a deletion policy, and a conditioned status reporting readiness and sync state.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Name of the `ProviderConfig` used when a resource does not set one.
pub const DEFAULT_PROVIDER_CONFIG: &str = "default";

/// Fields common to the spec of every managed resource.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    /// ProviderConfig holding the Azure credentials for this resource
    #[serde(default)]
    pub provider_config_ref: ProviderConfigReference,

    /// Secret to which connection details (endpoint, username, password) are written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_connection_secret_to_ref: Option<SecretReference>,

    /// What happens to the Azure resource when this object is deleted
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// Reference to a cluster-scoped `ProviderConfig`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigReference {
    /// Name of the ProviderConfig
    pub name: String,
}

impl Default for ProviderConfigReference {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROVIDER_CONFIG.to_string(),
        }
    }
}

/// Reference to a namespaced Secret.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    /// Name of the secret
    pub name: String,

    /// Namespace of the secret
    pub namespace: String,
}

/// Reference to a single key of a namespaced Secret.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    /// Name of the secret
    pub name: String,

    /// Namespace of the secret
    pub namespace: String,

    /// Key within the secret data
    pub key: String,
}

/// Reference to another managed resource by name.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Name of the referenced object
    pub name: String,
}

impl Reference {
    /// Create a reference to the named object
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Deletion policy of a managed resource
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum DeletionPolicy {
    /// Delete the Azure resource together with the managed resource
    #[default]
    Delete,
    /// Leave the Azure resource in place
    Orphan,
}

/// Condition types reported by managed resources
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionType {
    /// Whether the external resource is ready for use
    Ready,
    /// Whether the last reconciliation succeeded
    Synced,
}

/// Status of a condition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// Reason attached to a condition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionReason {
    Available,
    Unavailable,
    Creating,
    Deleting,
    ReconcileSuccess,
    ReconcileError,
}

/// A single observed condition of a managed resource.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type
    #[serde(rename = "type")]
    pub type_: ConditionType,

    /// Condition status
    pub status: ConditionStatus,

    /// Last time the condition changed
    pub last_transition_time: DateTime<Utc>,

    /// Machine-readable reason for the condition
    pub reason: ConditionReason,

    /// Human-readable detail, usually an error message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Condition {
    fn new(
        type_: ConditionType,
        status: ConditionStatus,
        reason: ConditionReason,
        message: Option<String>,
    ) -> Self {
        Self {
            type_,
            status,
            last_transition_time: Utc::now(),
            reason,
            message,
        }
    }

    /// The external resource is ready for use.
    pub fn available() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::True, ConditionReason::Available, None)
    }

    /// The external resource exists but is not ready for use.
    pub fn unavailable() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, ConditionReason::Unavailable, None)
    }

    /// The external resource is being created.
    pub fn creating() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, ConditionReason::Creating, None)
    }

    /// The external resource is being deleted.
    pub fn deleting() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, ConditionReason::Deleting, None)
    }

    /// The last reconciliation succeeded.
    pub fn reconcile_success() -> Self {
        Self::new(ConditionType::Synced, ConditionStatus::True, ConditionReason::ReconcileSuccess, None)
    }

    /// The last reconciliation failed with the given error.
    pub fn reconcile_error(message: impl Into<String>) -> Self {
        Self::new(
            ConditionType::Synced,
            ConditionStatus::False,
            ConditionReason::ReconcileError,
            Some(message.into()),
        )
    }

    /// True if both conditions are the same apart from their transition time.
    pub fn equivalent(&self, other: &Condition) -> bool {
        self.type_ == other.type_
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Status fragment holding the conditions of a managed resource.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConditionedStatus {
    /// Observed conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl ConditionedStatus {
    /// Get the condition of the given type, if present
    pub fn get(&self, type_: ConditionType) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    /// Set conditions, replacing any existing condition of the same type.
    ///
    /// A condition equivalent to the existing one keeps the existing transition time,
    /// so repeated reconciliations do not rewrite the status.
    pub fn set_conditions(&mut self, conditions: impl IntoIterator<Item = Condition>) {
        for condition in conditions {
            match self.conditions.iter_mut().find(|c| c.type_ == condition.type_) {
                Some(existing) if existing.equivalent(&condition) => {}
                Some(existing) => *existing = condition,
                None => self.conditions.push(condition),
            }
        }
    }
}

/// Method of the request that started an ARM long-running operation.
pub const ASYNC_METHOD_PUT: &str = "PUT";
/// Method of an update started through PATCH.
pub const ASYNC_METHOD_PATCH: &str = "PATCH";
/// Method of a delete request.
pub const ASYNC_METHOD_DELETE: &str = "DELETE";

/// Status of an ARM long-running operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum AsyncOperationStatus {
    #[default]
    InProgress,
    Succeeded,
    Failed,
    Canceled,
}

/// Tracking record for an ARM long-running operation.
///
/// ARM returns a polling URL for slow PUT/PATCH/DELETE requests; the controller
/// keeps it in status and polls it on later passes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AsyncOperation {
    /// HTTP method of the request that started the operation
    pub method: String,

    /// URL to poll for the operation outcome
    #[serde(rename = "pollingURL")]
    pub polling_url: String,

    /// Last observed status
    #[serde(default)]
    pub status: AsyncOperationStatus,

    /// Error reported by Azure when the operation failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AsyncOperation {
    /// Create a new in-progress operation
    pub fn new(method: impl Into<String>, polling_url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            polling_url: polling_url.into(),
            status: AsyncOperationStatus::InProgress,
            error_message: None,
        }
    }

    /// Whether the operation is still running
    pub fn in_progress(&self) -> bool {
        self.status == AsyncOperationStatus::InProgress
    }

    /// Whether the operation ended in failure or was canceled
    pub fn failed(&self) -> bool {
        matches!(self.status, AsyncOperationStatus::Failed | AsyncOperationStatus::Canceled)
    }
}
