//! Controller-specific error types.
//!
//! This module defines error types specific to the Azure provider controller
//! that are not covered by upstream library errors.

use azure_client::AzureError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the Azure provider controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Azure Resource Manager error
    #[error("Azure error: {0}")]
    Azure(#[from] AzureError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// ProviderConfig or credentials secret could not be used
    #[error("Cannot get Azure credentials: {0}")]
    Credentials(String),

    /// A referenced managed resource does not exist or does not expose the needed value yet
    #[error("Referenced resource not ready: {0}")]
    ReferenceNotReady(String),

    /// A long-running Azure operation failed
    #[error("Async operation failed: {0}")]
    AsyncOperationFailed(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ControllerError {
    /// Whether the error is an Azure "not found" response
    pub fn is_not_found(&self) -> bool {
        matches!(self, ControllerError::Azure(e) if e.is_not_found())
    }
}
