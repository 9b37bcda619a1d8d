//! Long-running operation models

use serde::{Deserialize, Serialize};

/// A long-running operation started by a PUT, PATCH or DELETE request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongRunningOperation {
    /// HTTP method of the request that started the operation
    pub method: String,
    /// URL from the `Azure-AsyncOperation` (or `Location`) response header
    pub polling_url: String,
}

impl LongRunningOperation {
    pub fn new(method: impl Into<String>, polling_url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            polling_url: polling_url.into(),
        }
    }
}

/// Outcome of a long-running operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    InProgress,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationStatus {
    /// Parse the `status` field of an operation body.
    ///
    /// Unknown non-terminal states (`Accepted`, `Running`, `Creating`, ...) count as in progress.
    pub fn parse(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "succeeded" => OperationStatus::Succeeded,
            "failed" => OperationStatus::Failed,
            "canceled" | "cancelled" => OperationStatus::Canceled,
            _ => OperationStatus::InProgress,
        }
    }
}

/// Result of polling a long-running operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationState {
    pub status: OperationStatus,
    pub error_message: Option<String>,
}

impl OperationState {
    pub fn in_progress() -> Self {
        Self {
            status: OperationStatus::InProgress,
            error_message: None,
        }
    }

    pub fn succeeded() -> Self {
        Self {
            status: OperationStatus::Succeeded,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: OperationStatus::Failed,
            error_message: Some(message.into()),
        }
    }
}

/// Body of an `Azure-AsyncOperation` status resource
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OperationBody {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<super::ArmErrorDetail>,
}

/// Response of a PUT or PATCH that may complete asynchronously.
///
/// `resource` is absent when ARM answered `202 Accepted` without a body.
#[derive(Debug, Clone)]
pub struct LongRunning<T> {
    pub resource: Option<T>,
    pub operation: Option<LongRunningOperation>,
}

impl<T> LongRunning<T> {
    /// A response that completed synchronously
    pub fn completed(resource: T) -> Self {
        Self {
            resource: Some(resource),
            operation: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_status_parse() {
        assert_eq!(OperationStatus::parse("Succeeded"), OperationStatus::Succeeded);
        assert_eq!(OperationStatus::parse("Failed"), OperationStatus::Failed);
        assert_eq!(OperationStatus::parse("Cancelled"), OperationStatus::Canceled);
        assert_eq!(OperationStatus::parse("Accepted"), OperationStatus::InProgress);
        assert_eq!(OperationStatus::parse("InProgress"), OperationStatus::InProgress);
    }
}
