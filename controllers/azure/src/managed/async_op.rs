//! ARM long-running operations kept in status
//!
//! Writes that ARM completes asynchronously hand back a polling URL. It is kept in
//! `status.atProvider.lastOperation` so that later passes can poll it and, above
//! all, tell a resource that is still being created apart from one that is gone.

use super::ExternalObservation;
use crate::error::ControllerError;
use azure_client::{AzureClientTrait, LongRunningOperation, OperationState, OperationStatus};
use crds::{ASYNC_METHOD_DELETE, ASYNC_METHOD_PUT, AsyncOperation, AsyncOperationStatus, Condition, Managed};
use tracing::{debug, warn};

/// Start tracking an operation returned by a write request
pub fn track(operation: LongRunningOperation) -> AsyncOperation {
    AsyncOperation::new(operation.method, operation.polling_url)
}

/// Record the outcome of a poll
pub fn apply_state(operation: &mut AsyncOperation, state: OperationState) {
    operation.status = match state.status {
        OperationStatus::InProgress => AsyncOperationStatus::InProgress,
        OperationStatus::Succeeded => AsyncOperationStatus::Succeeded,
        OperationStatus::Failed => AsyncOperationStatus::Failed,
        OperationStatus::Canceled => AsyncOperationStatus::Canceled,
    };
    operation.error_message = state.error_message;
}

/// Poll a tracked operation that is still in progress and record its outcome.
pub async fn fetch_async_operation(
    azure: &dyn AzureClientTrait,
    operation: &mut AsyncOperation,
) -> Result<(), ControllerError> {
    if !operation.in_progress() {
        return Ok(());
    }

    let target = LongRunningOperation::new(operation.method.clone(), operation.polling_url.clone());
    let state = azure.fetch_async_operation(&target).await?;
    debug!("Operation {} {} is {:?}", operation.method, operation.polling_url, state.status);
    apply_state(operation, state);
    Ok(())
}

/// Poll the last operation of a resource that exists, forgetting it once its
/// polling URL has expired.
pub async fn refresh(
    azure: &dyn AzureClientTrait,
    last_operation: &mut Option<AsyncOperation>,
) -> Result<(), ControllerError> {
    let Some(operation) = last_operation.as_mut() else {
        return Ok(());
    };

    match fetch_async_operation(azure, operation).await {
        Err(e) if e.is_not_found() => {
            debug!("Polling URL {} expired", operation.polling_url);
            *last_operation = None;
            Ok(())
        }
        other => other,
    }
}

/// How to read a 404 for a resource that may have a creation in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFound {
    /// A PUT is still running; the resource exists as far as the lifecycle is concerned
    CreationInProgress,
    /// Nothing is running; the resource must be created
    Absent,
}

impl NotFound {
    /// What the lifecycle sees for a resource ARM does not list
    pub fn observation<R: Managed>(self, resource: &mut R) -> ExternalObservation {
        match self {
            NotFound::CreationInProgress => {
                resource.set_conditions([Condition::creating()]);
                ExternalObservation::exists(true)
            }
            NotFound::Absent => ExternalObservation::absent(),
        }
    }
}

/// [`interpret_not_found`] for a resource that may have no `atProvider` yet
pub async fn interpret_missing(
    azure: &dyn AzureClientTrait,
    last_operation: Option<&mut Option<AsyncOperation>>,
) -> Result<NotFound, ControllerError> {
    match last_operation {
        Some(last_operation) => interpret_not_found(azure, last_operation).await,
        None => Ok(NotFound::Absent),
    }
}

/// Decide what a 404 means given the last tracked operation.
///
/// - No operation, or an operation other than a PUT: the resource is absent.
/// - A PUT still in progress: the resource is being created.
/// - A failed PUT: the operation error is returned and the operation is cleared,
///   so the next pass creates the resource again.
/// - A PUT that succeeded or whose polling URL expired: the resource is absent.
pub async fn interpret_not_found(
    azure: &dyn AzureClientTrait,
    last_operation: &mut Option<AsyncOperation>,
) -> Result<NotFound, ControllerError> {
    let Some(operation) = last_operation.as_mut() else {
        return Ok(NotFound::Absent);
    };

    if operation.method != ASYNC_METHOD_PUT {
        *last_operation = None;
        return Ok(NotFound::Absent);
    }

    match fetch_async_operation(azure, operation).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {
            warn!("Polling URL {} no longer exists, forgetting the operation", operation.polling_url);
            *last_operation = None;
            return Ok(NotFound::Absent);
        }
        Err(e) => return Err(e),
    }

    if operation.in_progress() {
        return Ok(NotFound::CreationInProgress);
    }

    let failure = operation.failed().then(|| {
        operation
            .error_message
            .clone()
            .unwrap_or_else(|| format!("{:?}", operation.status))
    });
    *last_operation = None;

    match failure {
        Some(message) => Err(ControllerError::AsyncOperationFailed(message)),
        None => Ok(NotFound::Absent),
    }
}

/// Whether a tracked operation is still running
pub fn in_progress(last_operation: Option<&AsyncOperation>) -> bool {
    last_operation.is_some_and(AsyncOperation::in_progress)
}

/// Whether a tracked DELETE is still running
pub fn deleting(last_operation: Option<&AsyncOperation>) -> bool {
    last_operation.is_some_and(|op| op.method == ASYNC_METHOD_DELETE && op.in_progress())
}

#[cfg(test)]
mod tests {
    use super::*;
    use azure_client::MockAzureClient;

    fn put(url: &str) -> Option<AsyncOperation> {
        Some(AsyncOperation::new(ASYNC_METHOD_PUT, url))
    }

    #[tokio::test]
    async fn test_not_found_without_operation_is_absent() {
        let mock = MockAzureClient::new("sub");
        let mut last = None;
        assert_eq!(interpret_not_found(&mock, &mut last).await.unwrap(), NotFound::Absent);
        assert_eq!(mock.call_count("fetch_async_operation"), 0);
    }

    #[tokio::test]
    async fn test_not_found_while_put_in_progress() {
        let mock = MockAzureClient::new("sub");
        mock.set_operation_state("https://op/1", OperationState::in_progress());
        let mut last = put("https://op/1");

        let outcome = interpret_not_found(&mock, &mut last).await.unwrap();
        assert_eq!(outcome, NotFound::CreationInProgress);
        assert!(last.is_some());
    }

    #[tokio::test]
    async fn test_not_found_after_failed_put_surfaces_error_and_clears() {
        let mock = MockAzureClient::new("sub");
        mock.set_operation_state("https://op/1", OperationState::failed("quota exceeded"));
        let mut last = put("https://op/1");

        let err = interpret_not_found(&mock, &mut last).await.unwrap_err();
        assert!(matches!(err, ControllerError::AsyncOperationFailed(ref m) if m == "quota exceeded"));
        assert!(last.is_none());
    }

    #[tokio::test]
    async fn test_not_found_after_delete_is_absent() {
        let mock = MockAzureClient::new("sub");
        let mut last = Some(AsyncOperation::new(crds::ASYNC_METHOD_DELETE, "https://op/2"));

        assert_eq!(interpret_not_found(&mock, &mut last).await.unwrap(), NotFound::Absent);
        assert!(last.is_none());
    }

    #[tokio::test]
    async fn test_fetch_skips_finished_operations() {
        let mock = MockAzureClient::new("sub");
        let mut op = AsyncOperation::new(ASYNC_METHOD_PUT, "https://op/3");
        op.status = AsyncOperationStatus::Succeeded;

        fetch_async_operation(&mock, &mut op).await.unwrap();
        assert_eq!(mock.call_count("fetch_async_operation"), 0);
    }

    #[tokio::test]
    async fn test_refresh_forgets_expired_operation() {
        let mock = MockAzureClient::new("sub");
        let mut last = put("https://op/gone");

        refresh(&mock, &mut last).await.unwrap();
        assert!(last.is_none());
    }

    #[tokio::test]
    async fn test_missing_without_status_is_absent() {
        let mock = MockAzureClient::new("sub");
        assert_eq!(interpret_missing(&mock, None).await.unwrap(), NotFound::Absent);
        assert_eq!(mock.call_count("fetch_async_operation"), 0);
    }

    #[test]
    fn test_deleting_only_for_running_delete() {
        let mut delete = AsyncOperation::new(ASYNC_METHOD_DELETE, "https://op/5");
        assert!(deleting(Some(&delete)));
        assert!(!deleting(put("https://op/6").as_ref()));

        delete.status = AsyncOperationStatus::Failed;
        assert!(!deleting(Some(&delete)));
        assert!(!deleting(None));
    }

    #[tokio::test]
    async fn test_fetch_records_outcome() {
        let mock = MockAzureClient::new("sub");
        mock.set_operation_state("https://op/4", OperationState::succeeded());
        let mut op = AsyncOperation::new(ASYNC_METHOD_PUT, "https://op/4");

        fetch_async_operation(&mock, &mut op).await.unwrap();
        assert_eq!(op.status, AsyncOperationStatus::Succeeded);
        assert!(op.error_message.is_none());
    }
}
