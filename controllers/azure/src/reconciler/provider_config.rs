//! ProviderConfig reconciliation
//!
//! A ProviderConfig has no Azure counterpart; reconciling it only checks that
//! its credentials can obtain a token and reports the result as conditions.

use super::Reconciler;
use crate::error::ControllerError;
use crate::managed::Connector;
use crds::{Condition, ProviderConfig, ProviderConfigStatus};
use kube::api::{Patch, PatchParams};
use kube::{Api, ResourceExt};
use kube_runtime::controller::Action;
use tracing::{debug, info, warn};

/// Connect with the ProviderConfig's credentials and request a token
pub async fn verify(connector: &dyn Connector, provider_config: &str) -> Result<(), ControllerError> {
    let azure = connector.connect(provider_config).await?;
    azure.validate_credentials().await?;
    Ok(())
}

/// Status reflecting the outcome of [`verify`]
pub fn status_after(previous: Option<&ProviderConfigStatus>, result: &Result<(), ControllerError>) -> ProviderConfigStatus {
    let mut status = previous.cloned().unwrap_or_default();
    match result {
        Ok(()) => status
            .conditioned
            .set_conditions([Condition::available(), Condition::reconcile_success()]),
        Err(e) => status
            .conditioned
            .set_conditions([Condition::unavailable(), Condition::reconcile_error(e.to_string())]),
    }
    status
}

impl Reconciler {
    /// Check the credentials of a ProviderConfig and record the outcome in its status
    pub async fn reconcile_provider_config(&self, config: &ProviderConfig) -> Result<Action, ControllerError> {
        let name = config.name_any();
        let result = verify(self.connector.as_ref(), &name).await;
        let status = status_after(config.status.as_ref(), &result);

        if config.status.as_ref() == Some(&status) {
            debug!("ProviderConfig {} status unchanged", name);
        } else {
            let api: Api<ProviderConfig> = Api::all(self.client.clone());
            let patch = serde_json::json!({ "status": status });
            api.patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
                .await?;
        }

        match result {
            Ok(()) => {
                info!("ProviderConfig {} credentials are valid", name);
                Ok(Action::requeue(self.config.poll_interval))
            }
            Err(e) => {
                warn!("ProviderConfig {} credentials are not usable: {}", name, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{StaticConnector, TEST_SUBSCRIPTION};
    use azure_client::MockAzureClient;
    use crds::{ConditionReason, ConditionStatus, ConditionType};

    #[tokio::test]
    async fn test_verify_valid_credentials() {
        let mock = MockAzureClient::new(TEST_SUBSCRIPTION);
        let connector = StaticConnector::new(&mock);

        verify(&connector, "default").await.unwrap();
        assert_eq!(mock.call_count("validate_credentials"), 1);
    }

    #[tokio::test]
    async fn test_verify_rejected_credentials() {
        let mock = MockAzureClient::new(TEST_SUBSCRIPTION);
        mock.fail_with("validate_credentials", 401, "AADSTS7000215: Invalid client secret");
        let connector = StaticConnector::new(&mock);

        let err = verify(&connector, "default").await.unwrap_err();
        assert!(matches!(err, ControllerError::Azure(_)));
    }

    #[tokio::test]
    async fn test_verify_missing_config() {
        let connector = StaticConnector::failing("ProviderConfig default not found");
        let err = verify(&connector, "default").await.unwrap_err();
        assert!(matches!(err, ControllerError::Credentials(_)));
    }

    #[test]
    fn test_status_after_success() {
        let status = status_after(None, &Ok(()));
        let ready = status.conditioned.get(ConditionType::Ready).unwrap();
        assert_eq!(ready.status, ConditionStatus::True);
        assert_eq!(
            status.conditioned.get(ConditionType::Synced).unwrap().reason,
            ConditionReason::ReconcileSuccess
        );
    }

    #[test]
    fn test_status_after_failure_keeps_message() {
        let previous = status_after(None, &Ok(()));
        let status = status_after(
            Some(&previous),
            &Err(ControllerError::Credentials("secret has no key credentials".to_string())),
        );

        assert_eq!(
            status.conditioned.get(ConditionType::Ready).unwrap().reason,
            ConditionReason::Unavailable
        );
        let synced = status.conditioned.get(ConditionType::Synced).unwrap();
        assert_eq!(synced.status, ConditionStatus::False);
        assert!(synced.message.as_deref().unwrap().contains("no key credentials"));
    }

    #[test]
    fn test_status_after_is_stable() {
        let first = status_after(None, &Ok(()));
        let second = status_after(Some(&first), &Ok(()));
        assert_eq!(first, second);
    }
}
