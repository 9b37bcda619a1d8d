//! ResourceGroup external client

use super::found;
use crate::error::ControllerError;
use crate::managed::async_op;
use crate::managed::{ExternalClient, ExternalCreation, ExternalObservation, ManagedKind};
use crate::reconcile_helpers::{STATE_DELETING, provisioning_condition, state_is, tags_match};
use azure_client::AzureClientTrait;
use crds::{Managed, ResourceGroup, ResourceGroupObservation};
use std::sync::Arc;
use tracing::debug;

impl ManagedKind for ResourceGroup {
    fn external_client(azure: Arc<dyn AzureClientTrait>) -> Box<dyn ExternalClient<Self>> {
        Box::new(ResourceGroupExternal { azure })
    }
}

pub struct ResourceGroupExternal {
    azure: Arc<dyn AzureClientTrait>,
}

impl ResourceGroupExternal {
    fn desired(cr: &ResourceGroup) -> azure_client::ResourceGroup {
        azure_client::ResourceGroup {
            location: cr.spec.location.clone(),
            tags: cr.spec.tags.clone(),
            ..Default::default()
        }
    }

    fn record(cr: &mut ResourceGroup, group: &azure_client::ResourceGroup) {
        let at_provider = cr
            .managed_status_mut()
            .at_provider
            .get_or_insert_with(ResourceGroupObservation::default);
        at_provider.id = group.id.clone();
        at_provider.provisioning_state = group.provisioning_state().map(str::to_string);
    }
}

#[async_trait::async_trait]
impl ExternalClient<ResourceGroup> for ResourceGroupExternal {
    async fn observe(&self, cr: &mut ResourceGroup) -> Result<ExternalObservation, ControllerError> {
        let Some(group) = found(self.azure.get_resource_group(&cr.external_name()).await)? else {
            let last_operation = cr
                .status
                .as_mut()
                .and_then(|s| s.at_provider.as_mut())
                .map(|p| &mut p.last_operation);
            let outcome = async_op::interpret_missing(self.azure.as_ref(), last_operation).await?;
            return Ok(outcome.observation(cr));
        };

        Self::record(cr, &group);
        if let Some(at_provider) = cr.managed_status_mut().at_provider.as_mut() {
            async_op::refresh(self.azure.as_ref(), &mut at_provider.last_operation).await?;
        }
        cr.set_conditions([provisioning_condition(group.provisioning_state())]);

        let up_to_date = tags_match(cr.spec.tags.as_ref(), group.tags.as_ref());
        Ok(ExternalObservation::exists(up_to_date))
    }

    async fn create(&self, cr: &mut ResourceGroup) -> Result<ExternalCreation, ControllerError> {
        let group = self
            .azure
            .create_or_update_resource_group(&cr.external_name(), &Self::desired(cr))
            .await?;
        Self::record(cr, &group);
        Ok(ExternalCreation::default())
    }

    async fn update(&self, cr: &mut ResourceGroup) -> Result<(), ControllerError> {
        let group = self
            .azure
            .create_or_update_resource_group(&cr.external_name(), &Self::desired(cr))
            .await?;
        Self::record(cr, &group);
        Ok(())
    }

    async fn delete(&self, cr: &mut ResourceGroup) -> Result<(), ControllerError> {
        let at_provider = cr.status.as_ref().and_then(|s| s.at_provider.as_ref());
        let state = at_provider.and_then(|p| p.provisioning_state.as_deref());
        let operation = at_provider.and_then(|p| p.last_operation.as_ref());
        if state_is(state, STATE_DELETING) || async_op::deleting(operation) {
            debug!("Resource group {} is already being deleted", cr.external_name());
            return Ok(());
        }

        let operation = self.azure.delete_resource_group(&cr.external_name()).await?;
        if let Some(at_provider) = cr.managed_status_mut().at_provider.as_mut() {
            at_provider.last_operation = operation.map(async_op::track);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use azure_client::{MockAzureClient, OperationState, ResourceGroupProperties};
    use crds::{ASYNC_METHOD_DELETE, AsyncOperation, AsyncOperationStatus, ConditionReason, ConditionType};
    use std::collections::BTreeMap;

    fn external(mock: &MockAzureClient) -> Box<dyn ExternalClient<ResourceGroup>> {
        ResourceGroup::external_client(Arc::new(mock.clone()))
    }

    fn insert_group(mock: &MockAzureClient, state: &str) -> String {
        let path = mock.resource_group_path("rg");
        mock.insert(
            &path,
            &azure_client::ResourceGroup {
                id: Some(path.clone()),
                name: Some("rg".to_string()),
                location: "westeurope".to_string(),
                tags: None,
                properties: Some(ResourceGroupProperties {
                    provisioning_state: Some(state.to_string()),
                }),
            },
        );
        path
    }

    #[tokio::test]
    async fn test_observe_missing_group() {
        let mock = MockAzureClient::new(TEST_SUBSCRIPTION);
        let mut cr = create_test_resource_group("rg", "westeurope");

        let observation = external(&mock).observe(&mut cr).await.unwrap();
        assert!(!observation.resource_exists);
    }

    #[tokio::test]
    async fn test_create_then_observe_available() {
        let mock = MockAzureClient::new(TEST_SUBSCRIPTION);
        let mut cr = create_test_resource_group("rg", "westeurope");
        let client = external(&mock);

        client.create(&mut cr).await.unwrap();
        assert!(mock.contains(&mock.resource_group_path("rg")));

        let observation = client.observe(&mut cr).await.unwrap();
        assert!(observation.resource_exists);
        assert!(observation.resource_up_to_date);
        let ready = cr.condition(ConditionType::Ready).unwrap();
        assert_eq!(ready.reason, ConditionReason::Available);
        let at_provider = cr.status.unwrap().at_provider.unwrap();
        assert_eq!(at_provider.provisioning_state.as_deref(), Some("Succeeded"));
    }

    #[tokio::test]
    async fn test_tags_drive_up_to_date() {
        let mock = MockAzureClient::new(TEST_SUBSCRIPTION);
        let mut cr = create_test_resource_group("rg", "westeurope");
        let client = external(&mock);
        client.create(&mut cr).await.unwrap();

        let mut tags = BTreeMap::new();
        tags.insert("team".to_string(), "data".to_string());
        cr.spec.tags = Some(tags);

        let observation = client.observe(&mut cr).await.unwrap();
        assert!(!observation.resource_up_to_date);

        client.update(&mut cr).await.unwrap();
        let observation = client.observe(&mut cr).await.unwrap();
        assert!(observation.resource_up_to_date);
    }

    #[tokio::test]
    async fn test_deleting_group_is_not_deleted_again() {
        let mock = MockAzureClient::new(TEST_SUBSCRIPTION);
        let path = insert_group(&mock, "Deleting");
        let mut cr = create_test_resource_group("rg", "westeurope");
        let client = external(&mock);

        client.observe(&mut cr).await.unwrap();
        assert_eq!(
            cr.condition(ConditionType::Ready).unwrap().reason,
            ConditionReason::Deleting
        );

        client.delete(&mut cr).await.unwrap();
        assert_eq!(mock.call_count("delete_resource_group"), 0);
        assert!(mock.contains(&path));
    }

    #[tokio::test]
    async fn test_running_delete_operation_is_polled_not_repeated() {
        let mock = MockAzureClient::new(TEST_SUBSCRIPTION);
        insert_group(&mock, "Succeeded");
        let url = "https://management.azure.com/operations/rg-delete";
        mock.set_operation_state(url, OperationState::in_progress());
        let mut cr = create_test_resource_group("rg", "westeurope");
        cr.managed_status_mut().at_provider = Some(ResourceGroupObservation {
            last_operation: Some(AsyncOperation::new(ASYNC_METHOD_DELETE, url)),
            ..Default::default()
        });
        let client = external(&mock);

        client.observe(&mut cr).await.unwrap();
        client.delete(&mut cr).await.unwrap();
        assert_eq!(mock.call_count("fetch_async_operation"), 1);
        assert_eq!(mock.call_count("delete_resource_group"), 0);

        mock.set_operation_state(url, OperationState::failed("ScopeLocked: resource group is locked"));
        client.observe(&mut cr).await.unwrap();
        let operation = cr.status.as_ref().unwrap().at_provider.as_ref().unwrap().last_operation.clone().unwrap();
        assert_eq!(operation.status, AsyncOperationStatus::Failed);
        assert_eq!(operation.error_message.as_deref(), Some("ScopeLocked: resource group is locked"));

        client.delete(&mut cr).await.unwrap();
        assert_eq!(mock.call_count("delete_resource_group"), 1);
    }

    #[tokio::test]
    async fn test_finished_delete_operation_means_absent() {
        let mock = MockAzureClient::new(TEST_SUBSCRIPTION);
        let mut cr = create_test_resource_group("rg", "westeurope");
        let client = external(&mock);
        client.create(&mut cr).await.unwrap();
        client.observe(&mut cr).await.unwrap();

        client.delete(&mut cr).await.unwrap();
        assert!(cr.status.as_ref().unwrap().at_provider.as_ref().unwrap().last_operation.is_some());

        let observation = client.observe(&mut cr).await.unwrap();
        assert!(!observation.resource_exists);
        assert!(cr.status.unwrap().at_provider.unwrap().last_operation.is_none());
    }
}
