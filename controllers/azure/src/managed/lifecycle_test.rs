//! Unit tests for the generic managed lifecycle

#[cfg(test)]
mod tests {
    use crate::error::ControllerError;
    use crate::managed::store::has_finalizer;
    use crate::managed::{FINALIZER, ReconcileOutcome};
    use crate::test_utils::*;
    use crds::{
        ConditionReason, ConditionStatus, ConditionType, DeletionPolicy, Managed, Redis, Reference, ResourceGroup,
    };
    use std::collections::BTreeMap;

    fn group() -> ResourceGroup {
        create_test_resource_group("rg", "westeurope")
    }

    #[tokio::test]
    async fn test_first_pass_adds_finalizer_and_creates() {
        let h = Harness::<ResourceGroup>::new();

        let outcome = h.reconcile(&group()).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Requeue(TEST_SHORT_WAIT));
        assert!(h.mock.contains(&h.mock.resource_group_path("rg")));
        let created = h.latest();
        assert!(has_finalizer(&created));
        assert_eq!(
            created.condition(ConditionType::Ready).unwrap().reason,
            ConditionReason::Creating
        );
        assert_eq!(
            created.condition(ConditionType::Synced).unwrap().reason,
            ConditionReason::ReconcileSuccess
        );
    }

    #[tokio::test]
    async fn test_in_sync_resource_polls_without_rewriting_status() {
        let h = Harness::<ResourceGroup>::new();
        h.reconcile(&group()).await.unwrap();

        let outcome = h.reconcile_again().await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Requeue(TEST_POLL_INTERVAL));
        assert_eq!(
            h.latest().condition(ConditionType::Ready).unwrap().reason,
            ConditionReason::Available
        );
        let updates = h.store.status_updates();

        let outcome = h.reconcile_again().await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Requeue(TEST_POLL_INTERVAL));
        assert_eq!(h.store.status_updates(), updates);
        assert_eq!(h.mock.call_count("create_or_update_resource_group"), 1);
    }

    #[tokio::test]
    async fn test_drift_triggers_update() {
        let h = Harness::<ResourceGroup>::new();
        h.reconcile(&group()).await.unwrap();

        let mut cr = h.latest();
        cr.spec.tags = Some(BTreeMap::from([("team".to_string(), "data".to_string())]));
        let outcome = h.reconcile(&cr).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Requeue(TEST_POLL_INTERVAL));
        assert_eq!(h.mock.call_count("create_or_update_resource_group"), 2);
        let stored: azure_client::ResourceGroup = h.mock.stored(&h.mock.resource_group_path("rg")).unwrap();
        assert_eq!(stored.tags.unwrap().get("team").map(String::as_str), Some("data"));
    }

    #[tokio::test]
    async fn test_connect_failure_is_recorded() {
        let h = Harness::<ResourceGroup>::new()
            .with_connector(StaticConnector::failing("ProviderConfig default not found"));

        let err = h.reconcile(&group()).await.unwrap_err();

        assert!(matches!(err, ControllerError::Credentials(_)));
        let synced = h.latest().condition(ConditionType::Synced).cloned().unwrap();
        assert_eq!(synced.status, ConditionStatus::False);
        assert_eq!(synced.reason, ConditionReason::ReconcileError);
        assert!(synced.message.unwrap().contains("ProviderConfig default not found"));
        assert_eq!(h.mock.call_count("get_resource_group"), 0);
    }

    #[tokio::test]
    async fn test_observe_failure_is_recorded() {
        let h = Harness::<ResourceGroup>::new();
        h.mock.fail_with("get_resource_group", 500, "InternalServerError");

        let err = h.reconcile(&group()).await.unwrap_err();

        assert!(matches!(err, ControllerError::Azure(_)));
        assert_eq!(h.mock.call_count("create_or_update_resource_group"), 0);
        assert_eq!(
            h.latest().condition(ConditionType::Synced).unwrap().reason,
            ConditionReason::ReconcileError
        );
    }

    #[tokio::test]
    async fn test_create_failure_is_recorded() {
        let h = Harness::<ResourceGroup>::new();
        h.mock.fail_with("create_or_update_resource_group", 409, "Conflict");

        let err = h.reconcile(&group()).await.unwrap_err();

        assert!(matches!(err, ControllerError::Azure(_)));
        let failed = h.latest();
        assert_eq!(
            failed.condition(ConditionType::Ready).unwrap().reason,
            ConditionReason::Creating
        );
        assert_eq!(
            failed.condition(ConditionType::Synced).unwrap().status,
            ConditionStatus::False
        );

        h.mock.clear_failures();
        h.reconcile_again().await.unwrap();
        assert!(h.mock.contains(&h.mock.resource_group_path("rg")));
    }

    #[tokio::test]
    async fn test_unresolved_reference_stops_before_azure() {
        let h = Harness::<Redis>::new();
        let mut cr = create_test_redis("cache", "unused");
        cr.spec.for_provider.resource_group_name = None;
        cr.spec.for_provider.resource_group_name_ref = Some(Reference::new("missing"));

        let err = h.reconcile(&cr).await.unwrap_err();

        assert!(matches!(err, ControllerError::ReferenceNotReady(_)));
        assert_eq!(h.mock.call_count("get_redis"), 0);
        let failed = h.latest();
        assert!(!has_finalizer(&failed));
        assert_eq!(
            failed.condition(ConditionType::Synced).unwrap().reason,
            ConditionReason::ReconcileError
        );
    }

    #[tokio::test]
    async fn test_delete_waits_for_azure_then_releases() {
        let h = Harness::<ResourceGroup>::new();
        h.reconcile(&group()).await.unwrap();
        h.reconcile_again().await.unwrap();

        let mut cr = h.latest();
        mark_deleted(&mut cr);
        let outcome = h.reconcile(&cr).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Requeue(TEST_SHORT_WAIT));
        assert_eq!(h.mock.call_count("delete_resource_group"), 1);
        let deleting = h.latest();
        assert_eq!(
            deleting.condition(ConditionType::Ready).unwrap().reason,
            ConditionReason::Deleting
        );
        assert!(has_finalizer(&deleting));

        let outcome = h.reconcile_again().await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Done);
        assert!(!has_finalizer(&h.latest()));
    }

    #[tokio::test]
    async fn test_delete_of_missing_resource_releases_immediately() {
        let h = Harness::<ResourceGroup>::new();
        let mut cr = with_finalizer(group());
        mark_deleted(&mut cr);

        let outcome = h.reconcile(&cr).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Done);
        assert_eq!(h.mock.call_count("delete_resource_group"), 0);
        assert!(!has_finalizer(&h.latest()));
    }

    #[tokio::test]
    async fn test_orphaned_resource_is_left_in_azure() {
        let h = Harness::<ResourceGroup>::new();
        h.reconcile(&group()).await.unwrap();

        let mut cr = h.latest();
        cr.spec.resource_spec.deletion_policy = DeletionPolicy::Orphan;
        mark_deleted(&mut cr);
        let outcome = h.reconcile(&cr).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Done);
        assert_eq!(h.mock.call_count("delete_resource_group"), 0);
        assert!(h.mock.contains(&h.mock.resource_group_path("rg")));
        let released = h.latest();
        assert!(
            !released
                .metadata
                .finalizers
                .unwrap_or_default()
                .iter()
                .any(|f| f == FINALIZER)
        );
    }

    #[tokio::test]
    async fn test_external_name_annotation_names_the_azure_resource() {
        let h = Harness::<ResourceGroup>::new();
        let mut cr = group();
        cr.metadata.annotations = Some(BTreeMap::from([(
            crds::EXTERNAL_NAME_ANNOTATION.to_string(),
            "rg-prod-westeurope".to_string(),
        )]));

        h.reconcile(&cr).await.unwrap();

        assert!(h.mock.contains(&h.mock.resource_group_path("rg-prod-westeurope")));
        assert!(!h.mock.contains(&h.mock.resource_group_path("rg")));
    }
}
