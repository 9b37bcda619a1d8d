//! Unit tests for the CosmosDB account external client

#[cfg(test)]
mod tests {
    use crate::managed::{CONNECTION_ENDPOINT_KEY, CONNECTION_PASSWORD_KEY, ReconcileOutcome};
    use crate::reconciler::cosmosdb::{desired_account, is_up_to_date};
    use crate::test_utils::*;
    use azure_client::{DatabaseAccount, DatabaseAccountLocation};
    use crds::{ConditionReason, ConditionType, CosmosDBAccount, CosmosDBLocation, Managed, Reference};

    fn account_with_connection_secret() -> CosmosDBAccount {
        let mut cr = create_test_cosmosdb_account("docs", "rg");
        cr.spec.resource_spec.write_connection_secret_to_ref = Some(connection_secret_ref("default", "docs-conn"));
        cr
    }

    #[tokio::test]
    async fn test_create_not_repeated_while_in_flight() {
        let h = Harness::<CosmosDBAccount>::new();

        let outcome = h
            .reconcile_with_creation_in_flight(&account_with_connection_secret(), 3)
            .await;

        assert_eq!(outcome, ReconcileOutcome::Requeue(TEST_POLL_INTERVAL));
        assert_eq!(h.mock.call_count("create_or_update_database_account"), 1);
        assert_eq!(
            h.latest().condition(ConditionType::Ready).unwrap().reason,
            ConditionReason::Available
        );
        assert!(h.store.secret_value(CONNECTION_PASSWORD_KEY).is_some());
    }

    #[tokio::test]
    async fn test_create_then_publish_keys() {
        let h = Harness::<CosmosDBAccount>::new();
        h.reconcile(&account_with_connection_secret()).await.unwrap();

        let stored: DatabaseAccount = h.mock.stored(&h.mock.database_account_path("rg", "docs")).unwrap();
        assert_eq!(stored.kind.as_deref(), Some("GlobalDocumentDB"));
        assert_eq!(stored.properties.database_account_offer_type.as_deref(), Some("Standard"));
        assert!(h.store.secret().is_none());

        let outcome = h.reconcile_again().await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Requeue(TEST_POLL_INTERVAL));

        let ready = h.latest();
        assert_eq!(ready.condition(ConditionType::Ready).unwrap().reason, ConditionReason::Available);
        assert_eq!(
            ready.status.unwrap().at_provider.unwrap().document_endpoint.as_deref(),
            Some("https://docs.documents.azure.com:443/")
        );
        assert_eq!(
            h.store.secret_value(CONNECTION_PASSWORD_KEY).as_deref(),
            Some("docs-primary-master-key")
        );
        assert_eq!(
            h.store.secret_value(CONNECTION_ENDPOINT_KEY).as_deref(),
            Some("https://docs.documents.azure.com:443/")
        );
        assert_eq!(h.mock.call_count("create_or_update_database_account"), 1);
    }

    #[tokio::test]
    async fn test_consistency_change_is_applied() {
        let h = Harness::<CosmosDBAccount>::new();
        h.reconcile(&create_test_cosmosdb_account("docs", "rg")).await.unwrap();

        let mut cr = h.latest();
        if let Some(policy) = cr.spec.for_provider.properties.consistency_policy.as_mut() {
            policy.default_consistency_level = "Strong".to_string();
        }
        h.reconcile(&cr).await.unwrap();

        assert_eq!(h.mock.call_count("create_or_update_database_account"), 2);
        let stored: DatabaseAccount = h.mock.stored(&h.mock.database_account_path("rg", "docs")).unwrap();
        assert_eq!(
            stored.properties.consistency_policy.unwrap().default_consistency_level,
            "Strong"
        );
    }

    #[tokio::test]
    async fn test_resource_group_reference() {
        let references = StaticReferences::default().with_resource_group("rg-object", "rg-azure");
        let h = Harness::<CosmosDBAccount>::new().with_references(references);
        let mut cr = create_test_cosmosdb_account("docs", "unused");
        cr.spec.for_provider.resource_group_name = None;
        cr.spec.for_provider.resource_group_name_ref = Some(Reference::new("rg-object"));

        h.reconcile(&cr).await.unwrap();

        assert!(h.mock.contains(&h.mock.database_account_path("rg-azure", "docs")));
    }

    #[tokio::test]
    async fn test_delete_account() {
        let h = Harness::<CosmosDBAccount>::new();
        h.reconcile(&account_with_connection_secret()).await.unwrap();
        h.reconcile_again().await.unwrap();

        let mut cr = h.latest();
        mark_deleted(&mut cr);
        h.reconcile(&cr).await.unwrap();
        assert_eq!(h.mock.call_count("delete_database_account"), 1);

        let outcome = h.reconcile_again().await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Done);
        assert!(h.store.secret_deleted());
    }

    #[test]
    fn test_locations_compared_by_normalized_name() {
        let params = create_test_cosmosdb_account("docs", "rg").spec.for_provider;
        let mut account = desired_account(&params);
        account.properties.locations = Some(vec![DatabaseAccountLocation {
            location_name: "West Europe".to_string(),
            failover_priority: 0,
            is_zone_redundant: Some(false),
        }]);
        assert!(is_up_to_date(&params, &account));

        let mut two_regions = params.clone();
        two_regions.properties.locations.push(CosmosDBLocation {
            location_name: "northeurope".to_string(),
            failover_priority: 1,
            is_zone_redundant: None,
        });
        assert!(!is_up_to_date(&two_regions, &account));
    }

    #[test]
    fn test_unset_flags_are_not_compared() {
        let params = create_test_cosmosdb_account("docs", "rg").spec.for_provider;
        let mut account = desired_account(&params);
        account.properties.enable_automatic_failover = Some(true);
        account.properties.ip_range_filter = Some("10.0.0.0/8".to_string());
        assert!(is_up_to_date(&params, &account));

        let mut failover = params.clone();
        failover.properties.enable_automatic_failover = Some(false);
        assert!(!is_up_to_date(&failover, &account));
    }
}
