//! Unit tests for the MySQL and PostgreSQL server external client

#[cfg(test)]
mod tests {
    use crate::error::ControllerError;
    use crate::managed::{CONNECTION_ENDPOINT_KEY, CONNECTION_PASSWORD_KEY, CONNECTION_USERNAME_KEY, ReconcileOutcome};
    use crate::reconciler::sql_server::{is_up_to_date, late_initialize, server_condition, sku};
    use crate::test_utils::*;
    use azure_client::{OperationState, Server, ServerFlavor, ServerProperties};
    use crds::{ConditionReason, ConditionType, Managed, MySQLServer, PostgreSQLServer, SkuTier};

    fn mysql_with_connection_secret() -> MySQLServer {
        let mut cr = create_test_mysql_server("db", "rg");
        cr.spec.resource_spec.write_connection_secret_to_ref = Some(connection_secret_ref("default", "db-conn"));
        cr
    }

    fn ready_reason<R: Managed>(cr: &R) -> ConditionReason {
        cr.condition(ConditionType::Ready).unwrap().reason
    }

    #[tokio::test]
    async fn test_create_publishes_credentials() {
        let h = Harness::<MySQLServer>::new();

        let outcome = h.reconcile(&mysql_with_connection_secret()).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Requeue(TEST_SHORT_WAIT));

        let stored: Server = h
            .mock
            .stored(&h.mock.server_path(ServerFlavor::MySql, "rg", "db"))
            .unwrap();
        assert_eq!(stored.sku.unwrap().name, "GP_Gen5_2");
        assert_eq!(stored.properties.version.as_deref(), Some("5.7"));

        let password = h.store.secret_value(CONNECTION_PASSWORD_KEY).unwrap();
        assert!(password.len() >= 16);
        assert_eq!(h.store.secret_value(CONNECTION_USERNAME_KEY).as_deref(), Some("dbadmin@db"));
        assert_eq!(
            h.store.secret_value(CONNECTION_ENDPOINT_KEY).as_deref(),
            Some("db.mysql.database.azure.com")
        );

        let created = h.latest();
        assert_eq!(ready_reason(&created), ConditionReason::Creating);
        let operation = created.status.unwrap().at_provider.unwrap().last_operation.unwrap();
        assert_eq!(operation.method, "PUT");
    }

    #[tokio::test]
    async fn test_observe_available_keeps_password() {
        let h = Harness::<MySQLServer>::new();
        h.reconcile(&mysql_with_connection_secret()).await.unwrap();
        let password = h.store.secret_value(CONNECTION_PASSWORD_KEY).unwrap();

        let outcome = h.reconcile_again().await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Requeue(TEST_POLL_INTERVAL));

        let ready = h.latest();
        assert_eq!(ready_reason(&ready), ConditionReason::Available);
        let at_provider = ready.status.as_ref().unwrap().at_provider.as_ref().unwrap();
        assert_eq!(at_provider.user_visible_state.as_deref(), Some("Ready"));
        assert!(!at_provider.last_operation.as_ref().unwrap().in_progress());

        assert_eq!(h.store.secret_value(CONNECTION_PASSWORD_KEY), Some(password));
        assert_eq!(h.mock.call_count("create_server"), 1);
        assert_eq!(h.mock.call_count("update_server"), 0);
    }

    #[tokio::test]
    async fn test_late_initializes_server_defaults() {
        let h = Harness::<MySQLServer>::new();
        h.reconcile(&create_test_mysql_server("db", "rg")).await.unwrap();
        h.reconcile_again().await.unwrap();

        let params = h.latest().spec.for_provider;
        assert_eq!(params.minimal_tls_version.as_deref(), Some("TLSEnforcementDisabled"));
        assert_eq!(params.public_network_access.as_deref(), Some("Enabled"));
        assert_eq!(params.storage_profile.backup_retention_days, Some(7));
        assert_eq!(params.storage_profile.geo_redundant_backup.as_deref(), Some("Disabled"));
        assert_eq!(params.storage_profile.storage_autogrow.as_deref(), Some("Enabled"));
        assert_eq!(h.store.spec_updates(), 1);
    }

    #[tokio::test]
    async fn test_not_found_while_creation_in_progress() {
        let h = Harness::<MySQLServer>::new();
        h.mock.set_deferred_creation(true);

        h.reconcile(&create_test_mysql_server("db", "rg")).await.unwrap();
        let url = h.mock.last_operation_url().unwrap();

        h.reconcile_again().await.unwrap();
        assert_eq!(h.mock.call_count("create_server"), 1);
        assert_eq!(ready_reason(&h.latest()), ConditionReason::Creating);

        h.mock.complete_operation(&url);
        h.reconcile_again().await.unwrap();
        assert_eq!(h.mock.call_count("create_server"), 1);
        assert_eq!(ready_reason(&h.latest()), ConditionReason::Available);
    }

    #[tokio::test]
    async fn test_failed_creation_is_reported_then_retried() {
        let h = Harness::<MySQLServer>::new();
        h.mock.set_deferred_creation(true);

        h.reconcile(&create_test_mysql_server("db", "rg")).await.unwrap();
        let url = h.mock.last_operation_url().unwrap();
        h.mock.fail_operation(&url, "The server name is already in use");

        let err = h.reconcile_again().await.unwrap_err();
        assert!(matches!(err, ControllerError::AsyncOperationFailed(ref m) if m.contains("already in use")));
        let failed = h.latest();
        let synced = failed.condition(ConditionType::Synced).unwrap();
        assert_eq!(synced.reason, ConditionReason::ReconcileError);
        assert!(failed.status.unwrap().at_provider.unwrap().last_operation.is_none());

        h.mock.set_deferred_creation(false);
        h.reconcile_again().await.unwrap();
        assert_eq!(h.mock.call_count("create_server"), 2);
    }

    #[tokio::test]
    async fn test_update_waits_for_running_operation() {
        let h = Harness::<MySQLServer>::new();
        h.reconcile(&create_test_mysql_server("db", "rg")).await.unwrap();
        let url = h.mock.last_operation_url().unwrap();
        h.mock.set_operation_state(&url, OperationState::in_progress());

        let mut cr = h.latest();
        cr.spec.for_provider.sku.capacity = 4;
        h.reconcile(&cr).await.unwrap();
        assert_eq!(h.mock.call_count("update_server"), 0);

        h.mock.set_operation_state(&url, OperationState::succeeded());
        let mut cr = h.latest();
        cr.spec.for_provider.sku.capacity = 4;
        h.reconcile(&cr).await.unwrap();
        assert_eq!(h.mock.call_count("update_server"), 1);

        let stored: Server = h
            .mock
            .stored(&h.mock.server_path(ServerFlavor::MySql, "rg", "db"))
            .unwrap();
        assert_eq!(stored.sku.unwrap().name, "GP_Gen5_4");
        let operation = h.latest().status.unwrap().at_provider.unwrap().last_operation.unwrap();
        assert_eq!(operation.method, "PATCH");
    }

    #[tokio::test]
    async fn test_postgresql_uses_its_own_provider() {
        let h = Harness::<PostgreSQLServer>::new();
        let mut cr = create_test_postgresql_server("pg", "rg");
        cr.spec.resource_spec.write_connection_secret_to_ref = Some(connection_secret_ref("default", "pg-conn"));

        h.reconcile(&cr).await.unwrap();

        assert!(h.mock.contains(&h.mock.server_path(ServerFlavor::PostgreSql, "rg", "pg")));
        assert!(!h.mock.contains(&h.mock.server_path(ServerFlavor::MySql, "rg", "pg")));
        assert_eq!(
            h.store.secret_value(CONNECTION_ENDPOINT_KEY).as_deref(),
            Some("pg.postgres.database.azure.com")
        );
    }

    #[tokio::test]
    async fn test_dropping_server_is_not_deleted_again() {
        let h = Harness::<MySQLServer>::new();
        h.reconcile(&create_test_mysql_server("db", "rg")).await.unwrap();
        let path = h.mock.server_path(ServerFlavor::MySql, "rg", "db");
        let mut stored: Server = h.mock.stored(&path).unwrap();
        stored.properties.user_visible_state = Some("Dropping".to_string());
        h.mock.insert(&path, &stored);

        let mut cr = h.latest();
        mark_deleted(&mut cr);
        let outcome = h.reconcile(&cr).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Requeue(TEST_SHORT_WAIT));
        assert_eq!(h.mock.call_count("delete_server"), 0);
        assert!(h.mock.contains(&path));
    }

    #[tokio::test]
    async fn test_delete_removes_server() {
        let h = Harness::<MySQLServer>::new();
        h.reconcile(&create_test_mysql_server("db", "rg")).await.unwrap();
        h.reconcile_again().await.unwrap();

        let mut cr = h.latest();
        mark_deleted(&mut cr);
        h.reconcile(&cr).await.unwrap();
        assert_eq!(h.mock.call_count("delete_server"), 1);

        let outcome = h.reconcile_again().await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Done);
    }

    #[test]
    fn test_sku_name() {
        let mut params = create_test_sql_parameters("rg");
        assert_eq!(sku(&params).name, "GP_Gen5_2");

        params.sku.tier = SkuTier::MemoryOptimized;
        params.sku.capacity = 8;
        let sku = sku(&params);
        assert_eq!(sku.name, "MO_Gen5_8");
        assert_eq!(sku.tier.as_deref(), Some("MemoryOptimized"));
    }

    #[test]
    fn test_up_to_date_compares_version_and_storage() {
        let params = create_test_sql_parameters("rg");
        let mut server = Server {
            location: "westeurope".to_string(),
            sku: Some(sku(&params)),
            properties: ServerProperties {
                version: Some("5.7".to_string()),
                ssl_enforcement: Some("Enabled".to_string()),
                storage_profile: Some(azure_client::StorageProfile {
                    storage_mb: Some(51200),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(is_up_to_date(&params, &server));

        server.properties.version = Some("8.0".to_string());
        assert!(!is_up_to_date(&params, &server));

        server.properties.version = Some("5.7".to_string());
        server.properties.storage_profile = None;
        assert!(!is_up_to_date(&params, &server));
    }

    #[test]
    fn test_late_initialize_without_storage_profile() {
        let mut params = create_test_sql_parameters("rg");
        let server = Server {
            location: "westeurope".to_string(),
            ..Default::default()
        };
        assert!(!late_initialize(&mut params, &server));
        assert_eq!(params, create_test_sql_parameters("rg"));
    }

    #[test]
    fn test_server_condition() {
        assert_eq!(server_condition(Some("Ready")).reason, ConditionReason::Available);
        assert_eq!(server_condition(Some("Dropping")).reason, ConditionReason::Deleting);
        assert_eq!(server_condition(Some("Disabled")).reason, ConditionReason::Unavailable);
        assert_eq!(server_condition(None).reason, ConditionReason::Unavailable);
    }
}
