//! MySQLServer and PostgreSQLServer external client
//!
//! Both kinds are served by one implementation parameterised by [`ServerFlavor`].
//! Creating a server takes minutes and ARM answers 404 for most of that time, so
//! the PUT's polling URL is kept in `lastOperation` and consulted before a 404 is
//! taken to mean the server is gone.

use super::found;
use crate::error::ControllerError;
use crate::managed::async_op::{self, NotFound};
use crate::managed::references::{required, resolve_resource_group};
use crate::managed::{
    CONNECTION_ENDPOINT_KEY, CONNECTION_PASSWORD_KEY, CONNECTION_USERNAME_KEY, ExternalClient,
    ExternalCreation, ExternalObservation, ManagedKind, ReferenceLookup, connection_details,
};
use crate::reconcile_helpers::{
    generate_password, late_init, optional_matches, sku_tier, sql_sku_name, state_is, tags_match,
};
use azure_client::{
    AzureClientTrait, LongRunning, Server, ServerCreateParameters, ServerCreateProperties, ServerFlavor,
    ServerSku, ServerUpdateParameters, ServerUpdateProperties,
};
use crds::{
    AsyncOperation, Condition, Managed, MySQLServer, PostgreSQLServer, SqlServerObservation,
    SqlServerParameters, SqlServerStatus, SslEnforcement,
};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

/// `userVisibleState` of a server that accepts connections
pub const SERVER_STATE_READY: &str = "Ready";
/// `userVisibleState` of a server that is being deleted
pub const SERVER_STATE_DROPPING: &str = "Dropping";

/// A server kind and the Azure resource provider serving it
pub trait SqlServerKind: ManagedKind + Managed<Status = SqlServerStatus> {
    const FLAVOR: ServerFlavor;

    fn parameters(&self) -> &SqlServerParameters;

    fn parameters_mut(&mut self) -> &mut SqlServerParameters;
}

macro_rules! sql_server_kind {
    ($kind:ty, $flavor:expr) => {
        impl SqlServerKind for $kind {
            const FLAVOR: ServerFlavor = $flavor;

            fn parameters(&self) -> &SqlServerParameters {
                &self.spec.for_provider
            }

            fn parameters_mut(&mut self) -> &mut SqlServerParameters {
                &mut self.spec.for_provider
            }
        }

        #[async_trait::async_trait]
        impl ManagedKind for $kind {
            fn external_client(azure: Arc<dyn AzureClientTrait>) -> Box<dyn ExternalClient<Self>> {
                Box::new(SqlServerExternal::<$kind>::new(azure))
            }

            async fn resolve_references(&mut self, lookup: &dyn ReferenceLookup) -> Result<bool, ControllerError> {
                let params = &mut self.spec.for_provider;
                resolve_resource_group(
                    lookup,
                    params.resource_group_name_ref.as_ref(),
                    &mut params.resource_group_name,
                )
                .await
            }
        }
    };
}

sql_server_kind!(MySQLServer, ServerFlavor::MySql);
sql_server_kind!(PostgreSQLServer, ServerFlavor::PostgreSql);

pub struct SqlServerExternal<R> {
    azure: Arc<dyn AzureClientTrait>,
    kind: PhantomData<fn() -> R>,
}

impl<R> SqlServerExternal<R> {
    pub fn new(azure: Arc<dyn AzureClientTrait>) -> Self {
        Self {
            azure,
            kind: PhantomData,
        }
    }
}

/// SKU of the server, e.g. `GP_Gen5_2`
pub fn sku(params: &SqlServerParameters) -> ServerSku {
    ServerSku {
        name: sql_sku_name(params.sku.tier, &params.sku.family, params.sku.capacity),
        tier: Some(sku_tier(params.sku.tier).to_string()),
        capacity: Some(params.sku.capacity),
        family: Some(params.sku.family.clone()),
        size: params.sku.size.clone(),
    }
}

fn ssl_enforcement(value: SslEnforcement) -> &'static str {
    match value {
        SslEnforcement::Enabled => "Enabled",
        SslEnforcement::Disabled => "Disabled",
    }
}

fn storage_profile(params: &SqlServerParameters) -> azure_client::StorageProfile {
    let storage = &params.storage_profile;
    azure_client::StorageProfile {
        backup_retention_days: storage.backup_retention_days,
        geo_redundant_backup: storage.geo_redundant_backup.clone(),
        storage_mb: Some(storage.storage_mb),
        storage_autogrow: storage.storage_autogrow.clone(),
    }
}

/// PUT body creating the server with the given administrator password
pub fn create_parameters(params: &SqlServerParameters, password: String) -> ServerCreateParameters {
    ServerCreateParameters {
        location: params.location.clone(),
        sku: sku(params),
        tags: params.tags.clone(),
        properties: ServerCreateProperties {
            create_mode: "Default".to_string(),
            administrator_login: params.administrator_login.clone(),
            administrator_login_password: password,
            version: Some(params.version.clone()),
            ssl_enforcement: Some(ssl_enforcement(params.ssl_enforcement).to_string()),
            minimal_tls_version: params.minimal_tls_version.clone(),
            public_network_access: params.public_network_access.clone(),
            storage_profile: Some(storage_profile(params)),
        },
    }
}

/// PATCH body bringing an existing server to the desired state
pub fn update_parameters(params: &SqlServerParameters) -> ServerUpdateParameters {
    ServerUpdateParameters {
        sku: Some(sku(params)),
        tags: params.tags.clone(),
        properties: ServerUpdateProperties {
            version: Some(params.version.clone()),
            ssl_enforcement: Some(ssl_enforcement(params.ssl_enforcement).to_string()),
            minimal_tls_version: params.minimal_tls_version.clone(),
            public_network_access: params.public_network_access.clone(),
            storage_profile: Some(storage_profile(params)),
        },
    }
}

/// Whether the server matches the parameters
pub fn is_up_to_date(params: &SqlServerParameters, server: &Server) -> bool {
    let observed = &server.properties;
    let storage = observed.storage_profile.clone().unwrap_or_default();
    let desired_storage = &params.storage_profile;

    server.sku.as_ref().map(|s| s.name.as_str()) == Some(sku(params).name.as_str())
        && observed.version.as_deref() == Some(params.version.as_str())
        && observed.ssl_enforcement.as_deref() == Some(ssl_enforcement(params.ssl_enforcement))
        && optional_matches(
            params.minimal_tls_version.as_deref(),
            observed.minimal_tls_version.as_deref(),
        )
        && optional_matches(
            params.public_network_access.as_deref(),
            observed.public_network_access.as_deref(),
        )
        && storage.storage_mb == Some(desired_storage.storage_mb)
        && optional_matches(
            desired_storage.backup_retention_days.as_ref(),
            storage.backup_retention_days.as_ref(),
        )
        && optional_matches(
            desired_storage.geo_redundant_backup.as_deref(),
            storage.geo_redundant_backup.as_deref(),
        )
        && optional_matches(
            desired_storage.storage_autogrow.as_deref(),
            storage.storage_autogrow.as_deref(),
        )
        && tags_match(params.tags.as_ref(), server.tags.as_ref())
}

/// Fill unset parameters from the server, returning true when any changed
pub fn late_initialize(params: &mut SqlServerParameters, server: &Server) -> bool {
    let observed = &server.properties;
    let mut changed = late_init(&mut params.minimal_tls_version, observed.minimal_tls_version.as_ref());
    changed |= late_init(&mut params.public_network_access, observed.public_network_access.as_ref());

    if let Some(storage) = observed.storage_profile.as_ref() {
        let desired = &mut params.storage_profile;
        changed |= late_init(&mut desired.backup_retention_days, storage.backup_retention_days.as_ref());
        changed |= late_init(&mut desired.geo_redundant_backup, storage.geo_redundant_backup.as_ref());
        changed |= late_init(&mut desired.storage_autogrow, storage.storage_autogrow.as_ref());
    }
    changed
}

/// Ready condition from `userVisibleState`
pub fn server_condition(state: Option<&str>) -> Condition {
    if state_is(state, SERVER_STATE_READY) {
        Condition::available()
    } else if state_is(state, SERVER_STATE_DROPPING) {
        Condition::deleting()
    } else {
        Condition::unavailable()
    }
}

fn observation(server: &Server) -> SqlServerObservation {
    let props = &server.properties;
    SqlServerObservation {
        id: server.id.clone(),
        name: server.name.clone(),
        type_: server.type_.clone(),
        user_visible_state: props.user_visible_state.clone(),
        fully_qualified_domain_name: props.fully_qualified_domain_name.clone(),
        version: props.version.clone(),
        master_server_id: props.master_server_id.clone(),
        last_operation: None,
    }
}

fn at_provider<R: SqlServerKind>(cr: &R) -> Option<&SqlServerObservation> {
    cr.managed_status().and_then(|s| s.at_provider.as_ref())
}

fn last_operation<R: SqlServerKind>(cr: &R) -> Option<&AsyncOperation> {
    at_provider(cr).and_then(|p| p.last_operation.as_ref())
}

/// Record the response of a write and the operation it started
fn record<R: SqlServerKind>(cr: &mut R, result: LongRunning<Server>) {
    let at_provider = cr
        .managed_status_mut()
        .at_provider
        .get_or_insert_with(SqlServerObservation::default);
    if let Some(server) = result.resource.as_ref() {
        *at_provider = observation(server);
    }
    at_provider.last_operation = result.operation.map(async_op::track);
}

fn resource_group<R: SqlServerKind>(cr: &R) -> Result<String, ControllerError> {
    Ok(required(cr.parameters().resource_group_name.as_deref(), "resourceGroupName")?.to_string())
}

#[async_trait::async_trait]
impl<R: SqlServerKind> ExternalClient<R> for SqlServerExternal<R> {
    async fn observe(&self, cr: &mut R) -> Result<ExternalObservation, ControllerError> {
        let name = cr.external_name();
        let resource_group = resource_group(cr)?;

        let Some(server) = found(self.azure.get_server(R::FLAVOR, &resource_group, &name).await)? else {
            let Some(at_provider) = cr.managed_status_mut().at_provider.as_mut() else {
                return Ok(ExternalObservation::absent());
            };
            let outcome = async_op::interpret_not_found(self.azure.as_ref(), &mut at_provider.last_operation).await?;
            return match outcome {
                NotFound::CreationInProgress => {
                    debug!("{} server {} is still being created", R::FLAVOR, name);
                    cr.set_conditions([Condition::creating()]);
                    Ok(ExternalObservation::exists(true))
                }
                NotFound::Absent => Ok(ExternalObservation::absent()),
            };
        };

        let mut operation = last_operation(cr).cloned();
        async_op::refresh(self.azure.as_ref(), &mut operation).await?;
        let operation_running = async_op::in_progress(operation.as_ref());

        cr.managed_status_mut().at_provider = Some(SqlServerObservation {
            last_operation: operation,
            ..observation(&server)
        });
        cr.set_conditions([server_condition(server.properties.user_visible_state.as_deref())]);

        let late_initialized = late_initialize(cr.parameters_mut(), &server);

        // Updates wait for the running operation
        let up_to_date = operation_running || is_up_to_date(cr.parameters(), &server);

        let mut details = vec![(
            CONNECTION_USERNAME_KEY,
            format!("{}@{}", cr.parameters().administrator_login, name),
        )];
        if let Some(fqdn) = server.properties.fully_qualified_domain_name.clone() {
            details.push((CONNECTION_ENDPOINT_KEY, fqdn));
        }

        Ok(ExternalObservation::exists(up_to_date)
            .with_late_init(late_initialized)
            .with_connection_details(connection_details(details)))
    }

    async fn create(&self, cr: &mut R) -> Result<ExternalCreation, ControllerError> {
        let name = cr.external_name();
        let resource_group = resource_group(cr)?;
        let password = generate_password();

        let params = create_parameters(cr.parameters(), password.clone());
        let result = self
            .azure
            .create_server(R::FLAVOR, &resource_group, &name, &params)
            .await?;
        info!("Requested creation of {} server {} in {}", R::FLAVOR, name, resource_group);
        record(cr, result);

        let details = connection_details([
            (CONNECTION_PASSWORD_KEY, password),
            (
                CONNECTION_USERNAME_KEY,
                format!("{}@{}", cr.parameters().administrator_login, name),
            ),
            (
                CONNECTION_ENDPOINT_KEY,
                format!("{}.{}", name, R::FLAVOR.dns_suffix()),
            ),
        ]);
        Ok(ExternalCreation {
            connection_details: details,
        })
    }

    async fn update(&self, cr: &mut R) -> Result<(), ControllerError> {
        let name = cr.external_name();
        if async_op::in_progress(last_operation(cr)) {
            debug!("{} server {} has an operation in progress", R::FLAVOR, name);
            return Ok(());
        }

        let resource_group = resource_group(cr)?;
        let result = self
            .azure
            .update_server(R::FLAVOR, &resource_group, &name, &update_parameters(cr.parameters()))
            .await?;
        record(cr, result);
        Ok(())
    }

    async fn delete(&self, cr: &mut R) -> Result<(), ControllerError> {
        let name = cr.external_name();
        let state = at_provider(cr).and_then(|p| p.user_visible_state.as_deref());
        if state_is(state, SERVER_STATE_DROPPING) {
            debug!("{} server {} is already being dropped", R::FLAVOR, name);
            return Ok(());
        }

        let resource_group = resource_group(cr)?;
        let operation = self.azure.delete_server(R::FLAVOR, &resource_group, &name).await?;
        if let Some(at_provider) = cr.managed_status_mut().at_provider.as_mut() {
            at_provider.last_operation = operation.map(async_op::track);
        }
        Ok(())
    }
}
