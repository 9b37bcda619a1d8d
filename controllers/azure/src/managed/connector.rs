//! ProviderConfig → Azure client
//!
//! A managed resource names a `ProviderConfig`; the config points at a secret key
//! holding service principal credentials. Clients are cached per ProviderConfig
//! and rebuilt when the secret changes, so the token cache survives across
//! reconciliations.

use crate::error::ControllerError;
use azure_client::{AzureClient, AzureClientTrait, Credentials};
use crds::{CredentialsSource, ProviderConfig, SecretKeySelector};
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Produces an Azure client for a ProviderConfig
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, provider_config: &str) -> Result<Arc<dyn AzureClientTrait>, ControllerError>;
}

struct CachedClient {
    secret_version: String,
    client: Arc<dyn AzureClientTrait>,
}

/// Connector reading ProviderConfigs and secrets from the cluster
pub struct KubeConnector {
    client: Client,
    cache: Mutex<HashMap<String, CachedClient>>,
}

impl std::fmt::Debug for KubeConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeConnector").finish_non_exhaustive()
    }
}

impl KubeConnector {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Read the credentials secret referenced by a ProviderConfig
    async fn credentials_secret(&self, config: &ProviderConfig) -> Result<(SecretKeySelector, Secret), ControllerError> {
        let name = config.metadata.name.as_deref().unwrap_or_default();
        let selector = secret_selector(config)?;

        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &selector.namespace);
        let secret = secrets.get_opt(&selector.name).await?.ok_or_else(|| {
            ControllerError::Credentials(format!(
                "secret {}/{} referenced by ProviderConfig {} not found",
                selector.namespace, selector.name, name
            ))
        })?;

        Ok((selector.clone(), secret))
    }

    fn cached(&self, provider_config: &str, secret_version: &str) -> Option<Arc<dyn AzureClientTrait>> {
        let cache = self.cache.lock().ok()?;
        cache
            .get(provider_config)
            .filter(|c| c.secret_version == secret_version)
            .map(|c| Arc::clone(&c.client))
    }
}

#[async_trait::async_trait]
impl Connector for KubeConnector {
    async fn connect(&self, provider_config: &str) -> Result<Arc<dyn AzureClientTrait>, ControllerError> {
        let configs: Api<ProviderConfig> = Api::all(self.client.clone());
        let config = configs
            .get_opt(provider_config)
            .await?
            .ok_or_else(|| ControllerError::Credentials(format!("ProviderConfig {} not found", provider_config)))?;

        let (selector, secret) = self.credentials_secret(&config).await?;
        let secret_version = secret.metadata.resource_version.clone().unwrap_or_default();

        if let Some(client) = self.cached(provider_config, &secret_version) {
            debug!("Reusing Azure client for ProviderConfig {}", provider_config);
            return Ok(client);
        }

        let credentials = credentials_from_secret(&secret, &selector.key)?;
        info!(
            "Building Azure client for ProviderConfig {} (subscription {})",
            provider_config, credentials.subscription_id
        );
        let client: Arc<dyn AzureClientTrait> = Arc::new(AzureClient::new(credentials)?);

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(
                provider_config.to_string(),
                CachedClient {
                    secret_version,
                    client: Arc::clone(&client),
                },
            );
        }

        Ok(client)
    }
}

/// Secret key selector of a ProviderConfig, if it reads credentials from a secret
pub fn secret_selector(config: &ProviderConfig) -> Result<&SecretKeySelector, ControllerError> {
    let name = config.metadata.name.as_deref().unwrap_or_default();
    match config.spec.credentials.source {
        CredentialsSource::Secret => config.spec.credentials.secret_ref.as_ref().ok_or_else(|| {
            ControllerError::Credentials(format!("ProviderConfig {} has no credentials secretRef", name))
        }),
        CredentialsSource::None => Err(ControllerError::Credentials(format!(
            "ProviderConfig {} has credentials source None; Azure requires a service principal",
            name
        ))),
    }
}

/// Parse service principal credentials from a secret key
pub fn credentials_from_secret(secret: &Secret, key: &str) -> Result<Credentials, ControllerError> {
    let secret_name = secret.metadata.name.as_deref().unwrap_or_default();
    let data = secret
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .ok_or_else(|| ControllerError::Credentials(format!("secret {} has no key {}", secret_name, key)))?;

    Credentials::from_json(&data.0).map_err(|e| ControllerError::Credentials(format!("secret {}: {}", secret_name, e)))
}
