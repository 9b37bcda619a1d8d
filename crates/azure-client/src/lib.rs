//! Azure Resource Manager REST API Client
//!
//! A Rust client library for the subset of the Azure Resource Manager API used by
//! the Azure provider controllers. Provides type-safe models and methods for
//! resource groups, Redis caches, MySQL/PostgreSQL servers, CosmosDB accounts and
//! virtual networks.
//!
//! # Example
//!
//! ```no_run
//! use azure_client::{AzureClient, AzureClientTrait, Credentials};
//!
//! # async fn example(secret: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! // Credentials are the output of `az ad sp create-for-rbac --sdk-auth`
//! let client = AzureClient::new(Credentials::from_json(secret)?)?;
//! client.validate_credentials().await?;
//!
//! let group = client.get_resource_group("my-rg").await?;
//! println!("{:?}", group.provisioning_state());
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Authentication**: OAuth2 client credentials with token caching
//! - **Long-running operations**: `Azure-AsyncOperation` / `Location` polling
//! - **Mocking**: `MockAzureClient` behind the `test-util` feature

pub mod auth;
pub mod client;
pub mod common;
pub mod credentials;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod azure_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::AzureClient;
pub use common::{HttpClient, paths};
pub use credentials::Credentials;
pub use error::AzureError;
pub use models::*;
pub use azure_trait::AzureClientTrait;
#[cfg(feature = "test-util")]
pub use mock::MockAzureClient;
