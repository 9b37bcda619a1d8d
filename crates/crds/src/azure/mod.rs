//! Core Azure CRDs
//!
//! Resources that are not tied to a specific Azure service:
//! - ProviderConfig (credentials)
//! - Resource Groups

pub mod provider_config;
pub mod resource_group;

pub use provider_config::*;
pub use resource_group::*;
