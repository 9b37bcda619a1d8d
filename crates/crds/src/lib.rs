//! Azure provider CRD definitions
//!
//! Kubernetes Custom Resource Definitions for Azure managed resources, grouped
//! the way Azure groups its services:
//! - `azure`: ProviderConfig and resource groups
//! - `cache`: Azure Cache for Redis
//! - `database`: MySQL/PostgreSQL servers, their rules, CosmosDB accounts
//! - `network`: virtual networks, subnets, security groups

pub mod common;
pub mod managed;
pub mod azure;
pub mod cache;
pub mod database;
pub mod network;

pub use common::*;
pub use managed::{EXTERNAL_NAME_ANNOTATION, Managed, ManagedStatus};
pub use azure::*;
pub use cache::*;
pub use database::*;
pub use network::*;
