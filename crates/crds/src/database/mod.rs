//! Database CRDs
//!
//! Resources for managing Azure database services:
//! - MySQL and PostgreSQL single servers
//! - Server firewall rules
//! - Server virtual network rules
//! - CosmosDB accounts

pub mod sql_server;
pub mod firewall_rule;
pub mod virtual_network_rule;
pub mod cosmosdb;

pub use sql_server::*;
pub use firewall_rule::*;
pub use virtual_network_rule::*;
pub use cosmosdb::*;
