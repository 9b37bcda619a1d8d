//! Network CRDs
//!
//! Resources for managing Azure networking:
//! - Virtual Networks
//! - Subnets
//! - Network Security Groups

pub mod virtual_network;
pub mod subnet;
pub mod security_group;

pub use virtual_network::*;
pub use subnet::*;
pub use security_group::*;
