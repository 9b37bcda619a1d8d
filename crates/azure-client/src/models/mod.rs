//! Typed ARM models, grouped by resource provider.

pub mod cosmosdb;
pub mod network;
pub mod operation;
pub mod redis;
pub mod resources;
pub mod sql;

pub use cosmosdb::*;
pub use network::*;
pub use operation::*;
pub use redis::*;
pub use resources::*;
pub use sql::*;

use serde::{Deserialize, Serialize};

/// Error envelope returned by ARM on failed requests
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArmErrorResponse {
    #[serde(default)]
    pub error: ArmErrorDetail,
}

/// Error detail inside an ARM error envelope
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArmErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
