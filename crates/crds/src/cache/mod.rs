//! Cache CRDs
//!
//! - Azure Cache for Redis

pub mod redis;

pub use redis::*;
