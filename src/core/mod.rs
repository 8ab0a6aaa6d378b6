// src/core/mod.rs

//! Core of the topology manager's node control plane: the wire protocol, the
//! per-node client, the connection pool, and the maintenance task around it.

pub mod errors;
pub mod metrics;
pub mod protocol;
pub mod redis;
pub mod tasks;

pub use errors::{ErrorKind, TopomError};
pub use redis::{RedisClient, RedisPool};
