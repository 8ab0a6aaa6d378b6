// src/core/redis/mod.rs

//! Client and connection pool for issuing administrative commands to store nodes.

pub mod client;
pub mod conn;
pub mod info;
pub mod pool;

pub use client::{MIGRATE_TIMEOUT_MS, RedisClient};
pub use conn::DialOptions;
pub use pool::{PoolOptions, PoolStats, RedisPool};
