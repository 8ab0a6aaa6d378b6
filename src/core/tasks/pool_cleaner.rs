// src/core/tasks/pool_cleaner.rs

use crate::core::{RedisPool, TopomError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// A task that periodically calls `RedisPool::cleanup` so idle connections are
/// retired even when nobody acquires or releases clients for a while.
pub struct PoolCleanerTask {
    pool: Arc<RedisPool>,
    interval: Duration,
}

impl PoolCleanerTask {
    pub fn new(pool: Arc<RedisPool>, interval: Duration) -> Self {
        Self { pool, interval }
    }

    /// Runs until a shutdown signal arrives or the pool is closed underneath it.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(
            "Pool cleaner task started. Cleanup interval: {:?}",
            self.interval
        );
        let mut interval = tokio::time::interval(self.interval);
        // The first tick completes immediately; there is nothing idle yet.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.pool.cleanup().await {
                        Ok(()) => {
                            let stats = self.pool.stats().await;
                            debug!(
                                "Pool cleanup done: {} idle client(s) across {} address(es).",
                                stats.idle_clients, stats.addresses
                            );
                        }
                        Err(TopomError::ClosedPool) => {
                            info!("Pool closed; cleaner task exiting.");
                            return;
                        }
                        Err(e) => warn!("Pool cleanup failed: {}", e),
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Pool cleaner task shutting down.");
                    return;
                }
            }
        }
    }
}
