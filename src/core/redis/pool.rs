// src/core/redis/pool.rs

//! A pool of idle `RedisClient`s keyed by node address.
//!
//! Callers take a client with `get_client`, run commands on it, and hand it
//! back with `put_client`. Only healthy, recently used clients are kept; the
//! rest are closed. One lock guards the whole registry, and a pool miss dials
//! the new connection while that lock is held, so new-connection setup is
//! serialized pool-wide.

use super::client::RedisClient;
use super::conn::DialOptions;
use crate::config::PoolConfig;
use crate::core::TopomError;
use crate::core::metrics;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Settings applied to every client the pool creates.
#[derive(Debug, Clone, Default)]
pub struct PoolOptions {
    /// Password sent with `AUTH` right after dialing. `None` skips `AUTH`.
    pub auth: Option<String>,
    /// Staleness window for idle clients. Zero disables expiry.
    pub idle_timeout: Duration,
    pub dial: DialOptions,
}

impl From<&PoolConfig> for PoolOptions {
    fn from(config: &PoolConfig) -> Self {
        Self {
            auth: config.auth.clone().filter(|s| !s.is_empty()),
            idle_timeout: config.idle_timeout,
            dial: config.dial_options(),
        }
    }
}

/// A point-in-time snapshot of the pool's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub addresses: usize,
    pub idle_clients: usize,
    pub closed: bool,
}

#[derive(Debug, Default)]
struct PoolState {
    /// Most recently released client at the front.
    idle: HashMap<String, VecDeque<RedisClient>>,
    closed: bool,
}

#[derive(Debug)]
pub struct RedisPool {
    options: PoolOptions,
    state: Mutex<PoolState>,
}

impl RedisPool {
    pub fn new(options: PoolOptions) -> Self {
        Self {
            options,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// A client may go back into (or come out of) the pool only if it never
    /// failed and was used within half the idle timeout, so it is retired well
    /// before the node itself would drop the idle connection.
    pub fn is_recyclable(&self, client: &RedisClient) -> bool {
        is_recyclable_at(
            client.is_failed(),
            client.last_use(),
            self.options.idle_timeout,
            Instant::now(),
        )
    }

    /// Takes an idle client for `addr`, or dials a new one if none is usable.
    /// Stale or failed idle clients met along the way are closed.
    pub async fn get_client(&self, addr: &str) -> Result<RedisClient, TopomError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(TopomError::ClosedPool);
        }

        if let Some(list) = state.idle.get_mut(addr) {
            while let Some(client) = list.pop_front() {
                if self.is_recyclable(&client) {
                    metrics::POOL_IDLE_CLIENTS.dec();
                    metrics::POOL_REUSED_TOTAL.inc();
                    debug!("Reusing pooled client for {}", addr);
                    return Ok(client);
                }
                metrics::POOL_IDLE_CLIENTS.dec();
                discard(client, "stale on acquire").await;
            }
        }

        metrics::POOL_DIALS_TOTAL.inc();
        debug!("No reusable client for {}; dialing", addr);
        RedisClient::connect(addr, self.options.auth.as_deref(), self.options.dial).await
    }

    /// Returns a client to the pool. Clients that are no longer recyclable are
    /// closed instead. After `close`, the client is closed and `ClosedPool`
    /// is returned.
    pub async fn put_client(&self, client: RedisClient) -> Result<(), TopomError> {
        let mut state = self.state.lock().await;
        if state.closed {
            discard(client, "pool closed").await;
            return Err(TopomError::ClosedPool);
        }
        if !self.is_recyclable(&client) {
            discard(client, "not recyclable on release").await;
            return Ok(());
        }
        metrics::POOL_IDLE_CLIENTS.inc();
        state
            .idle
            .entry(client.addr().to_string())
            .or_default()
            .push_front(client);
        Ok(())
    }

    /// Closes every idle client that is no longer recyclable and forgets
    /// addresses left with no idle clients. Survivors keep their order.
    pub async fn cleanup(&self) -> Result<(), TopomError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(TopomError::ClosedPool);
        }

        let mut discarded = 0usize;
        for list in state.idle.values_mut() {
            for _ in 0..list.len() {
                let Some(client) = list.pop_front() else {
                    break;
                };
                if self.is_recyclable(&client) {
                    list.push_back(client);
                } else {
                    discarded += 1;
                    discard(client, "stale on cleanup").await;
                }
            }
        }
        state.idle.retain(|_, list| !list.is_empty());

        if discarded > 0 {
            metrics::POOL_IDLE_CLIENTS.sub(discarded as f64);
            debug!("Pool cleanup closed {} idle client(s)", discarded);
        }
        Ok(())
    }

    /// Shuts the pool down and closes every idle client. Calling it again is a
    /// no-op.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if state.closed {
            return;
        }
        state.closed = true;

        let mut closed = 0usize;
        for (_, list) in state.idle.drain() {
            for client in list {
                closed += 1;
                discard(client, "pool closed").await;
            }
        }
        metrics::POOL_IDLE_CLIENTS.sub(closed as f64);
        debug!("Pool closed; released {} idle client(s)", closed);
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }

    /// Number of idle clients held for `addr`.
    pub async fn idle_count(&self, addr: &str) -> usize {
        let state = self.state.lock().await;
        state.idle.get(addr).map_or(0, VecDeque::len)
    }

    pub async fn stats(&self) -> PoolStats {
        let state = self.state.lock().await;
        PoolStats {
            addresses: state.idle.len(),
            idle_clients: state.idle.values().map(VecDeque::len).sum(),
            closed: state.closed,
        }
    }
}

/// The recyclability rule on its own, with the clock passed in.
pub fn is_recyclable_at(
    failed: bool,
    last_use: Instant,
    idle_timeout: Duration,
    now: Instant,
) -> bool {
    if failed {
        return false;
    }
    if idle_timeout.is_zero() {
        return true;
    }
    // A window past the clock's range never closes.
    last_use
        .checked_add(idle_timeout / 2)
        .is_none_or(|deadline| deadline > now)
}

async fn discard(client: RedisClient, reason: &str) {
    debug!("Closing client for {} ({})", client.addr(), reason);
    metrics::POOL_DISCARDED_TOTAL.inc();
    client.close().await;
}
