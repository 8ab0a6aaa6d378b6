// src/core/metrics.rs

//! Prometheus metrics for pool and client activity.
//!
//! Registered once per process through `lazy_static`.

use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, TextEncoder, register_counter, register_gauge};

lazy_static! {
    /// Idle clients currently held across all pools.
    pub static ref POOL_IDLE_CLIENTS: Gauge =
        register_gauge!("topom_pool_idle_clients", "Number of idle clients held by the pool.").unwrap();
    /// New connections dialed because no idle client was reusable.
    pub static ref POOL_DIALS_TOTAL: Counter =
        register_counter!("topom_pool_dials_total", "Total number of connections dialed on a pool miss.").unwrap();
    /// Idle clients handed back out to a caller.
    pub static ref POOL_REUSED_TOTAL: Counter =
        register_counter!("topom_pool_reused_total", "Total number of idle clients reused.").unwrap();
    /// Clients closed by the pool: stale, failed, or released after shutdown.
    pub static ref POOL_DISCARDED_TOTAL: Counter =
        register_counter!("topom_pool_discarded_total", "Total number of clients closed by the pool.").unwrap();
    pub static ref CLIENT_FAILURES_TOTAL: Counter =
        register_counter!("topom_client_failures_total", "Total number of commands that poisoned a client.").unwrap();
}

/// Renders every registered metric in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
