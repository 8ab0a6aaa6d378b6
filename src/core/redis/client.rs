// src/core/redis/client.rs

//! A client bound to a single store node, exposing the administrative
//! commands the topology manager needs as typed calls.

use super::conn::{DialOptions, RedisConn};
use super::info;
use crate::core::TopomError;
use crate::core::metrics;
use crate::core::protocol::{RespFrame, reply};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::{debug, warn};

/// Server-side budget handed to `SLOTSMGRTTAGSLOT`, in milliseconds.
pub const MIGRATE_TIMEOUT_MS: u64 = 30 * 1000;

/// Owns one connection to one node.
///
/// The first failed command poisons the client: the error is kept in
/// `last_error` and every later command fails with `FailedClient` without
/// touching the network. A command abandoned before its reply arrives also
/// poisons the client. A poisoned client is never reused by the pool.
#[derive(Debug)]
pub struct RedisClient {
    addr: String,
    conn: RedisConn,
    last_error: Option<TopomError>,
    last_use: Instant,
}

impl RedisClient {
    /// Dials `addr` and authenticates with `auth` when one is given.
    /// A failed `AUTH` closes the connection before the error is returned.
    pub async fn connect(
        addr: &str,
        auth: Option<&str>,
        options: DialOptions,
    ) -> Result<Self, TopomError> {
        let mut conn = RedisConn::connect(addr, options).await?;
        if let Some(auth) = auth {
            if let Err(e) = conn.send("AUTH", &[auth]).await {
                conn.close().await;
                return Err(e);
            }
        }
        debug!("Connected to {}", addr);
        Ok(Self {
            addr: addr.to_string(),
            conn,
            last_error: None,
            last_use: Instant::now(),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn last_error(&self) -> Option<&TopomError> {
        self.last_error.as_ref()
    }

    pub fn last_use(&self) -> Instant {
        self.last_use
    }

    pub fn is_failed(&self) -> bool {
        self.last_error.is_some()
    }

    /// Closes the underlying connection.
    pub async fn close(self) {
        self.conn.close().await;
    }

    async fn command<S: AsRef<str>>(
        &mut self,
        name: &str,
        args: &[S],
    ) -> Result<RespFrame, TopomError> {
        if self.last_error.is_some() {
            return Err(TopomError::FailedClient);
        }
        // Stays set if this future is dropped mid-round-trip.
        self.last_error = Some(TopomError::Interrupted);
        match self.conn.send(name, args).await {
            Ok(reply) => {
                self.last_error = None;
                self.last_use = Instant::now();
                Ok(reply)
            }
            Err(e) => {
                debug!("Command {} to {} failed: {}", name, self.addr, e);
                metrics::CLIENT_FAILURES_TOTAL.inc();
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// `SLOTSINFO`: key counts for every non-empty slot hosted by the node.
    pub async fn slots_info(&mut self) -> Result<BTreeMap<u32, u64>, TopomError> {
        let reply = self.command::<&str>("SLOTSINFO", &[]).await?;
        info::parse_slots_info(&reply)
    }

    /// Migrates one batch of `slot` to `host:port` with `SLOTSMGRTTAGSLOT` and
    /// returns how many keys moved. Callers repeat until it returns 0.
    pub async fn slots_mgrt_tag_slot(
        &mut self,
        host: &str,
        port: &str,
        slot: u32,
    ) -> Result<u64, TopomError> {
        let timeout = MIGRATE_TIMEOUT_MS.to_string();
        let slot_arg = slot.to_string();
        let reply = self
            .command(
                "SLOTSMGRTTAGSLOT",
                &[host, port, timeout.as_str(), slot_arg.as_str()],
            )
            .await?;
        info::parse_migrate_reply(slot, &reply)
    }

    /// Same as `slots_mgrt_tag_slot`, taking the destination as `host:port`.
    pub async fn migrate_slot_to(&mut self, target: &str, slot: u32) -> Result<u64, TopomError> {
        let (host, port) = info::split_host_port(target)?;
        self.slots_mgrt_tag_slot(host, port, slot).await
    }

    pub async fn get_info(&mut self) -> Result<HashMap<String, String>, TopomError> {
        let reply = self.command::<&str>("INFO", &[]).await?;
        let text = reply::string(&reply)?;
        Ok(info::parse_info(&text))
    }

    /// The node's current master as `host:port`, or `None` if it is a master.
    pub async fn get_master(&mut self) -> Result<Option<String>, TopomError> {
        let info = self.get_info().await?;
        Ok(info::master_from_info(&info))
    }

    /// `maxmemory` in bytes; an unlimited node reports `f64::INFINITY`.
    pub async fn get_max_memory(&mut self) -> Result<f64, TopomError> {
        let reply = self.command("CONFIG", &["GET", "maxmemory"]).await?;
        info::parse_max_memory(&reply)
    }

    /// Points the node at `master`, or detaches it when `master` is empty.
    ///
    /// Attaching to the master the node already follows is a no-op.
    pub async fn slave_of(&mut self, master: &str) -> Result<(), TopomError> {
        if master == self.addr {
            return Err(TopomError::SelfReplication(master.to_string()));
        }
        if master.is_empty() {
            self.command("SLAVEOF", &["NO", "ONE"]).await?;
            return Ok(());
        }

        if self.get_master().await?.as_deref() == Some(master) {
            return Ok(());
        }
        let (host, port) = info::split_host_port(master)?;
        warn!("redis set slaveof [M] {} <---> {} [S]", master, self.addr);
        self.command("SLAVEOF", &[host, port]).await?;
        Ok(())
    }
}
