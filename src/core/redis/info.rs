// src/core/redis/info.rs

//! Reply parsing for the administrative commands issued by `RedisClient`,
//! kept free of I/O so each shape can be checked on its own.

use crate::core::TopomError;
use crate::core::protocol::RespFrame;
use crate::core::protocol::reply;
use std::collections::{BTreeMap, HashMap};

/// Parses the `INFO` text into `key -> value`.
///
/// Lines are split on the first colon and both sides trimmed. Lines without a
/// colon (section headers, blanks) and lines with an empty key are skipped.
pub fn parse_info(text: &str) -> HashMap<String, String> {
    let mut info = HashMap::new();
    for line in text.split('\n') {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if !key.is_empty() {
            info.insert(key.to_string(), value.trim().to_string());
        }
    }
    info
}

/// Derives the master address of a node from its parsed `INFO`.
/// Returns `None` when the node is not replicating from anyone.
pub fn master_from_info(info: &HashMap<String, String>) -> Option<String> {
    let host = info.get("master_host").map(String::as_str).unwrap_or("");
    let port = info.get("master_port").map(String::as_str).unwrap_or("");
    if host.is_empty() && port.is_empty() {
        return None;
    }
    Some(join_host_port(host, port))
}

/// Parses a `SLOTSINFO` reply: a sequence of `(slot, key_count)` pairs.
pub fn parse_slots_info(reply: &RespFrame) -> Result<BTreeMap<u32, u64>, TopomError> {
    let mut slots = BTreeMap::new();
    for (i, info) in reply::values(reply)?.iter().enumerate() {
        let invalid = || TopomError::InvalidResponse(format!("invalid response[{i}] = {info}"));
        let pair = reply::ints(info).map_err(|_| invalid())?;
        let &[slot, keys] = pair.as_slice() else {
            return Err(invalid());
        };
        let slot = u32::try_from(slot).map_err(|_| invalid())?;
        let keys = u64::try_from(keys).map_err(|_| invalid())?;
        slots.insert(slot, keys);
    }
    Ok(slots)
}

/// Parses a `SLOTSMGRTTAGSLOT` reply of `(status, moved)`, returning the number
/// of keys moved in this batch.
pub fn parse_migrate_reply(slot: u32, reply: &RespFrame) -> Result<u64, TopomError> {
    let invalid = || TopomError::InvalidResponse(format!("invalid response = {reply}"));
    let pair = reply::ints(reply).map_err(|_| invalid())?;
    let &[status, moved] = pair.as_slice() else {
        return Err(invalid());
    };
    if status != 0 {
        return Err(TopomError::MigrationFailed {
            slot,
            reply: reply.to_string(),
        });
    }
    u64::try_from(moved).map_err(|_| invalid())
}

/// Parses a `CONFIG GET maxmemory` reply. Zero means unlimited and maps to
/// positive infinity so it is never mistaken for a cap.
pub fn parse_max_memory(reply: &RespFrame) -> Result<f64, TopomError> {
    let invalid = || TopomError::InvalidResponse(format!("invalid response = {reply}"));
    let pair = reply::values(reply).map_err(|_| invalid())?;
    let [_, value] = pair else {
        return Err(invalid());
    };
    match reply::int(value).map_err(|_| invalid())? {
        0 => Ok(f64::INFINITY),
        v => Ok(v as f64),
    }
}

/// Splits `host:port` (or `[v6-host]:port`) into its parts.
pub fn split_host_port(addr: &str) -> Result<(&str, &str), TopomError> {
    let invalid = || TopomError::InvalidAddress(addr.to_string());
    let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
        (host, tail.strip_prefix(':').ok_or_else(invalid)?)
    } else {
        let (host, port) = addr.rsplit_once(':').ok_or_else(invalid)?;
        if host.contains(':') {
            return Err(invalid());
        }
        (host, port)
    };
    if port.contains(':') || port.contains(']') {
        return Err(invalid());
    }
    Ok((host, port))
}

/// Joins a host and port, bracketing IPv6 hosts.
pub fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}
