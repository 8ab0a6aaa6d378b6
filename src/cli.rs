// src/cli.rs

//! Argument parsing and command execution for the `topom` operator binary.

use crate::core::{RedisPool, TopomError};
use anyhow::{Result, anyhow};

pub const USAGE: &str = "\
Usage: topom [--config <path>] [--metrics] <command>

Commands:
  slots <addr>                 Show key counts per slot
  info <addr>                  Dump INFO key/value pairs
  master <addr>                Show the node's master
  maxmemory <addr>             Show the node's memory ceiling
  slaveof <addr> <master>      Make <addr> replicate from <master>
  promote <addr>               Detach <addr> from its master
  migrate <src> <dst> <slot>   Move every key of <slot> from <src> to <dst>

Options:
  --config <path>              Load settings from a TOML file
  --metrics                    Print pool metrics after the command";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Slots { addr: String },
    Info { addr: String },
    Master { addr: String },
    MaxMemory { addr: String },
    SlaveOf { addr: String, master: String },
    Promote { addr: String },
    Migrate { src: String, dst: String, slot: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub config_path: Option<String>,
    /// Print the Prometheus registry once the command has run.
    pub print_metrics: bool,
    pub command: Command,
}

impl Command {
    /// The node the command talks to.
    pub fn addr(&self) -> &str {
        match self {
            Command::Slots { addr }
            | Command::Info { addr }
            | Command::Master { addr }
            | Command::MaxMemory { addr }
            | Command::SlaveOf { addr, .. }
            | Command::Promote { addr } => addr,
            Command::Migrate { src, .. } => src,
        }
    }
}

/// Parses the arguments that follow the program name.
pub fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut config_path = None;
    let mut print_metrics = false;
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let path = iter
                .next()
                .ok_or_else(|| anyhow!("--config flag requires a value"))?;
            config_path = Some(path.clone());
        } else if arg == "--metrics" {
            print_metrics = true;
        } else {
            rest.push(arg.as_str());
        }
    }

    let command = match rest.as_slice() {
        ["slots", addr] => Command::Slots {
            addr: addr.to_string(),
        },
        ["info", addr] => Command::Info {
            addr: addr.to_string(),
        },
        ["master", addr] => Command::Master {
            addr: addr.to_string(),
        },
        ["maxmemory", addr] => Command::MaxMemory {
            addr: addr.to_string(),
        },
        ["slaveof", addr, master] => Command::SlaveOf {
            addr: addr.to_string(),
            master: master.to_string(),
        },
        ["promote", addr] => Command::Promote {
            addr: addr.to_string(),
        },
        ["migrate", src, dst, slot] => Command::Migrate {
            src: src.to_string(),
            dst: dst.to_string(),
            slot: slot
                .parse()
                .map_err(|_| anyhow!("Invalid slot number: {slot}"))?,
        },
        [] => return Err(anyhow!("missing command")),
        [other, ..] => return Err(anyhow!("unknown or malformed command '{other}'")),
    };

    Ok(CliArgs {
        config_path,
        print_metrics,
        command,
    })
}

/// Runs `command` on a pooled client and returns the text to print.
/// The client goes back to the pool whether or not the command succeeded.
pub async fn execute(pool: &RedisPool, command: &Command) -> Result<String> {
    let mut client = pool.get_client(command.addr()).await?;
    let output = match command {
        Command::Slots { .. } => client.slots_info().await.map(|slots| {
            slots
                .iter()
                .map(|(slot, keys)| format!("slot-{slot:04} {keys}"))
                .collect::<Vec<_>>()
                .join("\n")
        }),
        Command::Info { .. } => client.get_info().await.map(|info| {
            let mut lines: Vec<_> = info.iter().map(|(k, v)| format!("{k}:{v}")).collect();
            lines.sort();
            lines.join("\n")
        }),
        Command::Master { .. } => client
            .get_master()
            .await
            .map(|m| m.unwrap_or_else(|| "(none)".to_string())),
        Command::MaxMemory { .. } => client.get_max_memory().await.map(|v| {
            if v.is_infinite() {
                "unlimited".to_string()
            } else {
                format!("{v}")
            }
        }),
        Command::SlaveOf { master, .. } => client.slave_of(master).await.map(|_| "OK".to_string()),
        Command::Promote { .. } => client.slave_of("").await.map(|_| "OK".to_string()),
        Command::Migrate { dst, slot, .. } => migrate_all(&mut client, dst, *slot)
            .await
            .map(|moved| format!("moved {moved} key(s) of slot-{slot:04}")),
    };
    release(pool, client).await;
    Ok(output?)
}

/// Repeats batch migration of `slot` until a batch moves nothing.
async fn migrate_all(
    client: &mut crate::core::RedisClient,
    dst: &str,
    slot: u32,
) -> Result<u64, TopomError> {
    let mut total = 0;
    loop {
        match client.migrate_slot_to(dst, slot).await? {
            0 => return Ok(total),
            n => total += n,
        }
    }
}

async fn release(pool: &RedisPool, client: crate::core::RedisClient) {
    if let Err(e) = pool.put_client(client).await {
        tracing::debug!("Client not returned to pool: {}", e);
    }
}
