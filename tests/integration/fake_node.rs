// tests/integration/fake_node.rs

//! A scripted stand-in for a store node. It speaks RESP over a real TCP
//! socket, answers the administrative commands the client issues, and records
//! every command it receives.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;
use topom::core::protocol::{RespFrame, RespFrameCodec};

#[derive(Debug, Default)]
pub struct NodeState {
    pub password: Option<String>,
    pub master: Option<(String, String)>,
    pub maxmemory: i64,
    pub slots: Vec<(i64, i64)>,
    pub migrate_reply: Vec<i64>,
    /// When set, the node drops the connection instead of answering.
    pub hang_up: bool,
    /// When set, every command is answered with this error reply.
    pub error_reply: Option<String>,
    /// Held before every reply is written.
    pub reply_delay: Duration,
    pub commands: Vec<Vec<String>>,
    pub connections: usize,
}

pub struct FakeNode {
    pub addr: String,
    pub state: Arc<Mutex<NodeState>>,
    handle: JoinHandle<()>,
}

impl FakeNode {
    pub async fn start() -> Self {
        Self::with_state(NodeState::default()).await
    }

    pub async fn with_password(password: &str) -> Self {
        Self::with_state(NodeState {
            password: Some(password.to_string()),
            ..NodeState::default()
        })
        .await
    }

    pub async fn with_state(state: NodeState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let state = Arc::new(Mutex::new(state));

        let accept_state = state.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                accept_state.lock().connections += 1;
                let conn_state = accept_state.clone();
                tokio::spawn(async move {
                    let mut framed = Framed::new(socket, RespFrameCodec);
                    while let Some(Ok(frame)) = framed.next().await {
                        let Some(reply) = respond(&conn_state, frame) else {
                            return;
                        };
                        let delay = conn_state.lock().reply_delay;
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        if framed.send(reply).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Commands received so far whose name matches `name`.
    pub fn count(&self, name: &str) -> usize {
        self.state
            .lock()
            .commands
            .iter()
            .filter(|c| c.first().is_some_and(|n| n.eq_ignore_ascii_case(name)))
            .count()
    }

    pub fn total_commands(&self) -> usize {
        self.state.lock().commands.len()
    }

    pub fn connections(&self) -> usize {
        self.state.lock().connections
    }
}

impl Drop for FakeNode {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn bulk(s: &str) -> RespFrame {
    RespFrame::BulkString(Bytes::copy_from_slice(s.as_bytes()))
}

fn respond(state: &Mutex<NodeState>, frame: RespFrame) -> Option<RespFrame> {
    let RespFrame::Array(parts) = frame else {
        return Some(RespFrame::Error("ERR expected array".into()));
    };
    let args: Vec<String> = parts
        .iter()
        .map(|p| match p {
            RespFrame::BulkString(b) => String::from_utf8_lossy(b).into_owned(),
            other => format!("{other:?}"),
        })
        .collect();

    let mut state = state.lock();
    if state.hang_up {
        return None;
    }
    state.commands.push(args.clone());
    if let Some(msg) = &state.error_reply {
        return Some(RespFrame::Error(msg.clone()));
    }

    let name = args.first().map(|s| s.to_ascii_uppercase()).unwrap_or_default();
    let reply = match (name.as_str(), args.get(1..).unwrap_or_default()) {
        ("AUTH", [password]) => match &state.password {
            Some(expected) if expected == password => RespFrame::SimpleString("OK".into()),
            _ => RespFrame::Error("ERR invalid password".into()),
        },
        ("PING", []) => RespFrame::SimpleString("PONG".into()),
        ("SLOTSINFO", []) => RespFrame::Array(
            state
                .slots
                .iter()
                .map(|(slot, keys)| {
                    RespFrame::Array(vec![RespFrame::Integer(*slot), RespFrame::Integer(*keys)])
                })
                .collect(),
        ),
        ("SLOTSMGRTTAGSLOT", [_, _, _, _]) => RespFrame::Array(
            state
                .migrate_reply
                .iter()
                .map(|v| RespFrame::Integer(*v))
                .collect(),
        ),
        ("INFO", []) => {
            let (host, port) = state.master.clone().unwrap_or_default();
            let role = if host.is_empty() { "master" } else { "slave" };
            bulk(&format!(
                "# Replication\r\nrole:{role}\r\nmaster_host:{host}\r\nmaster_port:{port}\r\n"
            ))
        }
        ("CONFIG", [get, key]) if get.eq_ignore_ascii_case("GET") && key == "maxmemory" => {
            RespFrame::Array(vec![bulk("maxmemory"), bulk(&state.maxmemory.to_string())])
        }
        ("SLAVEOF", [no, one]) if no == "NO" && one == "ONE" => {
            state.master = None;
            RespFrame::SimpleString("OK".into())
        }
        ("SLAVEOF", [host, port]) => {
            state.master = Some((host.clone(), port.clone()));
            RespFrame::SimpleString("OK".into())
        }
        _ => RespFrame::Error(format!("ERR unknown command '{name}'")),
    };
    Some(reply)
}
