// src/core/redis/conn.rs

//! The transport primitive underneath `RedisClient`: one TCP connection that
//! sends a command and waits for exactly one reply.

use crate::core::TopomError;
use crate::core::protocol::{RespFrame, RespFrameCodec};
use bytes::BytesMut;
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Timeouts applied when dialing a node and on every read and write after that.
/// `None` for read or write means the operation may wait indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialOptions {
    pub connect_timeout: Duration,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
}

impl Default for DialOptions {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

#[derive(Debug)]
pub struct RedisConn {
    stream: TcpStream,
    codec: RespFrameCodec,
    read_buf: BytesMut,
    options: DialOptions,
}

impl RedisConn {
    /// Opens a TCP connection to `addr` (`host:port`) within the connect timeout.
    pub async fn connect(addr: &str, options: DialOptions) -> Result<Self, TopomError> {
        let stream = tokio::time::timeout(options.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| TopomError::Timeout(format!("connect to {addr}")))??;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            codec: RespFrameCodec,
            read_buf: BytesMut::with_capacity(4096),
            options,
        })
    }

    /// Sends `name args...` and waits for one reply frame.
    ///
    /// An error reply from the node is returned as `TopomError::Server`.
    pub async fn send<S: AsRef<str>>(
        &mut self,
        name: &str,
        args: &[S],
    ) -> Result<RespFrame, TopomError> {
        let mut write_buf = BytesMut::new();
        self.codec
            .encode(RespFrame::command(name, args), &mut write_buf)?;

        with_deadline(
            self.options.write_timeout,
            "write",
            self.stream.write_all(&write_buf),
        )
        .await??;

        match self.read_reply().await? {
            RespFrame::Error(msg) => Err(TopomError::Server(msg)),
            reply => Ok(reply),
        }
    }

    async fn read_reply(&mut self) -> Result<RespFrame, TopomError> {
        loop {
            // Bytes left over from a previous read may already hold a full frame.
            if let Some(reply) = self.codec.decode(&mut self.read_buf)? {
                return Ok(reply);
            }
            let n = with_deadline(
                self.options.read_timeout,
                "read",
                self.stream.read_buf(&mut self.read_buf),
            )
            .await??;
            if n == 0 {
                return Err(TopomError::ConnectionClosed);
            }
        }
    }

    /// Shuts the connection down. Consuming `self` means it happens once.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!("Ignoring error while closing connection: {}", e);
        }
    }
}

async fn with_deadline<F: Future>(
    deadline: Option<Duration>,
    op: &str,
    fut: F,
) -> Result<F::Output, TopomError> {
    match deadline {
        Some(d) => tokio::time::timeout(d, fut)
            .await
            .map_err(|_| TopomError::Timeout(format!("{op} timed out after {d:?}"))),
        None => Ok(fut.await),
    }
}
