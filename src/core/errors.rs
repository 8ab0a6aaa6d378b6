// src/core/errors.rs

//! Defines the primary error type shared by the node client and the pool.

use std::sync::Arc;
use thiserror::Error;

/// Every failure the client and pool can surface to a caller.
#[derive(Error, Debug)]
pub enum TopomError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Incomplete data in stream")]
    IncompleteData,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Timeout: {0}")]
    Timeout(String),

    /// An error reply (`-ERR ...`) sent back by the node.
    #[error("Server error: {0}")]
    Server(String),

    #[error("use of failed redis client")]
    FailedClient,

    /// The caller stopped waiting before the reply was read, leaving the
    /// connection out of step with the node.
    #[error("command interrupted before its reply was read")]
    Interrupted,

    #[error("use of closed redis pool")]
    ClosedPool,

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("migrate slot-{slot:04} failed, response = {reply}")]
    MigrationFailed { slot: u32, reply: String },

    #[error("can not slave of itself: {0}")]
    SelfReplication(String),

    #[error("invalid address '{0}'")]
    InvalidAddress(String),
}

/// Coarse classification of a `TopomError`, for callers that need to decide
/// between "target unreachable", "target misbehaved" and "operator misuse".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unreachable,
    Misbehaved,
    Misuse,
}

impl TopomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TopomError::Io(_)
            | TopomError::ConnectionClosed
            | TopomError::Timeout(_)
            | TopomError::FailedClient
            | TopomError::Interrupted => ErrorKind::Unreachable,
            TopomError::IncompleteData
            | TopomError::Protocol(_)
            | TopomError::Server(_)
            | TopomError::InvalidResponse(_)
            | TopomError::MigrationFailed { .. } => ErrorKind::Misbehaved,
            TopomError::ClosedPool
            | TopomError::SelfReplication(_)
            | TopomError::InvalidAddress(_) => ErrorKind::Misuse,
        }
    }
}

// `std::io::Error` is not cloneable, so it is shared through an `Arc`. A poisoned
// client hands the same recorded error back to later callers.
impl Clone for TopomError {
    fn clone(&self) -> Self {
        match self {
            TopomError::Io(e) => TopomError::Io(Arc::clone(e)),
            TopomError::IncompleteData => TopomError::IncompleteData,
            TopomError::Protocol(s) => TopomError::Protocol(s.clone()),
            TopomError::ConnectionClosed => TopomError::ConnectionClosed,
            TopomError::Timeout(s) => TopomError::Timeout(s.clone()),
            TopomError::Server(s) => TopomError::Server(s.clone()),
            TopomError::FailedClient => TopomError::FailedClient,
            TopomError::Interrupted => TopomError::Interrupted,
            TopomError::ClosedPool => TopomError::ClosedPool,
            TopomError::InvalidResponse(s) => TopomError::InvalidResponse(s.clone()),
            TopomError::MigrationFailed { slot, reply } => TopomError::MigrationFailed {
                slot: *slot,
                reply: reply.clone(),
            },
            TopomError::SelfReplication(s) => TopomError::SelfReplication(s.clone()),
            TopomError::InvalidAddress(s) => TopomError::InvalidAddress(s.clone()),
        }
    }
}

impl PartialEq for TopomError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TopomError::Io(e1), TopomError::Io(e2)) => e1.kind() == e2.kind(),
            (TopomError::Protocol(s1), TopomError::Protocol(s2)) => s1 == s2,
            (TopomError::Timeout(s1), TopomError::Timeout(s2)) => s1 == s2,
            (TopomError::Server(s1), TopomError::Server(s2)) => s1 == s2,
            (TopomError::InvalidResponse(s1), TopomError::InvalidResponse(s2)) => s1 == s2,
            (
                TopomError::MigrationFailed { slot: s1, reply: r1 },
                TopomError::MigrationFailed { slot: s2, reply: r2 },
            ) => s1 == s2 && r1 == r2,
            (TopomError::SelfReplication(s1), TopomError::SelfReplication(s2)) => s1 == s2,
            (TopomError::InvalidAddress(s1), TopomError::InvalidAddress(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl From<std::io::Error> for TopomError {
    fn from(e: std::io::Error) -> Self {
        TopomError::Io(Arc::new(e))
    }
}
