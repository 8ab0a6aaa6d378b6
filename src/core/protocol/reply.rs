// src/core/protocol/reply.rs

//! Typed views over raw reply frames.
//!
//! Nodes answer administrative commands with a handful of shapes: integers
//! (sometimes sent as bulk strings, as `CONFIG GET` does), arrays of integers,
//! nested arrays of pairs, and text blobs. These helpers turn a `RespFrame`
//! into the shape the caller expects, or an `InvalidResponse` naming what
//! actually arrived.

use super::RespFrame;
use crate::core::TopomError;
use std::fmt;

/// Renders a frame compactly for error messages, e.g. `[1 0]` or `"OK"`.
impl fmt::Display for RespFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespFrame::SimpleString(s) => write!(f, "{s:?}"),
            RespFrame::Error(s) => write!(f, "ERR({s:?})"),
            RespFrame::Integer(i) => write!(f, "{i}"),
            RespFrame::BulkString(b) => write!(f, "{:?}", String::from_utf8_lossy(b)),
            RespFrame::Null | RespFrame::NullArray => f.write_str("nil"),
            RespFrame::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Expects an array reply and returns its elements.
pub fn values(reply: &RespFrame) -> Result<&[RespFrame], TopomError> {
    match reply {
        RespFrame::Array(items) => Ok(items),
        other => Err(TopomError::InvalidResponse(format!(
            "expected array, got {other}"
        ))),
    }
}

/// Expects an integer, accepting the textual form used by bulk and simple strings.
pub fn int(reply: &RespFrame) -> Result<i64, TopomError> {
    let parsed = match reply {
        RespFrame::Integer(i) => return Ok(*i),
        RespFrame::BulkString(b) => std::str::from_utf8(b).ok().and_then(|s| s.parse().ok()),
        RespFrame::SimpleString(s) => s.parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| TopomError::InvalidResponse(format!("expected integer, got {reply}")))
}

/// Expects an array whose every element converts to an integer.
pub fn ints(reply: &RespFrame) -> Result<Vec<i64>, TopomError> {
    values(reply)?.iter().map(int).collect()
}

/// Expects a textual reply.
pub fn string(reply: &RespFrame) -> Result<String, TopomError> {
    match reply {
        RespFrame::BulkString(b) => Ok(String::from_utf8_lossy(b).into_owned()),
        RespFrame::SimpleString(s) => Ok(s.clone()),
        other => Err(TopomError::InvalidResponse(format!(
            "expected string, got {other}"
        ))),
    }
}
