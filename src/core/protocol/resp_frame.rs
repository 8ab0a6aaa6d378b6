// src/core/protocol/resp_frame.rs

//! Implements the RESP (REdis Serialization Protocol) frame structure and the
//! corresponding `Encoder` and `Decoder` used to talk to store nodes.

use crate::core::TopomError;
use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// The CRLF (Carriage Return, Line Feed) sequence used to terminate lines in RESP.
const CRLF: &[u8] = b"\r\n";
const CRLF_LEN: usize = 2;

// Protocol-level limits so a misbehaving node cannot make us allocate without bound.
const MAX_FRAME_ELEMENTS: usize = 1_024 * 1_024;
const MAX_BULK_STRING_SIZE: usize = 512 * 1024 * 1024;
const MAX_RECURSION_DEPTH: usize = 256;

/// A single frame in the RESP protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum RespFrame {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    Null,
    NullArray,
    Array(Vec<RespFrame>),
}

impl RespFrame {
    /// Builds a command frame: an array of bulk strings, command name first.
    pub fn command<S: AsRef<str>>(name: &str, args: &[S]) -> Self {
        let mut parts = Vec::with_capacity(args.len() + 1);
        parts.push(RespFrame::BulkString(Bytes::copy_from_slice(name.as_bytes())));
        for arg in args {
            parts.push(RespFrame::BulkString(Bytes::copy_from_slice(
                arg.as_ref().as_bytes(),
            )));
        }
        RespFrame::Array(parts)
    }
}

/// A `tokio_util::codec` implementation for encoding and decoding `RespFrame`s.
#[derive(Debug, Default)]
pub struct RespFrameCodec;

impl Encoder<RespFrame> for RespFrameCodec {
    type Error = TopomError;

    fn encode(&mut self, item: RespFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            RespFrame::SimpleString(s) => {
                dst.extend_from_slice(b"+");
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Error(s) => {
                dst.extend_from_slice(b"-");
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Integer(i) => {
                dst.extend_from_slice(b":");
                dst.extend_from_slice(i.to_string().as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::BulkString(b) => {
                dst.extend_from_slice(b"$");
                dst.extend_from_slice(b.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                dst.extend_from_slice(&b);
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Null => {
                dst.extend_from_slice(b"$-1\r\n");
            }
            RespFrame::NullArray => {
                dst.extend_from_slice(b"*-1\r\n");
            }
            RespFrame::Array(arr) => {
                dst.extend_from_slice(b"*");
                dst.extend_from_slice(arr.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                for frame in arr {
                    self.encode(frame, dst)?;
                }
            }
        }
        Ok(())
    }
}

impl Decoder for RespFrameCodec {
    type Item = RespFrame;
    type Error = TopomError;

    /// Decodes one frame from the front of `src`. Returns `Ok(None)` until a
    /// complete frame is buffered; only the consumed bytes are advanced.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut bytes = &src[..];
        match self.decode_recursive(&mut bytes, 0) {
            Ok(frame) => {
                let len = src.len() - bytes.len();
                src.advance(len);
                Ok(Some(frame))
            }
            Err(TopomError::IncompleteData) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl RespFrameCodec {
    fn decode_recursive(&self, bytes: &mut &[u8], depth: usize) -> Result<RespFrame, TopomError> {
        if depth > MAX_RECURSION_DEPTH {
            return Err(TopomError::Protocol(
                "RESP recursion depth limit exceeded".to_string(),
            ));
        }

        if bytes.is_empty() {
            return Err(TopomError::IncompleteData);
        }

        match bytes[0] {
            b'+' => self.parse_simple_string(bytes),
            b'-' => self.parse_error(bytes),
            b':' => self.parse_integer(bytes),
            b'$' => self.parse_bulk_string(bytes),
            b'*' => self.parse_array(bytes, depth),
            other => Err(TopomError::Protocol(format!(
                "unexpected frame prefix byte 0x{other:02x}"
            ))),
        }
    }

    /// Returns the next line (without CRLF) and advances past it.
    fn parse_line<'a>(&self, bytes: &mut &'a [u8]) -> Result<&'a [u8], TopomError> {
        if let Some(pos) = find_crlf(bytes) {
            let line = &bytes[..pos];
            *bytes = &bytes[pos + CRLF_LEN..];
            Ok(line)
        } else {
            Err(TopomError::IncompleteData)
        }
    }

    fn parse_length(&self, line: &[u8]) -> Result<isize, TopomError> {
        String::from_utf8_lossy(line)
            .parse::<isize>()
            .map_err(|_| TopomError::Protocol("invalid length prefix".to_string()))
    }

    /// Parses a Simple String (e.g., `+OK\r\n`).
    fn parse_simple_string(&self, bytes: &mut &[u8]) -> Result<RespFrame, TopomError> {
        *bytes = &bytes[1..];
        let line = self.parse_line(bytes)?;
        Ok(RespFrame::SimpleString(
            String::from_utf8_lossy(line).to_string(),
        ))
    }

    /// Parses an Error (e.g., `-ERR message\r\n`).
    fn parse_error(&self, bytes: &mut &[u8]) -> Result<RespFrame, TopomError> {
        *bytes = &bytes[1..];
        let line = self.parse_line(bytes)?;
        Ok(RespFrame::Error(String::from_utf8_lossy(line).to_string()))
    }

    /// Parses an Integer (e.g., `:1000\r\n`).
    fn parse_integer(&self, bytes: &mut &[u8]) -> Result<RespFrame, TopomError> {
        *bytes = &bytes[1..];
        let line = self.parse_line(bytes)?;
        let i = String::from_utf8_lossy(line)
            .parse::<i64>()
            .map_err(|_| TopomError::Protocol("invalid integer frame".to_string()))?;
        Ok(RespFrame::Integer(i))
    }

    /// Parses a Bulk String (e.g., `$5\r\nhello\r\n`).
    fn parse_bulk_string(&self, bytes: &mut &[u8]) -> Result<RespFrame, TopomError> {
        *bytes = &bytes[1..];
        let line = self.parse_line(bytes)?;
        let str_len = self.parse_length(line)?;

        if str_len == -1 {
            return Ok(RespFrame::Null);
        }
        if str_len < 0 || str_len as usize > MAX_BULK_STRING_SIZE {
            return Err(TopomError::Protocol(format!(
                "invalid bulk string length {str_len}"
            )));
        }

        let str_len = str_len as usize;
        if bytes.len() < str_len + CRLF_LEN {
            return Err(TopomError::IncompleteData);
        }
        if &bytes[str_len..str_len + CRLF_LEN] != CRLF {
            return Err(TopomError::Protocol(
                "bulk string not terminated by CRLF".to_string(),
            ));
        }

        let data = Bytes::copy_from_slice(&bytes[..str_len]);
        *bytes = &bytes[str_len + CRLF_LEN..];
        Ok(RespFrame::BulkString(data))
    }

    /// Parses an Array (e.g., `*2\r\n:1\r\n:2\r\n`).
    fn parse_array(&self, bytes: &mut &[u8], depth: usize) -> Result<RespFrame, TopomError> {
        *bytes = &bytes[1..];
        let line = self.parse_line(bytes)?;
        let arr_len = self.parse_length(line)?;

        if arr_len == -1 {
            return Ok(RespFrame::NullArray);
        }
        if arr_len < 0 || arr_len as usize > MAX_FRAME_ELEMENTS {
            return Err(TopomError::Protocol(format!(
                "invalid array length {arr_len}"
            )));
        }

        let arr_len = arr_len as usize;
        let mut frames = Vec::with_capacity(arr_len.min(64));
        for _ in 0..arr_len {
            frames.push(self.decode_recursive(bytes, depth + 1)?);
        }
        Ok(RespFrame::Array(frames))
    }
}

fn find_crlf(src: &[u8]) -> Option<usize> {
    src.windows(CRLF_LEN).position(|window| window == CRLF)
}
