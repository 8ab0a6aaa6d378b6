// src/core/protocol/mod.rs

pub mod reply;
pub mod resp_frame;
pub use resp_frame::{RespFrame, RespFrameCodec};
