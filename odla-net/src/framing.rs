//! Length-prefixed framing for map-protocol messages.
//!
//! Wire format: `[u32 length (big-endian)][JSON payload]`

use std::io;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::DecodeError;

/// Frames larger than this are rejected.
pub const MAX_FRAME_LEN: usize = 1 << 20;

const LEN_PREFIX: usize = 4;

/// Encode a message as a length-prefixed JSON frame.
pub fn encode_frame<T: Serialize>(msg: &T) -> io::Result<Vec<u8>> {
    let payload = serde_json::to_vec(msg)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let len = payload.len() as u32;
    let mut frame = Vec::with_capacity(LEN_PREFIX + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Accumulates stream chunks and yields complete frames.
///
/// A bad frame is consumed and reported without disturbing the frames
/// after it. An oversized prefix cannot be skipped reliably, so the whole
/// buffer is discarded.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Take the next complete frame, if one has fully arrived.
    pub fn next_frame<T: DeserializeOwned>(&mut self) -> Option<Result<T, DecodeError>> {
        if self.buf.len() < LEN_PREFIX {
            return None;
        }
        let mut len_buf = [0u8; LEN_PREFIX];
        len_buf.copy_from_slice(&self.buf[..LEN_PREFIX]);
        let len = u32::from_be_bytes(len_buf) as usize;

        if len > MAX_FRAME_LEN {
            self.buf.clear();
            return Some(Err(DecodeError::Oversized(len)));
        }
        if self.buf.len() < LEN_PREFIX + len {
            return None;
        }

        let frame: Vec<u8> = self.buf.drain(..LEN_PREFIX + len).collect();
        Some(serde_json::from_slice(&frame[LEN_PREFIX..]).map_err(DecodeError::from))
    }
}
