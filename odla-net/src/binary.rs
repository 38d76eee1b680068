//! Fixed-layout binary codec.
//!
//! All integers are little-endian with no padding. Inbound command:
//! `[prior_state i32][post_state i32, optional][kind u8][par1 i32][par2 i32][text: u64 len + UTF-8]`.
//! Outbound status: an 8-byte header whose first byte is the total length
//! of the reply, followed by the tail of the variant named in byte 1.

use std::io;

use serde::{Deserialize, Serialize};

use odla_types::{
    Command, CommandKind, RangeFields, ReplyKind, SelectionState, SingleFields, StatusBody,
    StatusHeader, StatusReply, ViewState,
};

use crate::error::DecodeError;

/// Largest inbound command accepted, text included.
pub const MAX_COMMAND_LEN: usize = 64 * 1024;

/// Header-only reply length.
pub const COMMON_LEN: usize = 8;
/// Header plus single-element tail.
pub const SINGLE_LEN: usize = COMMON_LEN + 16;
/// Header plus range tail.
pub const RANGE_LEN: usize = COMMON_LEN + 8;

/// Encoded value of an absent view-state transition.
const NO_STATE: i32 = -1;

fn wire_config() -> impl bincode::config::Config {
    bincode::config::standard()
        .with_little_endian()
        .with_fixed_int_encoding()
        .with_limit::<MAX_COMMAND_LEN>()
}

/// Inbound command layout. Some device firmwares send a post-state field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandLayout {
    pub post_state: bool,
}

impl CommandLayout {
    pub const BASIC: CommandLayout = CommandLayout { post_state: false };
    pub const WITH_POST_STATE: CommandLayout = CommandLayout { post_state: true };

    /// Size of a command with empty text.
    pub fn min_len(self) -> usize {
        let states = if self.post_state { 8 } else { 4 };
        states + 1 + 4 + 4 + 8
    }
}

#[derive(Serialize, Deserialize)]
struct WireCommand {
    prior_state: i32,
    kind: u8,
    par1: i32,
    par2: i32,
    text: String,
}

#[derive(Serialize, Deserialize)]
struct WireCommandWithPost {
    prior_state: i32,
    post_state: i32,
    kind: u8,
    par1: i32,
    par2: i32,
    text: String,
}

#[derive(Serialize, Deserialize)]
struct WireHeader {
    msg_len: u8,
    reply_kind: u8,
    view_state: u8,
    selection_state: u8,
    selected_count: i32,
}

fn state_to_wire(state: Option<ViewState>) -> i32 {
    state.map(|s| i32::from(s.as_u8())).unwrap_or(NO_STATE)
}

fn state_from_wire(value: i32) -> Result<Option<ViewState>, DecodeError> {
    if value < 0 {
        return Ok(None);
    }
    ViewState::from_i32(value)
        .map(Some)
        .ok_or(DecodeError::UnknownViewState(value))
}

fn encode_err(e: bincode::error::EncodeError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e.to_string())
}

/// Encode a command the way the device sends it.
pub fn encode_command(cmd: &Command, layout: CommandLayout) -> io::Result<Vec<u8>> {
    let text = cmd.text.clone().unwrap_or_default();
    let bytes = if layout.post_state {
        bincode::serde::encode_to_vec(
            WireCommandWithPost {
                prior_state: state_to_wire(cmd.state_before),
                post_state: state_to_wire(cmd.state_after),
                kind: cmd.kind.as_u8(),
                par1: cmd.par1,
                par2: cmd.par2,
                text,
            },
            wire_config(),
        )
    } else {
        bincode::serde::encode_to_vec(
            WireCommand {
                prior_state: state_to_wire(cmd.state_before),
                kind: cmd.kind.as_u8(),
                par1: cmd.par1,
                par2: cmd.par2,
                text,
            },
            wire_config(),
        )
    };
    bytes.map_err(encode_err)
}

/// Decode one command from the front of `buf`, returning it with the
/// number of bytes consumed.
pub fn decode_command(buf: &[u8], layout: CommandLayout) -> Result<(Command, usize), DecodeError> {
    let min = layout.min_len();
    if buf.len() < min {
        return Err(DecodeError::TooShort { len: buf.len(), min });
    }

    let (prior, post, kind, par1, par2, text, used) = if layout.post_state {
        let (w, used): (WireCommandWithPost, usize) =
            bincode::serde::decode_from_slice(buf, wire_config())?;
        (w.prior_state, w.post_state, w.kind, w.par1, w.par2, w.text, used)
    } else {
        let (w, used): (WireCommand, usize) =
            bincode::serde::decode_from_slice(buf, wire_config())?;
        (w.prior_state, NO_STATE, w.kind, w.par1, w.par2, w.text, used)
    };

    let kind = CommandKind::from_u8(kind).ok_or(DecodeError::UnknownKind(kind))?;
    let cmd = Command {
        state_before: state_from_wire(prior)?,
        state_after: state_from_wire(post)?,
        kind,
        par1,
        par2,
        text: (!text.is_empty()).then_some(text),
    };
    Ok((cmd, used))
}

/// Reassembles binary commands from stream chunks.
///
/// An incomplete command stays buffered until the rest arrives. A bad
/// command leaves no way to find the start of the next one, so the whole
/// buffer is dropped.
#[derive(Debug)]
pub struct CommandBuffer {
    layout: CommandLayout,
    buf: Vec<u8>,
}

impl CommandBuffer {
    pub fn new(layout: CommandLayout) -> Self {
        Self {
            layout,
            buf: Vec::new(),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Take the next complete command, if one has fully arrived.
    pub fn next_command(&mut self) -> Option<Result<Command, DecodeError>> {
        let min = self.layout.min_len();
        if self.buf.len() < min {
            return None;
        }

        // Kind sits right before the two parameters and the text length
        let kind = self.buf[min - 17];
        if CommandKind::from_u8(kind).is_none() {
            self.buf.clear();
            return Some(Err(DecodeError::UnknownKind(kind)));
        }

        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&self.buf[min - 8..min]);
        let text_len = usize::try_from(u64::from_le_bytes(len_bytes)).unwrap_or(usize::MAX);
        let Some(total) = text_len.checked_add(min).filter(|t| *t <= MAX_COMMAND_LEN) else {
            self.buf.clear();
            return Some(Err(DecodeError::Oversized(text_len)));
        };
        if self.buf.len() < total {
            return None;
        }

        match decode_command(&self.buf[..total], self.layout) {
            Ok((cmd, used)) => {
                self.buf.drain(..used);
                Some(Ok(cmd))
            }
            Err(e) => {
                self.buf.clear();
                Some(Err(e))
            }
        }
    }
}

/// Encode a status reply. Byte 0 always holds the encoded length.
pub fn encode_status(reply: &StatusReply) -> io::Result<Vec<u8>> {
    let header = WireHeader {
        msg_len: 0,
        reply_kind: reply.kind().as_u8(),
        view_state: reply.header.view_state.as_u8(),
        selection_state: reply.header.selection_state.as_u8(),
        selected_count: reply.header.selected_count,
    };
    let bytes = match &reply.body {
        StatusBody::None => bincode::serde::encode_to_vec(&header, wire_config()),
        StatusBody::Single(fields) => bincode::serde::encode_to_vec((&header, fields), wire_config()),
        StatusBody::Range(fields) => bincode::serde::encode_to_vec((&header, fields), wire_config()),
    };
    let mut bytes = bytes.map_err(encode_err)?;
    debug_assert_eq!(bytes.len(), expected_len(reply.kind()));
    stamp_len(&mut bytes)?;
    Ok(bytes)
}

/// Write the reply length into byte 0, which has room for 255.
fn stamp_len(bytes: &mut [u8]) -> io::Result<()> {
    let len = u8::try_from(bytes.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("status reply of {} bytes does not fit the length byte", bytes.len()),
        )
    })?;
    bytes[0] = len;
    Ok(())
}

fn expected_len(kind: ReplyKind) -> usize {
    match kind {
        ReplyKind::NoElement => COMMON_LEN,
        ReplyKind::SingleElement => SINGLE_LEN,
        ReplyKind::RangeElement => RANGE_LEN,
    }
}

/// Decode a status reply, as the device does.
pub fn decode_status(buf: &[u8]) -> Result<StatusReply, DecodeError> {
    if buf.len() < COMMON_LEN {
        return Err(DecodeError::TooShort { len: buf.len(), min: COMMON_LEN });
    }
    let (header, used): (WireHeader, usize) =
        bincode::serde::decode_from_slice(buf, wire_config())?;

    let kind = ReplyKind::from_u8(header.reply_kind)
        .ok_or(DecodeError::UnknownKind(header.reply_kind))?;
    let declared = header.msg_len as usize;
    if buf.len() < declared || declared != expected_len(kind) {
        return Err(DecodeError::TooShort { len: buf.len(), min: expected_len(kind) });
    }

    let view_state = ViewState::from_i32(i32::from(header.view_state))
        .ok_or(DecodeError::UnknownViewState(i32::from(header.view_state)))?;
    let selection_state = SelectionState::from_u8(header.selection_state).unwrap_or_default();

    let tail = &buf[used..declared];
    let body = match kind {
        ReplyKind::NoElement => StatusBody::None,
        ReplyKind::SingleElement => {
            let (fields, _): (SingleFields, usize) =
                bincode::serde::decode_from_slice(tail, wire_config())?;
            StatusBody::Single(fields)
        }
        ReplyKind::RangeElement => {
            let (fields, _): (RangeFields, usize) =
                bincode::serde::decode_from_slice(tail, wire_config())?;
            StatusBody::Range(fields)
        }
    };

    Ok(StatusReply {
        header: StatusHeader {
            view_state,
            selection_state,
            selected_count: header.selected_count,
        },
        body,
    })
}
