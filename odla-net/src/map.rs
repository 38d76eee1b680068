//! Key/value map protocol.
//!
//! Each message is a framed JSON object of string keys to string values.
//! Reserved keys: `STATE`, `COM`, `PAR1`, `PAR2`, `SpeechFlags`.

use std::collections::HashMap;
use std::io;

use log::{debug, warn};

use odla_types::{Command, CommandKind, FeedbackReply, SpeechFlags, ViewState};

use crate::framing::{encode_frame, FrameBuffer};
use crate::protocol::Inbound;

pub type MapMessage = HashMap<String, String>;

pub const KEY_STATE: &str = "STATE";
pub const KEY_COMMAND: &str = "COM";
pub const KEY_PAR1: &str = "PAR1";
pub const KEY_PAR2: &str = "PAR2";
pub const KEY_SPEECH_FLAGS: &str = "SpeechFlags";

/// Parse an integer value, reporting whether it was present and valid.
fn parse_int(msg: &MapMessage, key: &str) -> (i32, bool) {
    match msg.get(key).map(|v| v.trim().parse::<i32>()) {
        Some(Ok(v)) => (v, true),
        _ => (0, false),
    }
}

fn kind_for(name: &str) -> CommandKind {
    match name {
        "play" => CommandKind::Play,
        "pause" => CommandKind::Pause,
        "stop" => CommandKind::Stop,
        "goto" => CommandKind::Goto,
        "select-measures" => CommandKind::SelectMeasures,
        "staff-pressed" => CommandKind::StaffPressed,
        "insert-measures" => CommandKind::InsertMeasures,
        "line-view" => CommandKind::LineView,
        "page-view" => CommandKind::PageView,
        "tempo" => CommandKind::Tempo,
        "metronome" => CommandKind::Metronome,
        "time-signature" => CommandKind::TimeSignature,
        n if n.starts_with("palette") => CommandKind::Palette,
        _ => CommandKind::Action,
    }
}

/// Translate one map message into a command plus the feedback it asks for.
pub fn inbound_from_map(msg: &MapMessage) -> Inbound {
    let name = msg.get(KEY_COMMAND).map(|s| s.trim()).unwrap_or("");
    let (par1, _) = parse_int(msg, KEY_PAR1);
    let (par2, _) = parse_int(msg, KEY_PAR2);

    let kind = kind_for(name);
    let mut command = Command::new(kind).with_params(par1, par2);
    command.state_before = msg
        .get(KEY_STATE)
        .and_then(|s| ViewState::from_name(s.trim()));

    match kind {
        CommandKind::Action | CommandKind::Palette => {
            if !name.is_empty() {
                command.text = Some(name.to_string());
            }
        }
        // The map revision only ever toggles.
        CommandKind::Metronome => command.par1 = -1,
        _ => {}
    }

    let feedback = match parse_int(msg, KEY_SPEECH_FLAGS) {
        (flags, true) => Some(SpeechFlags(flags as u32)),
        (_, false) => None,
    };

    Inbound { command, feedback }
}

/// Reassembles framed map messages from stream chunks.
#[derive(Debug, Default)]
pub struct MapDecoder {
    frames: FrameBuffer,
}

impl MapDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<Inbound> {
        self.frames.extend(bytes);
        let mut out = Vec::new();
        while let Some(frame) = self.frames.next_frame::<MapMessage>() {
            match frame {
                Ok(msg) => {
                    debug!("received map message: {:?}", msg);
                    out.push(inbound_from_map(&msg));
                }
                Err(e) => warn!("dropping map message: {}", e),
            }
        }
        out
    }
}

/// Encode a feedback reply as a framed JSON map.
pub fn encode_feedback(reply: &FeedbackReply) -> io::Result<Vec<u8>> {
    encode_frame(reply)
}
