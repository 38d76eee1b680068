//! Protocol revisions and the inbound decoder shared by all of them.

use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use odla_types::{Command, SpeechFlags};

use crate::binary::{CommandBuffer, CommandLayout};
use crate::line::LineDecoder;
use crate::map::MapDecoder;

/// Default local channel name used by the device companion.
pub const DEFAULT_SERVER_NAME: &str = "ODLA_MSCORE_SERVER";

/// Wire revision spoken on a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    /// Fixed binary commands, binary status replies.
    Binary,
    /// Binary commands carrying a post-state field.
    BinaryPostState,
    /// Newline-delimited text commands, binary status replies.
    Text,
    /// Framed key/value maps, key/value feedback replies.
    Map,
}

impl Protocol {
    pub fn name(self) -> &'static str {
        match self {
            Protocol::Binary => "binary",
            Protocol::BinaryPostState => "binary-post-state",
            Protocol::Text => "text",
            Protocol::Map => "map",
        }
    }

    /// Whether replies are key/value feedback maps rather than status structs.
    pub fn replies_with_feedback(self) -> bool {
        matches!(self, Protocol::Map)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binary" => Ok(Protocol::Binary),
            "binary-post-state" => Ok(Protocol::BinaryPostState),
            "text" | "line" => Ok(Protocol::Text),
            "map" => Ok(Protocol::Map),
            other => Err(format!("unknown protocol '{}'", other)),
        }
    }
}

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub command: Command,
    /// Fields the peer wants read back (map protocol only).
    pub feedback: Option<SpeechFlags>,
}

impl From<Command> for Inbound {
    fn from(command: Command) -> Self {
        Self {
            command,
            feedback: None,
        }
    }
}

/// Stateful decoder for one peer's byte stream.
#[derive(Debug)]
pub enum InboundDecoder {
    Binary(CommandBuffer),
    Text(LineDecoder),
    Map(MapDecoder),
}

impl InboundDecoder {
    pub fn new(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Binary => Self::Binary(CommandBuffer::new(CommandLayout::BASIC)),
            Protocol::BinaryPostState => Self::Binary(CommandBuffer::new(CommandLayout::WITH_POST_STATE)),
            Protocol::Text => Self::Text(LineDecoder::new()),
            Protocol::Map => Self::Map(MapDecoder::new()),
        }
    }

    /// Feed one read's worth of bytes, returning the messages it completes
    /// in arrival order.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Inbound> {
        match self {
            Self::Binary(commands) => {
                commands.extend(bytes);
                let mut out = Vec::new();
                while let Some(next) = commands.next_command() {
                    match next {
                        Ok(cmd) => out.push(Inbound::from(cmd)),
                        Err(e) => warn!("dropping binary message: {}", e),
                    }
                }
                out
            }
            Self::Text(lines) => lines.push(bytes).into_iter().map(Inbound::from).collect(),
            Self::Map(maps) => maps.push(bytes),
        }
    }
}
