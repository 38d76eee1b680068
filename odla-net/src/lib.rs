//! Wire protocols and transport for the ODLA bridge.
//!
//! This crate decodes device commands from each protocol revision, encodes
//! status replies, and carries bytes over a reconnecting client link or a
//! listening server.

pub mod binary;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod framing;
pub mod line;
pub mod map;
pub mod protocol;
pub mod server;

pub use client::{DeviceLink, LinkEvent, DEFAULT_RECONNECT_INTERVAL};
pub use endpoint::{DeviceStream, Endpoint};
pub use error::DecodeError;
pub use protocol::{Inbound, InboundDecoder, Protocol, DEFAULT_SERVER_NAME};
pub use server::{DeviceServer, PeerEvent, PeerId};
