#![allow(dead_code)]
//! Test harness utilities for odla-core integration tests.

use std::collections::HashMap;

use odla_core::config::DriverSettings;
use odla_core::host::headless::{HeadlessHost, Score};
use odla_core::session::Session;
use odla_net::binary::{decode_status, encode_command, CommandLayout};
use odla_net::framing::encode_frame;
use odla_net::Protocol;
use odla_types::{Command, FeedbackReply, StatusReply};

/// A one-staff 4/4 score of `measures` empty measures.
pub fn host(measures: usize) -> HeadlessHost {
    HeadlessHost::new(Score::single_staff(measures))
}

pub fn session(protocol: Protocol) -> Session {
    Session::new(protocol, DriverSettings::default())
}

/// Send one binary command and decode every status that comes back.
pub fn send_binary(session: &mut Session, host: &mut HeadlessHost, cmd: &Command) -> Vec<StatusReply> {
    let bytes = encode_command(cmd, CommandLayout::BASIC).unwrap();
    session
        .handle_bytes(&bytes, host)
        .iter()
        .map(|r| decode_status(r).unwrap())
        .collect()
}

/// Send text lines (newline appended to each) and decode the statuses.
pub fn send_lines(session: &mut Session, host: &mut HeadlessHost, lines: &[&str]) -> Vec<StatusReply> {
    let mut bytes = Vec::new();
    for line in lines {
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
    }
    session
        .handle_bytes(&bytes, host)
        .iter()
        .map(|r| decode_status(r).unwrap())
        .collect()
}

/// Send one framed map message and decode the feedback maps returned.
pub fn send_map(session: &mut Session, host: &mut HeadlessHost, pairs: &[(&str, &str)]) -> Vec<FeedbackReply> {
    let msg: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    let frame = encode_frame(&msg).unwrap();
    session
        .handle_bytes(&frame, host)
        .iter()
        .map(|r| {
            let len = u32::from_be_bytes([r[0], r[1], r[2], r[3]]) as usize;
            assert_eq!(len, r.len() - 4);
            serde_json::from_slice(&r[4..]).unwrap()
        })
        .collect()
}

/// The single reply of a one-command exchange.
pub fn only(replies: Vec<StatusReply>) -> StatusReply {
    assert_eq!(replies.len(), 1, "expected exactly one reply, got {:?}", replies);
    replies[0]
}
