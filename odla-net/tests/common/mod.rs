#![allow(dead_code)]
//! Test harness utilities for odla-net integration tests.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use odla_net::{DeviceLink, DeviceServer, LinkEvent, PeerEvent};

/// Bind a listener on an ephemeral loopback port.
pub fn loopback_listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

/// An address nothing is listening on.
pub fn dead_address() -> String {
    let (listener, addr) = loopback_listener();
    drop(listener);
    addr
}

/// Poll the link until an event matching `pred` shows up, or timeout.
pub fn poll_link_until(
    link: &mut DeviceLink,
    timeout: Duration,
    pred: impl Fn(&LinkEvent) -> bool,
) -> Vec<LinkEvent> {
    let start = Instant::now();
    let mut seen = Vec::new();
    while start.elapsed() < timeout {
        let events = link.poll();
        let done = events.iter().any(&pred);
        seen.extend(events);
        if done {
            return seen;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("Timed out polling link, saw {:?}", seen);
}

/// Collect data bytes from the link until `len` bytes arrived.
pub fn read_link_bytes(link: &mut DeviceLink, len: usize, timeout: Duration) -> Vec<u8> {
    let start = Instant::now();
    let mut data = Vec::new();
    while start.elapsed() < timeout && data.len() < len {
        for event in link.poll() {
            if let LinkEvent::Data(bytes) = event {
                data.extend(bytes);
            }
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    data
}

/// Drive the server until an event matching `pred` shows up, or timeout.
pub fn drive_server_until(
    server: &mut DeviceServer,
    timeout: Duration,
    pred: impl Fn(&PeerEvent) -> bool,
) -> Vec<PeerEvent> {
    let start = Instant::now();
    let mut seen = Vec::new();
    while start.elapsed() < timeout {
        let events = server.poll();
        let done = events.iter().any(&pred);
        seen.extend(events);
        if done {
            return seen;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("Timed out driving server, saw {:?}", seen);
}

/// A raw device peer for transport-level tests.
pub struct RawDevice {
    pub stream: TcpStream,
}

impl RawDevice {
    pub fn connect(addr: &str) -> std::io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;
        Ok(Self { stream })
    }

    pub fn send(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()
    }

    pub fn recv_exact(&mut self, len: usize) -> std::io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.stream.read_exact(&mut buf)?;
        Ok(buf)
    }
}
