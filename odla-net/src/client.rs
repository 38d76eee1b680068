//! Outbound link to the device companion.
//!
//! Connects to a named endpoint and keeps retrying at a fixed interval while
//! disconnected. Reads happen on a background thread that only forwards
//! bytes; everything else runs on the caller's loop.

use std::io::{self, BufWriter, Read, Write};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::endpoint::{DeviceStream, Endpoint};

/// Default retry period while disconnected.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(2000);

const READ_CHUNK: usize = 4096;

/// Something that happened on the link since the last poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Connected,
    Data(Vec<u8>),
    Disconnected,
}

/// Messages from the reader thread.
enum ReaderMsg {
    Data(Vec<u8>),
    Closed,
}

/// A reconnecting client connection to the device companion.
pub struct DeviceLink {
    endpoint: Endpoint,
    interval: Duration,
    writer: Option<BufWriter<DeviceStream>>,
    reader_rx: Option<Receiver<ReaderMsg>>,
    /// When the reconnect timer last fired; `None` fires immediately.
    last_attempt: Option<Instant>,
    attempts: u64,
    /// A drop noticed by `send`, reported on the next poll.
    dropped: bool,
}

impl DeviceLink {
    pub fn new(endpoint: Endpoint, interval: Duration) -> Self {
        Self {
            endpoint,
            interval,
            writer: None,
            reader_rx: None,
            last_attempt: None,
            attempts: 0,
            dropped: false,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.writer.is_some()
    }

    /// Number of connection attempts made so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Fire the reconnect timer if due, then drain anything the reader
    /// thread has received.
    pub fn poll(&mut self) -> Vec<LinkEvent> {
        let mut events = Vec::new();
        if std::mem::take(&mut self.dropped) {
            events.push(LinkEvent::Disconnected);
        }

        if !self.is_connected() {
            let due = self
                .last_attempt
                .map_or(true, |t| t.elapsed() >= self.interval);
            if due && self.attempt_connection() {
                events.push(LinkEvent::Connected);
            }
        }

        loop {
            let msg = match &self.reader_rx {
                Some(rx) => rx.try_recv(),
                None => break,
            };
            match msg {
                Ok(ReaderMsg::Data(bytes)) => events.push(LinkEvent::Data(bytes)),
                Ok(ReaderMsg::Closed) | Err(TryRecvError::Disconnected) => {
                    self.mark_disconnected();
                    events.push(LinkEvent::Disconnected);
                    break;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        events
    }

    /// Write one reply and flush it. Returns the number of bytes written.
    /// A failed write drops the connection; the timer then reconnects.
    pub fn send(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "device link not connected"))?;

        let result = writer.write_all(bytes).and_then(|()| writer.flush());
        match result {
            Ok(()) => Ok(bytes.len()),
            Err(e) => {
                self.mark_disconnected();
                self.dropped = true;
                Err(e)
            }
        }
    }

    /// Close the connection. The reconnect timer keeps running.
    pub fn disconnect(&mut self) {
        self.mark_disconnected();
    }

    fn attempt_connection(&mut self) -> bool {
        self.last_attempt = Some(Instant::now());
        self.attempts += 1;
        debug!("Connecting to {} attempt {}", self.endpoint, self.attempts);

        let stream = match self.endpoint.connect() {
            Ok(s) => s,
            Err(e) => {
                debug!("Connection to {} failed: {}", self.endpoint, e);
                return false;
            }
        };
        let read_stream = match stream.try_clone() {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to clone device stream: {}", e);
                return false;
            }
        };

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            device_reader_thread(read_stream, tx);
        });

        self.writer = Some(BufWriter::new(stream));
        self.reader_rx = Some(rx);
        info!("Connected to ODLA at {}", self.endpoint);
        true
    }

    fn mark_disconnected(&mut self) {
        if let Some(writer) = self.writer.take() {
            let _ = writer.get_ref().shutdown();
            info!("Disconnected from ODLA at {}", self.endpoint);
        }
        self.reader_rx = None;
        // Retry period counts from the drop.
        self.last_attempt = Some(Instant::now());
    }
}

/// Background thread that forwards raw reads to the link.
fn device_reader_thread(mut stream: DeviceStream, tx: Sender<ReaderMsg>) {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(ReaderMsg::Data(buf[..n].to_vec())).is_err() {
                    // Link dropped or reconnected
                    return;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("Device read error: {}", e);
                break;
            }
        }
    }
    let _ = tx.send(ReaderMsg::Closed);
    debug!("Device reader thread exiting");
}
