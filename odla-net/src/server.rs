//! Listening endpoint for device companions that connect to us.
//!
//! Accepts peers, forwards their raw reads, and writes replies back to the
//! peer that sent the command.

use std::collections::HashMap;
use std::io::{self, BufWriter, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use log::{debug, error, info, warn};

/// Identifier of a connected device peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u64);

/// Something that happened on the server since the last poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    Connected(PeerId),
    Data(PeerId, Vec<u8>),
    Disconnected(PeerId),
}

enum ReaderMsg {
    Data(PeerId, Vec<u8>),
    Closed(PeerId),
}

const READ_CHUNK: usize = 4096;

/// Server that device companions connect to.
pub struct DeviceServer {
    listener: TcpListener,
    peers: HashMap<PeerId, BufWriter<TcpStream>>,
    reader_rx: Receiver<ReaderMsg>,
    reader_tx: Sender<ReaderMsg>,
    /// Events raised outside `poll`, such as a peer dropped on a failed write.
    pending: Vec<PeerEvent>,
    next_peer_id: u64,
}

impl DeviceServer {
    /// Bind the server to an address.
    pub fn bind(addr: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;

        let (reader_tx, reader_rx) = mpsc::channel();

        info!("DeviceServer listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            peers: HashMap::new(),
            reader_rx,
            reader_tx,
            pending: Vec::new(),
            next_peer_id: 0,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Report queued events, then accept pending connections and drain
    /// reads, in that order.
    pub fn poll(&mut self) -> Vec<PeerEvent> {
        let mut events = std::mem::take(&mut self.pending);
        events.extend(self.accept_connections());
        events.extend(self.poll_reads());
        events
    }

    /// Accept any pending TCP connections.
    pub fn accept_connections(&mut self) -> Vec<PeerEvent> {
        let mut events = Vec::new();
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    let peer = PeerId(self.next_peer_id);
                    self.next_peer_id += 1;

                    // Accepted sockets may inherit non-blocking mode
                    if let Err(e) = stream.set_nonblocking(false) {
                        error!("Failed to configure peer socket: {}", e);
                        continue;
                    }
                    let _ = stream.set_nodelay(true);
                    let read_stream = match stream.try_clone() {
                        Ok(s) => s,
                        Err(e) => {
                            error!("Failed to clone stream: {}", e);
                            continue;
                        }
                    };

                    let tx = self.reader_tx.clone();
                    thread::spawn(move || {
                        peer_reader_thread(peer, read_stream, tx);
                    });

                    self.peers.insert(peer, BufWriter::new(stream));
                    info!("Device {:?} connected from {}", peer, addr);
                    events.push(PeerEvent::Connected(peer));
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    error!("Accept error: {}", e);
                    break;
                }
            }
        }
        events
    }

    /// Drain data forwarded by peer reader threads.
    pub fn poll_reads(&mut self) -> Vec<PeerEvent> {
        let mut events = Vec::new();
        while let Ok(msg) = self.reader_rx.try_recv() {
            match msg {
                ReaderMsg::Data(peer, bytes) => events.push(PeerEvent::Data(peer, bytes)),
                ReaderMsg::Closed(peer) => {
                    // A peer dropped on a failed write was already reported
                    if self.peers.remove(&peer).is_some() {
                        info!("Device {:?} disconnected", peer);
                        events.push(PeerEvent::Disconnected(peer));
                    }
                }
            }
        }
        events
    }

    /// Write and flush a reply to one peer. A peer whose write fails is dropped.
    pub fn send_to(&mut self, peer: PeerId, bytes: &[u8]) -> io::Result<usize> {
        let writer = self
            .peers
            .get_mut(&peer)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, format!("no peer {:?}", peer)))?;

        match writer.write_all(bytes).and_then(|()| writer.flush()) {
            Ok(()) => Ok(bytes.len()),
            Err(e) => {
                warn!("Failed to send to device {:?}: {}", peer, e);
                self.drop_peer(peer);
                Err(e)
            }
        }
    }

    /// Close a peer and queue its `Disconnected` event for the next poll.
    pub fn drop_peer(&mut self, peer: PeerId) {
        if let Some(writer) = self.peers.remove(&peer) {
            let _ = writer.get_ref().shutdown(Shutdown::Both);
            info!("Device {:?} dropped", peer);
            self.pending.push(PeerEvent::Disconnected(peer));
        }
    }
}

/// Background thread that forwards a peer's reads to the server.
fn peer_reader_thread(peer: PeerId, mut stream: TcpStream, tx: Sender<ReaderMsg>) {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(ReaderMsg::Data(peer, buf[..n].to_vec())).is_err() {
                    // Receiver dropped, server is shutting down
                    return;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("Device {:?} read error: {}", peer, e);
                break;
            }
        }
    }
    let _ = tx.send(ReaderMsg::Closed(peer));
    debug!("Device {:?} reader thread exiting", peer);
}
