//! Link loops for the two transport modes.
//!
//! Connect mode dials the device companion and keeps redialling; listen mode
//! accepts companions over TCP. Both run every command against one
//! headless score.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use odla_core::config::Config;
use odla_core::host::headless::{HeadlessHost, Score};
use odla_core::session::Session;
use odla_net::{DeviceLink, DeviceServer, LinkEvent, PeerEvent, PeerId, Protocol};

/// Idle wait between polls.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Measures in the score the bridge starts with.
const INITIAL_MEASURES: usize = 32;

fn new_host() -> HeadlessHost {
    HeadlessHost::new(Score::single_staff(INITIAL_MEASURES))
}

// =============================================================================
// Connect Mode
// =============================================================================

pub fn run_link(config: &Config, protocol: Protocol) -> std::io::Result<()> {
    let endpoint = config.endpoint();
    log::info!("Connecting to device companion at {} ({})", endpoint, protocol);

    let mut host = new_host();
    let mut link = DeviceLink::new(endpoint, config.reconnect_interval());
    let mut session = Session::new(protocol, config.driver_settings());

    loop {
        for event in link.poll() {
            match event {
                LinkEvent::Connected => {
                    log::info!("Connected to {}", link.endpoint());
                    session = Session::new(protocol, config.driver_settings());
                }
                LinkEvent::Data(bytes) => {
                    for reply in session.handle_bytes(&bytes, &mut host) {
                        if let Err(e) = link.send(&reply) {
                            log::warn!("Could not send status: {}", e);
                            break;
                        }
                    }
                }
                LinkEvent::Disconnected => {
                    log::info!("Device companion disconnected, retrying every {:?}", config.reconnect_interval());
                }
            }
        }
        thread::sleep(POLL_INTERVAL);
    }
}

// =============================================================================
// Listen Mode
// =============================================================================

pub fn run_listener(config: &Config, protocol: Protocol) -> std::io::Result<()> {
    let addr = config.listen_addr();
    let mut server = DeviceServer::bind(addr)?;
    log::info!("Listening for device companions on {} ({})", server.local_addr()?, protocol);

    let mut host = new_host();
    let mut sessions: HashMap<PeerId, Session> = HashMap::new();

    loop {
        for event in server.poll() {
            match event {
                PeerEvent::Connected(peer) => {
                    log::info!("Peer {:?} connected", peer);
                    sessions.insert(peer, Session::new(protocol, config.driver_settings()));
                }
                PeerEvent::Data(peer, bytes) => {
                    let Some(session) = sessions.get_mut(&peer) else {
                        log::debug!("Data from unknown peer {:?}", peer);
                        continue;
                    };
                    for reply in session.handle_bytes(&bytes, &mut host) {
                        if let Err(e) = server.send_to(peer, &reply) {
                            log::warn!("Could not send status to {:?}: {}", peer, e);
                            break;
                        }
                    }
                }
                PeerEvent::Disconnected(peer) => {
                    log::info!("Peer {:?} disconnected", peer);
                    sessions.remove(&peer);
                }
            }
        }
        thread::sleep(POLL_INTERVAL);
    }
}
