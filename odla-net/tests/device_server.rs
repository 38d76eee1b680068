mod common;

use std::time::Duration;

use odla_net::{DeviceServer, PeerEvent};

#[test]
fn test_peer_connect_data_and_reply() {
    let mut server = DeviceServer::bind("127.0.0.1:0").unwrap();
    let addr = server.local_addr().unwrap().to_string();

    let mut device = common::RawDevice::connect(&addr).unwrap();
    let events = common::drive_server_until(&mut server, Duration::from_secs(2), |e| {
        matches!(e, PeerEvent::Connected(_))
    });
    let peer = match events[0] {
        PeerEvent::Connected(p) => p,
        ref other => panic!("Expected Connected, got {:?}", other),
    };
    assert_eq!(server.peer_count(), 1);

    device.send(b"PLAY\n").unwrap();
    let events = common::drive_server_until(&mut server, Duration::from_secs(2), |e| {
        matches!(e, PeerEvent::Data(..))
    });
    assert!(events.contains(&PeerEvent::Data(peer, b"PLAY\n".to_vec())));

    server.send_to(peer, &[8, 0, 0, 0, 0, 0, 0, 0]).unwrap();
    let reply = device.recv_exact(8).unwrap();
    assert_eq!(reply[0], 8);
}

#[test]
fn test_peer_disconnect_is_reported() {
    let mut server = DeviceServer::bind("127.0.0.1:0").unwrap();
    let addr = server.local_addr().unwrap().to_string();

    let device = common::RawDevice::connect(&addr).unwrap();
    common::drive_server_until(&mut server, Duration::from_secs(2), |e| {
        matches!(e, PeerEvent::Connected(_))
    });

    drop(device);
    common::drive_server_until(&mut server, Duration::from_secs(2), |e| {
        matches!(e, PeerEvent::Disconnected(_))
    });
    assert_eq!(server.peer_count(), 0);
}

#[test]
fn test_peers_get_distinct_ids() {
    let mut server = DeviceServer::bind("127.0.0.1:0").unwrap();
    let addr = server.local_addr().unwrap().to_string();

    let _a = common::RawDevice::connect(&addr).unwrap();
    let _b = common::RawDevice::connect(&addr).unwrap();

    let start = std::time::Instant::now();
    let mut peers = Vec::new();
    while peers.len() < 2 && start.elapsed() < Duration::from_secs(2) {
        for event in server.poll() {
            if let PeerEvent::Connected(p) = event {
                peers.push(p);
            }
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(peers.len(), 2);
    assert_ne!(peers[0], peers[1]);
}

#[test]
fn test_send_to_unknown_peer_fails() {
    let mut server = DeviceServer::bind("127.0.0.1:0").unwrap();
    let err = server
        .send_to(odla_net::PeerId(99), b"x")
        .unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotConnected);
}

#[test]
fn test_dropped_peer_is_reported_once() {
    let mut server = DeviceServer::bind("127.0.0.1:0").unwrap();
    let addr = server.local_addr().unwrap().to_string();

    let _device = common::RawDevice::connect(&addr).unwrap();
    let events = common::drive_server_until(&mut server, Duration::from_secs(2), |e| {
        matches!(e, PeerEvent::Connected(_))
    });
    let PeerEvent::Connected(peer) = events[0] else {
        panic!("Expected Connected, got {:?}", events[0]);
    };

    server.drop_peer(peer);
    assert_eq!(server.peer_count(), 0);
    assert_eq!(server.poll(), vec![PeerEvent::Disconnected(peer)]);

    // The reader thread's close arrives later and stays silent
    std::thread::sleep(Duration::from_millis(100));
    assert!(server.poll().is_empty());
}

#[test]
fn test_failed_send_reports_disconnect() {
    let mut server = DeviceServer::bind("127.0.0.1:0").unwrap();
    let addr = server.local_addr().unwrap().to_string();

    let device = common::RawDevice::connect(&addr).unwrap();
    let events = common::drive_server_until(&mut server, Duration::from_secs(2), |e| {
        matches!(e, PeerEvent::Connected(_))
    });
    let PeerEvent::Connected(peer) = events[0] else {
        panic!("Expected Connected, got {:?}", events[0]);
    };
    drop(device);

    // Writes to a closed socket fail once the reset comes back
    let start = std::time::Instant::now();
    while server.send_to(peer, &[8, 0, 0, 0, 0, 0, 0, 0]).is_ok() {
        assert!(start.elapsed() < Duration::from_secs(2), "send never failed");
        std::thread::sleep(Duration::from_millis(10));
    }

    let events = common::drive_server_until(&mut server, Duration::from_secs(2), |e| {
        matches!(e, PeerEvent::Disconnected(_))
    });
    let disconnects = events
        .iter()
        .filter(|e| **e == PeerEvent::Disconnected(peer))
        .count();
    assert_eq!(disconnects, 1);
    assert_eq!(server.peer_count(), 0);
}
