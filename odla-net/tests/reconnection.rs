mod common;

use std::io::{Read, Write};
use std::time::Duration;

use odla_net::{DeviceLink, Endpoint, LinkEvent};

const INTERVAL: Duration = Duration::from_millis(50);

#[test]
fn test_connects_on_first_poll() {
    let (listener, addr) = common::loopback_listener();
    let mut link = DeviceLink::new(Endpoint::Tcp(addr), INTERVAL);

    let events = link.poll();
    assert_eq!(events.first(), Some(&LinkEvent::Connected));
    assert!(link.is_connected());
    assert_eq!(link.attempts(), 1);

    let (_peer, _) = listener.accept().unwrap();
}

#[test]
fn test_retries_at_fixed_interval_while_down() {
    let mut link = DeviceLink::new(Endpoint::Tcp(common::dead_address()), INTERVAL);

    assert!(link.poll().is_empty());
    assert_eq!(link.attempts(), 1);

    // Timer has not fired yet
    assert!(link.poll().is_empty());
    assert_eq!(link.attempts(), 1);

    for expected in 2..=4 {
        std::thread::sleep(INTERVAL + Duration::from_millis(10));
        link.poll();
        assert_eq!(link.attempts(), expected);
        assert!(!link.is_connected());
    }
}

#[test]
fn test_reconnects_after_peer_drops() {
    let (listener, addr) = common::loopback_listener();
    let mut link = DeviceLink::new(Endpoint::Tcp(addr), INTERVAL);
    link.poll();
    let (peer, _) = listener.accept().unwrap();

    drop(peer);
    let events = common::poll_link_until(&mut link, Duration::from_secs(2), |e| {
        *e == LinkEvent::Disconnected
    });
    assert!(events.contains(&LinkEvent::Disconnected));
    assert!(!link.is_connected());

    let events = common::poll_link_until(&mut link, Duration::from_secs(2), |e| {
        *e == LinkEvent::Connected
    });
    assert!(events.contains(&LinkEvent::Connected));
    assert!(link.is_connected());
    assert_eq!(link.attempts(), 2);
    let _ = listener.accept().unwrap();
}

#[test]
fn test_data_flows_both_ways() {
    let (listener, addr) = common::loopback_listener();
    let mut link = DeviceLink::new(Endpoint::Tcp(addr), INTERVAL);
    link.poll();
    let (mut peer, _) = listener.accept().unwrap();
    peer.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

    peer.write_all(b"GOTO MEASURE 5\n").unwrap();
    let data = common::read_link_bytes(&mut link, 15, Duration::from_secs(2));
    assert_eq!(data, b"GOTO MEASURE 5\n");

    assert_eq!(link.send(&[8, 0, 0, 0, 0, 0, 0, 0]).unwrap(), 8);
    let mut reply = [0u8; 8];
    peer.read_exact(&mut reply).unwrap();
    assert_eq!(reply[0], 8);
}

#[test]
fn test_send_while_disconnected_fails() {
    let mut link = DeviceLink::new(Endpoint::Tcp(common::dead_address()), INTERVAL);
    link.poll();
    let err = link.send(b"x").unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotConnected);
}

#[test]
fn test_failed_send_reports_disconnect() {
    let (listener, addr) = common::loopback_listener();
    let mut link = DeviceLink::new(Endpoint::Tcp(addr), INTERVAL);
    link.poll();
    let (peer, _) = listener.accept().unwrap();
    drop(peer);

    // Writes to a closed socket fail once the reset comes back
    let start = std::time::Instant::now();
    while link.send(&[8, 0, 0, 0, 0, 0, 0, 0]).is_ok() {
        assert!(start.elapsed() < Duration::from_secs(2), "send never failed");
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(!link.is_connected());
    assert_eq!(link.poll().first(), Some(&LinkEvent::Disconnected));
}

#[cfg(unix)]
#[test]
fn test_local_channel_endpoint() {
    use std::os::unix::net::UnixListener;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ODLA_MSCORE_SERVER");
    let listener = UnixListener::bind(&path).unwrap();

    let mut link = DeviceLink::new(
        Endpoint::Local(path.to_string_lossy().into_owned()),
        INTERVAL,
    );
    assert_eq!(link.poll().first(), Some(&LinkEvent::Connected));

    let (mut peer, _) = listener.accept().unwrap();
    peer.write_all(b"UNDO\n").unwrap();
    let data = common::read_link_bytes(&mut link, 5, Duration::from_secs(2));
    assert_eq!(data, b"UNDO\n");
}
