use super::response::parse_compact_peers;
use super::*;

#[test]
fn test_parse_compact_peers() {
    let data = [
        0xC0, 0xA8, 0x01, 0x01, 0x1A, 0xE1, // 192.168.1.1:6881
        0x0A, 0x00, 0x00, 0x01, 0x23, 0x28, // 10.0.0.1:9000
    ];

    let peers = parse_compact_peers(&data);
    assert_eq!(peers.len(), 2);
    assert_eq!(peers[0].to_string(), "192.168.1.1:6881");
    assert_eq!(peers[1].to_string(), "10.0.0.1:9000");
}

#[test]
fn test_parse_compact_peers_empty() {
    assert!(parse_compact_peers(&[]).is_empty());
}

#[test]
fn test_announce_response_from_bytes() {
    let mut body = Vec::new();
    body.extend_from_slice(b"d8:completei10e10:incompletei5e8:intervali1800e5:peers12:");
    body.extend_from_slice(&[
        0xC0, 0xA8, 0x01, 0x01, 0x1A, 0xE1, 0x0A, 0x00, 0x00, 0x01, 0x23, 0x28,
    ]);
    body.push(b'e');

    let response = AnnounceResponse::from_bytes(&body).unwrap();
    assert_eq!(response.interval, Some(1800));
    assert_eq!(response.complete, Some(10));
    assert_eq!(response.incomplete, Some(5));
    assert_eq!(response.peers.len(), 2);
    assert_eq!(response.peers[0].to_string(), "192.168.1.1:6881");
}

#[test]
fn test_announce_response_failure_reason() {
    let body = b"d14:failure reason11:not allowede";
    assert!(matches!(
        AnnounceResponse::from_bytes(body),
        Err(TrackerError::Failure(reason)) if reason == "not allowed"
    ));
}

#[test]
fn test_announce_response_bad_peers_length() {
    let body = b"d5:peers5:abcdee";
    assert!(matches!(
        AnnounceResponse::from_bytes(body),
        Err(TrackerError::InvalidResponse(_))
    ));
}

#[test]
fn test_http_tracker_rejects_non_http_url() {
    assert!(matches!(
        HttpTracker::new("udp://tracker.example.com:80"),
        Err(TrackerError::InvalidUrl(_))
    ));
}
