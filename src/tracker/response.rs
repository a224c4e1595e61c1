use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use super::error::TrackerError;
use crate::bencode::decode;

/// A parsed tracker announce response.
#[derive(Debug, Clone)]
pub struct AnnounceResponse {
    /// Seconds the tracker asks us to wait before re-announcing.
    pub interval: Option<u32>,
    /// Number of seeders, when reported.
    pub complete: Option<u32>,
    /// Number of leechers, when reported.
    pub incomplete: Option<u32>,
    /// Peer endpoints from the compact `peers` string.
    pub peers: Vec<SocketAddr>,
}

impl AnnounceResponse {
    /// Parses a bencoded announce response body.
    ///
    /// A `failure reason` entry is surfaced as [`TrackerError::Failure`];
    /// `peers` must be a byte string in the 6-bytes-per-peer compact form.
    pub fn from_bytes(body: &[u8]) -> Result<Self, TrackerError> {
        let value = decode(body)?;
        let dict = value
            .as_dict()
            .ok_or_else(|| TrackerError::InvalidResponse("expected dict".into()))?;

        if let Some(reason) = dict
            .get(b"failure reason".as_slice())
            .and_then(|v| v.as_str())
        {
            return Err(TrackerError::Failure(reason.to_string()));
        }

        let interval = dict
            .get(b"interval".as_slice())
            .and_then(|v| v.as_integer())
            .map(|v| v as u32);

        let complete = dict
            .get(b"complete".as_slice())
            .and_then(|v| v.as_integer())
            .map(|v| v as u32);

        let incomplete = dict
            .get(b"incomplete".as_slice())
            .and_then(|v| v.as_integer())
            .map(|v| v as u32);

        let peers_bytes = dict
            .get(b"peers".as_slice())
            .and_then(|v| v.as_bytes())
            .ok_or_else(|| TrackerError::InvalidResponse("missing peers".into()))?;

        if peers_bytes.len() % 6 != 0 {
            return Err(TrackerError::InvalidResponse(
                "peers length not a multiple of 6".into(),
            ));
        }

        Ok(Self {
            interval,
            complete,
            incomplete,
            peers: parse_compact_peers(peers_bytes),
        })
    }
}

/// Parses the compact peer format: 4 IP bytes then a big-endian u16 port,
/// repeated.
pub fn parse_compact_peers(data: &[u8]) -> Vec<SocketAddr> {
    data.chunks_exact(6)
        .map(|chunk| {
            let ip = Ipv4Addr::new(chunk[0], chunk[1], chunk[2], chunk[3]);
            let port = u16::from_be_bytes([chunk[4], chunk[5]]);
            SocketAddr::new(IpAddr::V4(ip), port)
        })
        .collect()
}
