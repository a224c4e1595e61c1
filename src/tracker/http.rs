use std::net::SocketAddr;

use reqwest::Client;
use tracing::debug;

use super::error::TrackerError;
use super::response::AnnounceResponse;
use crate::constants::{DEFAULT_PORT, MAGNET_LEFT_PLACEHOLDER, TRACKER_TIMEOUT};
use crate::metainfo::{InfoHash, Torrent};
use crate::peer::PeerId;

/// An HTTP tracker client (BEP-3).
///
/// # Examples
///
/// ```no_run
/// use btget::metainfo::InfoHash;
/// use btget::peer::PeerId;
/// use btget::tracker::HttpTracker;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tracker = HttpTracker::new("http://tracker.example.com/announce")?;
/// let response = tracker
///     .announce(&InfoHash::from_bytes([0u8; 20]), &PeerId::generate(), 1000)
///     .await?;
/// println!("found {} peers", response.peers.len());
/// # Ok(())
/// # }
/// ```
pub struct HttpTracker {
    client: Client,
    url: String,
}

impl HttpTracker {
    pub fn new(url: &str) -> Result<Self, TrackerError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(TrackerError::InvalidUrl(url.to_string()));
        }

        let client = Client::builder()
            .timeout(TRACKER_TIMEOUT)
            .build()
            .map_err(TrackerError::Http)?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Announces to the tracker and returns the parsed response.
    ///
    /// The query string is assembled by hand because `info_hash` carries
    /// the raw 20 hash bytes percent-encoded, which URL builders would
    /// re-encode.
    pub async fn announce(
        &self,
        info_hash: &InfoHash,
        peer_id: &PeerId,
        left: u64,
    ) -> Result<AnnounceResponse, TrackerError> {
        let url = format!(
            "{}?info_hash={}&peer_id={}&port={}&uploaded=0&downloaded=0&left={}&compact=1",
            self.url,
            info_hash.url_encode(),
            url_encode(peer_id.as_bytes()),
            DEFAULT_PORT,
            left,
        );

        debug!(url = %self.url, "announcing to tracker");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status.as_u16() != 200 {
            return Err(TrackerError::BadStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        AnnounceResponse::from_bytes(&body)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Fetches the peer list for a torrent from its announce URL.
///
/// `left` is the payload size when the info dictionary is known; for a bare
/// magnet torrent a positive placeholder is reported instead, since the
/// real size arrives only with the metadata.
pub async fn fetch_peers(
    torrent: &Torrent,
    peer_id: &PeerId,
) -> Result<Vec<SocketAddr>, TrackerError> {
    let left = torrent
        .info
        .as_ref()
        .map(|info| info.total_length)
        .unwrap_or(MAGNET_LEFT_PLACEHOLDER);

    let tracker = HttpTracker::new(&torrent.announce)?;
    let response = tracker.announce(&torrent.info_hash, peer_id, left).await?;
    Ok(response.peers)
}

fn url_encode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.' || b == b'~' {
                (b as char).to_string()
            } else {
                format!("%{:02X}", b)
            }
        })
        .collect()
}
