//! btget - a BitTorrent v1 download client
//!
//! Ingests a `.torrent` file or a magnet link, discovers peers through the
//! HTTP tracker, and downloads a single-file payload in parallel across
//! peers with per-piece SHA-1 verification. Magnet downloads first fetch
//! the `info` dictionary from a peer via the metadata extension.
//!
//! # Modules
//!
//! - [`bencode`] - BEP-3 bencode encoding/decoding
//! - [`metainfo`] - Torrent files, magnet links, and the info hash
//! - [`tracker`] - BEP-3 HTTP tracker announces and compact peer lists
//! - [`peer`] - BEP-3/10 peer wire protocol and the BEP-9 metadata extension
//! - [`download`] - Parallel piece scheduling, verification, and assembly

pub mod bencode;
pub mod constants;
pub mod download;
pub mod metainfo;
pub mod peer;
pub mod tracker;

pub use bencode::{decode, encode, BencodeError, Value};
pub use download::{DownloadError, Downloader};
pub use metainfo::{Info, InfoHash, MagnetLink, MetainfoError, Torrent};
pub use peer::{
    Handshake, Message, MessageId, PeerConnection, PeerError, PeerId, PeerState, PeerTransport,
};
pub use tracker::{AnnounceResponse, HttpTracker, TrackerError};
