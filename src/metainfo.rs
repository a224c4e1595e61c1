//! Torrent metainfo handling (BEP-3, BEP-9)
//!
//! This module handles torrent file parsing, magnet links, and the
//! info hash that identifies a torrent.

mod error;
mod info_hash;
mod magnet;
mod torrent;

pub use error::MetainfoError;
pub use info_hash::InfoHash;
pub use magnet::MagnetLink;
pub use torrent::{Info, Torrent};

#[cfg(test)]
mod tests;
