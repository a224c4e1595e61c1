//! HTTP tracker protocol (BEP-3)
//!
//! Announces the client to the tracker named in the metainfo and parses
//! the compact peer list out of the response.

mod error;
mod http;
mod response;

pub use error::TrackerError;
pub use http::{fetch_peers, HttpTracker};
pub use response::AnnounceResponse;

#[cfg(test)]
mod tests;
