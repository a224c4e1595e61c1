//! Parallel piece download engine.
//!
//! Schedules one task per piece across a shared pool of peer sessions,
//! verifies every piece against its SHA-1 digest, and assembles the
//! payload.

mod engine;
mod error;

pub use engine::{fetch_metadata, Downloader};
pub use error::DownloadError;
