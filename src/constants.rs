//! Protocol constants and tuning parameters.

use std::time::Duration;

/// Client id prefix for peer id generation (Azureus style).
pub const CLIENT_PREFIX: &str = "-BG0001-";

/// Port reported to trackers.
pub const DEFAULT_PORT: u16 = 6881;

/// Standard block size (16 KiB); the largest length a REQUEST may carry.
pub const BLOCK_SIZE: u32 = 16384;

/// Metadata exchange piece size (BEP-9).
pub const METADATA_PIECE_SIZE: usize = 16384;

/// Sanity cap on a frame's length prefix. Large enough for the bitfield of
/// any realistic torrent and for a metadata piece, far below anything a
/// well-behaved peer sends.
pub const MAX_FRAME_LEN: usize = 2 * 1024 * 1024;

/// `left` value reported to the tracker while downloading from a magnet
/// link, before the metadata reveals the real size.
pub const MAGNET_LEFT_PLACEHOLDER: u64 = 999;

/// Extension message id we advertise for ut_metadata in our half of the
/// extension handshake.
pub const LOCAL_UT_METADATA_ID: u8 = 123;

/// Attempts per piece before the download as a whole fails.
pub const MAX_PIECE_ATTEMPTS: usize = 3;

/// Tracker HTTP request timeout.
pub const TRACKER_TIMEOUT: Duration = Duration::from_secs(10);

/// TCP dial timeout for peer connections.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
