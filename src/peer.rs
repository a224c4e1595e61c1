//! Peer wire protocol (BEP-3, BEP-10)
//!
//! The 68-byte handshake, length-prefixed message framing, the per-session
//! state machine, and the metadata exchange extension used to complete
//! magnet downloads.

mod bitfield;
mod connection;
mod error;
mod extension;
mod message;
mod metadata;
mod peer_id;
mod transport;

pub use bitfield::Bitfield;
pub use connection::{PeerConnection, PeerState};
pub use error::PeerError;
pub use extension::{ExtensionHandshake, EXTENSION_HANDSHAKE_ID};
pub use message::{Handshake, Message, MessageId, HANDSHAKE_LEN};
pub use metadata::{
    extension_handshake, fetch_info_bytes, MetadataMessage, MetadataMessageType,
};
pub use peer_id::PeerId;
pub use transport::PeerTransport;

#[cfg(test)]
mod tests;
