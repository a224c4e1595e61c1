use super::message::MessageId;
use thiserror::Error;

/// Errors that can occur during peer communication.
#[derive(Debug, Error)]
pub enum PeerError {
    /// The TCP dial failed.
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    /// Network I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer sent an invalid handshake.
    #[error("invalid handshake")]
    InvalidHandshake,

    /// The peer's info hash doesn't match ours.
    #[error("info hash mismatch")]
    InfoHashMismatch,

    /// A frame's length prefix exceeds the sanity cap.
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),

    /// Received an unknown message id.
    #[error("unknown message id: {0}")]
    UnknownMessageId(u8),

    /// Received a malformed protocol message.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A different message type was expected at this point in the session.
    #[error("expected {expected:?}, got {got:?}")]
    UnexpectedMessage {
        expected: MessageId,
        got: Option<MessageId>,
    },

    /// The connection was closed by the peer.
    #[error("connection closed")]
    ConnectionClosed,

    /// Operation timed out.
    #[error("timeout")]
    Timeout,

    /// The handshake did not negotiate the extension protocol.
    #[error("peer does not support extensions")]
    ExtensionsUnsupported,

    /// A metadata message's bencoded header is malformed.
    #[error("bad metadata header: {0}")]
    BadMetadataHeader(String),

    /// Extension protocol error.
    #[error("extension error: {0}")]
    Extension(String),

    /// Error decoding bencode in extension messages.
    #[error("bencode error: {0}")]
    Bencode(#[from] crate::bencode::BencodeError),
}
