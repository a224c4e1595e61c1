//! Metadata exchange extension (ut_metadata, BEP-9).
//!
//! Fetches the `info` dictionary from a peer over an established session,
//! which is how a magnet download learns piece hashes and sizes before any
//! content moves.

use std::collections::BTreeMap;

use bytes::{Bytes, BytesMut};
use tracing::debug;

use super::connection::PeerConnection;
use super::error::PeerError;
use super::extension::{ExtensionHandshake, EXTENSION_HANDSHAKE_ID};
use super::message::{Message, MessageId};
use crate::bencode::{decode_prefix, encode, Value};
use crate::constants::{LOCAL_UT_METADATA_ID, METADATA_PIECE_SIZE};

/// ut_metadata message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataMessageType {
    /// Ask for a metadata piece.
    Request = 0,
    /// Deliver a metadata piece.
    Data = 1,
    /// Refuse a metadata request.
    Reject = 2,
}

impl MetadataMessageType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(MetadataMessageType::Request),
            1 => Some(MetadataMessageType::Data),
            2 => Some(MetadataMessageType::Reject),
            _ => None,
        }
    }
}

/// A ut_metadata message: a bencoded header, followed for Data messages by
/// the raw metadata bytes.
#[derive(Debug, Clone)]
pub struct MetadataMessage {
    pub msg_type: MetadataMessageType,
    pub piece: u32,
    /// Total metadata size; present in Data messages.
    pub total_size: Option<u32>,
    /// The raw piece bytes; present in Data messages.
    pub data: Option<Bytes>,
}

impl MetadataMessage {
    /// A request for one metadata piece.
    pub fn request(piece: u32) -> Self {
        Self {
            msg_type: MetadataMessageType::Request,
            piece,
            total_size: None,
            data: None,
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut dict = BTreeMap::new();
        dict.insert(
            Bytes::from_static(b"msg_type"),
            Value::Integer(self.msg_type as i64),
        );
        dict.insert(
            Bytes::from_static(b"piece"),
            Value::Integer(self.piece as i64),
        );
        if let Some(total_size) = self.total_size {
            dict.insert(
                Bytes::from_static(b"total_size"),
                Value::Integer(total_size as i64),
            );
        }

        let mut out = encode(&Value::Dict(dict));
        if let Some(ref data) = self.data {
            out.extend_from_slice(data);
        }
        Bytes::from(out)
    }

    /// Decodes a message; the header/tail boundary comes from the decoder's
    /// consumed-byte count.
    pub fn decode(payload: &[u8]) -> Result<Self, PeerError> {
        let (header, consumed) = decode_prefix(payload)
            .map_err(|e| PeerError::BadMetadataHeader(e.to_string()))?;
        let dict = header
            .as_dict()
            .ok_or_else(|| PeerError::BadMetadataHeader("expected dict".into()))?;

        let msg_type = dict
            .get(b"msg_type".as_slice())
            .and_then(|v| v.as_integer())
            .and_then(|v| MetadataMessageType::from_byte(v as u8))
            .ok_or_else(|| PeerError::BadMetadataHeader("missing msg_type".into()))?;

        let piece = dict
            .get(b"piece".as_slice())
            .and_then(|v| v.as_integer())
            .ok_or_else(|| PeerError::BadMetadataHeader("missing piece".into()))?
            as u32;

        let total_size = dict
            .get(b"total_size".as_slice())
            .and_then(|v| v.as_integer())
            .map(|v| v as u32);

        let data = if msg_type == MetadataMessageType::Data {
            Some(Bytes::copy_from_slice(&payload[consumed..]))
        } else {
            None
        };

        Ok(Self {
            msg_type,
            piece,
            total_size,
            data,
        })
    }
}

/// Number of 16 KiB pieces the metadata spans.
pub fn metadata_piece_count(metadata_size: usize) -> usize {
    metadata_size.div_ceil(METADATA_PIECE_SIZE)
}

/// Fetches the raw `info` dictionary bytes over an established session.
///
/// The session must have negotiated extensions in its handshake and must
/// already have consumed the peer's initial BITFIELD. The caller verifies
/// the returned bytes against the info hash before trusting them (see
/// [`Torrent::attach_info`](crate::metainfo::Torrent::attach_info)).
pub async fn fetch_info_bytes(conn: &mut PeerConnection) -> Result<Bytes, PeerError> {
    let remote = extension_handshake(conn).await?;

    let ut_metadata = remote
        .extension_id("ut_metadata")
        .ok_or_else(|| PeerError::Extension("peer does not offer ut_metadata".into()))?;
    conn.metadata_ext_id = Some(ut_metadata);

    // Small torrents fit one piece and some peers omit metadata_size for
    // them; in that case request piece 0 only.
    let piece_count = match remote.metadata_size {
        Some(size) if size > 0 => metadata_piece_count(size as usize),
        _ => 1,
    };

    debug!(addr = %conn.addr, pieces = piece_count, "fetching metadata");

    let mut metadata = BytesMut::new();
    for piece in 0..piece_count as u32 {
        conn.send(Message::Extended {
            id: ut_metadata,
            payload: MetadataMessage::request(piece).encode(),
        })
        .await?;

        let reply = conn.expect(MessageId::Extended).await?;
        let payload = match reply {
            Message::Extended { payload, .. } => payload,
            _ => unreachable!(),
        };

        let message = MetadataMessage::decode(&payload)?;
        if message.msg_type != MetadataMessageType::Data || message.piece != piece {
            return Err(PeerError::Extension(format!(
                "expected data for metadata piece {piece}"
            )));
        }
        let data = message
            .data
            .ok_or_else(|| PeerError::BadMetadataHeader("data message without tail".into()))?;
        metadata.extend_from_slice(&data);
    }

    Ok(metadata.freeze())
}

/// Runs the extension handshake and returns the peer's half.
///
/// Advertises our ut_metadata id and reads back the ids and
/// `metadata_size` the peer advertises. Requires a session whose
/// handshake negotiated the extension protocol.
pub async fn extension_handshake(
    conn: &mut PeerConnection,
) -> Result<ExtensionHandshake, PeerError> {
    if !conn.supports_extensions {
        return Err(PeerError::ExtensionsUnsupported);
    }

    let ours = ExtensionHandshake::with_extensions(&[("ut_metadata", LOCAL_UT_METADATA_ID)]);
    conn.send(Message::Extended {
        id: EXTENSION_HANDSHAKE_ID,
        payload: ours.encode(),
    })
    .await?;

    let reply = conn.expect(MessageId::Extended).await?;
    match reply {
        Message::Extended { id, payload } if id == EXTENSION_HANDSHAKE_ID => {
            ExtensionHandshake::decode(&payload)
        }
        Message::Extended { id, .. } => Err(PeerError::Extension(format!(
            "expected extension handshake, got extension message {id}"
        ))),
        _ => unreachable!(),
    }
}
