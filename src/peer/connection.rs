use std::net::SocketAddr;

use tracing::trace;

use super::bitfield::Bitfield;
use super::error::PeerError;
use super::message::{Handshake, Message, MessageId};
use super::peer_id::PeerId;
use super::transport::PeerTransport;
use crate::metainfo::InfoHash;

/// Where a session stands in the peer wire state machine.
///
/// A fresh connection walks `Fresh → HandshakeSent → Handshaked →
/// BitfieldReceived → Interested → Unchoked → Downloading`; `Closed` is
/// reachable from anywhere. A session that has reached `Unchoked` can be
/// reused for further pieces without repeating the preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Fresh,
    HandshakeSent,
    Handshaked,
    BitfieldReceived,
    Interested,
    Unchoked,
    Downloading,
    Closed,
}

/// One TCP session with a peer, plus the post-handshake state.
pub struct PeerConnection {
    pub addr: SocketAddr,
    pub state: PeerState,
    /// The remote's id, known after the handshake.
    pub remote_id: Option<PeerId>,
    /// Whether the remote's handshake advertised the extension protocol.
    pub supports_extensions: bool,
    /// The id the remote expects for ut_metadata messages, once learned.
    pub metadata_ext_id: Option<u8>,
    /// The remote's piece map, once its BITFIELD arrived.
    pub bitfield: Option<Bitfield>,
    transport: Option<PeerTransport>,
}

impl PeerConnection {
    /// Dials the peer. The session starts out fresh; call
    /// [`PeerConnection::handshake`] next.
    pub async fn connect(addr: SocketAddr) -> Result<Self, PeerError> {
        let transport = PeerTransport::connect(addr).await?;
        Ok(Self {
            addr,
            state: PeerState::Fresh,
            remote_id: None,
            supports_extensions: false,
            metadata_ext_id: None,
            bitfield: None,
            transport: Some(transport),
        })
    }

    /// Exchanges 68-byte handshakes and records what the remote told us.
    ///
    /// The remote's echoed info hash must match ours; a mismatch closes
    /// the session.
    pub async fn handshake(
        &mut self,
        info_hash: &InfoHash,
        local_id: &PeerId,
        extensions: bool,
    ) -> Result<Handshake, PeerError> {
        let ours = Handshake::new(*info_hash.as_bytes(), *local_id.as_bytes(), extensions);

        self.transport_mut()?.send_handshake(&ours).await?;
        self.state = PeerState::HandshakeSent;

        let theirs = self.transport_mut()?.recv_handshake().await?;

        if &theirs.info_hash != info_hash.as_bytes() {
            self.close();
            return Err(PeerError::InfoHashMismatch);
        }

        self.remote_id = PeerId::from_bytes(&theirs.peer_id);
        self.supports_extensions = extensions && theirs.supports_extensions();
        self.state = PeerState::Handshaked;

        trace!(addr = %self.addr, extensions = self.supports_extensions, "handshake complete");
        Ok(theirs)
    }

    pub async fn send(&mut self, message: Message) -> Result<(), PeerError> {
        self.transport_mut()?.send(&message).await
    }

    /// Receives the next message, silently skipping keep-alives.
    pub async fn receive(&mut self) -> Result<Message, PeerError> {
        loop {
            match self.transport_mut()?.recv().await? {
                Message::KeepAlive => continue,
                message => return Ok(message),
            }
        }
    }

    /// Receives the next message and requires it to be of the given type.
    pub async fn expect(&mut self, expected: MessageId) -> Result<Message, PeerError> {
        let message = self.receive().await?;
        if message.id() != Some(expected) {
            return Err(PeerError::UnexpectedMessage {
                expected,
                got: message.id(),
            });
        }
        Ok(message)
    }

    /// Consumes the initial BITFIELD message and stores the piece map.
    pub async fn read_bitfield(&mut self) -> Result<(), PeerError> {
        let message = self.expect(MessageId::Bitfield).await?;
        if let Message::Bitfield(bits) = message {
            self.bitfield = Some(Bitfield::from_bytes(bits));
        }
        self.state = PeerState::BitfieldReceived;
        Ok(())
    }

    /// Returns true once the preamble has run and requests may be issued.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, PeerState::Unchoked | PeerState::Downloading)
    }

    /// Returns true if the peer advertised the piece. Unknown when no
    /// bitfield arrived, in which case the piece is assumed present.
    pub fn has_piece(&self, index: u32) -> bool {
        match &self.bitfield {
            Some(bitfield) => bitfield.has_piece(index as usize),
            None => true,
        }
    }

    /// Closes the session. Idempotent; dropping the connection also closes
    /// the underlying socket.
    pub fn close(&mut self) {
        self.transport = None;
        self.state = PeerState::Closed;
    }

    fn transport_mut(&mut self) -> Result<&mut PeerTransport, PeerError> {
        self.transport.as_mut().ok_or(PeerError::ConnectionClosed)
    }
}
