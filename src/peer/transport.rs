use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::error::PeerError;
use super::message::{Handshake, Message, HANDSHAKE_LEN};
use crate::constants::{CONNECT_TIMEOUT, MAX_FRAME_LEN};

const READ_TIMEOUT: Duration = Duration::from_secs(30);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Framed transport over one TCP connection to a peer.
///
/// Handles the fixed-size handshake exchange and the length-prefixed
/// message framing that follows it. Every read and write carries a
/// deadline so a silent peer cannot stall a download forever.
pub struct PeerTransport {
    stream: TcpStream,
}

impl PeerTransport {
    /// Dials the peer over TCP.
    pub async fn connect(addr: SocketAddr) -> Result<Self, PeerError> {
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| PeerError::Timeout)?
            .map_err(PeerError::Connect)?;
        Ok(Self { stream })
    }

    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    pub async fn send_handshake(&mut self, handshake: &Handshake) -> Result<(), PeerError> {
        self.write_all(&handshake.encode()).await
    }

    pub async fn recv_handshake(&mut self) -> Result<Handshake, PeerError> {
        let mut buf = [0u8; HANDSHAKE_LEN];
        self.read_exact(&mut buf).await?;
        Handshake::decode(&buf)
    }

    pub async fn send(&mut self, message: &Message) -> Result<(), PeerError> {
        self.write_all(&message.encode()).await
    }

    /// Reads the next frame and decodes it.
    ///
    /// A zero length prefix decodes to [`Message::KeepAlive`]; callers that
    /// want the next real message should use
    /// [`PeerConnection::receive`](super::PeerConnection::receive).
    pub async fn recv(&mut self) -> Result<Message, PeerError> {
        let mut prefix = [0u8; 4];
        self.read_exact(&mut prefix).await?;
        let length = u32::from_be_bytes(prefix) as usize;

        if length > MAX_FRAME_LEN {
            return Err(PeerError::FrameTooLarge(length));
        }

        let mut body = vec![0u8; length];
        self.read_exact(&mut body).await?;
        Message::decode(Bytes::from(body))
    }

    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), PeerError> {
        timeout(READ_TIMEOUT, self.stream.read_exact(buf))
            .await
            .map_err(|_| PeerError::Timeout)?
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::UnexpectedEof => PeerError::ConnectionClosed,
                _ => PeerError::Io(e),
            })?;
        Ok(())
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<(), PeerError> {
        timeout(WRITE_TIMEOUT, self.stream.write_all(data))
            .await
            .map_err(|_| PeerError::Timeout)??;
        Ok(())
    }
}
