use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use rand::Rng as _;
use sha1::{Digest, Sha1};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::error::DownloadError;
use crate::constants::{BLOCK_SIZE, MAX_PIECE_ATTEMPTS};
use crate::metainfo::{InfoHash, Torrent};
use crate::peer::{fetch_info_bytes, Message, MessageId, PeerConnection, PeerId, PeerState};

/// Splits a piece into REQUEST-sized blocks: ascending `(begin, length)`
/// pairs of at most [`BLOCK_SIZE`] bytes, the final block taking the
/// remainder.
pub(crate) fn block_lengths(piece_len: u32) -> Vec<(u32, u32)> {
    let mut blocks = Vec::with_capacity(piece_len.div_ceil(BLOCK_SIZE) as usize);
    let mut begin = 0;
    while begin < piece_len {
        let length = BLOCK_SIZE.min(piece_len - begin);
        blocks.push((begin, length));
        begin += length;
    }
    blocks
}

/// Peer sessions shared across piece tasks, keyed by endpoint.
///
/// The map lock covers lookup and the dial-plus-handshake of a new
/// session; the per-session lock keeps one task's REQUEST/PIECE exchange
/// from interleaving with another's when both picked the same peer.
struct SessionPool {
    info_hash: InfoHash,
    peer_id: PeerId,
    sessions: Mutex<HashMap<SocketAddr, Arc<Mutex<PeerConnection>>>>,
}

impl SessionPool {
    fn new(info_hash: InfoHash, peer_id: PeerId) -> Self {
        Self {
            info_hash,
            peer_id,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the session for `addr`, dialing and handshaking a new one
    /// on first use.
    async fn checkout(&self, addr: SocketAddr) -> Result<Arc<Mutex<PeerConnection>>, DownloadError> {
        let mut sessions = self.sessions.lock().await;

        if let Some(session) = sessions.get(&addr) {
            return Ok(Arc::clone(session));
        }

        let mut conn = PeerConnection::connect(addr).await?;
        conn.handshake(&self.info_hash, &self.peer_id, false).await?;
        debug!(peer = %addr, "opened session");

        let session = Arc::new(Mutex::new(conn));
        sessions.insert(addr, Arc::clone(&session));
        Ok(session)
    }

    /// Drops a broken session so the next attempt dials fresh.
    async fn evict(&self, addr: SocketAddr) {
        let session = self.sessions.lock().await.remove(&addr);
        if let Some(session) = session {
            session.lock().await.close();
        }
    }

    async fn close_all(&self) {
        for (_, session) in self.sessions.lock().await.drain() {
            session.lock().await.close();
        }
    }
}

/// Downloads a torrent's payload in parallel across its peers.
///
/// One task per piece; each task picks a peer endpoint uniformly at random
/// and reuses the pooled session for it, so a busy peer serves many pieces
/// over one connection. A piece that fails (hash mismatch, dead peer) is
/// retried against another random peer a bounded number of times before
/// the download as a whole fails.
///
/// # Examples
///
/// ```no_run
/// use btget::download::Downloader;
/// use btget::metainfo::Torrent;
/// use btget::peer::PeerId;
/// use btget::tracker;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let data = std::fs::read("example.torrent")?;
/// let torrent = Torrent::from_bytes(&data)?;
/// let peer_id = PeerId::generate();
///
/// let peers = tracker::fetch_peers(&torrent, &peer_id).await?;
/// let downloader = Downloader::new(torrent, peers, peer_id)?;
/// downloader.download_to("output.bin".as_ref()).await?;
/// # Ok(())
/// # }
/// ```
pub struct Downloader {
    torrent: Arc<Torrent>,
    peers: Arc<Vec<SocketAddr>>,
    pool: Arc<SessionPool>,
}

impl Downloader {
    /// Creates a downloader for a fully populated torrent.
    ///
    /// # Errors
    ///
    /// Fails when the torrent has no piece metadata yet (magnet before the
    /// metadata extension ran) or the peer list is empty.
    pub fn new(
        torrent: Torrent,
        peers: Vec<SocketAddr>,
        peer_id: PeerId,
    ) -> Result<Self, DownloadError> {
        torrent.require_info()?;
        if peers.is_empty() {
            return Err(DownloadError::NoPeers);
        }

        let pool = Arc::new(SessionPool::new(torrent.info_hash, peer_id));
        Ok(Self {
            torrent: Arc::new(torrent),
            peers: Arc::new(peers),
            pool,
        })
    }

    /// Downloads the whole payload and returns it.
    ///
    /// Pieces complete in any order; each is written at its fixed offset
    /// `index * piece_length`, so the output is byte-identical regardless
    /// of scheduling. The first piece that exhausts its attempts aborts
    /// the remaining tasks.
    pub async fn download(&self) -> Result<Vec<u8>, DownloadError> {
        let info = self.torrent.require_info()?;
        let piece_count = info.piece_count() as u32;
        let piece_length = info.piece_length;
        let mut output = vec![0u8; info.total_length as usize];

        info!(
            pieces = piece_count,
            bytes = info.total_length,
            peers = self.peers.len(),
            "starting download"
        );

        let mut tasks: JoinSet<Result<(u32, Vec<u8>), DownloadError>> = JoinSet::new();
        for index in 0..piece_count {
            let torrent = Arc::clone(&self.torrent);
            let peers = Arc::clone(&self.peers);
            let pool = Arc::clone(&self.pool);
            tasks.spawn(async move {
                let data = download_piece_with_retry(&torrent, &peers, &pool, index).await?;
                Ok((index, data))
            });
        }

        let result = loop {
            match tasks.join_next().await {
                None => break Ok(()),
                Some(Ok(Ok((index, data)))) => {
                    let offset = (index as u64 * piece_length) as usize;
                    output[offset..offset + data.len()].copy_from_slice(&data);
                    debug!(piece = index, bytes = data.len(), "piece committed");
                }
                Some(Ok(Err(e))) => break Err(e),
                Some(Err(_)) => break Err(DownloadError::TaskFailed),
            }
        };

        tasks.abort_all();
        self.pool.close_all().await;

        result.map(|()| output)
    }

    /// Downloads the payload and writes it to `path`.
    pub async fn download_to(&self, path: &Path) -> Result<(), DownloadError> {
        let data = self.download().await?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, &data).await?;

        info!(path = %path.display(), bytes = data.len(), "wrote payload");
        Ok(())
    }

    /// Downloads a single piece and returns its verified bytes.
    pub async fn download_piece(&self, index: u32) -> Result<Vec<u8>, DownloadError> {
        let info = self.torrent.require_info()?;
        if index as usize >= info.piece_count() {
            return Err(DownloadError::PieceOutOfRange { piece: index });
        }

        let result = download_piece_with_retry(&self.torrent, &self.peers, &self.pool, index).await;
        self.pool.close_all().await;
        result
    }
}

/// Completes a magnet torrent by fetching its `info` dictionary from the
/// first peer, using the metadata extension over a throwaway session.
pub async fn fetch_metadata(
    torrent: &mut Torrent,
    peers: &[SocketAddr],
    peer_id: &PeerId,
) -> Result<(), DownloadError> {
    let addr = *peers.first().ok_or(DownloadError::NoPeers)?;

    let mut conn = PeerConnection::connect(addr).await?;
    conn.handshake(&torrent.info_hash, peer_id, true).await?;
    conn.read_bitfield().await?;

    let raw_info = fetch_info_bytes(&mut conn).await?;
    conn.close();

    torrent.attach_info(&raw_info)?;
    Ok(())
}

async fn download_piece_with_retry(
    torrent: &Torrent,
    peers: &[SocketAddr],
    pool: &SessionPool,
    index: u32,
) -> Result<Vec<u8>, DownloadError> {
    let mut last_err = None;

    for attempt in 0..MAX_PIECE_ATTEMPTS {
        let addr = peers[rand::rng().random_range(0..peers.len())];

        match download_piece_from(torrent, pool, addr, index).await {
            Ok(data) => return Ok(data),
            Err(e) => {
                warn!(piece = index, peer = %addr, attempt, error = %e, "piece attempt failed");
                // A peer that simply lacks the piece keeps its session;
                // anything else leaves the session in an unknown state.
                if !matches!(e, DownloadError::PieceUnavailable { .. }) {
                    pool.evict(addr).await;
                }
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or(DownloadError::NoPeers))
}

async fn download_piece_from(
    torrent: &Torrent,
    pool: &SessionPool,
    addr: SocketAddr,
    index: u32,
) -> Result<Vec<u8>, DownloadError> {
    let info = torrent.require_info()?;

    let session = pool.checkout(addr).await?;
    let mut conn = session.lock().await;

    // Fresh sessions run the preamble once; reused sessions skip it.
    if !conn.is_ready() {
        run_preamble(&mut conn).await?;
    }

    if !conn.has_piece(index) {
        return Err(DownloadError::PieceUnavailable { piece: index });
    }

    let piece_len = info.piece_size(index) as u32;
    let data = fetch_piece(&mut conn, index, piece_len).await?;
    drop(conn);

    let digest: [u8; 20] = Sha1::digest(&data).into();
    if digest != info.pieces[index as usize] {
        return Err(DownloadError::PieceHashMismatch { piece: index });
    }

    Ok(data)
}

/// Consumes BITFIELD, sends INTERESTED, waits for UNCHOKE.
async fn run_preamble(conn: &mut PeerConnection) -> Result<(), DownloadError> {
    conn.read_bitfield().await?;

    conn.send(Message::Interested).await?;
    conn.state = PeerState::Interested;

    conn.expect(MessageId::Unchoke).await?;
    conn.state = PeerState::Unchoked;
    Ok(())
}

/// Pulls one piece block by block, strictly serially: each REQUEST is
/// answered by exactly one PIECE before the next is sent.
async fn fetch_piece(
    conn: &mut PeerConnection,
    index: u32,
    piece_len: u32,
) -> Result<Vec<u8>, DownloadError> {
    conn.state = PeerState::Downloading;

    let mut piece = Vec::with_capacity(piece_len as usize);
    for (begin, length) in block_lengths(piece_len) {
        conn.send(Message::Request {
            index,
            begin,
            length,
        })
        .await?;

        let message = conn.expect(MessageId::Piece).await?;
        if let Message::Piece {
            index: got_index,
            begin: got_begin,
            data,
        } = message
        {
            if got_index != index || got_begin != begin || data.len() != length as usize {
                return Err(DownloadError::BlockMismatch {
                    piece: index,
                    begin,
                });
            }
            piece.extend_from_slice(&data);
        }
    }

    conn.state = PeerState::Unchoked;
    Ok(piece)
}
