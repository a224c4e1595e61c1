use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("peer error: {0}")]
    Peer(#[from] crate::peer::PeerError),

    #[error("tracker error: {0}")]
    Tracker(#[from] crate::tracker::TrackerError),

    #[error("metainfo error: {0}")]
    Metainfo(#[from] crate::metainfo::MetainfoError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("piece {piece} failed hash verification")]
    PieceHashMismatch { piece: u32 },

    #[error("piece {piece}: block at offset {begin} does not match the request")]
    BlockMismatch { piece: u32, begin: u32 },

    #[error("peer does not have piece {piece}")]
    PieceUnavailable { piece: u32 },

    #[error("piece index {piece} out of range")]
    PieceOutOfRange { piece: u32 },

    #[error("tracker returned no peers")]
    NoPeers,

    #[error("download task panicked")]
    TaskFailed,
}
