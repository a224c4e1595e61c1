//! Subcommand surface of the `btget` binary.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use btget::bencode::{self, Value};
use btget::download::{self, Downloader};
use btget::metainfo::{MagnetLink, Torrent};
use btget::peer::{self, PeerConnection, PeerId};
use btget::tracker;

#[derive(Parser)]
#[command(name = "btget", version, about = "BitTorrent v1 download client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decode a bencoded value and print it as JSON.
    Decode { value: String },
    /// Print a torrent file's tracker, size, info hash, and piece hashes.
    Info { torrent: PathBuf },
    /// Print the torrent's peers, one ip:port per line.
    Peers { torrent: PathBuf },
    /// Handshake with one peer and print its peer id.
    Handshake { torrent: PathBuf, peer: String },
    /// Download a single piece.
    #[command(name = "download_piece")]
    DownloadPiece {
        #[arg(short)]
        output: PathBuf,
        torrent: PathBuf,
        piece: u32,
    },
    /// Download the whole payload.
    Download {
        #[arg(short)]
        output: PathBuf,
        torrent: PathBuf,
    },
    /// Print the tracker URL and info hash of a magnet link.
    #[command(name = "magnet_parse")]
    MagnetParse { link: String },
    /// Handshake via a magnet link and print the peer's id and
    /// ut_metadata extension id.
    #[command(name = "magnet_handshake")]
    MagnetHandshake { link: String },
    /// Fetch a magnet link's metadata from a peer and print it.
    #[command(name = "magnet_info")]
    MagnetInfo { link: String },
    /// Download a single piece starting from a magnet link.
    #[command(name = "magnet_download_piece")]
    MagnetDownloadPiece {
        #[arg(short)]
        output: PathBuf,
        link: String,
        piece: u32,
    },
    /// Download the whole payload starting from a magnet link.
    #[command(name = "magnet_download")]
    MagnetDownload {
        #[arg(short)]
        output: PathBuf,
        link: String,
    },
}

impl Command {
    pub async fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Decode { value } => {
                let decoded = bencode::decode(value.as_bytes())?;
                println!("{}", to_json(&decoded));
            }
            Command::Info { torrent } => {
                let torrent = read_torrent(&torrent)?;
                print_info(&torrent)?;
            }
            Command::Peers { torrent } => {
                let torrent = read_torrent(&torrent)?;
                let peer_id = PeerId::generate();
                for peer in tracker::fetch_peers(&torrent, &peer_id).await? {
                    println!("{peer}");
                }
            }
            Command::Handshake { torrent, peer } => {
                let torrent = read_torrent(&torrent)?;
                let addr: SocketAddr = peer.parse().context("invalid peer address")?;
                let peer_id = PeerId::generate();

                let mut conn = PeerConnection::connect(addr).await?;
                let theirs = conn.handshake(&torrent.info_hash, &peer_id, false).await?;
                conn.close();

                println!("Peer ID: {}", hex(&theirs.peer_id));
            }
            Command::DownloadPiece {
                output,
                torrent,
                piece,
            } => {
                let torrent = read_torrent(&torrent)?;
                let peer_id = PeerId::generate();
                let peers = tracker::fetch_peers(&torrent, &peer_id).await?;
                download_piece(&output, torrent, peers, peer_id, piece).await?;
            }
            Command::Download { output, torrent } => {
                let torrent = read_torrent(&torrent)?;
                let peer_id = PeerId::generate();
                let peers = tracker::fetch_peers(&torrent, &peer_id).await?;
                download_all(&output, torrent, peers, peer_id).await?;
            }
            Command::MagnetParse { link } => {
                let torrent = parse_magnet(&link)?;
                println!("Tracker URL: {}", torrent.announce);
                println!("Info Hash: {}", torrent.info_hash);
            }
            Command::MagnetHandshake { link } => {
                let torrent = parse_magnet(&link)?;
                let peer_id = PeerId::generate();
                let peers = tracker::fetch_peers(&torrent, &peer_id).await?;
                let addr = *peers.first().context("tracker returned no peers")?;

                let mut conn = PeerConnection::connect(addr).await?;
                let theirs = conn.handshake(&torrent.info_hash, &peer_id, true).await?;
                conn.read_bitfield().await?;

                println!("Peer ID: {}", hex(&theirs.peer_id));
                if conn.supports_extensions {
                    let remote = peer::extension_handshake(&mut conn).await?;
                    if let Some(id) = remote.extension_id("ut_metadata") {
                        println!("Peer Metadata Extension ID: {id}");
                    }
                }
                conn.close();
            }
            Command::MagnetInfo { link } => {
                let (torrent, _, _) = complete_magnet(&link).await?;
                print_info(&torrent)?;
            }
            Command::MagnetDownloadPiece {
                output,
                link,
                piece,
            } => {
                let (torrent, peers, peer_id) = complete_magnet(&link).await?;
                download_piece(&output, torrent, peers, peer_id, piece).await?;
            }
            Command::MagnetDownload { output, link } => {
                let (torrent, peers, peer_id) = complete_magnet(&link).await?;
                download_all(&output, torrent, peers, peer_id).await?;
            }
        }
        Ok(())
    }
}

fn read_torrent(path: &Path) -> anyhow::Result<Torrent> {
    let data = std::fs::read(path)
        .with_context(|| format!("reading torrent file {}", path.display()))?;
    Ok(Torrent::from_bytes(&data)?)
}

fn parse_magnet(link: &str) -> anyhow::Result<Torrent> {
    let magnet = MagnetLink::parse(link)?;
    Ok(Torrent::from_magnet(&magnet)?)
}

/// Parses a magnet link and completes it with metadata fetched from the
/// swarm. Returns the peer list and id alongside, so download commands
/// don't announce twice.
async fn complete_magnet(link: &str) -> anyhow::Result<(Torrent, Vec<SocketAddr>, PeerId)> {
    let mut torrent = parse_magnet(link)?;
    let peer_id = PeerId::generate();
    let peers = tracker::fetch_peers(&torrent, &peer_id).await?;
    download::fetch_metadata(&mut torrent, &peers, &peer_id).await?;
    Ok((torrent, peers, peer_id))
}

async fn download_all(
    output: &Path,
    torrent: Torrent,
    peers: Vec<SocketAddr>,
    peer_id: PeerId,
) -> anyhow::Result<()> {
    let downloader = Downloader::new(torrent, peers, peer_id)?;
    downloader.download_to(output).await?;
    println!("Downloaded to {}.", output.display());
    Ok(())
}

async fn download_piece(
    output: &Path,
    torrent: Torrent,
    peers: Vec<SocketAddr>,
    peer_id: PeerId,
    piece: u32,
) -> anyhow::Result<()> {
    let downloader = Downloader::new(torrent, peers, peer_id)?;
    let data = downloader.download_piece(piece).await?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output, &data)?;
    println!("Piece {} downloaded to {}.", piece, output.display());
    Ok(())
}

fn print_info(torrent: &Torrent) -> anyhow::Result<()> {
    let info = torrent.require_info()?;
    println!("Tracker URL: {}", torrent.announce);
    println!("Length: {}", info.total_length);
    println!("Info Hash: {}", torrent.info_hash);
    println!("Piece Length: {}", info.piece_length);
    println!("Piece Hashes:");
    for piece in &info.pieces {
        println!("{}", hex(piece));
    }
    Ok(())
}

fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Integer(i) => (*i).into(),
        Value::Bytes(b) => serde_json::Value::String(String::from_utf8_lossy(b).into_owned()),
        Value::List(l) => serde_json::Value::Array(l.iter().map(to_json).collect()),
        Value::Dict(d) => serde_json::Value::Object(
            d.iter()
                .map(|(k, v)| (String::from_utf8_lossy(k).into_owned(), to_json(v)))
                .collect(),
        ),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
            use std::fmt::Write;
            let _ = write!(s, "{:02x}", b);
            s
        })
}
