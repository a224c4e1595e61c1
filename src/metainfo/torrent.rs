use std::ops::Range;

use super::error::MetainfoError;
use super::info_hash::InfoHash;
use crate::bencode::{decode, decode_prefix, Value};

/// A torrent the client can work on.
///
/// Produced either from a `.torrent` file, in which case [`Torrent::info`]
/// is present immediately, or from a magnet link, in which case only the
/// announce URL and info hash are known until the metadata extension
/// delivers the `info` dictionary (see [`Torrent::attach_info`]).
///
/// # Examples
///
/// ```no_run
/// use btget::metainfo::Torrent;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let data = std::fs::read("example.torrent")?;
/// let torrent = Torrent::from_bytes(&data)?;
///
/// let info = torrent.require_info()?;
/// println!("{}: {} bytes, {} pieces", info.name, info.total_length, info.piece_count());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Torrent {
    /// Tracker announce URL.
    pub announce: String,
    /// The torrent's identity.
    pub info_hash: InfoHash,
    /// Suggested name, when known (`dn` for magnets, `info.name` otherwise).
    pub name: Option<String>,
    /// Piece data; `None` for a magnet link until metadata arrives.
    pub info: Option<Info>,
}

/// The parsed `info` dictionary of a single-file torrent.
#[derive(Debug, Clone)]
pub struct Info {
    /// Suggested output filename.
    pub name: String,
    /// Bytes per piece; every piece but the last has exactly this length.
    pub piece_length: u64,
    /// Total payload size in bytes.
    pub total_length: u64,
    /// SHA-1 digest of each piece, in order.
    pub pieces: Vec<[u8; 20]>,
}

impl Torrent {
    /// Parses a `.torrent` file from raw bytes.
    ///
    /// The info hash is computed over the exact input bytes spanning the
    /// `info` value, not over a re-encoding of the parsed tree, so it is
    /// correct even for inputs whose dictionaries are not in canonical
    /// key order.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid bencode, if `announce` or
    /// any required `info` field is missing, or if `pieces` is not a
    /// multiple of 20 bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, MetainfoError> {
        let value = decode(data)?;
        let dict = value.as_dict().ok_or(MetainfoError::InvalidField("root"))?;

        let announce = dict
            .get(b"announce".as_slice())
            .ok_or(MetainfoError::MissingField("announce"))?
            .as_str()
            .ok_or(MetainfoError::InvalidField("announce"))?
            .to_string();

        let info_value = dict
            .get(b"info".as_slice())
            .ok_or(MetainfoError::MissingField("info"))?;

        let span = raw_info_span(data)?;
        let info_hash = InfoHash::from_info_bytes(&data[span]);

        let info = Info::from_value(info_value)?;

        Ok(Self {
            announce,
            info_hash,
            name: Some(info.name.clone()),
            info: Some(info),
        })
    }

    /// Builds a torrent from a parsed magnet link.
    ///
    /// Piece data is absent until [`Torrent::attach_info`] is called with
    /// the metadata fetched from a peer.
    pub fn from_magnet(magnet: &super::MagnetLink) -> Result<Self, MetainfoError> {
        let announce = magnet
            .trackers
            .first()
            .ok_or(MetainfoError::MissingField("tr"))?
            .clone();

        Ok(Self {
            announce,
            info_hash: magnet.info_hash,
            name: magnet.display_name.clone(),
            info: None,
        })
    }

    /// Fills in the `info` dictionary from raw metadata bytes.
    ///
    /// The bytes are verified against the info hash before being trusted;
    /// a peer that serves metadata for a different torrent is rejected.
    pub fn attach_info(&mut self, raw_info: &[u8]) -> Result<(), MetainfoError> {
        if InfoHash::from_info_bytes(raw_info) != self.info_hash {
            return Err(MetainfoError::InfoHashMismatch);
        }

        let value = decode(raw_info)?;
        let info = Info::from_value(&value)?;

        if self.name.is_none() {
            self.name = Some(info.name.clone());
        }
        self.info = Some(info);
        Ok(())
    }

    /// Returns the piece data, or an error when it has not been fetched yet.
    pub fn require_info(&self) -> Result<&Info, MetainfoError> {
        self.info.as_ref().ok_or(MetainfoError::MetadataMissing)
    }
}

impl Info {
    /// Parses the `info` dictionary of a single-file torrent.
    pub fn from_value(value: &Value) -> Result<Self, MetainfoError> {
        let dict = value.as_dict().ok_or(MetainfoError::InvalidField("info"))?;

        let name = dict
            .get(b"name".as_slice())
            .and_then(|v| v.as_str())
            .ok_or(MetainfoError::MissingField("name"))?
            .to_string();

        let total_length = dict
            .get(b"length".as_slice())
            .and_then(|v| v.as_integer())
            .ok_or(MetainfoError::MissingField("length"))? as u64;

        let piece_length = dict
            .get(b"piece length".as_slice())
            .and_then(|v| v.as_integer())
            .ok_or(MetainfoError::MissingField("piece length"))? as u64;

        let pieces_bytes = dict
            .get(b"pieces".as_slice())
            .and_then(|v| v.as_bytes())
            .ok_or(MetainfoError::MissingField("pieces"))?;

        if pieces_bytes.len() % 20 != 0 {
            return Err(MetainfoError::InvalidField("pieces"));
        }

        let pieces: Vec<[u8; 20]> = pieces_bytes
            .chunks_exact(20)
            .map(|chunk| {
                let mut arr = [0u8; 20];
                arr.copy_from_slice(chunk);
                arr
            })
            .collect();

        Ok(Self {
            name,
            piece_length,
            total_length,
            pieces,
        })
    }

    /// Number of pieces in the torrent.
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// Length of the piece at `index` in bytes.
    ///
    /// All pieces have `piece_length` except the last, whose length is
    /// `((total_length - 1) % piece_length) + 1`. The modulo form keeps a
    /// payload that is an exact multiple of the piece length from yielding
    /// a zero-length final piece.
    pub fn piece_size(&self, index: u32) -> u64 {
        if self.total_length == 0 {
            return 0;
        }
        if (index as usize) < self.pieces.len().saturating_sub(1) {
            self.piece_length
        } else {
            (self.total_length - 1) % self.piece_length + 1
        }
    }
}

/// Locates the byte range of the `info` value within a bencoded metainfo
/// dictionary by walking the top-level keys.
fn raw_info_span(data: &[u8]) -> Result<Range<usize>, MetainfoError> {
    if data.first() != Some(&b'd') {
        return Err(MetainfoError::InvalidField("root"));
    }

    let mut pos = 1;
    loop {
        if data.get(pos) == Some(&b'e') {
            return Err(MetainfoError::MissingField("info"));
        }

        let (key, key_len) = decode_prefix(&data[pos..])?;
        pos += key_len;

        let (_, value_len) = decode_prefix(&data[pos..])?;

        if key.as_bytes().map(|b| b.as_ref()) == Some(b"info".as_slice()) {
            return Ok(pos..pos + value_len);
        }
        pos += value_len;
    }
}
