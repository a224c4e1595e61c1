use super::error::MetainfoError;
use super::info_hash::InfoHash;

/// A parsed magnet link (BEP-9).
///
/// Magnet links carry a torrent's info hash and tracker URLs but no piece
/// data; the `info` dictionary is fetched from peers afterwards.
///
/// # Examples
///
/// ```
/// use btget::metainfo::MagnetLink;
///
/// let uri = "magnet:?xt=urn:btih:ad42ce8109f54c99613ce38f9b4d87e70f24a165\
///            &dn=magnet1.gif&tr=http%3A%2F%2Ftracker.example.com%2Fannounce";
/// let magnet = MagnetLink::parse(uri).unwrap();
///
/// assert_eq!(magnet.display_name.as_deref(), Some("magnet1.gif"));
/// assert_eq!(magnet.trackers[0], "http://tracker.example.com/announce");
/// ```
#[derive(Debug, Clone)]
pub struct MagnetLink {
    /// The torrent's info hash (required, from `xt`).
    pub info_hash: InfoHash,
    /// Suggested display name (from `dn`).
    pub display_name: Option<String>,
    /// Tracker URLs (from `tr`, may repeat).
    pub trackers: Vec<String>,
}

impl MagnetLink {
    /// Parses a magnet URI.
    ///
    /// `xt` must be `urn:btih:` followed by 40 hex characters. `dn` and
    /// `tr` are percent-decoded; unknown parameters are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MetainfoError::InvalidMagnetLink`] when the `magnet:?`
    /// prefix or the `xt` parameter is missing, or when the info hash is
    /// not 40 hex characters.
    pub fn parse(uri: &str) -> Result<Self, MetainfoError> {
        let query = uri
            .strip_prefix("magnet:?")
            .ok_or_else(|| MetainfoError::InvalidMagnetLink("missing magnet:? prefix".into()))?;

        let mut xt = None;
        let mut display_name = None;
        let mut trackers = Vec::new();

        for (key, value) in query.split('&').filter_map(|part| part.split_once('=')) {
            match key {
                "xt" if xt.is_none() => xt = Some(value),
                "dn" if display_name.is_none() => display_name = Some(percent_decode(value)),
                "tr" => trackers.push(percent_decode(value)),
                _ => {}
            }
        }

        let xt =
            xt.ok_or_else(|| MetainfoError::InvalidMagnetLink("missing xt parameter".into()))?;
        let hex = xt
            .strip_prefix("urn:btih:")
            .ok_or_else(|| MetainfoError::InvalidMagnetLink("unsupported xt format".into()))?;
        let info_hash = InfoHash::from_hex(hex)?;

        Ok(Self {
            info_hash,
            display_name,
            trackers,
        })
    }
}

/// Decodes `%xx` escapes and `+` as space. Malformed escapes pass through
/// untouched.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(bytes.len());

    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push((hi << 4 | lo) as char);
                i += 3;
                continue;
            }
        }
        out.push(if b == b'+' { ' ' } else { b as char });
        i += 1;
    }

    out
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
