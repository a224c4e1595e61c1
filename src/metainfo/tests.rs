use super::*;

fn sample_metainfo(total_length: u64, piece_length: u64, piece_count: usize) -> Vec<u8> {
    let mut pieces = Vec::with_capacity(piece_count * 20);
    for i in 0..piece_count {
        pieces.extend_from_slice(&[i as u8; 20]);
    }

    let mut info = Vec::new();
    info.extend_from_slice(format!("d6:lengthi{}e", total_length).as_bytes());
    info.extend_from_slice(b"4:name8:test.bin");
    info.extend_from_slice(format!("12:piece lengthi{}e", piece_length).as_bytes());
    info.extend_from_slice(format!("6:pieces{}:", pieces.len()).as_bytes());
    info.extend_from_slice(&pieces);
    info.push(b'e');

    let mut data = Vec::new();
    data.extend_from_slice(b"d8:announce19:http://tracker.test");
    data.extend_from_slice(b"4:info");
    data.extend_from_slice(&info);
    data.push(b'e');
    data
}

#[test]
fn test_parse_metainfo() {
    let data = sample_metainfo(32773, 16384, 3);
    let torrent = Torrent::from_bytes(&data).unwrap();

    assert_eq!(torrent.announce, "http://tracker.test");
    assert_eq!(torrent.name.as_deref(), Some("test.bin"));

    let info = torrent.require_info().unwrap();
    assert_eq!(info.name, "test.bin");
    assert_eq!(info.total_length, 32773);
    assert_eq!(info.piece_length, 16384);
    assert_eq!(info.piece_count(), 3);
    assert_eq!(info.pieces[1], [1u8; 20]);
}

#[test]
fn test_info_hash_covers_exact_info_bytes() {
    let data = sample_metainfo(32773, 16384, 3);
    let torrent = Torrent::from_bytes(&data).unwrap();

    // The info value starts right after the "4:info" key and runs to the
    // byte before the root dictionary's closing 'e'.
    let start = data.windows(6).position(|w| w == b"4:info").unwrap() + 6;
    let info_slice = &data[start..data.len() - 1];

    assert_eq!(torrent.info_hash, InfoHash::from_info_bytes(info_slice));
}

#[test]
fn test_parse_metainfo_missing_fields() {
    assert!(matches!(
        Torrent::from_bytes(b"d4:infod4:name4:testee"),
        Err(MetainfoError::MissingField("announce"))
    ));
    assert!(matches!(
        Torrent::from_bytes(b"d8:announce4:http4:infodee"),
        Err(MetainfoError::MissingField(_))
    ));
}

#[test]
fn test_parse_metainfo_bad_pieces_length() {
    let mut data = Vec::new();
    data.extend_from_slice(b"d8:announce4:http4:info");
    data.extend_from_slice(b"d6:lengthi5e4:name1:a12:piece lengthi5e6:pieces3:abce");
    data.push(b'e');
    assert!(matches!(
        Torrent::from_bytes(&data),
        Err(MetainfoError::InvalidField("pieces"))
    ));
}

#[test]
fn test_piece_size_last_piece() {
    let data = sample_metainfo(32773, 16384, 3);
    let torrent = Torrent::from_bytes(&data).unwrap();
    let info = torrent.require_info().unwrap();

    assert_eq!(info.piece_size(0), 16384);
    assert_eq!(info.piece_size(1), 16384);
    assert_eq!(info.piece_size(2), 5);
}

#[test]
fn test_piece_size_exact_multiple() {
    // A payload that is an exact multiple of the piece length keeps a full
    // final piece instead of a zero-length one.
    let data = sample_metainfo(32768, 16384, 2);
    let torrent = Torrent::from_bytes(&data).unwrap();
    let info = torrent.require_info().unwrap();

    assert_eq!(info.piece_size(0), 16384);
    assert_eq!(info.piece_size(1), 16384);
}

#[test]
fn test_info_hash_hex_roundtrip() {
    let hex = "ad42ce8109f54c99613ce38f9b4d87e70f24a165";
    let hash = InfoHash::from_hex(hex).unwrap();
    assert_eq!(hash.to_hex(), hex);
    assert_eq!(hash.to_string(), hex);

    assert!(InfoHash::from_hex("abcd").is_err());
    assert!(InfoHash::from_hex("zz42ce8109f54c99613ce38f9b4d87e70f24a165").is_err());
}

#[test]
fn test_info_hash_url_encode() {
    let hash = InfoHash::from_bytes([0xaa; 20]);
    assert_eq!(hash.url_encode(), "%aa".repeat(20));
}

#[test]
fn test_magnet_link_parse() {
    let uri = "magnet:?xt=urn:btih:ad42ce8109f54c99613ce38f9b4d87e70f24a165&dn=magnet1.gif\
               &tr=http%3A%2F%2Fbittorrent-test-tracker.codecrafters.io%2Fannounce";
    let magnet = MagnetLink::parse(uri).unwrap();

    assert_eq!(
        magnet.info_hash.to_hex(),
        "ad42ce8109f54c99613ce38f9b4d87e70f24a165"
    );
    assert_eq!(magnet.display_name.as_deref(), Some("magnet1.gif"));
    assert_eq!(
        magnet.trackers,
        vec!["http://bittorrent-test-tracker.codecrafters.io/announce".to_string()]
    );
}

#[test]
fn test_magnet_link_ignores_unknown_params() {
    let uri = "magnet:?xt=urn:btih:ad42ce8109f54c99613ce38f9b4d87e70f24a165&x.pe=1.2.3.4:80&ws=http://seed";
    let magnet = MagnetLink::parse(uri).unwrap();
    assert!(magnet.trackers.is_empty());
    assert!(magnet.display_name.is_none());
}

#[test]
fn test_magnet_link_invalid() {
    assert!(MagnetLink::parse("http://not-a-magnet").is_err());
    assert!(MagnetLink::parse("magnet:?dn=no-xt").is_err());
    assert!(MagnetLink::parse("magnet:?xt=urn:btih:tooshort").is_err());
}

#[test]
fn test_torrent_from_magnet() {
    let uri = "magnet:?xt=urn:btih:ad42ce8109f54c99613ce38f9b4d87e70f24a165&dn=magnet1.gif\
               &tr=http%3A%2F%2Ftracker.test%2Fannounce";
    let magnet = MagnetLink::parse(uri).unwrap();
    let torrent = Torrent::from_magnet(&magnet).unwrap();

    assert_eq!(torrent.announce, "http://tracker.test/announce");
    assert_eq!(torrent.name.as_deref(), Some("magnet1.gif"));
    assert!(torrent.info.is_none());
    assert!(matches!(
        torrent.require_info(),
        Err(MetainfoError::MetadataMissing)
    ));
}

#[test]
fn test_torrent_from_magnet_requires_tracker() {
    let magnet = MagnetLink::parse("magnet:?xt=urn:btih:ad42ce8109f54c99613ce38f9b4d87e70f24a165")
        .unwrap();
    assert!(matches!(
        Torrent::from_magnet(&magnet),
        Err(MetainfoError::MissingField("tr"))
    ));
}

#[test]
fn test_attach_info_verifies_hash() {
    let data = sample_metainfo(32773, 16384, 3);
    let parsed = Torrent::from_bytes(&data).unwrap();

    let start = data.windows(6).position(|w| w == b"4:info").unwrap() + 6;
    let info_slice = &data[start..data.len() - 1];

    let mut torrent = Torrent {
        announce: "http://tracker.test".to_string(),
        info_hash: parsed.info_hash,
        name: None,
        info: None,
    };

    torrent.attach_info(info_slice).unwrap();
    assert_eq!(torrent.name.as_deref(), Some("test.bin"));
    assert_eq!(torrent.require_info().unwrap().piece_count(), 3);

    let mut wrong = Torrent {
        announce: "http://tracker.test".to_string(),
        info_hash: InfoHash::from_bytes([0u8; 20]),
        name: None,
        info: None,
    };
    assert!(matches!(
        wrong.attach_info(info_slice),
        Err(MetainfoError::InfoHashMismatch)
    ));
}
