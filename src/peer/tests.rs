use super::*;
use bytes::Bytes;

fn decode_frame(frame: Bytes) -> Message {
    // Message::decode takes the body after the 4-byte length prefix.
    Message::decode(frame.slice(4..)).unwrap()
}

#[test]
fn test_peer_id_generate() {
    let id1 = PeerId::generate();
    let id2 = PeerId::generate();
    assert_ne!(id1.0, id2.0);
    assert!(id1.0.starts_with(b"-BG0001-"));
    assert_eq!(id1.to_hex().len(), 40);
}

#[test]
fn test_handshake_layout_with_extensions() {
    let handshake = Handshake::new([0xAA; 20], [0xBB; 20], true);
    let encoded = handshake.encode();

    assert_eq!(encoded.len(), 68);
    assert_eq!(encoded[0], 0x13);
    assert_eq!(&encoded[1..20], b"BitTorrent protocol");
    assert_eq!(&encoded[20..28], &[0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00]);
    assert_eq!(&encoded[28..48], &[0xAA; 20]);
    assert_eq!(&encoded[48..68], &[0xBB; 20]);
}

#[test]
fn test_handshake_layout_without_extensions() {
    let handshake = Handshake::new([0xAA; 20], [0xBB; 20], false);
    let encoded = handshake.encode();
    assert_eq!(&encoded[20..28], &[0u8; 8]);
    assert!(!handshake.supports_extensions());
}

#[test]
fn test_handshake_roundtrip() {
    let handshake = Handshake::new([1u8; 20], [2u8; 20], true);
    let decoded = Handshake::decode(&handshake.encode()).unwrap();

    assert_eq!(decoded.info_hash, [1u8; 20]);
    assert_eq!(decoded.peer_id, [2u8; 20]);
    assert!(decoded.supports_extensions());
}

#[test]
fn test_handshake_decode_invalid() {
    assert!(Handshake::decode(&[0u8; 10]).is_err());

    let mut bad = Handshake::new([1u8; 20], [2u8; 20], false).encode().to_vec();
    bad[0] = 18;
    assert!(Handshake::decode(&bad).is_err());
}

#[test]
fn test_keepalive_encoding() {
    assert_eq!(Message::KeepAlive.encode().as_ref(), &[0, 0, 0, 0]);
    assert!(matches!(
        Message::decode(Bytes::new()).unwrap(),
        Message::KeepAlive
    ));
}

#[test]
fn test_request_wire_format() {
    let encoded = Message::Request {
        index: 1,
        begin: 16384,
        length: 16384,
    }
    .encode();

    assert_eq!(encoded.len(), 17);
    assert_eq!(&encoded[0..4], &[0, 0, 0, 13]);
    assert_eq!(encoded[4], 6);
    assert_eq!(&encoded[5..9], &[0, 0, 0, 1]);
    assert_eq!(&encoded[9..13], &[0, 0, 0x40, 0]);
    assert_eq!(&encoded[13..17], &[0, 0, 0x40, 0]);
}

#[test]
fn test_message_roundtrip() {
    let messages = vec![
        Message::Choke,
        Message::Unchoke,
        Message::Interested,
        Message::NotInterested,
        Message::Have { piece: 42 },
        Message::Bitfield(Bytes::from_static(&[0xF0, 0x01])),
        Message::Request {
            index: 1,
            begin: 0,
            length: 16384,
        },
        Message::Cancel {
            index: 1,
            begin: 0,
            length: 16384,
        },
        Message::Extended {
            id: 3,
            payload: Bytes::from_static(b"d1:ai1ee"),
        },
    ];

    for msg in messages {
        let id = msg.id();
        let decoded = decode_frame(msg.encode());
        assert_eq!(decoded.id(), id);
    }
}

#[test]
fn test_piece_message_roundtrip() {
    let data = Bytes::from_static(b"hello world");
    let encoded = Message::Piece {
        index: 3,
        begin: 16384,
        data: data.clone(),
    }
    .encode();

    match decode_frame(encoded) {
        Message::Piece {
            index,
            begin,
            data: decoded,
        } => {
            assert_eq!(index, 3);
            assert_eq!(begin, 16384);
            assert_eq!(decoded, data);
        }
        other => panic!("expected piece, got {:?}", other),
    }
}

#[test]
fn test_unknown_message_id() {
    let body = Bytes::from_static(&[99]);
    assert!(matches!(
        Message::decode(body),
        Err(PeerError::UnknownMessageId(99))
    ));
}

#[test]
fn test_truncated_message_payload() {
    assert!(Message::decode(Bytes::from_static(&[6, 0, 0])).is_err());
    assert!(Message::decode(Bytes::from_static(&[7, 0, 0, 0, 0])).is_err());
}

#[test]
fn test_bitfield() {
    let bf = Bitfield::from_bytes(Bytes::from_static(&[0x80, 0x01]));

    assert!(bf.has_piece(0));
    assert!(!bf.has_piece(1));
    assert!(bf.has_piece(15));
    assert!(!bf.has_piece(16));
    assert!(!bf.has_piece(1000));
    assert_eq!(bf.bit_len(), 16);
}

#[test]
fn test_extension_handshake_roundtrip() {
    let mut hs = ExtensionHandshake::with_extensions(&[("ut_metadata", 123)]);
    hs.metadata_size = Some(132);

    let encoded = hs.encode();
    let decoded = ExtensionHandshake::decode(&encoded).unwrap();

    assert_eq!(decoded.extension_id("ut_metadata"), Some(123));
    assert_eq!(decoded.extension_id("ut_pex"), None);
    assert_eq!(decoded.metadata_size, Some(132));
}

#[test]
fn test_extension_handshake_wire_shape() {
    let hs = ExtensionHandshake::with_extensions(&[("ut_metadata", 123)]);
    assert_eq!(hs.encode().as_ref(), b"d1:md11:ut_metadatai123eee");
}

#[test]
fn test_metadata_request_encoding() {
    let encoded = MetadataMessage::request(0).encode();
    assert_eq!(encoded.as_ref(), b"d8:msg_typei0e5:piecei0ee");
}

#[test]
fn test_metadata_data_decode_with_tail() {
    let mut payload = b"d8:msg_typei1e5:piecei0e10:total_sizei5ee".to_vec();
    payload.extend_from_slice(b"hello");

    let message = MetadataMessage::decode(&payload).unwrap();
    assert_eq!(message.msg_type, MetadataMessageType::Data);
    assert_eq!(message.piece, 0);
    assert_eq!(message.total_size, Some(5));
    assert_eq!(message.data.as_deref(), Some(b"hello".as_slice()));
}

#[test]
fn test_metadata_decode_bad_header() {
    assert!(matches!(
        MetadataMessage::decode(b"not bencode"),
        Err(PeerError::BadMetadataHeader(_))
    ));
    assert!(matches!(
        MetadataMessage::decode(b"d5:piecei0ee"),
        Err(PeerError::BadMetadataHeader(_))
    ));
}

#[tokio::test]
async fn test_transport_frames_over_tcp() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut transport = PeerTransport::new(stream);

        let theirs = transport.recv_handshake().await.unwrap();
        let reply = Handshake::new(theirs.info_hash, [9u8; 20], false);
        transport.send_handshake(&reply).await.unwrap();

        match transport.recv().await.unwrap() {
            Message::Request {
                index,
                begin,
                length,
            } => {
                assert_eq!((index, begin, length), (0, 0, 3));
            }
            other => panic!("expected request, got {:?}", other),
        }

        transport
            .send(&Message::Piece {
                index: 0,
                begin: 0,
                data: Bytes::from_static(b"abc"),
            })
            .await
            .unwrap();
    });

    let mut transport = PeerTransport::connect(addr).await.unwrap();
    transport
        .send_handshake(&Handshake::new([1u8; 20], [2u8; 20], false))
        .await
        .unwrap();
    let echoed = transport.recv_handshake().await.unwrap();
    assert_eq!(echoed.info_hash, [1u8; 20]);
    assert_eq!(echoed.peer_id, [9u8; 20]);

    transport
        .send(&Message::Request {
            index: 0,
            begin: 0,
            length: 3,
        })
        .await
        .unwrap();

    match transport.recv().await.unwrap() {
        Message::Piece { data, .. } => assert_eq!(data.as_ref(), b"abc"),
        other => panic!("expected piece, got {:?}", other),
    }

    server.await.unwrap();
}
