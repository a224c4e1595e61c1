use std::collections::BTreeMap;

use bytes::Bytes;

use super::*;

#[test]
fn test_decode_integer() {
    assert_eq!(decode(b"i42e").unwrap(), Value::Integer(42));
    assert_eq!(decode(b"i-42e").unwrap(), Value::Integer(-42));
    assert_eq!(decode(b"i0e").unwrap(), Value::Integer(0));
}

#[test]
fn test_decode_integer_invalid() {
    assert!(decode(b"i-0e").is_err());
    assert!(decode(b"i03e").is_err());
    assert!(decode(b"ie").is_err());
    assert!(decode(b"i42").is_err());
}

#[test]
fn test_decode_bytes() {
    assert_eq!(
        decode(b"4:spam").unwrap(),
        Value::Bytes(Bytes::from_static(b"spam"))
    );
    assert_eq!(decode(b"0:").unwrap(), Value::Bytes(Bytes::from_static(b"")));
}

#[test]
fn test_decode_bytes_truncated() {
    assert!(decode(b"10:short").is_err());
    assert!(decode(b"4spam").is_err());
}

#[test]
fn test_decode_list() {
    let result = decode(b"l5:helloi52ee").unwrap();
    match result {
        Value::List(l) => {
            assert_eq!(l.len(), 2);
            assert_eq!(l[0], Value::Bytes(Bytes::from_static(b"hello")));
            assert_eq!(l[1], Value::Integer(52));
        }
        _ => panic!("expected list"),
    }
}

#[test]
fn test_decode_dict() {
    let result = decode(b"d3:foo3:bar5:helloi52ee").unwrap();
    let dict = result.as_dict().unwrap();
    assert_eq!(dict.len(), 2);
    assert_eq!(
        dict.get(&Bytes::from_static(b"foo")),
        Some(&Value::Bytes(Bytes::from_static(b"bar")))
    );
    assert_eq!(
        dict.get(&Bytes::from_static(b"hello")),
        Some(&Value::Integer(52))
    );
}

#[test]
fn test_decode_dict_non_string_key() {
    assert!(decode(b"di1e3:fooe").is_err());
}

#[test]
fn test_decode_prefix_consumed() {
    let (_, consumed) = decode_prefix(b"d3:foo3:bar5:helloi52ee").unwrap();
    assert_eq!(consumed, 23);

    let (_, consumed) = decode_prefix(b"l5:helloi52ee").unwrap();
    assert_eq!(consumed, 13);

    let (value, consumed) = decode_prefix(b"5:helloXXX").unwrap();
    assert_eq!(value.as_str(), Some("hello"));
    assert_eq!(consumed, 7);
}

#[test]
fn test_decode_rejects_trailing_data() {
    assert!(decode(b"i42eextra").is_err());
    assert!(decode_prefix(b"i42eextra").is_ok());
}

#[test]
fn test_encode_integer() {
    assert_eq!(encode(&Value::Integer(42)), b"i42e");
    assert_eq!(encode(&Value::Integer(-42)), b"i-42e");
    assert_eq!(encode(&Value::Integer(0)), b"i0e");
}

#[test]
fn test_encode_bytes() {
    assert_eq!(encode(&Value::Bytes(Bytes::from_static(b"spam"))), b"4:spam");
    assert_eq!(encode(&Value::Bytes(Bytes::new())), b"0:");
}

#[test]
fn test_encode_empty_containers() {
    assert_eq!(encode(&Value::List(vec![])), b"le");
    assert_eq!(encode(&Value::Dict(BTreeMap::new())), b"de");
}

#[test]
fn test_encode_dict_sorted_keys() {
    let mut dict = BTreeMap::new();
    dict.insert(Bytes::from_static(b"zz"), Value::Integer(1));
    dict.insert(Bytes::from_static(b"aa"), Value::Integer(2));
    assert_eq!(encode(&Value::Dict(dict)), b"d2:aai2e2:zzi1ee");
}

#[test]
fn test_roundtrip() {
    // Keys already in lexicographic order round-trip byte for byte.
    let original: &[u8] =
        b"d8:announce15:http://test.com4:infod4:name4:test12:piece lengthi16384eee";
    let decoded = decode(original).unwrap();
    assert_eq!(encode(&decoded), original);
}

#[test]
fn test_nesting_limit() {
    let mut deep = Vec::new();
    deep.extend(std::iter::repeat_n(b'l', 100));
    deep.extend(std::iter::repeat_n(b'e', 100));
    assert!(matches!(decode(&deep), Err(BencodeError::NestingTooDeep)));
}
