use super::value::Value;

/// Encodes a value to its canonical bencode form.
///
/// Dictionary keys are emitted in lexicographic byte order, so decoding a
/// well-formed input and re-encoding it reproduces the input exactly.
/// Appending to a byte buffer cannot fail, so the encoder is infallible.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    append_value(value, &mut out);
    out
}

fn append_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Integer(i) => {
            out.push(b'i');
            out.extend_from_slice(i.to_string().as_bytes());
            out.push(b'e');
        }
        Value::Bytes(bytes) => append_string(bytes, out),
        Value::List(items) => {
            out.push(b'l');
            for item in items {
                append_value(item, out);
            }
            out.push(b'e');
        }
        Value::Dict(entries) => {
            out.push(b'd');
            for (key, value) in entries {
                append_string(key, out);
                append_value(value, out);
            }
            out.push(b'e');
        }
    }
}

/// Byte strings and dictionary keys share the `<len>:<bytes>` form.
fn append_string(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(bytes.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(bytes);
}
