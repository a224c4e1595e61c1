use std::collections::BTreeMap;

use bytes::Bytes;

use super::error::BencodeError;
use super::value::Value;

const MAX_DEPTH: usize = 64;

/// Decodes a single bencode value from a byte slice.
///
/// The input must contain exactly one complete value with no trailing data;
/// use [`decode_prefix`] when the value is followed by other bytes.
///
/// # Errors
///
/// Returns an error on truncated input, invalid syntax, nesting deeper than
/// 64 levels, or trailing data after the value.
///
/// # Examples
///
/// ```
/// use btget::bencode::decode;
///
/// let list = decode(b"l5:helloi52ee").unwrap();
/// assert_eq!(list.as_list().unwrap().len(), 2);
/// ```
pub fn decode(data: &[u8]) -> Result<Value, BencodeError> {
    let mut parser = Parser::new(data);
    let value = parser.parse_value(0)?;
    if parser.pos != data.len() {
        return Err(BencodeError::TrailingData);
    }
    Ok(value)
}

/// Decodes one bencode value from the front of a byte slice.
///
/// Returns the value together with the number of input bytes it occupied,
/// leaving any tail untouched. The extension protocol relies on this to
/// split a bencoded header from the raw payload that follows it.
///
/// # Examples
///
/// ```
/// use btget::bencode::decode_prefix;
///
/// let (value, consumed) = decode_prefix(b"i42etail").unwrap();
/// assert_eq!(value.as_integer(), Some(42));
/// assert_eq!(consumed, 4);
/// ```
pub fn decode_prefix(data: &[u8]) -> Result<(Value, usize), BencodeError> {
    let mut parser = Parser::new(data);
    let value = parser.parse_value(0)?;
    Ok((value, parser.pos))
}

/// Cursor over the input. Every parse method leaves `pos` just past the
/// bytes it consumed, which is what makes [`decode_prefix`]'s consumed
/// count fall out for free.
struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Consumes the next `n` bytes.
    fn take(&mut self, n: usize) -> Result<&'a [u8], BencodeError> {
        let rest = &self.input[self.pos..];
        if rest.len() < n {
            return Err(BencodeError::UnexpectedEof);
        }
        self.pos += n;
        Ok(&rest[..n])
    }

    /// Consumes bytes up to and including `delim`, returning what came
    /// before it.
    fn take_until(&mut self, delim: u8) -> Result<&'a [u8], BencodeError> {
        let rest = &self.input[self.pos..];
        let at = rest
            .iter()
            .position(|&b| b == delim)
            .ok_or(BencodeError::UnexpectedEof)?;
        self.pos += at + 1;
        Ok(&rest[..at])
    }

    /// Consumes a container's closing `e` if it is next.
    fn consume_end(&mut self) -> Result<bool, BencodeError> {
        match self.peek() {
            None => Err(BencodeError::UnexpectedEof),
            Some(b'e') => {
                self.pos += 1;
                Ok(true)
            }
            Some(_) => Ok(false),
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, BencodeError> {
        if depth > MAX_DEPTH {
            return Err(BencodeError::NestingTooDeep);
        }

        match self.peek() {
            None => Err(BencodeError::UnexpectedEof),
            Some(b'i') => {
                self.pos += 1;
                self.parse_integer()
            }
            Some(b'l') => {
                self.pos += 1;
                self.parse_list(depth)
            }
            Some(b'd') => {
                self.pos += 1;
                self.parse_dict(depth)
            }
            Some(b'0'..=b'9') => Ok(Value::Bytes(self.parse_string()?)),
            Some(c) => Err(BencodeError::UnexpectedChar(c as char)),
        }
    }

    fn parse_integer(&mut self) -> Result<Value, BencodeError> {
        let body = self.take_until(b'e')?;
        Ok(Value::Integer(parse_integer_body(body)?))
    }

    fn parse_string(&mut self) -> Result<Bytes, BencodeError> {
        let digits = self.take_until(b':')?;
        let len = parse_length(digits)?;
        let bytes = self.take(len)?;
        Ok(Bytes::copy_from_slice(bytes))
    }

    fn parse_list(&mut self, depth: usize) -> Result<Value, BencodeError> {
        let mut items = Vec::new();
        while !self.consume_end()? {
            items.push(self.parse_value(depth + 1)?);
        }
        Ok(Value::List(items))
    }

    fn parse_dict(&mut self, depth: usize) -> Result<Value, BencodeError> {
        let mut entries = BTreeMap::new();
        while !self.consume_end()? {
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(BencodeError::NonStringKey);
            }
            let key = self.parse_string()?;
            let value = self.parse_value(depth + 1)?;
            entries.insert(key, value);
        }
        Ok(Value::Dict(entries))
    }
}

/// Parses an integer body. `-0` and zero-padded forms are malformed per
/// BEP-3.
fn parse_integer_body(body: &[u8]) -> Result<i64, BencodeError> {
    let (negative, digits) = match body.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, body),
    };

    if digits.is_empty() {
        return Err(BencodeError::InvalidInteger("empty".into()));
    }
    if digits[0] == b'0' && (negative || digits.len() > 1) {
        return Err(BencodeError::InvalidInteger("leading zeros".into()));
    }

    let mut value: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(BencodeError::InvalidInteger("non-digit".into()));
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((b - b'0') as i64))
            .ok_or_else(|| BencodeError::InvalidInteger("overflow".into()))?;
    }

    Ok(if negative { -value } else { value })
}

/// Parses a byte string's decimal length prefix.
fn parse_length(digits: &[u8]) -> Result<usize, BencodeError> {
    if digits.is_empty() {
        return Err(BencodeError::InvalidStringLength);
    }

    let mut len: usize = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(BencodeError::InvalidStringLength);
        }
        len = len
            .checked_mul(10)
            .and_then(|l| l.checked_add((b - b'0') as usize))
            .ok_or(BencodeError::InvalidStringLength)?;
    }

    Ok(len)
}
