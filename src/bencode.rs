//! Bencode encoding and decoding (BEP-3)
//!
//! Bencode is the serialization used by torrent metainfo files, tracker
//! responses, and the peer wire's extension payloads.

mod decode;
mod encode;
mod error;
mod value;

pub use decode::{decode, decode_prefix};
pub use encode::encode;
pub use error::BencodeError;
pub use value::Value;

#[cfg(test)]
mod tests;
