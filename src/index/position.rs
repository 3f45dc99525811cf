//! Position tokens
//!
//! A token captures a cursor's (key, duplicate index) together with the
//! identity and generation of the index it came from. Layout, little-endian:
//!
//! ```text
//! +------------------+
//! | Magic "AIDX"     | 4 bytes
//! | Version          | u8
//! | Index id         | 16 bytes
//! | Generation       | u64
//! | Dup index        | u32
//! | Key length       | u16
//! | Key bytes        | key length bytes
//! | Checksum         | u32, CRC32 over everything above
//! +------------------+
//! ```
//!
//! The text form is URL-safe base64 without padding.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use crc32fast::Hasher;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::btree::IndexId;
use super::errors::{IndexError, IndexResult};
use super::key::Key;

const MAGIC: &[u8; 4] = b"AIDX";
const VERSION: u8 = 1;
const HEADER_LEN: usize = 4 + 1 + 16 + 8 + 4 + 2;
const CHECKSUM_LEN: usize = 4;

/// Opaque, serializable cursor position.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PositionToken {
    bytes: Vec<u8>,
}

/// Decoded token contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TokenParts {
    pub index_id: IndexId,
    pub generation: u64,
    pub dup: usize,
    pub key: Key,
}

impl PositionToken {
    pub(crate) fn encode(
        index_id: IndexId,
        generation: u64,
        key: &Key,
        dup: usize,
    ) -> IndexResult<Self> {
        let dup = u32::try_from(dup)
            .map_err(|_| IndexError::invalid_position("duplicate index does not fit a token"))?;
        let key_len = u16::try_from(key.len())
            .map_err(|_| IndexError::invalid_position("key too long for a token"))?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + key.len() + CHECKSUM_LEN);
        bytes.extend_from_slice(MAGIC);
        bytes.push(VERSION);
        bytes.extend_from_slice(index_id.as_bytes());
        bytes.extend_from_slice(&generation.to_le_bytes());
        bytes.extend_from_slice(&dup.to_le_bytes());
        bytes.extend_from_slice(&key_len.to_le_bytes());
        bytes.extend_from_slice(key.as_bytes());
        let checksum = checksum(&bytes);
        bytes.extend_from_slice(&checksum.to_le_bytes());

        Ok(Self { bytes })
    }

    pub(crate) fn decode(&self) -> IndexResult<TokenParts> {
        let b = &self.bytes;
        if b.len() < HEADER_LEN + CHECKSUM_LEN {
            return Err(IndexError::invalid_position(format!(
                "token too short: {} bytes",
                b.len()
            )));
        }

        let (body, tail) = b.split_at(b.len() - CHECKSUM_LEN);
        let stored = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
        if checksum(body) != stored {
            return Err(IndexError::invalid_position("token checksum mismatch"));
        }
        if &body[0..4] != MAGIC {
            return Err(IndexError::invalid_position("not a position token"));
        }
        if body[4] != VERSION {
            return Err(IndexError::invalid_position(format!(
                "unsupported token version {}",
                body[4]
            )));
        }

        let mut id = [0u8; 16];
        id.copy_from_slice(&body[5..21]);
        let mut generation = [0u8; 8];
        generation.copy_from_slice(&body[21..29]);
        let dup = u32::from_le_bytes([body[29], body[30], body[31], body[32]]);
        let key_len = u16::from_le_bytes([body[33], body[34]]) as usize;

        let key_bytes = &body[HEADER_LEN..];
        if key_bytes.len() != key_len {
            return Err(IndexError::invalid_position(format!(
                "token key length {} does not match {} stored bytes",
                key_len,
                key_bytes.len()
            )));
        }

        Ok(TokenParts {
            index_id: IndexId::from_bytes(id),
            generation: u64::from_le_bytes(generation),
            dup: dup as usize,
            key: Key::from_encoded(key_bytes),
        })
    }

    /// Wrap raw token bytes. Validation happens when the token is restored.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn to_base64(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.bytes)
    }

    pub fn from_base64(text: &str) -> IndexResult<Self> {
        URL_SAFE_NO_PAD
            .decode(text.trim())
            .map(Self::from_bytes)
            .map_err(|e| IndexError::invalid_position(format!("token is not base64: {}", e)))
    }
}

fn checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

impl fmt::Debug for PositionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PositionToken({})", self.to_base64())
    }
}

impl fmt::Display for PositionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}

impl Serialize for PositionToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for PositionToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_base64(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexErrorCode;

    fn sample() -> (IndexId, Key) {
        (
            IndexId::from_bytes([7u8; 16]),
            Key::from_encoded(&[0x80, 0x00, 0x00, 0x32]),
        )
    }

    #[test]
    fn test_encode_decode() {
        let (id, key) = sample();
        let token = PositionToken::encode(id, 3, &key, 1).unwrap();
        assert_eq!(token.as_bytes().len(), HEADER_LEN + 4 + CHECKSUM_LEN);

        let parts = token.decode().unwrap();
        assert_eq!(parts.index_id, id);
        assert_eq!(parts.generation, 3);
        assert_eq!(parts.dup, 1);
        assert_eq!(parts.key, key);
    }

    #[test]
    fn test_flipped_bit_rejected() {
        let (id, key) = sample();
        let mut bytes = PositionToken::encode(id, 0, &key, 0).unwrap().into_bytes();
        bytes[HEADER_LEN] ^= 0x01;

        let err = PositionToken::from_bytes(bytes).decode().unwrap_err();
        assert_eq!(err.code(), IndexErrorCode::AeroInvalidPosition);
        assert!(err.message().contains("checksum"));
    }

    #[test]
    fn test_truncated_and_empty_rejected() {
        let (id, key) = sample();
        let bytes = PositionToken::encode(id, 0, &key, 0).unwrap().into_bytes();

        for len in [0, 3, HEADER_LEN, bytes.len() - 1] {
            let token = PositionToken::from_bytes(bytes[..len].to_vec());
            assert!(token.decode().is_err(), "length {} accepted", len);
        }
    }

    #[test]
    fn test_wrong_magic_with_valid_checksum_rejected() {
        let mut body = b"NOPE".to_vec();
        body.resize(HEADER_LEN, 0);
        let sum = checksum(&body);
        body.extend_from_slice(&sum.to_le_bytes());

        let err = PositionToken::from_bytes(body).decode().unwrap_err();
        assert!(err.message().contains("not a position token"));
    }

    #[test]
    fn test_base64_and_serde() {
        let (id, key) = sample();
        let token = PositionToken::encode(id, 9, &key, 2).unwrap();

        let text = token.to_base64();
        assert!(!text.contains('='));
        assert_eq!(PositionToken::from_base64(&text).unwrap(), token);

        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, format!("\"{}\"", text));
        let back: PositionToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);

        let err = PositionToken::from_base64("***").unwrap_err();
        assert_eq!(err.code(), IndexErrorCode::AeroInvalidPosition);
    }
}
