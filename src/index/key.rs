//! Index keys and comparators
//!
//! A [`Key`] is the fixed-width, order-preserving byte form of one
//! attribute value. Two comparator kinds exist:
//!
//! - Ordinal: numeric attributes. Integers are stored big-endian with the
//!   sign bit flipped, floats use the IEEE total-order transform, so byte
//!   order equals arithmetic order.
//! - Lexicographic (`MEMCMP`): opaque fixed-size blobs compared byte by byte.
//!
//! Both reduce to byte comparison of the encoded form, which is what lets
//! the index keep keys in a plain `BTreeMap`.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{IndexError, IndexResult};
use crate::schema::Value;

/// Key type named in an attribute's index definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
    Int16,
    Int32,
    Int64,
    Uint16,
    Uint32,
    Uint64,
    Float,
    Double,
    Timestamp,
    /// Raw byte comparison of the attribute's stored bytes
    Memcmp,
}

impl KeyType {
    /// Returns the key type name
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Int16 => "INT16",
            KeyType::Int32 => "INT32",
            KeyType::Int64 => "INT64",
            KeyType::Uint16 => "UINT16",
            KeyType::Uint32 => "UINT32",
            KeyType::Uint64 => "UINT64",
            KeyType::Float => "FLOAT",
            KeyType::Double => "DOUBLE",
            KeyType::Timestamp => "TIMESTAMP",
            KeyType::Memcmp => "MEMCMP",
        }
    }

    /// Width of ordinal key types. `None` for `MEMCMP`, whose width comes
    /// from the attribute.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            KeyType::Int16 | KeyType::Uint16 => Some(2),
            KeyType::Int32 | KeyType::Uint32 | KeyType::Float => Some(4),
            KeyType::Int64 | KeyType::Uint64 | KeyType::Double | KeyType::Timestamp => Some(8),
            KeyType::Memcmp => None,
        }
    }

    /// Comparator kind for this key type
    pub fn comparator_kind(&self) -> ComparatorKind {
        match self {
            KeyType::Memcmp => ComparatorKind::Lexicographic,
            _ => ComparatorKind::Ordinal,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How keys of an attribute are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparatorKind {
    /// Fixed-width numeric value, order-preserving encoding
    Ordinal,
    /// Fixed-size opaque blob, byte-wise order
    Lexicographic,
}

impl ComparatorKind {
    /// Total order over keys of one attribute.
    ///
    /// Ordinal keys are encoded so that byte order equals numeric order,
    /// so both kinds compare the encoded bytes.
    pub fn compare(&self, a: &Key, b: &Key) -> Ordering {
        a.as_bytes().cmp(b.as_bytes())
    }
}

/// Key type plus fixed width, as selected by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    key_type: KeyType,
    width: usize,
}

impl KeySpec {
    /// Build a key spec. Ordinal types must use their natural width;
    /// `MEMCMP` needs a non-zero width.
    pub fn new(key_type: KeyType, width: usize) -> IndexResult<Self> {
        match key_type.fixed_width() {
            Some(natural) if natural != width => {
                Err(IndexError::invalid_key_size(natural, width))
            }
            None if width == 0 => Err(IndexError::invalid_key("MEMCMP keys need a non-zero width")),
            _ => Ok(Self { key_type, width }),
        }
    }

    /// Spec for an ordinal key type at its natural width.
    pub fn ordinal(key_type: KeyType) -> IndexResult<Self> {
        let width = key_type
            .fixed_width()
            .ok_or_else(|| IndexError::invalid_key("MEMCMP is not an ordinal key type"))?;
        Self::new(key_type, width)
    }

    /// Spec for a lexicographic key of `width` bytes.
    pub fn memcmp(width: usize) -> IndexResult<Self> {
        Self::new(KeyType::Memcmp, width)
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn comparator_kind(&self) -> ComparatorKind {
        self.key_type.comparator_kind()
    }

    /// Wrap already-encoded key bytes.
    pub fn key_from_bytes(&self, bytes: &[u8]) -> IndexResult<Key> {
        if bytes.len() != self.width {
            return Err(IndexError::invalid_key_size(self.width, bytes.len()));
        }
        Ok(Key::from_encoded(bytes))
    }

    /// Encode an attribute value as a key.
    pub fn key_from_value(&self, value: &Value) -> IndexResult<Key> {
        let bytes = match (self.key_type, value) {
            (KeyType::Int16, Value::Int16(v)) => ordinal::encode_i16(*v).to_vec(),
            (KeyType::Int32, Value::Int32(v)) => ordinal::encode_i32(*v).to_vec(),
            (KeyType::Int64, Value::Int64(v)) => ordinal::encode_i64(*v).to_vec(),
            (KeyType::Uint16, Value::Uint16(v)) => v.to_be_bytes().to_vec(),
            (KeyType::Uint32, Value::Uint32(v)) => v.to_be_bytes().to_vec(),
            (KeyType::Uint64, Value::Uint64(v)) => v.to_be_bytes().to_vec(),
            (KeyType::Timestamp, Value::Timestamp(v)) => v.to_be_bytes().to_vec(),
            (KeyType::Float, Value::Float(v)) => ordinal::encode_f32(*v).to_vec(),
            (KeyType::Double, Value::Double(v)) => ordinal::encode_f64(*v).to_vec(),
            (KeyType::Memcmp, v) => v.raw_bytes(),
            (key_type, v) => {
                return Err(IndexError::invalid_key(format!(
                    "{} value cannot form a {} key",
                    v.type_name(),
                    key_type
                )))
            }
        };
        self.key_from_bytes(&bytes)
    }

    /// Human-readable form: decoded number for ordinal keys, upper-case
    /// hex for `MEMCMP`.
    pub fn render(&self, key: &Key) -> String {
        let b = key.as_bytes();
        if b.len() != self.width {
            return key.to_hex();
        }
        match self.key_type {
            KeyType::Int16 => ordinal::decode_i16(b).to_string(),
            KeyType::Int32 => ordinal::decode_i32(b).to_string(),
            KeyType::Int64 => ordinal::decode_i64(b).to_string(),
            KeyType::Uint16 => u16::from_be_bytes([b[0], b[1]]).to_string(),
            KeyType::Uint32 => u32::from_be_bytes([b[0], b[1], b[2], b[3]]).to_string(),
            KeyType::Uint64 | KeyType::Timestamp => ordinal::be_u64(b).to_string(),
            KeyType::Float => ordinal::decode_f32(b).to_string(),
            KeyType::Double => ordinal::decode_f64(b).to_string(),
            KeyType::Memcmp => key.to_hex(),
        }
    }

    /// Parse the form produced by [`Self::render`].
    pub fn parse(&self, text: &str) -> IndexResult<Key> {
        let text = text.trim();
        let bad = |_| IndexError::invalid_key(format!("'{}' is not a valid {} key", text, self.key_type));
        let value = match self.key_type {
            KeyType::Int16 => Value::Int16(text.parse().map_err(bad)?),
            KeyType::Int32 => Value::Int32(text.parse().map_err(bad)?),
            KeyType::Int64 => Value::Int64(text.parse().map_err(bad)?),
            KeyType::Uint16 => Value::Uint16(text.parse().map_err(bad)?),
            KeyType::Uint32 => Value::Uint32(text.parse().map_err(bad)?),
            KeyType::Uint64 => Value::Uint64(text.parse().map_err(bad)?),
            KeyType::Timestamp => Value::Timestamp(text.parse().map_err(bad)?),
            KeyType::Float => {
                let v: f32 = text
                    .parse()
                    .map_err(|_| IndexError::invalid_key(format!("'{}' is not a valid FLOAT key", text)))?;
                Value::Float(v)
            }
            KeyType::Double => {
                let v: f64 = text
                    .parse()
                    .map_err(|_| IndexError::invalid_key(format!("'{}' is not a valid DOUBLE key", text)))?;
                Value::Double(v)
            }
            KeyType::Memcmp => return self.key_from_bytes(&Key::from_hex(text)?.bytes),
        };
        self.key_from_value(&value)
    }
}

/// Encoded key bytes.
///
/// Keys are only meaningful relative to the [`KeySpec`] that produced
/// them; the derived `Ord` is the byte order both comparator kinds use.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    bytes: Box<[u8]>,
}

impl Key {
    pub(crate) fn from_encoded(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Upper-case hex, two digits per byte
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.bytes.len() * 2);
        for b in self.bytes.iter() {
            out.push_str(&format!("{:02X}", b));
        }
        out
    }

    /// Parse upper- or lower-case hex. Width is checked by the caller's spec.
    pub fn from_hex(text: &str) -> IndexResult<Self> {
        if text.len() % 2 != 0 {
            return Err(IndexError::invalid_key("hex key needs an even number of digits"));
        }
        let bytes = (0..text.len())
            .step_by(2)
            .map(|i| {
                text.get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| IndexError::invalid_key(format!("'{}' is not valid hex", text)))
            })
            .collect::<IndexResult<Vec<u8>>>()?;
        Ok(Self::from_encoded(&bytes))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Order-preserving encodings for ordinal keys.
mod ordinal {
    pub fn encode_i16(v: i16) -> [u8; 2] {
        ((v as u16) ^ 0x8000).to_be_bytes()
    }

    pub fn encode_i32(v: i32) -> [u8; 4] {
        ((v as u32) ^ 0x8000_0000).to_be_bytes()
    }

    pub fn encode_i64(v: i64) -> [u8; 8] {
        ((v as u64) ^ (1 << 63)).to_be_bytes()
    }

    // Negative: flip all bits. Positive: flip the sign bit.
    pub fn encode_f32(v: f32) -> [u8; 4] {
        let bits = v.to_bits();
        let ordered = if (bits >> 31) == 1 { !bits } else { bits ^ (1 << 31) };
        ordered.to_be_bytes()
    }

    pub fn encode_f64(v: f64) -> [u8; 8] {
        let bits = v.to_bits();
        let ordered = if (bits >> 63) == 1 { !bits } else { bits ^ (1 << 63) };
        ordered.to_be_bytes()
    }

    pub fn be_u64(b: &[u8]) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&b[..8]);
        u64::from_be_bytes(buf)
    }

    fn be_u32(b: &[u8]) -> u32 {
        u32::from_be_bytes([b[0], b[1], b[2], b[3]])
    }

    pub fn decode_i16(b: &[u8]) -> i16 {
        (u16::from_be_bytes([b[0], b[1]]) ^ 0x8000) as i16
    }

    pub fn decode_i32(b: &[u8]) -> i32 {
        (be_u32(b) ^ 0x8000_0000) as i32
    }

    pub fn decode_i64(b: &[u8]) -> i64 {
        (be_u64(b) ^ (1 << 63)) as i64
    }

    pub fn decode_f32(b: &[u8]) -> f32 {
        let ordered = be_u32(b);
        let bits = if (ordered >> 31) == 1 { ordered ^ (1 << 31) } else { !ordered };
        f32::from_bits(bits)
    }

    pub fn decode_f64(b: &[u8]) -> f64 {
        let ordered = be_u64(b);
        let bits = if (ordered >> 63) == 1 { ordered ^ (1 << 63) } else { !ordered };
        f64::from_bits(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexErrorCode;

    fn int32(v: i32) -> Key {
        KeySpec::ordinal(KeyType::Int32)
            .unwrap()
            .key_from_value(&Value::Int32(v))
            .unwrap()
    }

    #[test]
    fn test_signed_ordering_matches_arithmetic() {
        let values = [i32::MIN, -500, -1, 0, 1, 55, 490, i32::MAX];
        for pair in values.windows(2) {
            assert!(int32(pair[0]) < int32(pair[1]), "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_int64_and_int16_ordering() {
        let spec = KeySpec::ordinal(KeyType::Int64).unwrap();
        let a = spec.key_from_value(&Value::Int64(-3)).unwrap();
        let b = spec.key_from_value(&Value::Int64(2)).unwrap();
        assert!(a < b);

        let spec = KeySpec::ordinal(KeyType::Int16).unwrap();
        let a = spec.key_from_value(&Value::Int16(i16::MIN)).unwrap();
        let b = spec.key_from_value(&Value::Int16(-1)).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_float_ordering() {
        let spec = KeySpec::ordinal(KeyType::Double).unwrap();
        let values = [f64::NEG_INFINITY, -2.5, -0.0, 0.0, 1e-9, 3.25, f64::INFINITY];
        let keys: Vec<Key> = values
            .iter()
            .map(|v| spec.key_from_value(&Value::Double(*v)).unwrap())
            .collect();
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1]);
        }

        let spec = KeySpec::ordinal(KeyType::Float).unwrap();
        let a = spec.key_from_value(&Value::Float(-1.5)).unwrap();
        let b = spec.key_from_value(&Value::Float(0.5)).unwrap();
        assert_eq!(ComparatorKind::Ordinal.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_memcmp_is_bytewise() {
        let spec = KeySpec::memcmp(4).unwrap();
        let a = spec.key_from_bytes(&[0x00, 0xFF, 0xFF, 0xFF]).unwrap();
        let b = spec.key_from_bytes(&[0x01, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(spec.comparator_kind(), ComparatorKind::Lexicographic);
        assert_eq!(ComparatorKind::Lexicographic.compare(&a, &b), Ordering::Less);
        assert_eq!(ComparatorKind::Lexicographic.compare(&b, &b), Ordering::Equal);
    }

    #[test]
    fn test_invalid_key_size() {
        let spec = KeySpec::memcmp(16).unwrap();
        let err = spec.key_from_bytes(&[0u8; 15]).unwrap_err();
        assert_eq!(err.code(), IndexErrorCode::AeroInvalidKeySize);

        let err = spec.key_from_value(&Value::Struct(vec![1, 2, 3])).unwrap_err();
        assert_eq!(err.code(), IndexErrorCode::AeroInvalidKeySize);

        let err = KeySpec::new(KeyType::Int32, 8).unwrap_err();
        assert_eq!(err.code(), IndexErrorCode::AeroInvalidKeySize);
        assert!(KeySpec::memcmp(0).is_err());
    }

    #[test]
    fn test_value_type_mismatch_rejected() {
        let spec = KeySpec::ordinal(KeyType::Int32).unwrap();
        let err = spec.key_from_value(&Value::Int64(5)).unwrap_err();
        assert_eq!(err.code(), IndexErrorCode::AeroInvalidKeySize);
        assert!(err.message().contains("INT32"));
    }

    #[test]
    fn test_render_and_parse() {
        let spec = KeySpec::ordinal(KeyType::Int32).unwrap();
        let key = spec.key_from_value(&Value::Int32(-42)).unwrap();
        assert_eq!(spec.render(&key), "-42");
        assert_eq!(spec.parse(" -42 ").unwrap(), key);
        assert!(spec.parse("forty-two").is_err());

        let spec = KeySpec::memcmp(2).unwrap();
        let key = spec.key_from_bytes(&[0x0A, 0xFF]).unwrap();
        assert_eq!(spec.render(&key), "0AFF");
        assert_eq!(spec.parse("0aff").unwrap(), key);
        assert!(spec.parse("0AF").is_err());
        assert!(spec.parse("0AFF00").is_err());
    }

    #[test]
    fn test_key_type_serde_names() {
        let t: KeyType = serde_json::from_str("\"UINT64\"").unwrap();
        assert_eq!(t, KeyType::Uint64);
        let t: KeyType = serde_json::from_str("\"MEMCMP\"").unwrap();
        assert_eq!(t.comparator_kind(), ComparatorKind::Lexicographic);
        assert_eq!(t.fixed_width(), None);
    }
}
