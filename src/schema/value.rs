//! Typed attribute values

use serde::{Deserialize, Serialize};

use super::types::AttrType;

/// One attribute value of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Float(f32),
    Double(f64),
    Timestamp(u64),
    /// Fixed-size opaque blob
    Struct(Vec<u8>),
}

impl Value {
    /// The attribute type this value belongs to
    pub fn attr_type(&self) -> AttrType {
        match self {
            Value::Int16(_) => AttrType::Int16,
            Value::Int32(_) => AttrType::Int32,
            Value::Int64(_) => AttrType::Int64,
            Value::Uint16(_) => AttrType::Uint16,
            Value::Uint32(_) => AttrType::Uint32,
            Value::Uint64(_) => AttrType::Uint64,
            Value::Float(_) => AttrType::Float,
            Value::Double(_) => AttrType::Double,
            Value::Timestamp(_) => AttrType::Timestamp,
            Value::Struct(_) => AttrType::Struct,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.attr_type().as_str()
    }

    /// Stored bytes, big-endian for numbers, verbatim for blobs.
    ///
    /// This is what a `MEMCMP` key compares.
    pub fn raw_bytes(&self) -> Vec<u8> {
        match self {
            Value::Int16(v) => v.to_be_bytes().to_vec(),
            Value::Int32(v) => v.to_be_bytes().to_vec(),
            Value::Int64(v) => v.to_be_bytes().to_vec(),
            Value::Uint16(v) => v.to_be_bytes().to_vec(),
            Value::Uint32(v) => v.to_be_bytes().to_vec(),
            Value::Uint64(v) | Value::Timestamp(v) => v.to_be_bytes().to_vec(),
            Value::Float(v) => v.to_be_bytes().to_vec(),
            Value::Double(v) => v.to_be_bytes().to_vec(),
            Value::Struct(bytes) => bytes.clone(),
        }
    }

    /// Width in bytes
    pub fn width(&self) -> usize {
        match self {
            Value::Struct(bytes) => bytes.len(),
            other => other.attr_type().fixed_width().unwrap_or(0),
        }
    }
}
