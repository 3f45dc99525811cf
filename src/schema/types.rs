//! Schema type definitions
//!
//! A schema is an ordered list of fixed-width attributes. An attribute's
//! position in the list is its attribute id, which is also the position of
//! its value inside a [`Record`].
//!
//! Templates are JSON:
//!
//! ```json
//! { "name": "test",
//!   "attrs": [
//!     { "name": "i32", "type": "INT32",
//!       "index": { "type": "BXTREE", "key": "INT32" } },
//!     { "name": "struct", "type": "STRUCT", "size": 16,
//!       "index": { "type": "BXTREE", "key": "MEMCMP" } } ] }
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};
use crate::index::{KeySpec, KeyType};
use crate::store::Record;

/// Attribute value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttrType {
    Int16,
    Int32,
    Int64,
    Uint16,
    Uint32,
    Uint64,
    Float,
    Double,
    Timestamp,
    /// Fixed-size blob; width given by the attribute's `size`
    Struct,
}

impl AttrType {
    /// Returns the type name
    pub fn as_str(&self) -> &'static str {
        match self {
            AttrType::Int16 => "INT16",
            AttrType::Int32 => "INT32",
            AttrType::Int64 => "INT64",
            AttrType::Uint16 => "UINT16",
            AttrType::Uint32 => "UINT32",
            AttrType::Uint64 => "UINT64",
            AttrType::Float => "FLOAT",
            AttrType::Double => "DOUBLE",
            AttrType::Timestamp => "TIMESTAMP",
            AttrType::Struct => "STRUCT",
        }
    }

    /// Natural width; `None` for `STRUCT`
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            AttrType::Int16 | AttrType::Uint16 => Some(2),
            AttrType::Int32 | AttrType::Uint32 | AttrType::Float => Some(4),
            AttrType::Int64 | AttrType::Uint64 | AttrType::Double | AttrType::Timestamp => {
                Some(8)
            }
            AttrType::Struct => None,
        }
    }

    /// The ordinal key type matching this attribute type
    pub fn ordinal_key(&self) -> Option<KeyType> {
        match self {
            AttrType::Int16 => Some(KeyType::Int16),
            AttrType::Int32 => Some(KeyType::Int32),
            AttrType::Int64 => Some(KeyType::Int64),
            AttrType::Uint16 => Some(KeyType::Uint16),
            AttrType::Uint32 => Some(KeyType::Uint32),
            AttrType::Uint64 => Some(KeyType::Uint64),
            AttrType::Float => Some(KeyType::Float),
            AttrType::Double => Some(KeyType::Double),
            AttrType::Timestamp => Some(KeyType::Timestamp),
            AttrType::Struct => None,
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_index_type() -> String {
    "BXTREE".to_string()
}

/// Index declaration on an attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    /// Index structure name. Informational only; every index is an
    /// ordered tree with duplicate chains.
    #[serde(rename = "type", default = "default_index_type")]
    pub index_type: String,
    /// Key type selecting the comparator
    pub key: KeyType,
    /// Free-form index arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
}

impl IndexDef {
    pub fn new(key: KeyType) -> Self {
        Self {
            index_type: default_index_type(),
            key,
            args: None,
        }
    }
}

/// Attribute definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrDef {
    pub name: String,
    #[serde(rename = "type")]
    pub attr_type: AttrType,
    /// Required for `STRUCT`; optional and checked otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexDef>,
}

impl AttrDef {
    /// Unindexed attribute of a fixed-width type
    pub fn new(name: impl Into<String>, attr_type: AttrType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            size: None,
            index: None,
        }
    }

    /// Unindexed `STRUCT` attribute of `size` bytes
    pub fn blob(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            attr_type: AttrType::Struct,
            size: Some(size),
            index: None,
        }
    }

    /// Add an index with the given key type
    pub fn indexed(mut self, key: KeyType) -> Self {
        self.index = Some(IndexDef::new(key));
        self
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    /// Width in bytes of every value of this attribute
    pub fn width(&self) -> Option<usize> {
        self.attr_type.fixed_width().or(self.size)
    }

    /// Key spec for this attribute's index, `None` if unindexed.
    pub fn key_spec(&self) -> SchemaResult<Option<KeySpec>> {
        let index = match &self.index {
            Some(index) => index,
            None => return Ok(None),
        };
        let width = self.width().ok_or_else(|| SchemaError::InvalidSize {
            attr: self.name.clone(),
            attr_type: self.attr_type,
            size: self.size,
        })?;

        if index.key != KeyType::Memcmp && self.attr_type.ordinal_key() != Some(index.key) {
            return Err(SchemaError::KeyTypeMismatch {
                attr: self.name.clone(),
                attr_type: self.attr_type,
                key_type: index.key,
            });
        }

        KeySpec::new(index.key, width)
            .map(Some)
            .map_err(|source| SchemaError::InvalidKey {
                attr: self.name.clone(),
                source,
            })
    }

    fn validate(&self, position: usize) -> SchemaResult<()> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::EmptyAttrName(position));
        }
        let size_ok = match (self.attr_type.fixed_width(), self.size) {
            (None, Some(size)) => size > 0,
            (None, None) => false,
            (Some(natural), Some(size)) => natural == size,
            (Some(_), None) => true,
        };
        if !size_ok {
            return Err(SchemaError::InvalidSize {
                attr: self.name.clone(),
                attr_type: self.attr_type,
                size: self.size,
            });
        }
        self.key_spec().map(|_| ())
    }
}

/// A validated schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub attrs: Vec<AttrDef>,
}

impl Schema {
    /// Build and validate a schema from attribute definitions.
    pub fn from_template(name: impl Into<String>, attrs: Vec<AttrDef>) -> SchemaResult<Self> {
        let schema = Self {
            name: name.into(),
            attrs,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Parse and validate a `{ "name": ..., "attrs": [...] }` template.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        let schema: Schema = serde_json::from_str(json).map_err(|e| SchemaError::Malformed {
            name: "<json>".to_string(),
            reason: e.to_string(),
        })?;
        schema.validate()?;
        Ok(schema)
    }

    /// Build from a bare attribute array, as produced by `serde_json::json!`.
    pub fn from_template_value(
        name: impl Into<String>,
        attrs: serde_json::Value,
    ) -> SchemaResult<Self> {
        let name = name.into();
        let attrs: Vec<AttrDef> =
            serde_json::from_value(attrs).map_err(|e| SchemaError::Malformed {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        Self::from_template(name, attrs)
    }

    fn validate(&self) -> SchemaResult<()> {
        let mut seen = HashSet::new();
        for (position, attr) in self.attrs.iter().enumerate() {
            attr.validate(position)?;
            if !seen.insert(attr.name.as_str()) {
                return Err(SchemaError::DuplicateAttr(attr.name.clone()));
            }
        }
        Ok(())
    }

    pub fn attr_count(&self) -> usize {
        self.attrs.len()
    }

    /// Attribute id for a name
    pub fn attr_id(&self, name: &str) -> SchemaResult<usize> {
        self.attrs
            .iter()
            .position(|a| a.name == name)
            .ok_or_else(|| SchemaError::UnknownAttr(name.to_string()))
    }

    pub fn attr(&self, name: &str) -> SchemaResult<&AttrDef> {
        self.attr_id(name).map(|id| &self.attrs[id])
    }

    /// `(attr_id, attr)` for every indexed attribute, in schema order
    pub fn indexed_attrs(&self) -> impl Iterator<Item = (usize, &AttrDef)> {
        self.attrs.iter().enumerate().filter(|(_, a)| a.is_indexed())
    }

    /// Check that a record matches this schema value by value.
    pub fn check_record(&self, record: &Record) -> SchemaResult<()> {
        if record.len() != self.attrs.len() {
            return Err(SchemaError::RecordArity {
                schema: self.name.clone(),
                expected: self.attrs.len(),
                actual: record.len(),
            });
        }
        for (attr, value) in self.attrs.iter().zip(record.values()) {
            let width_ok = attr.width() == Some(value.width());
            if value.attr_type() != attr.attr_type || !width_ok {
                return Err(SchemaError::ValueMismatch {
                    attr: attr.name.clone(),
                    expected: format!("{}({})", attr.attr_type, attr.width().unwrap_or(0)),
                    actual: format!("{}({})", value.type_name(), value.width()),
                });
            }
        }
        Ok(())
    }
}
