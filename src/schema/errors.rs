//! Schema errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::types::AttrType;
use crate::index::{IndexError, KeyType};

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema definition and record validation errors
#[derive(Debug, Error)]
pub enum SchemaError {
    // ==================
    // Template Errors
    // ==================
    /// Template could not be parsed
    #[error("Malformed schema template {name}: {reason}")]
    Malformed { name: String, reason: String },

    /// Attribute without a name
    #[error("Attribute at position {0} has an empty name")]
    EmptyAttrName(usize),

    /// Two attributes share a name
    #[error("Duplicate attribute name: {0}")]
    DuplicateAttr(String),

    /// Declared size does not fit the attribute type
    #[error("Attribute {attr} of type {attr_type} has invalid size {size:?}")]
    InvalidSize {
        attr: String,
        attr_type: AttrType,
        size: Option<usize>,
    },

    /// Ordinal key type does not match the attribute type
    #[error("Attribute {attr} of type {attr_type} cannot use {key_type} keys")]
    KeyTypeMismatch {
        attr: String,
        attr_type: AttrType,
        key_type: KeyType,
    },

    /// Key spec could not be formed
    #[error("Attribute {attr} has an invalid key: {source}")]
    InvalidKey {
        attr: String,
        #[source]
        source: IndexError,
    },

    // ==================
    // Lookup Errors
    // ==================
    /// No attribute with this name
    #[error("Unknown attribute: {0}")]
    UnknownAttr(String),

    /// Attribute exists but is not indexed
    #[error("Attribute {0} is not indexed")]
    NotIndexed(String),

    // ==================
    // Record Errors
    // ==================
    /// Record has the wrong number of values
    #[error("Record has {actual} values, schema {schema} has {expected} attributes")]
    RecordArity {
        schema: String,
        expected: usize,
        actual: usize,
    },

    /// Record value has the wrong type or width
    #[error("Attribute {attr} expects {expected}, got {actual}")]
    ValueMismatch {
        attr: String,
        expected: String,
        actual: String,
    },

    // ==================
    // I/O Errors
    // ==================
    /// Template file could not be read
    #[error("Failed to read schema file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
