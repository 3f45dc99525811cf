//! Schemas for the object store
//!
//! A schema lists fixed-width attributes and declares which of them are
//! indexed and with which key type. Index construction reads the key spec
//! of each indexed attribute exactly once.

mod errors;
mod loader;
mod types;
mod value;

pub use errors::{SchemaError, SchemaResult};
pub use loader::SchemaLoader;
pub use types::{AttrDef, AttrType, IndexDef, Schema};
pub use value::Value;
