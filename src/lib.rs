//! aeroidx - ordered attribute indexes for a schema-driven object store
//!
//! Each indexed attribute gets an ordered index with duplicate chains.
//! Cursors traverse an index in both directions, seek exact, floor and
//! ceiling keys, and capture positions as tokens that another cursor can
//! restore.

pub mod config;
pub mod index;
pub mod observability;
pub mod schema;
pub mod store;

pub use config::{CursorOptions, IndexConfig};
pub use index::{
    AttrIndex, Cursor, CursorIter, Direction, IndexError, IndexErrorCode, IndexManager,
    IndexResult, Key, KeySpec, KeyType, PositionToken,
};
pub use schema::{AttrDef, AttrType, Schema, SchemaError, Value};
pub use store::{MemoryStore, ObjRef, ObjectStore, Record};
