//! Attribute indexes and cursors
//!
//! One ordered index per indexed attribute. Each distinct key owns a
//! duplicate chain of object references in insertion order.
//!
//! # Invariants
//!
//! - Forward order is (key ascending, insertion order ascending); backward
//!   order is its exact reverse
//! - Chains are never empty and removal keeps survivors in order
//! - A position token restores only on the index instance and generation
//!   it was captured from
//!
//! # Usage
//!
//! ```ignore
//! let mut cursor = Cursor::new(manager.attr_index("i32")?, &store);
//! cursor.prop_set("inf_last_dup", true)?;
//! if cursor.find_inf(&key) {
//!     let token = cursor.get_pos()?;
//!     let history: Vec<Record> = cursor.iter(Direction::Reverse).collect();
//! }
//! ```

mod btree;
mod cursor;
mod errors;
mod iter;
mod key;
mod manager;
mod position;

pub use btree::{AttrIndex, IndexId};
pub use cursor::{Cursor, CursorState};
pub use errors::{IndexError, IndexErrorCode, IndexResult, Severity};
pub use iter::{CursorIter, Direction};
pub use key::{ComparatorKind, Key, KeySpec, KeyType};
pub use manager::IndexManager;
pub use position::PositionToken;
