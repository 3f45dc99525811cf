//! Index and cursor configuration
//!
//! Both structs deserialize from JSON so they can sit next to a schema
//! template. Missing fields take their defaults.

use serde::{Deserialize, Serialize};

/// Configuration applied to every attribute index built by an
/// [`crate::index::IndexManager`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Bump the index generation on every insert, not only on removal.
    ///
    /// Appending never moves an existing slot, so by default position
    /// tokens survive inserts. Set this to invalidate them anyway.
    pub invalidate_on_insert: bool,
    /// Emit lifecycle events through the structured logger.
    pub log_events: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            invalidate_on_insert: false,
            log_events: true,
        }
    }
}

impl IndexConfig {
    /// Config with logging disabled.
    pub fn quiet() -> Self {
        Self {
            log_events: false,
            ..Self::default()
        }
    }

    /// Config that invalidates position tokens on any structural change.
    pub fn strict_generations() -> Self {
        Self {
            invalidate_on_insert: true,
            ..Self::default()
        }
    }
}

/// Per-cursor options. Also settable by name through `Cursor::prop_set`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorOptions {
    /// `find_inf` lands on the last duplicate of the floor key instead of the first.
    pub inf_last_dup: bool,
}

impl CursorOptions {
    /// Option name accepted by `Cursor::prop_set` for [`Self::inf_last_dup`].
    pub const INF_LAST_DUP: &'static str = "inf_last_dup";
}
