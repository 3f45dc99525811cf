//! Observable index and cursor events.
//!
//! Events are explicit and typed. Hot-path operations (seeks, steps,
//! inserts) are counted in [`super::IndexMetrics`] instead of logged.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// An attribute index was created for a schema attribute
    IndexCreated,
    /// All indexes were rebuilt from the object store
    IndexRebuilt,
    /// A reference was removed from a duplicate chain
    EntryRemoved,
    /// A position token was restored on a cursor
    PositionRestored,
    /// A position token was rejected
    PositionRejected,
    /// A seek key did not match the index key spec
    SeekKeyRejected,
    /// A cursor option was not recognized
    OptionRejected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::IndexCreated => "INDEX_CREATED",
            Event::IndexRebuilt => "INDEX_REBUILT",
            Event::EntryRemoved => "INDEX_ENTRY_REMOVED",
            Event::PositionRestored => "CURSOR_POSITION_RESTORED",
            Event::PositionRejected => "CURSOR_POSITION_REJECTED",
            Event::SeekKeyRejected => "CURSOR_SEEK_KEY_REJECTED",
            Event::OptionRejected => "CURSOR_OPTION_REJECTED",
        }
    }

    /// Returns true if the event reports rejected caller input
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Event::PositionRejected | Event::SeekKeyRejected | Event::OptionRejected
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
