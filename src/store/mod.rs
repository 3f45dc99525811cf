//! Object store
//!
//! The store owns record storage. Indexes only hold [`ObjRef`]s and ask the
//! store to materialize a record when a cursor's `item()` is called.

mod memory;
mod record;

pub use memory::MemoryStore;
pub use record::{ObjRef, Record};

/// Resolves object references to records.
///
/// Returns `None` when the reference no longer names a live record.
pub trait ObjectStore {
    fn resolve(&self, obj: ObjRef) -> Option<Record>;
}

impl<S: ObjectStore + ?Sized> ObjectStore for &S {
    fn resolve(&self, obj: ObjRef) -> Option<Record> {
        (**self).resolve(obj)
    }
}
