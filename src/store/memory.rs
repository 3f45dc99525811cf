//! In-memory object store
//!
//! Slots are allocated sequentially and never reused, so a deleted
//! reference stays unresolvable instead of aliasing a newer record.

use std::sync::atomic::{AtomicU64, Ordering};

use super::record::{ObjRef, Record};
use super::ObjectStore;

/// Vector-backed object store
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Vec<Option<Record>>,
    live: usize,
    resolves: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record and return its reference.
    pub fn alloc(&mut self, record: Record) -> ObjRef {
        let obj = ObjRef(self.slots.len() as u64);
        self.slots.push(Some(record));
        self.live += 1;
        obj
    }

    /// Release a record. Returns false if it was already gone.
    pub fn delete(&mut self, obj: ObjRef) -> bool {
        let released = self
            .slots
            .get_mut(obj.0 as usize)
            .and_then(Option::take)
            .is_some();
        if released {
            self.live -= 1;
        }
        released
    }

    /// Live record count
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// References of all live records in allocation order
    pub fn refs(&self) -> Vec<ObjRef> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| ObjRef(i as u64))
            .collect()
    }

    /// Number of `resolve` calls served so far
    pub fn resolve_count(&self) -> u64 {
        self.resolves.load(Ordering::Relaxed)
    }
}

impl ObjectStore for MemoryStore {
    fn resolve(&self, obj: ObjRef) -> Option<Record> {
        self.resolves.fetch_add(1, Ordering::Relaxed);
        self.slots.get(obj.0 as usize).and_then(|slot| slot.clone())
    }
}
