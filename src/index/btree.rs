//! Ordered attribute index with duplicate chains
//!
//! `BTreeMap<Key, Vec<ObjRef>>`: keys ascending, each key owning a
//! duplicate chain in insertion order. Forward iteration order is
//! (key ascending, chain position ascending). Chains are never empty;
//! removing the last reference drops the key.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

use uuid::Uuid;

use super::errors::{IndexError, IndexResult};
use super::key::{Key, KeySpec};
use crate::config::IndexConfig;
use crate::observability::{log_event, Event, IndexMetrics};
use crate::schema::Value;
use crate::store::ObjRef;

/// Identity of one attribute index instance. Position tokens carry it so a
/// token from another index is never restored by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexId(Uuid);

impl IndexId {
    fn generate() -> Self {
        IndexId(Uuid::new_v4())
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        IndexId(Uuid::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Secondary index over one attribute.
#[derive(Debug)]
pub struct AttrIndex {
    name: String,
    spec: KeySpec,
    id: IndexId,
    /// Bumped whenever an existing (key, dup) slot may have moved
    generation: u64,
    config: IndexConfig,
    tree: BTreeMap<Key, Vec<ObjRef>>,
    entries: usize,
    metrics: IndexMetrics,
}

impl AttrIndex {
    /// Create an empty index with the default config.
    pub fn new(name: impl Into<String>, spec: KeySpec) -> Self {
        Self::with_config(name, spec, IndexConfig::default())
    }

    pub fn with_config(name: impl Into<String>, spec: KeySpec, config: IndexConfig) -> Self {
        let index = Self {
            name: name.into(),
            spec,
            id: IndexId::generate(),
            generation: 0,
            config,
            tree: BTreeMap::new(),
            entries: 0,
            metrics: IndexMetrics::new(),
        };
        if index.config.log_events {
            log_event(
                Event::IndexCreated,
                &[
                    ("attr", index.name.as_str()),
                    ("index_id", index.id.to_string().as_str()),
                    ("key_type", index.spec.key_type().as_str()),
                    ("width", index.spec.width().to_string().as_str()),
                ],
            );
        }
        index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_spec(&self) -> &KeySpec {
        &self.spec
    }

    pub fn id(&self) -> IndexId {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn metrics(&self) -> &IndexMetrics {
        &self.metrics
    }

    /// Append `obj` to the duplicate chain of `key`, creating the entry if
    /// absent.
    pub fn insert(&mut self, key: Key, obj: ObjRef) -> IndexResult<()> {
        self.check_key(&key)?;
        self.tree.entry(key).or_default().push(obj);
        self.entries += 1;
        if self.config.invalidate_on_insert {
            self.generation += 1;
        }
        self.metrics.increment_inserts();
        Ok(())
    }

    /// Encode `value` under this index's key spec and insert it.
    pub fn insert_value(&mut self, value: &Value, obj: ObjRef) -> IndexResult<()> {
        let key = self.spec.key_from_value(value)?;
        self.insert(key, obj)
    }

    /// Remove the first occurrence of `obj` from the chain of `key`.
    ///
    /// Survivors keep their relative order. Returns false if the pair was
    /// not present.
    pub fn remove(&mut self, key: &Key, obj: ObjRef) -> bool {
        let chain = match self.tree.get_mut(key) {
            Some(chain) => chain,
            None => return false,
        };
        let pos = match chain.iter().position(|o| *o == obj) {
            Some(pos) => pos,
            None => return false,
        };
        chain.remove(pos);
        if chain.is_empty() {
            self.tree.remove(key);
        }
        self.entries -= 1;
        self.generation += 1;
        self.metrics.increment_removals();

        if self.config.log_events {
            log_event(
                Event::EntryRemoved,
                &[
                    ("attr", self.name.as_str()),
                    ("generation", self.generation.to_string().as_str()),
                    ("key", self.spec.render(key).as_str()),
                    ("obj", obj.to_string().as_str()),
                ],
            );
        }
        true
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        if !self.tree.is_empty() {
            self.generation += 1;
        }
        self.tree.clear();
        self.entries = 0;
    }

    /// Number of distinct keys
    pub fn key_count(&self) -> usize {
        self.tree.len()
    }

    /// Number of references across all chains
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Duplicate chain for an exact key, in insertion order.
    pub fn lookup_eq(&self, key: &Key) -> &[ObjRef] {
        self.chain(key).unwrap_or(&[])
    }

    /// All (key, reference) pairs in forward index order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&Key, ObjRef)> + '_ {
        self.tree
            .iter()
            .flat_map(|(key, chain)| chain.iter().map(move |obj| (key, *obj)))
    }

    pub(crate) fn check_key(&self, key: &Key) -> IndexResult<()> {
        if key.len() != self.spec.width() {
            return Err(IndexError::invalid_key_size(self.spec.width(), key.len()));
        }
        Ok(())
    }

    pub(crate) fn chain(&self, key: &Key) -> Option<&[ObjRef]> {
        self.tree.get(key).map(Vec::as_slice)
    }

    pub(crate) fn first(&self) -> Option<(&Key, &[ObjRef])> {
        self.tree.iter().next().map(as_entry)
    }

    pub(crate) fn last(&self) -> Option<(&Key, &[ObjRef])> {
        self.tree.iter().next_back().map(as_entry)
    }

    /// Smallest key strictly greater than `key`
    pub(crate) fn next_after(&self, key: &Key) -> Option<(&Key, &[ObjRef])> {
        self.tree
            .range((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(as_entry)
    }

    /// Greatest key strictly less than `key`
    pub(crate) fn prev_before(&self, key: &Key) -> Option<(&Key, &[ObjRef])> {
        self.tree.range(..key).next_back().map(as_entry)
    }

    /// Greatest key <= `key`
    pub(crate) fn floor(&self, key: &Key) -> Option<(&Key, &[ObjRef])> {
        self.tree.range(..=key).next_back().map(as_entry)
    }

    /// Smallest key >= `key`
    pub(crate) fn ceiling(&self, key: &Key) -> Option<(&Key, &[ObjRef])> {
        self.tree.range(key..).next().map(as_entry)
    }
}

fn as_entry<'a>((key, chain): (&'a Key, &'a Vec<ObjRef>)) -> (&'a Key, &'a [ObjRef]) {
    (key, chain.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexErrorCode, KeyType};

    fn index() -> AttrIndex {
        AttrIndex::with_config(
            "i32",
            KeySpec::ordinal(KeyType::Int32).unwrap(),
            IndexConfig::quiet(),
        )
    }

    fn key(idx: &AttrIndex, v: i32) -> Key {
        idx.key_spec().key_from_value(&Value::Int32(v)).unwrap()
    }

    #[test]
    fn test_duplicates_keep_insertion_order() {
        let mut idx = index();
        let k = key(&idx, 42);
        idx.insert(k.clone(), ObjRef(300)).unwrap();
        idx.insert(k.clone(), ObjRef(100)).unwrap();
        idx.insert(k.clone(), ObjRef(200)).unwrap();

        assert_eq!(idx.lookup_eq(&k), &[ObjRef(300), ObjRef(100), ObjRef(200)]);
        assert_eq!(idx.key_count(), 1);
        assert_eq!(idx.entry_count(), 3);
    }

    #[test]
    fn test_iteration_is_key_then_insertion_order() {
        let mut idx = index();
        idx.insert_value(&Value::Int32(20), ObjRef(1)).unwrap();
        idx.insert_value(&Value::Int32(-5), ObjRef(2)).unwrap();
        idx.insert_value(&Value::Int32(20), ObjRef(3)).unwrap();
        idx.insert_value(&Value::Int32(10), ObjRef(4)).unwrap();

        let order: Vec<ObjRef> = idx.iter().map(|(_, o)| o).collect();
        assert_eq!(order, vec![ObjRef(2), ObjRef(4), ObjRef(1), ObjRef(3)]);

        let reversed: Vec<ObjRef> = idx.iter().rev().map(|(_, o)| o).collect();
        assert_eq!(reversed, vec![ObjRef(3), ObjRef(1), ObjRef(4), ObjRef(2)]);
    }

    #[test]
    fn test_insert_rejects_wrong_width() {
        let mut idx = index();
        let wide = KeySpec::ordinal(KeyType::Int64)
            .unwrap()
            .key_from_value(&Value::Int64(1))
            .unwrap();
        let err = idx.insert(wide, ObjRef(1)).unwrap_err();
        assert_eq!(err.code(), IndexErrorCode::AeroInvalidKeySize);
        assert!(idx.is_empty());
    }

    #[test]
    fn test_remove_preserves_survivor_order() {
        let mut idx = index();
        let k = key(&idx, 7);
        for o in 1..=4 {
            idx.insert(k.clone(), ObjRef(o)).unwrap();
        }
        let generation = idx.generation();

        assert!(idx.remove(&k, ObjRef(2)));
        assert_eq!(idx.lookup_eq(&k), &[ObjRef(1), ObjRef(3), ObjRef(4)]);
        assert!(idx.generation() > generation);

        assert!(!idx.remove(&k, ObjRef(2)));
        assert!(!idx.remove(&key(&idx, 8), ObjRef(1)));
    }

    #[test]
    fn test_remove_last_drops_key() {
        let mut idx = index();
        let k = key(&idx, 1);
        idx.insert(k.clone(), ObjRef(9)).unwrap();
        assert!(idx.remove(&k, ObjRef(9)));
        assert_eq!(idx.key_count(), 0);
        assert_eq!(idx.entry_count(), 0);
        assert!(idx.first().is_none());
    }

    #[test]
    fn test_generation_on_insert_is_configurable() {
        let mut idx = index();
        idx.insert_value(&Value::Int32(1), ObjRef(1)).unwrap();
        assert_eq!(idx.generation(), 0);

        let mut strict = AttrIndex::with_config(
            "i32",
            KeySpec::ordinal(KeyType::Int32).unwrap(),
            IndexConfig {
                log_events: false,
                ..IndexConfig::strict_generations()
            },
        );
        strict.insert_value(&Value::Int32(1), ObjRef(1)).unwrap();
        assert_eq!(strict.generation(), 1);
    }

    #[test]
    fn test_neighbour_lookups() {
        let mut idx = index();
        for v in [10, 20, 30] {
            idx.insert_value(&Value::Int32(v), ObjRef(v as u64)).unwrap();
        }
        let k = |v| key(&idx, v);

        assert_eq!(idx.floor(&k(25)).unwrap().0, &k(20));
        assert_eq!(idx.floor(&k(20)).unwrap().0, &k(20));
        assert!(idx.floor(&k(5)).is_none());

        assert_eq!(idx.ceiling(&k(25)).unwrap().0, &k(30));
        assert_eq!(idx.ceiling(&k(30)).unwrap().0, &k(30));
        assert!(idx.ceiling(&k(31)).is_none());

        assert_eq!(idx.next_after(&k(20)).unwrap().0, &k(30));
        assert!(idx.next_after(&k(30)).is_none());
        assert_eq!(idx.prev_before(&k(20)).unwrap().0, &k(10));
        assert!(idx.prev_before(&k(10)).is_none());

        assert_eq!(idx.first().unwrap().0, &k(10));
        assert_eq!(idx.last().unwrap().0, &k(30));
    }

    #[test]
    fn test_distinct_indexes_have_distinct_ids() {
        assert_ne!(index().id(), index().id());
    }

    #[test]
    fn test_clear() {
        let mut idx = index();
        idx.insert_value(&Value::Int32(1), ObjRef(1)).unwrap();
        idx.clear();
        assert!(idx.is_empty());
        assert_eq!(idx.entry_count(), 0);
        assert_eq!(idx.generation(), 1);
    }
}
