//! Index Manager
//!
//! Owns one [`AttrIndex`] per indexed schema attribute and routes record
//! insertion and removal to them.
//!
//! # API
//!
//! - `index_record(obj, record)` - add a stored record to every index
//! - `unindex_record(obj, record)` - remove it again
//! - `rebuild_from_store(store, refs)` - rebuild all indexes
//! - `attr_index(name)` - index handle for cursors

use std::collections::BTreeMap;

use super::btree::AttrIndex;
use super::key::Key;
use crate::config::IndexConfig;
use crate::observability::{log_event, Event};
use crate::schema::{Schema, SchemaError, SchemaResult};
use crate::store::{ObjRef, ObjectStore, Record};

/// Per-schema set of attribute indexes
#[derive(Debug)]
pub struct IndexManager {
    schema: Schema,
    config: IndexConfig,
    /// attr name -> (attr id, index)
    indexes: BTreeMap<String, (usize, AttrIndex)>,
}

impl IndexManager {
    /// Build an empty index for every indexed attribute of `schema`.
    pub fn new(schema: &Schema, config: IndexConfig) -> SchemaResult<Self> {
        let mut indexes = BTreeMap::new();
        for (attr_id, attr) in schema.indexed_attrs() {
            if let Some(spec) = attr.key_spec()? {
                let index = AttrIndex::with_config(attr.name.clone(), spec, config.clone());
                indexes.insert(attr.name.clone(), (attr_id, index));
            }
        }
        Ok(Self {
            schema: schema.clone(),
            config,
            indexes,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Index for an attribute.
    pub fn attr_index(&self, name: &str) -> SchemaResult<&AttrIndex> {
        match self.indexes.get(name) {
            Some((_, index)) => Ok(index),
            None => {
                self.schema.attr(name)?;
                Err(SchemaError::NotIndexed(name.to_string()))
            }
        }
    }

    /// All indexes in attribute-id order
    pub fn indexes(&self) -> Vec<&AttrIndex> {
        let mut all: Vec<_> = self.indexes.values().collect();
        all.sort_by_key(|(attr_id, _)| *attr_id);
        all.into_iter().map(|(_, index)| index).collect()
    }

    /// Encode the record's key for every index, failing before any index
    /// is touched.
    fn keys_for(&self, record: &Record) -> SchemaResult<Vec<(String, Key)>> {
        self.schema.check_record(record)?;
        self.indexes
            .iter()
            .map(|(name, (attr_id, index))| -> SchemaResult<(String, Key)> {
                let value = record
                    .get(*attr_id)
                    .ok_or_else(|| SchemaError::UnknownAttr(name.clone()))?;
                let key = index
                    .key_spec()
                    .key_from_value(value)
                    .map_err(|source| SchemaError::InvalidKey {
                        attr: name.clone(),
                        source,
                    })?;
                Ok((name.clone(), key))
            })
            .collect()
    }

    /// Add a stored record to every attribute index.
    pub fn index_record(&mut self, obj: ObjRef, record: &Record) -> SchemaResult<()> {
        for (name, key) in self.keys_for(record)? {
            if let Some((_, index)) = self.indexes.get_mut(&name) {
                index
                    .insert(key, obj)
                    .map_err(|source| SchemaError::InvalidKey { attr: name, source })?;
            }
        }
        Ok(())
    }

    /// Remove a record from every attribute index. Returns true if any
    /// index held it.
    pub fn unindex_record(&mut self, obj: ObjRef, record: &Record) -> SchemaResult<bool> {
        let mut removed = false;
        for (name, key) in self.keys_for(record)? {
            if let Some((_, index)) = self.indexes.get_mut(&name) {
                removed |= index.remove(&key, obj);
            }
        }
        Ok(removed)
    }

    /// Clear all indexes and re-add every resolvable reference, in the
    /// order given. Unresolvable references are skipped.
    ///
    /// Every record is checked before any index is cleared; on error the
    /// indexes and their generations are unchanged.
    pub fn rebuild_from_store<S, I>(&mut self, store: &S, refs: I) -> SchemaResult<usize>
    where
        S: ObjectStore + ?Sized,
        I: IntoIterator<Item = ObjRef>,
    {
        let mut staged = Vec::new();
        for obj in refs {
            if let Some(record) = store.resolve(obj) {
                staged.push((obj, self.keys_for(&record)?));
            }
        }

        for (_, index) in self.indexes.values_mut() {
            index.clear();
        }
        for (obj, keys) in &staged {
            for (name, key) in keys {
                if let Some((_, index)) = self.indexes.get_mut(name) {
                    index
                        .insert(key.clone(), *obj)
                        .map_err(|source| SchemaError::InvalidKey {
                            attr: name.clone(),
                            source,
                        })?;
                }
            }
        }

        let count = staged.len();
        if self.config.log_events {
            log_event(
                Event::IndexRebuilt,
                &[
                    ("records", count.to_string().as_str()),
                    ("schema", self.schema.name.as_str()),
                ],
            );
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Cursor, KeyType};
    use crate::schema::{AttrDef, AttrType, Value};
    use crate::store::MemoryStore;

    fn schema() -> Schema {
        Schema::from_template(
            "pair",
            vec![
                AttrDef::new("a", AttrType::Int32).indexed(KeyType::Int32),
                AttrDef::blob("b", 4).indexed(KeyType::Memcmp),
                AttrDef::new("c", AttrType::Uint64),
            ],
        )
        .unwrap()
    }

    fn record(a: i32, b: u8) -> Record {
        Record::new(vec![Value::Int32(a), Value::Struct(vec![b; 4]), Value::Uint64(0)])
    }

    #[test]
    fn test_one_index_per_indexed_attr() {
        let manager = IndexManager::new(&schema(), IndexConfig::quiet()).unwrap();
        let names: Vec<&str> = manager.indexes().iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["a", "b"]);

        assert!(matches!(manager.attr_index("c"), Err(SchemaError::NotIndexed(_))));
        assert!(matches!(manager.attr_index("z"), Err(SchemaError::UnknownAttr(_))));
    }

    #[test]
    fn test_index_record_reaches_all_indexes() {
        let mut store = MemoryStore::new();
        let mut manager = IndexManager::new(&schema(), IndexConfig::quiet()).unwrap();

        for (a, b) in [(2, 9), (1, 8)] {
            let rec = record(a, b);
            let obj = store.alloc(rec.clone());
            manager.index_record(obj, &rec).unwrap();
        }

        for name in ["a", "b"] {
            let index = manager.attr_index(name).unwrap();
            let mut cursor = Cursor::new(index, &store);
            assert!(cursor.begin());
            assert_eq!(cursor.item(), Some(record(1, 8)));
        }
    }

    #[test]
    fn test_bad_record_leaves_indexes_untouched() {
        let mut manager = IndexManager::new(&schema(), IndexConfig::quiet()).unwrap();
        let bad = Record::new(vec![Value::Int32(1), Value::Struct(vec![0; 3]), Value::Uint64(0)]);

        assert!(manager.index_record(ObjRef(0), &bad).is_err());
        assert!(manager.indexes().iter().all(|i| i.is_empty()));
    }

    #[test]
    fn test_unindex_record() {
        let mut manager = IndexManager::new(&schema(), IndexConfig::quiet()).unwrap();
        let rec = record(5, 5);
        manager.index_record(ObjRef(7), &rec).unwrap();

        assert!(manager.unindex_record(ObjRef(7), &rec).unwrap());
        assert!(!manager.unindex_record(ObjRef(7), &rec).unwrap());
        assert!(manager.indexes().iter().all(|i| i.is_empty()));
    }

    #[test]
    fn test_rebuild_skips_deleted() {
        let mut store = MemoryStore::new();
        let mut manager = IndexManager::new(&schema(), IndexConfig::quiet()).unwrap();

        let mut refs = Vec::new();
        for a in 0..4 {
            let rec = record(a, a as u8);
            let obj = store.alloc(rec.clone());
            manager.index_record(obj, &rec).unwrap();
            refs.push(obj);
        }
        store.delete(refs[1]);

        let count = manager.rebuild_from_store(&store, store.refs()).unwrap();
        assert_eq!(count, 3);
        assert_eq!(manager.attr_index("a").unwrap().entry_count(), 3);
    }

    #[test]
    fn test_failed_rebuild_leaves_indexes_untouched() {
        let mut store = MemoryStore::new();
        let mut manager = IndexManager::new(&schema(), IndexConfig::quiet()).unwrap();

        let mut refs = Vec::new();
        for a in 0..3 {
            let rec = record(a, a as u8);
            let obj = store.alloc(rec.clone());
            manager.index_record(obj, &rec).unwrap();
            refs.push(obj);
        }
        let bad = store.alloc(Record::new(vec![Value::Int32(9)]));
        refs.push(bad);

        let generations: Vec<u64> = manager.indexes().iter().map(|i| i.generation()).collect();
        assert!(manager.rebuild_from_store(&store, refs).is_err());

        for (index, generation) in manager.indexes().iter().zip(generations) {
            assert_eq!(index.entry_count(), 3);
            assert_eq!(index.generation(), generation);
        }
    }
}
