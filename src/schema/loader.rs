//! Schema template loading
//!
//! Templates live one per file as `<dir>/<name>.json`. Non-JSON files are
//! ignored. A malformed template fails the whole load.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{SchemaError, SchemaResult};
use super::types::Schema;

/// Reads schema templates from a directory into an in-memory registry.
pub struct SchemaLoader {
    schema_dir: PathBuf,
    schemas: BTreeMap<String, Schema>,
}

impl SchemaLoader {
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            schemas: BTreeMap::new(),
        }
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Load every `*.json` template in the directory, in file-name order.
    pub fn load_all(&mut self) -> SchemaResult<usize> {
        let io_err = |source| SchemaError::Io {
            path: self.schema_dir.clone(),
            source,
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.schema_dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let schema = Self::load_file(path)?;
            self.register(schema)?;
        }
        Ok(paths.len())
    }

    /// Read and validate a single template file.
    pub fn load_file(path: &Path) -> SchemaResult<Schema> {
        let content = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Schema::from_json(&content).map_err(|e| match e {
            SchemaError::Malformed { reason, .. } => SchemaError::Malformed {
                name: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Register a schema. Names are unique.
    pub fn register(&mut self, schema: Schema) -> SchemaResult<()> {
        if self.schemas.contains_key(&schema.name) {
            return Err(SchemaError::Malformed {
                name: schema.name.clone(),
                reason: "schema already registered".to_string(),
            });
        }
        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
