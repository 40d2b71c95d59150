//! `IndexReader`: opens `B.offsets` plus lazily-memoized `B.<field>s`
//! shadow files, answering point/nearest queries (spec §4.5).

use std::{collections::HashMap, path::PathBuf, sync::Mutex};

use crate::{
    config::{Config, Stats},
    schema::{Field, IndexKind, Schema},
    store::{Bias, ByteView, Store},
    util, Result,
};

pub struct IndexReader {
    dir: PathBuf,
    name: String,
    schema: Schema,
    primary: Store,
    shadows: Mutex<HashMap<String, Store>>,
}

impl IndexReader {
    pub fn open(config: &Config, schema: Schema) -> Result<IndexReader> {
        let path = config.path_for("offsets");
        let primary = Store::open(config, &path)?;
        match util::load_toml::<_, Stats>(config.path_for("toml")) {
            Ok(stats) if stats.record_size != schema.record_size => {
                log::warn!("index {:?} stats record_size {} disagrees with schema record_size {}", config.name, stats.record_size, schema.record_size);
            }
            Ok(_) => (),
            Err(err) => log::debug!("no stats sidecar for index {:?} ({})", config.name, err),
        }
        Ok(IndexReader {
            dir: config.dir.clone(),
            name: config.name.clone(),
            schema,
            primary,
            shadows: Mutex::new(HashMap::new()),
        })
    }

    pub fn size(&self) -> u64 {
        self.primary.size()
    }

    pub fn get(&self, i: u64) -> Result<ByteView<'_>> {
        self.primary.read(i)
    }

    fn field(&self, name: &str) -> Result<&Field> {
        match self.schema.field(name) {
            Some(f) => Ok(f),
            None => err_at!(Precondition, msg: "schema has no field named {:?}", name),
        }
    }

    pub fn value_for(&self, record_index: u64, field_name: &str) -> Result<i64> {
        let field = self.field(field_name)?;
        let view = self.primary.read(record_index)?;
        Ok(field.value_type.read_i64(&view, field.record_offset() as usize))
    }

    /// Convenience search against the schema's canonical-ordering field.
    pub fn search_canonical(&self, value: i64, bias: Bias) -> Result<i64> {
        let field = match self.schema.canonical_field() {
            Some(f) => f,
            None => err_at!(Precondition, msg: "schema has no CanonicalOrdering field")?,
        };
        self.primary.binary_search(value, field.record_offset(), field.value_type, bias)
    }

    /// `field` CANONICAL_ORDERING delegates to the primary; otherwise
    /// binary-searches the field's shadow file, then extracts the
    /// leading sequence number as the primary index (spec §4.5).
    pub fn search(&self, field_name: &str, value: i64, bias: Bias) -> Result<i64> {
        let field = self.field(field_name)?.clone();
        if field.index_kind == IndexKind::CanonicalOrdering {
            return self.primary.binary_search(value, field.record_offset(), field.value_type, bias);
        }
        if !field.index_kind.is_indexable() {
            err_at!(NotIndexed, msg: "field {:?} is not declared UNIQUE or CANONICAL_ORDERING", field_name)?;
        }

        self.with_shadow(&field.name, |shadow| {
            let idx = shadow.binary_search(value, field.record_offset(), field.value_type, bias)?;
            if idx < 0 {
                return Ok(-1);
            }
            let view = shadow.read(idx as u64)?;
            Ok(u32::from_le_bytes(view[0..4].try_into().unwrap()) as i64)
        })
    }

    fn path_for(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.name, suffix))
    }

    fn with_shadow<F, R>(&self, field_name: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Store) -> Result<R>,
    {
        let mut guard = self.shadows.lock().unwrap();
        if !guard.contains_key(field_name) {
            let path = self.path_for(&format!("{}s", field_name));
            let config = Config::new(&self.dir, &self.name, self.schema.record_size);
            let store = Store::open(&config, &path)?;
            guard.insert(field_name.to_string(), store);
        }
        f(guard.get(field_name).unwrap())
    }
}

#[cfg(test)]
#[path = "reader_test.rs"]
mod reader_test;
