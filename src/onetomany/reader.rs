//! `OneToManyReader`: queries over the sorted forward file, with a
//! lazily-built/memoized inverse and a small graph-traversal helper
//! (spec §4.6/§4.7).

use std::{
    path::PathBuf,
    sync::{Arc, OnceLock},
};

use crate::{
    config::Config,
    index::reader::IndexReader,
    schema::ValueType,
    store::{Bias, Store},
    Result,
};

use super::{adapter::GraphAdapter, COUNTS_RECORD_SIZE, RECORD_SIZE};

/// One decoded forward/inverse record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub key_index: u32,
    pub value_index: u32,
    pub key: i64,
    pub value: i64,
}

fn decode(rec: &[u8]) -> Edge {
    Edge {
        key_index: u32::from_le_bytes(rec[0..4].try_into().unwrap()),
        value_index: u32::from_le_bytes(rec[4..8].try_into().unwrap()),
        key: ValueType::I64.read_i64(rec, 8),
        value: ValueType::I64.read_i64(rec, 16),
    }
}

pub struct OneToManyReader {
    dir: PathBuf,
    name: String,
    forward: Store,
    counts: Store,
    inverse_cache: OnceLock<Box<OneToManyReader>>,
    key_source: Option<(Arc<IndexReader>, String)>,
    value_source: Option<(Arc<IndexReader>, String)>,
}

impl OneToManyReader {
    pub fn open(config: &Config) -> Result<OneToManyReader> {
        let forward = Store::open(config, &config.path_for("12m"))?;
        let counts = Store::open(config, &config.path_for("counts"))?;
        Ok(OneToManyReader {
            dir: config.dir.clone(),
            name: config.name.clone(),
            forward,
            counts,
            inverse_cache: OnceLock::new(),
            key_source: None,
            value_source: None,
        })
    }

    /// Resolve `key_for_key_index` against `field` of an external primary
    /// index, instead of returning the raw index (spec §4.7 "delegating
    /// to primary/secondary search/get").
    pub fn with_key_source(mut self, reader: Arc<IndexReader>, field: &str) -> Self {
        self.key_source = Some((reader, field.to_string()));
        self
    }

    pub fn with_value_source(mut self, reader: Arc<IndexReader>, field: &str) -> Self {
        self.value_source = Some((reader, field.to_string()));
        self
    }

    pub fn size(&self) -> u64 {
        self.forward.size()
    }

    pub fn read(&self, i: u64) -> Result<Edge> {
        let rec = self.forward.read(i)?;
        Ok(decode(&rec))
    }

    fn path_for(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.name, suffix))
    }

    /// Lazily build (or return the cached) `B.m21` inverse. Grounded on
    /// the forward/inverse symmetry: the inverse is just another
    /// one-to-many store, sorted `(value, key)` instead of `(key, value)`.
    pub fn inverse(&self) -> Result<&OneToManyReader> {
        if let Some(inv) = self.inverse_cache.get() {
            return Ok(inv);
        }
        let path = self.path_for("m21");
        let inv = if path.exists() {
            let config = Config::new(&self.dir, &self.name, RECORD_SIZE);
            let forward = Store::open(&config, &path)?;
            let counts = Store::open(&config, &self.path_for("counts"))?;
            OneToManyReader {
                dir: self.dir.clone(),
                name: self.name.clone(),
                forward,
                counts,
                inverse_cache: OnceLock::new(),
                key_source: self.value_source.clone(),
                value_source: self.key_source.clone(),
            }
        } else {
            self.build_inverse_in_memory()?
        };
        let _ = self.inverse_cache.set(Box::new(inv));
        Ok(self.inverse_cache.get().unwrap())
    }

    /// When no `B.m21` file was materialized at write time, flip every
    /// forward record into a throwaway descriptor store backing an
    /// in-process inverse reader.
    fn build_inverse_in_memory(&self) -> Result<OneToManyReader> {
        let mut tmp = std::env::temp_dir();
        tmp.push(format!("rust.recidx.onetomany.inverse.{}.{}", self.name, std::process::id()));
        err_at!(IoFailure, std::fs::create_dir_all(&tmp))?;
        let config = Config::new(&tmp, "inv", RECORD_SIZE).set_writable(true).clone();

        let fd = crate::util::create_file_rw(config.path_for("12m").as_os_str())?;
        let mut forward = Store::Descriptor(crate::store::DescriptorStore::new(fd, RECORD_SIZE)?);
        let n = self.forward.size();
        for i in 0..n {
            let e = self.read(i)?;
            let mut buf = [0u8; RECORD_SIZE as usize];
            buf[0..4].copy_from_slice(&e.value_index.to_le_bytes());
            buf[4..8].copy_from_slice(&e.key_index.to_le_bytes());
            buf[8..16].copy_from_slice(&e.value.to_le_bytes());
            buf[16..24].copy_from_slice(&e.key.to_le_bytes());
            forward.append(&buf)?;
        }
        forward.sort(8, ValueType::U128Pair)?;

        let counts_fd = crate::util::create_file_rw(config.path_for("counts").as_os_str())?;
        let mut counts = Store::Descriptor(crate::store::DescriptorStore::new(counts_fd, COUNTS_RECORD_SIZE)?);
        let n = forward.size();
        let mut i = 0u64;
        while i < n {
            let rec = forward.read(i)?;
            let key_idx = u32::from_le_bytes(rec[0..4].try_into().unwrap());
            let key = ValueType::I64.read_i64(&rec, 8);
            drop(rec);
            let mut j = i + 1;
            while j < n {
                let r2 = forward.read(j)?;
                if ValueType::I64.read_i64(&r2, 8) != key {
                    break;
                }
                j += 1;
            }
            let mut buf = vec![0u8; COUNTS_RECORD_SIZE as usize];
            buf[0..4].copy_from_slice(&key_idx.to_le_bytes());
            buf[4..12].copy_from_slice(&key.to_le_bytes());
            buf[12..16].copy_from_slice(&((j - i) as u32).to_le_bytes());
            counts.append(&buf)?;
            i = j;
        }

        Ok(OneToManyReader {
            dir: tmp,
            name: "inv".to_string(),
            forward,
            counts,
            inverse_cache: OnceLock::new(),
            key_source: self.value_source.clone(),
            value_source: self.key_source.clone(),
        })
    }

    /// Every value associated with `key`, in ascending value order.
    pub fn values(&self, key: i64) -> Result<Vec<i64>> {
        let mut out = Vec::new();
        self.for_each(key, |e| out.push(e.value))?;
        Ok(out)
    }

    pub fn value_indices(&self, key: i64) -> Result<Vec<u32>> {
        let mut out = Vec::new();
        self.for_each(key, |e| out.push(e.value_index))?;
        Ok(out)
    }

    /// Invoke `f` once per `(key_index, value_index, key, value)` edge
    /// whose key equals `key`, in ascending value order.
    pub fn for_each<F: FnMut(Edge)>(&self, key: i64, mut f: F) -> Result<()> {
        let first = self.forward.binary_search(key, 8, ValueType::I64, Bias::Backward)?;
        if first < 0 {
            return Ok(());
        }
        let n = self.forward.size();
        let mut i = first as u64;
        while i < n {
            let e = self.read(i)?;
            if e.key != key {
                break;
            }
            f(e);
            i += 1;
        }
        Ok(())
    }

    /// The key found by `bias`-biased binary search against `key` (spec
    /// §4.6 `nearestKey(key, bias)`), or `None` on a miss.
    pub fn nearest_key(&self, key: i64, bias: Bias) -> Result<Option<i64>> {
        let idx = self.forward.binary_search(key, 8, ValueType::I64, bias)?;
        if idx < 0 {
            return Ok(None);
        }
        Ok(Some(self.read(idx as u64)?.key))
    }

    pub fn count_for_key(&self, key: i64) -> Result<u32> {
        let idx = self.counts.binary_search(key, 4, ValueType::I64, Bias::None)?;
        if idx < 0 {
            return Ok(0);
        }
        let rec = self.counts.read(idx as u64)?;
        Ok(u32::from_le_bytes(rec[12..16].try_into().unwrap()))
    }

    /// Iterative DFS over the key/value graph starting at `start`. Each
    /// newly-discovered node is visited at most once; `pred` returning
    /// `false` stops expansion from that node without pruning it from
    /// the result (spec §4.7).
    pub fn closure<P: FnMut(i64) -> bool>(&self, start: i64, mut pred: P) -> Result<Vec<i64>> {
        let mut visited = std::collections::HashSet::new();
        let mut stack = vec![start];
        let mut order = Vec::new();
        visited.insert(start);

        while let Some(node) = stack.pop() {
            order.push(node);
            if !pred(node) {
                continue;
            }
            for next in self.values(node)? {
                if visited.insert(next) {
                    stack.push(next);
                }
            }
        }
        Ok(order)
    }
}

impl GraphAdapter for OneToManyReader {
    fn index_of_key(&self, key: i64) -> Result<i64> {
        self.forward.binary_search(key, 8, ValueType::I64, Bias::Backward)
    }

    fn index_of_value(&self, value: i64) -> Result<i64> {
        self.inverse()?.index_of_key(value)
    }

    fn key_for_key_index(&self, index: u32) -> Result<i64> {
        match &self.key_source {
            Some((reader, field)) => reader.value_for(index as u64, field),
            None => Ok(index as i64),
        }
    }

    fn value_for_value_index(&self, index: u32) -> Result<i64> {
        match &self.value_source {
            Some((reader, field)) => reader.value_for(index as u64, field),
            None => Ok(index as i64),
        }
    }
}

#[cfg(test)]
#[path = "reader_test.rs"]
mod reader_test;
