//! The record-store contract (spec §4.1): a byte-addressable file of
//! fixed-size records, no header, record `i` at byte `i * record_size`.
//!
//! Four backends exist (`descriptor`, `caching`, `single_mapped`,
//! `multi_mapped`), plus `adaptive`, which migrates between them under
//! load. Rather than a trait object (the spec explicitly allows "a small
//! tagged variant, or an interface abstraction" — §9 "Polymorphism across
//! backends"), dispatch is a plain `enum` with inherent, match-based
//! methods, mirroring the teacher's `robt::flush::Flusher` enum.

pub mod adaptive;
pub mod caching;
pub mod descriptor;
pub mod multi_mapped;
pub mod single_mapped;
pub mod sort;

use std::ops::Deref;

use crate::{config::Config, schema::ValueType, Result};

pub use adaptive::AdaptiveStore;
pub use caching::CachingDescriptorStore;
pub use descriptor::DescriptorStore;
pub use multi_mapped::MultiMappedStore;
pub use single_mapped::SingleMappedStore;

/// Largest file size a single whole-file mapping will be attempted for
/// (spec §4.1.3/§6: "~2 GiB on 32-bit mapping APIs").
pub const SINGLE_MAP_LIMIT: u64 = 2 * 1024 * 1024 * 1024;

/// A view over one record's bytes, returned by `read`. Owned when the
/// backend has no live mapping to borrow from (descriptor, caching);
/// borrowed when it aliases a memory mapping. Spec §9: "a tagged variant
/// for 'owned pooled buffer' vs 'borrowed mapping slice' keeps the
/// contract uniform."
pub enum ByteView<'a> {
    Owned(Vec<u8>),
    Borrowed(&'a [u8]),
}

impl<'a> Deref for ByteView<'a> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            ByteView::Owned(v) => v.as_slice(),
            ByteView::Borrowed(s) => s,
        }
    }
}

impl<'a> ByteView<'a> {
    pub fn read_i64(&self, value_type: ValueType, offset: usize) -> i64 {
        value_type.read_i64(self, offset)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.deref().to_vec()
    }
}

/// Binary-search miss behavior (spec §4.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bias {
    None,
    Forward,
    Backward,
    Nearest,
}

/// The four concrete backends, dispatched by a plain match (no trait
/// object, per spec §9).
pub enum Store {
    Descriptor(DescriptorStore),
    Caching(CachingDescriptorStore),
    SingleMapped(SingleMappedStore),
    MultiMapped(MultiMappedStore),
}

impl Store {
    /// Open `path` with the backend chosen per spec §6: `always_mapped`
    /// and file size ≥ [SINGLE_MAP_LIMIT] selects multi-mapped; below the
    /// limit, single-mapped; otherwise, `prefer_direct == false` selects
    /// the caching descriptor backend and `prefer_direct == true` the
    /// plain one. `prefer_mapped` without `always_mapped` attempts
    /// mapping first and falls back to a descriptor backend on failure
    /// (`ResourceExhausted`).
    pub fn open(config: &Config, path: &std::path::Path) -> Result<Store> {
        log::debug!("opening store at {:?} (writable={}, always_mapped={})", path, config.writable, config.always_mapped);
        let fd = if config.writable {
            crate::util::open_file_rw(path.as_os_str())
                .or_else(|_| crate::util::create_file_rw(path.as_os_str()))?
        } else {
            crate::util::open_file_r(path.as_os_str())?
        };
        let meta = err_at!(IoFailure, fd.metadata())?;
        let len = meta.len();

        let want_mapped = config.always_mapped || config.prefer_mapped;
        if want_mapped {
            let built = if len >= SINGLE_MAP_LIMIT {
                MultiMappedStore::new(&fd, config.record_size).map(Store::MultiMapped)
            } else {
                SingleMappedStore::new(&fd, config.record_size).map(Store::SingleMapped)
            };
            match built {
                Ok(store) => return Ok(store),
                Err(err) if config.always_mapped => {
                    log::error!("failed to map {:?}: {}", path, err);
                    return err_at!(ResourceExhausted, msg: "failed to map {:?}", path);
                }
                Err(err) => {
                    log::warn!("mapping {:?} failed ({}), falling back to a descriptor backend", path, err);
                }
            }
        }

        if !config.prefer_direct {
            return Ok(Store::Caching(CachingDescriptorStore::new(fd, config.record_size)?));
        }
        Ok(Store::Descriptor(DescriptorStore::new(fd, config.record_size)?))
    }

    pub fn record_size(&self) -> u32 {
        match self {
            Store::Descriptor(s) => s.record_size(),
            Store::Caching(s) => s.record_size(),
            Store::SingleMapped(s) => s.record_size(),
            Store::MultiMapped(s) => s.record_size(),
        }
    }

    pub fn size_in_bytes(&self) -> u64 {
        match self {
            Store::Descriptor(s) => s.size_in_bytes(),
            Store::Caching(s) => s.size_in_bytes(),
            Store::SingleMapped(s) => s.size_in_bytes(),
            Store::MultiMapped(s) => s.size_in_bytes(),
        }
    }

    pub fn size(&self) -> u64 {
        self.size_in_bytes() / (self.record_size() as u64)
    }

    pub fn read(&self, i: u64) -> Result<ByteView<'_>> {
        match self {
            Store::Descriptor(s) => s.read(i),
            Store::Caching(s) => s.read(i),
            Store::SingleMapped(s) => s.read(i),
            Store::MultiMapped(s) => s.read(i),
        }
    }

    pub fn write_at(&mut self, byte_offset: u64, bytes: &[u8]) -> Result<()> {
        match self {
            Store::Descriptor(s) => s.write_at(byte_offset, bytes),
            Store::Caching(s) => s.write_at(byte_offset, bytes),
            Store::SingleMapped(s) => s.write_at(byte_offset, bytes),
            Store::MultiMapped(s) => s.write_at(byte_offset, bytes),
        }
    }

    /// Append `bytes` (one record) and return its new index.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        match self {
            Store::Descriptor(s) => s.append(bytes),
            Store::Caching(s) => s.append(bytes),
            Store::SingleMapped(s) => s.append(bytes),
            Store::MultiMapped(s) => s.append(bytes),
        }
    }

    pub fn write_typed(&mut self, record_index: u64, field_offset: u32, value_type: ValueType, value: i64) -> Result<()> {
        let r = self.record_size() as usize;
        let mut buf = vec![0u8; r];
        {
            let view = self.read(record_index)?;
            buf.copy_from_slice(&view);
        }
        value_type.write_i64(&mut buf, field_offset as usize, value);
        self.write_at(record_index * (r as u64), &buf)
    }

    pub fn swap(&mut self, i: u64, j: u64) -> Result<()> {
        match self {
            Store::Descriptor(s) => s.swap(i, j),
            Store::Caching(s) => s.swap(i, j),
            Store::SingleMapped(s) => s.swap(i, j),
            Store::MultiMapped(s) => s.swap(i, j),
        }
    }

    /// Exchange `n` consecutive records starting at `i` with `n` starting
    /// at `j`. Precondition: `[i, i+n)` and `[j, j+n)` disjoint.
    pub fn bulk_swap(&mut self, i: u64, j: u64, n: u64) -> Result<()> {
        if i < j + n && j < i + n {
            err_at!(Precondition, msg: "bulk_swap ranges overlap: [{},{}) vs [{},{})", i, i + n, j, j + n)?;
        }
        match self {
            Store::MultiMapped(s) => s.bulk_swap(i, j, n),
            _ => {
                for k in 0..n {
                    self.swap(i + k, j + k)?;
                }
                Ok(())
            }
        }
    }

    pub fn sort(&mut self, field_offset: u32, value_type: ValueType) -> Result<()> {
        sort::introsort(self, field_offset, value_type)
    }

    pub fn binary_search(&self, value: i64, field_offset: u32, value_type: ValueType, bias: Bias) -> Result<i64> {
        sort::binary_search(self, value, field_offset, value_type, bias)
    }

    pub fn iterate(&self, from_index: u64) -> StoreIter<'_> {
        StoreIter { store: self, next: from_index }
    }

    /// Flush outstanding writes to disk, mirroring the teacher's
    /// `Flusher::close` (`fd.sync_all()` before returning). Called once
    /// at the end of `IndexWriter::close`/`OneToMany::close`.
    pub fn sync(&self) -> Result<()> {
        match self {
            Store::Descriptor(s) => s.sync(),
            Store::Caching(s) => s.sync(),
            Store::SingleMapped(s) => s.sync(),
            Store::MultiMapped(s) => s.sync(),
        }
    }
}

pub struct StoreIter<'s> {
    store: &'s Store,
    next: u64,
}

impl<'s> Iterator for StoreIter<'s> {
    type Item = Result<ByteView<'s>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.store.size() {
            return None;
        }
        let i = self.next;
        self.next += 1;
        Some(self.store.read(i))
    }
}
