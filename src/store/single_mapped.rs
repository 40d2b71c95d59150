//! Single-mapped backend (spec §4.1.3): the whole file is mapped once;
//! `read` returns a slice of the mapping directly, no copy. Only usable
//! below [super::SINGLE_MAP_LIMIT].

use std::fs;

use memmap2::MmapMut;

use crate::Result;

use super::ByteView;

pub struct SingleMappedStore {
    mmap: MmapMut,
    record_size: u32,
}

impl SingleMappedStore {
    pub fn new(fd: &fs::File, record_size: u32) -> Result<SingleMappedStore> {
        if record_size == 0 {
            err_at!(Precondition, msg: "record_size must be > 0")?;
        }
        let meta = err_at!(IoFailure, fd.metadata())?;
        let len = meta.len();
        if len % (record_size as u64) != 0 {
            err_at!(Precondition, msg: "file size {} is not a multiple of record_size {}", len, record_size)?;
        }
        if len >= super::SINGLE_MAP_LIMIT {
            err_at!(ResourceExhausted, msg: "file size {} exceeds single-mapping limit", len)?;
        }
        // memmap2 refuses to map a zero-length file; an empty store maps
        // nothing and every read is out-of-range, which is already an error.
        let mmap = if len == 0 {
            err_at!(IoFailure, MmapMut::map_anon(1))?
        } else {
            err_at!(IoFailure, unsafe { MmapMut::map_mut(fd) })?
        };
        Ok(SingleMappedStore { mmap, record_size })
    }

    pub fn record_size(&self) -> u32 {
        self.record_size
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.mmap.len() as u64
    }

    pub fn read(&self, i: u64) -> Result<ByteView<'_>> {
        let r = self.record_size as usize;
        let start = (i as usize) * r;
        let end = start + r;
        if end > self.mmap.len() {
            err_at!(Precondition, msg: "read({}) out of range (mapping is {} bytes)", i, self.mmap.len())?;
        }
        Ok(ByteView::Borrowed(&self.mmap[start..end]))
    }

    pub fn write_at(&mut self, byte_offset: u64, bytes: &[u8]) -> Result<()> {
        if byte_offset % (self.record_size as u64) != 0 {
            err_at!(Precondition, msg: "write_at offset {} not a multiple of record_size {}", byte_offset, self.record_size)?;
        }
        let start = byte_offset as usize;
        let end = start + bytes.len();
        if end > self.mmap.len() {
            err_at!(Precondition, msg: "write_at [{},{}) out of range (mapping is {} bytes)", start, end, self.mmap.len())?;
        }
        self.mmap[start..end].copy_from_slice(bytes);
        Ok(())
    }

    pub fn append(&mut self, _bytes: &[u8]) -> Result<u64> {
        err_at!(Precondition, msg: "append is not supported on a mapped store; the mapping has a fixed size taken at open")
    }

    pub fn swap(&mut self, i: u64, j: u64) -> Result<()> {
        if i == j {
            return Ok(());
        }
        let r = self.record_size as usize;
        let mut scratch = vec![0u8; r];
        let (ia, ib) = ((i as usize) * r, (j as usize) * r);
        if ib + r > self.mmap.len() || ia + r > self.mmap.len() {
            err_at!(Precondition, msg: "swap({},{}) out of range", i, j)?;
        }

        let (lo, hi) = if ia < ib { (ia, ib) } else { (ib, ia) };
        let (left, right) = self.mmap.split_at_mut(hi);
        let lo_slice = &mut left[lo..lo + r];
        let hi_slice = &mut right[0..r];
        let (a_slice, b_slice): (&mut [u8], &mut [u8]) = if ia < ib { (lo_slice, hi_slice) } else { (hi_slice, lo_slice) };

        scratch.copy_from_slice(a_slice); // A -> scratch
        a_slice.copy_from_slice(b_slice); // B -> A
        b_slice.copy_from_slice(&scratch); // scratch -> B
        Ok(())
    }

    /// Flush the mapping's dirty pages to disk.
    pub fn sync(&self) -> Result<()> {
        err_at!(IoFailure, self.mmap.flush())
    }
}

#[cfg(test)]
#[path = "single_mapped_test.rs"]
mod single_mapped_test;
