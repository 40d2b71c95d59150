//! Multi-mapped backend (spec §4.1.4): the file is partitioned into
//! fixed-size segments aligned to record boundaries, each its own
//! mapping, so no individual mapping exceeds the platform limit.

use std::fs;

use memmap2::{MmapMut, MmapOptions};

use crate::Result;

use super::ByteView;

pub struct MultiMappedStore {
    segments: Vec<MmapMut>,
    record_size: u32,
    /// Records per segment (last segment may hold fewer).
    partition_records: u64,
    total_records: u64,
}

impl MultiMappedStore {
    pub fn new(fd: &fs::File, record_size: u32) -> Result<MultiMappedStore> {
        if record_size == 0 {
            err_at!(Precondition, msg: "record_size must be > 0")?;
        }
        let meta = err_at!(IoFailure, fd.metadata())?;
        let len = meta.len();
        if len % (record_size as u64) != 0 {
            err_at!(Precondition, msg: "file size {} is not a multiple of record_size {}", len, record_size)?;
        }

        let partition_bytes = (super::SINGLE_MAP_LIMIT / (record_size as u64)) * (record_size as u64);
        let partition_records = partition_bytes / (record_size as u64);
        let total_records = len / (record_size as u64);

        let mut segments = Vec::new();
        let mut offset = 0u64;
        while offset < len {
            let seg_len = partition_bytes.min(len - offset);
            let mmap = err_at!(
                IoFailure,
                unsafe { MmapOptions::new().offset(offset).len(seg_len as usize).map_mut(fd) }
            )?;
            segments.push(mmap);
            offset += seg_len;
        }
        if segments.is_empty() {
            let mmap = err_at!(IoFailure, MmapMut::map_anon(1))?;
            segments.push(mmap);
        }

        Ok(MultiMappedStore { segments, record_size, partition_records: partition_records.max(1), total_records })
    }

    pub fn record_size(&self) -> u32 {
        self.record_size
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.total_records * (self.record_size as u64)
    }

    fn locate(&self, i: u64) -> (usize, usize) {
        let seg = (i / self.partition_records) as usize;
        let within = ((i % self.partition_records) as usize) * (self.record_size as usize);
        (seg, within)
    }

    pub fn read(&self, i: u64) -> Result<ByteView<'_>> {
        if i >= self.total_records {
            err_at!(Precondition, msg: "read({}) out of range ({} records)", i, self.total_records)?;
        }
        let (seg, within) = self.locate(i);
        let r = self.record_size as usize;
        Ok(ByteView::Borrowed(&self.segments[seg][within..within + r]))
    }

    pub fn write_at(&mut self, byte_offset: u64, bytes: &[u8]) -> Result<()> {
        if byte_offset % (self.record_size as u64) != 0 {
            err_at!(Precondition, msg: "write_at offset {} not a multiple of record_size {}", byte_offset, self.record_size)?;
        }
        let i = byte_offset / (self.record_size as u64);
        let n = (bytes.len() as u64) / (self.record_size as u64);
        let r = self.record_size as usize;
        for k in 0..n {
            let (seg, within) = self.locate(i + k);
            let chunk = &bytes[(k as usize) * r..(k as usize + 1) * r];
            self.segments[seg][within..within + r].copy_from_slice(chunk);
        }
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
        let (seg_i, off_i) = self.locate(i);
        let (seg_j, off_j) = self.locate(j);

        if seg_i == seg_j {
            let seg = &mut self.segments[seg_i];
            let (lo, hi) = if off_i < off_j { (off_i, off_j) } else { (off_j, off_i) };
            let (left, right) = seg.split_at_mut(hi);
            let lo_slice = &mut left[lo..lo + r];
            let hi_slice = &mut right[0..r];
            let (a, b): (&mut [u8], &mut [u8]) = if off_i < off_j { (lo_slice, hi_slice) } else { (hi_slice, lo_slice) };
            let mut scratch = vec![0u8; r];
            scratch.copy_from_slice(a);
            a.copy_from_slice(b);
            b.copy_from_slice(&scratch);
        } else {
            let mut scratch = vec![0u8; r];
            scratch.copy_from_slice(&self.segments[seg_i][off_i..off_i + r]);
            let b = self.segments[seg_j][off_j..off_j + r].to_vec();
            self.segments[seg_i][off_i..off_i + r].copy_from_slice(&b);
            self.segments[seg_j][off_j..off_j + r].copy_from_slice(&scratch);
        }
        Ok(())
    }

    /// Fast-path bulk swap: only when `[i,i+n)` and `[j,j+n)` each lie
    /// entirely within a single partition (spec §4.1.4); otherwise falls
    /// back to per-record swap.
    pub fn bulk_swap(&mut self, i: u64, j: u64, n: u64) -> Result<()> {
        let same_partition = |start: u64| start / self.partition_records == (start + n - 1) / self.partition_records;
        if n > 0 && same_partition(i) && same_partition(j) {
            for k in 0..n {
                self.swap(i + k, j + k)?;
            }
            return Ok(());
        }
        for k in 0..n {
            self.swap(i + k, j + k)?;
        }
        Ok(())
    }

    /// Flush every segment's dirty pages to disk.
    pub fn sync(&self) -> Result<()> {
        for seg in &self.segments {
            err_at!(IoFailure, seg.flush())?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "multi_mapped_test.rs"]
mod multi_mapped_test;
