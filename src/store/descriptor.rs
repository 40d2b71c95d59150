//! Descriptor backend (spec §4.1.1): the simplest store — every `read`
//! is a positional read of `R` bytes, every `swap` two reads and two
//! writes. Favors low memory footprint over throughput; the only backend
//! guaranteed to work for files larger than addressable memory.

use std::fs;

use crate::{bufferpool::BufferPool, util, Result};

use super::ByteView;

pub struct DescriptorStore {
    fd: fs::File,
    record_size: u32,
    len_bytes: u64,
    pool: BufferPool,
}

impl DescriptorStore {
    pub fn new(fd: fs::File, record_size: u32) -> Result<DescriptorStore> {
        if record_size == 0 {
            err_at!(Precondition, msg: "record_size must be > 0")?;
        }
        let meta = err_at!(IoFailure, fd.metadata())?;
        let len_bytes = meta.len();
        if len_bytes % (record_size as u64) != 0 {
            err_at!(
                Precondition,
                msg: "file size {} is not a multiple of record_size {} (corrupt store)",
                len_bytes, record_size
            )?;
        }
        Ok(DescriptorStore { fd, record_size, len_bytes, pool: BufferPool::new(record_size as usize, 4) })
    }

    pub fn record_size(&self) -> u32 {
        self.record_size
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.len_bytes
    }

    pub fn read(&self, i: u64) -> Result<ByteView<'_>> {
        let mut buf = vec![0u8; self.record_size as usize];
        util::read_at(&self.fd, i * (self.record_size as u64), &mut buf)?;
        Ok(ByteView::Owned(buf))
    }

    pub fn write_at(&mut self, byte_offset: u64, bytes: &[u8]) -> Result<()> {
        if byte_offset % (self.record_size as u64) != 0 {
            err_at!(Precondition, msg: "write_at offset {} not a multiple of record_size {}", byte_offset, self.record_size)?;
        }
        if (bytes.len() as u32) % self.record_size != 0 {
            err_at!(Precondition, msg: "write_at bytes.len() {} not a multiple of record_size {}", bytes.len(), self.record_size)?;
        }
        util::write_at(&self.fd, byte_offset, bytes)?;
        let end = byte_offset + (bytes.len() as u64);
        if end > self.len_bytes {
            self.len_bytes = end;
        }
        Ok(())
    }

    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        if (bytes.len() as u32) != self.record_size {
            err_at!(Precondition, msg: "append expects exactly one record of {} bytes, got {}", self.record_size, bytes.len())?;
        }
        let index = self.len_bytes / (self.record_size as u64);
        self.write_at(self.len_bytes, bytes)?;
        Ok(index)
    }

    pub fn swap(&mut self, i: u64, j: u64) -> Result<()> {
        if i == j {
            return Ok(());
        }
        let r = self.record_size as u64;
        let fd = &self.fd;
        let pool = &self.pool;

        let a_res = pool.with_slot(0, |a| util::read_at(fd, i * r, a).map(|_| a.clone()));
        let a = a_res?;
        let b_res = pool.with_slot(1, |b| util::read_at(fd, j * r, b).map(|_| b.clone()));
        let b = b_res?;

        util::write_at(fd, j * r, &a)?;
        util::write_at(fd, i * r, &b)?;
        Ok(())
    }

    /// Flush outstanding writes to disk, mirroring the teacher's
    /// `Flusher::close` (`fd.sync_all()` before returning).
    pub fn sync(&self) -> Result<()> {
        err_at!(IoFailure, self.fd.sync_all())
    }
}

#[cfg(test)]
#[path = "descriptor_test.rs"]
mod descriptor_test;
