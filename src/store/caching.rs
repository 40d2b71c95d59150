//! Caching descriptor backend (spec §4.1.2): six rotating buffers per
//! thread, grouped into three `(head, middle, tail)` pairs covering the
//! file's three thirds. A miss reloads the pair for its third to cover
//! `[record, record + cache_window)`. Writes bump a mutation counter; a
//! cached window is usable only if its captured counter still matches.
//!
//! Cache state is per-thread (`thread_local!`), so no cross-thread
//! invalidation protocol is needed — only the thread that populated a
//! window can read stale bytes out of it, and only if it performed a
//! write itself without refreshing. Per spec §9 "ambiguous source
//! behavior", the commented-out invalidation in the source is preserved
//! as-is: a write bumps the counter but does not reach into other
//! threads' cached windows, and even same-thread windows are only
//! invalidated by the next counter check, not evicted eagerly.

use std::{
    cell::RefCell,
    collections::HashMap,
    fs,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{bufferpool::BufferPool, util, Result};

use super::ByteView;

/// Records covered by one reload of a cache pair.
const CACHE_WINDOW: u64 = 256;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

struct Window {
    start: u64,
    len: u64,
    buf: Vec<u8>,
    counter: u64,
}

impl Window {
    fn covers(&self, i: u64) -> bool {
        i >= self.start && i < self.start + self.len
    }
}

thread_local! {
    static CACHE: RefCell<HashMap<u64, [Option<Window>; 3]>> = RefCell::new(HashMap::new());
}

pub struct CachingDescriptorStore {
    id: u64,
    fd: fs::File,
    record_size: u32,
    len_bytes: AtomicU64,
    /// Bumped on every write; a cached window is stale once its captured
    /// value no longer matches. See the module comment: this is the only
    /// invalidation signal, deliberately.
    mutation_counter: AtomicU64,
    pool: BufferPool,
}

impl CachingDescriptorStore {
    pub fn new(fd: fs::File, record_size: u32) -> Result<CachingDescriptorStore> {
        if record_size == 0 {
            err_at!(Precondition, msg: "record_size must be > 0")?;
        }
        let meta = err_at!(IoFailure, fd.metadata())?;
        let len_bytes = meta.len();
        if len_bytes % (record_size as u64) != 0 {
            err_at!(Precondition, msg: "file size {} is not a multiple of record_size {}", len_bytes, record_size)?;
        }
        let id = NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed);
        Ok(CachingDescriptorStore {
            id,
            fd,
            record_size,
            len_bytes: AtomicU64::new(len_bytes),
            mutation_counter: AtomicU64::new(0),
            pool: BufferPool::new(record_size as usize, 4),
        })
    }

    pub fn record_size(&self) -> u32 {
        self.record_size
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.len_bytes.load(Ordering::Acquire)
    }

    fn size(&self) -> u64 {
        self.size_in_bytes() / (self.record_size as u64)
    }

    /// Which of the three (head, middle, tail) pairs covers record `i`.
    fn third_for(&self, i: u64) -> usize {
        let total = self.size().max(1);
        let third = total / 3 + 1;
        ((i / third).min(2)) as usize
    }

    pub fn read(&self, i: u64) -> Result<ByteView<'_>> {
        let third = self.third_for(i);
        let counter = self.mutation_counter.load(Ordering::Acquire);
        let r = self.record_size as usize;

        let hit = CACHE.with(|cell| {
            let mut map = cell.borrow_mut();
            let pairs = map.entry(self.id).or_insert_with(|| [None, None, None]);
            match &pairs[third] {
                Some(w) if w.covers(i) && w.counter == counter => {
                    let local = (i - w.start) as usize;
                    Some(w.buf[local * r..(local + 1) * r].to_vec())
                }
                _ => None,
            }
        });
        if let Some(bytes) = hit {
            return Ok(ByteView::Owned(bytes));
        }

        // Miss: reload the window for this third to cover [i, i + CACHE_WINDOW).
        let total = self.size();
        let start = i;
        let len = CACHE_WINDOW.min(total.saturating_sub(start)).max(1);
        let mut buf = vec![0u8; (len as usize) * r];
        util::read_at(&self.fd, start * (r as u64), &mut buf)?;

        let out = buf[0..r].to_vec();
        CACHE.with(|cell| {
            let mut map = cell.borrow_mut();
            let pairs = map.entry(self.id).or_insert_with(|| [None, None, None]);
            pairs[third] = Some(Window { start, len, buf, counter });
        });
        Ok(ByteView::Owned(out))
    }

    pub fn write_at(&mut self, byte_offset: u64, bytes: &[u8]) -> Result<()> {
        if byte_offset % (self.record_size as u64) != 0 {
            err_at!(Precondition, msg: "write_at offset {} not a multiple of record_size {}", byte_offset, self.record_size)?;
        }
        util::write_at(&self.fd, byte_offset, bytes)?;
        self.mutation_counter.fetch_add(1, Ordering::AcqRel);
        let end = byte_offset + (bytes.len() as u64);
        if end > self.size_in_bytes() {
            self.len_bytes.store(end, Ordering::Release);
        }
        Ok(())
    }

    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        if (bytes.len() as u32) != self.record_size {
            err_at!(Precondition, msg: "append expects exactly one record of {} bytes", self.record_size)?;
        }
        let index = self.size();
        let offset = self.size_in_bytes();
        self.write_at(offset, bytes)?;
        Ok(index)
    }

    pub fn swap(&mut self, i: u64, j: u64) -> Result<()> {
        if i == j {
            return Ok(());
        }
        let r = self.record_size as u64;
        let fd = &self.fd;
        let pool = &self.pool;

        let a = pool.with_slot(0, |a| util::read_at(fd, i * r, a).map(|_| a.clone()))?;
        let b = pool.with_slot(1, |b| util::read_at(fd, j * r, b).map(|_| b.clone()))?;

        util::write_at(fd, j * r, &a)?;
        util::write_at(fd, i * r, &b)?;
        self.mutation_counter.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Flush outstanding writes to disk, mirroring the teacher's
    /// `Flusher::close` (`fd.sync_all()` before returning).
    pub fn sync(&self) -> Result<()> {
        err_at!(IoFailure, self.fd.sync_all())
    }
}

#[cfg(test)]
#[path = "caching_test.rs"]
mod caching_test;
