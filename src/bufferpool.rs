//! Per-thread pool of reusable byte buffers (spec §4.2).
//!
//! Descriptor-based backends need scratch space for positional reads and
//! for the two-buffer dance a `swap` performs; handing out a fresh `Vec`
//! per call would thrash the allocator on hot sort/search paths. Instead
//! each [BufferPool] claims a fixed number of thread-local slots sized to
//! the store's record width, mirroring the teacher's own preference for
//! thread-local state over cross-thread sharing (`util::Thread`'s
//! gen-server pattern: every thread owns what it touches).
//!
//! Buffers can't be handed out as `&mut Vec<u8>` references that outlive
//! a call, since they live inside a `thread_local!` `RefCell`; callers get
//! at a slot through [BufferPool::with_slot] instead.

use std::{
    cell::RefCell,
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static SLOTS: RefCell<HashMap<u64, Vec<Vec<u8>>>> = RefCell::new(HashMap::new());
}

/// Default number of reusable buffers per thread (spec §6 `concurrency`).
pub const DEFAULT_CONCURRENCY: usize = 4;

pub struct BufferPool {
    id: u64,
    concurrency: usize,
    record_size: usize,
}

impl BufferPool {
    pub fn new(record_size: usize, concurrency: usize) -> BufferPool {
        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        BufferPool { id, concurrency: concurrency.max(1), record_size }
    }

    /// Run `f` against the slot's buffer, rewound (cleared and resized)
    /// to `record_size` bytes of zeroes before `f` runs. `slot` is taken
    /// modulo `concurrency`, so distinct slot indices map to distinct
    /// buffers for as long as a caller needs two at once (e.g. comparing
    /// two records during a sort).
    pub fn with_slot<F, R>(&self, slot: usize, f: F) -> R
    where
        F: FnOnce(&mut Vec<u8>) -> R,
    {
        SLOTS.with(|cell| {
            let mut map = cell.borrow_mut();
            let bufs = map
                .entry(self.id)
                .or_insert_with(|| vec![vec![0u8; self.record_size]; self.concurrency]);
            let buf = &mut bufs[slot % self.concurrency];
            buf.clear();
            buf.resize(self.record_size, 0);
            f(buf)
        })
    }

    /// One-shot allocation for bulk operations that don't fit the fixed
    /// per-slot record-sized buffers (e.g. a `bulk_swap` scratch region).
    pub fn allocate(&self, bytes: usize) -> Vec<u8> {
        vec![0u8; bytes]
    }
}

#[cfg(test)]
#[path = "bufferpool_test.rs"]
mod bufferpool_test;
