//! Fine-grained region lock over a store's bytes (spec §4.4). A 64-bit
//! word partitions the store into 64 equally sized regions; `enter_range`
//! acquires every region a byte range touches, all-or-nothing, before
//! running its callback.
//!
//! Grounded on `util::spinlock::Spinlock`'s CAS-retry-loop shape (load,
//! check, `compare_exchange(old, new, SeqCst, SeqCst)`, retry on
//! conflict), widened from a single latch-and-lock bit pair to a 64-bit
//! mask with one bit per region.

use std::sync::atomic::{AtomicU64, Ordering};

pub struct RegionLock {
    mask: AtomicU64,
    region_width: u64,
}

impl RegionLock {
    /// `region_width = record_size * blocks_per_slot` (spec §4.4).
    pub fn new(record_size: u32, blocks_per_slot: u32) -> RegionLock {
        let region_width = (record_size as u64) * (blocks_per_slot.max(1) as u64);
        RegionLock { mask: AtomicU64::new(0), region_width }
    }

    fn region_bits(&self, start_byte: u64, length_bytes: u64) -> u64 {
        if length_bytes == 0 {
            return 0;
        }
        let first = start_byte / self.region_width;
        let last = (start_byte + length_bytes - 1) / self.region_width;
        let mut bits = 0u64;
        for r in first..=last.min(63) {
            bits |= 1u64 << r;
        }
        bits
    }

    /// Acquire every region covered by `[start_byte, start_byte +
    /// length_bytes)`, reentrantly as a single all-or-nothing mask CAS,
    /// run `op`, then release. Retries on conflict rather than blocking a
    /// thread on a futex, matching the spinlock the pattern is grounded
    /// on.
    pub fn enter_range<F, R>(&self, start_byte: u64, length_bytes: u64, op: F) -> R
    where
        F: FnOnce() -> R,
    {
        let bits = self.region_bits(start_byte, length_bytes);
        loop {
            let cur = self.mask.load(Ordering::Acquire);
            if cur & bits != 0 {
                std::thread::yield_now();
                continue;
            }
            let new = cur | bits;
            if self
                .mask
                .compare_exchange(cur, new, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }
        let result = op();
        self.mask.fetch_and(!bits, Ordering::AcqRel);
        result
    }

    /// Bitmask currently held, for tests and diagnostics.
    pub fn held_mask(&self) -> u64 {
        self.mask.load(Ordering::Acquire)
    }
}

#[cfg(test)]
#[path = "regionlock_test.rs"]
mod regionlock_test;
