//! In-place introsort and bias-tolerant binary search (spec §4.3),
//! driven only by `Store::swap` — no auxiliary array of size N is ever
//! built (spec §9 "Sort delegation").

use std::cmp::Ordering;

use crate::{schema::ValueType, Result};

use super::{Bias, Store};

const INSERTION_CUTOFF: u64 = 16;

/// The comparison key read out of a record: either a plain `i64`, or the
/// compound `(high, low)` pair the one-to-many index sorts by. Compared
/// explicitly high-then-low (spec §9: not the source's magic-multiplier
/// trick).
#[derive(Clone, Copy)]
enum Key {
    I64(i64),
    Pair(i64, i64),
}

impl Key {
    fn cmp(&self, other: &Key) -> Ordering {
        match (self, other) {
            (Key::I64(a), Key::I64(b)) => a.cmp(b),
            (Key::Pair(ah, al), Key::Pair(bh, bl)) => ah.cmp(bh).then(al.cmp(bl)),
            _ => unreachable!("mixed key types in one sort/search pass"),
        }
    }
}

fn read_key(store: &Store, idx: u64, field_offset: u32, value_type: ValueType) -> Result<Key> {
    let view = store.read(idx)?;
    Ok(match value_type {
        ValueType::U128Pair => {
            let (hi, lo) = ValueType::read_u128_pair(&view, field_offset as usize);
            Key::Pair(hi, lo)
        }
        vt => Key::I64(vt.read_i64(&view, field_offset as usize)),
    })
}

pub fn introsort(store: &mut Store, field_offset: u32, value_type: ValueType) -> Result<()> {
    let n = store.size();
    if n < 2 {
        return Ok(());
    }
    quicksort(store, 0, n - 1, field_offset, value_type)
}

fn quicksort(store: &mut Store, mut lo: u64, mut hi: u64, field_offset: u32, value_type: ValueType) -> Result<()> {
    loop {
        if hi <= lo {
            return Ok(());
        }
        let len = hi - lo + 1;
        if len <= INSERTION_CUTOFF {
            return insertion_sort(store, lo, hi, field_offset, value_type);
        }

        let mid = lo + (hi - lo) / 2;
        let pivot = median_of_three(store, lo, mid, hi, field_offset, value_type)?;
        let p = hoare_partition(store, lo, hi, pivot, field_offset, value_type)?;

        // Recurse into the smaller side, loop into the larger — keeps
        // stack depth logarithmic without a separate heapsort fallback.
        if (p - lo) < (hi.saturating_sub(p)) {
            quicksort(store, lo, p, field_offset, value_type)?;
            lo = p + 1;
        } else {
            quicksort(store, p + 1, hi, field_offset, value_type)?;
            hi = p;
        }
    }
}

fn median_of_three(store: &Store, lo: u64, mid: u64, hi: u64, field_offset: u32, value_type: ValueType) -> Result<Key> {
    let a = read_key(store, lo, field_offset, value_type)?;
    let b = read_key(store, mid, field_offset, value_type)?;
    let c = read_key(store, hi, field_offset, value_type)?;
    let mut keys = [a, b, c];
    keys.sort_by(|x, y| x.cmp(y));
    Ok(keys[1])
}

/// Hoare partition around a captured pivot *value* (not a moving index —
/// entries are relocated by `swap` during partitioning, so indexing a
/// "pivot index" would chase a moving target).
fn hoare_partition(store: &mut Store, lo: u64, hi: u64, pivot: Key, field_offset: u32, value_type: ValueType) -> Result<u64> {
    let mut i = lo;
    let mut j = hi;
    loop {
        while read_key(store, i, field_offset, value_type)?.cmp(&pivot) == Ordering::Less {
            i += 1;
        }
        while read_key(store, j, field_offset, value_type)?.cmp(&pivot) == Ordering::Greater {
            j -= 1;
        }
        if i >= j {
            return Ok(j);
        }
        store.swap(i, j)?;
        i += 1;
        if j == 0 {
            return Ok(0);
        }
        j -= 1;
    }
}

fn insertion_sort(store: &mut Store, lo: u64, hi: u64, field_offset: u32, value_type: ValueType) -> Result<()> {
    let mut k = lo + 1;
    while k <= hi {
        let mut m = k;
        while m > lo {
            let cur = read_key(store, m, field_offset, value_type)?;
            let prev = read_key(store, m - 1, field_offset, value_type)?;
            if cur.cmp(&prev) == Ordering::Less {
                store.swap(m, m - 1)?;
                m -= 1;
            } else {
                break;
            }
        }
        k += 1;
    }
    Ok(())
}

/// Lower-bound walk plus the four bias semantics of spec §4.1/§4.3.
/// Duplicate-tolerance: BACKWARD returns the first (lowest-index) equal
/// record, FORWARD the last.
pub fn binary_search(store: &Store, value: i64, field_offset: u32, value_type: ValueType, bias: Bias) -> Result<i64> {
    let n = store.size() as i64;
    if n == 0 {
        return Ok(-1);
    }

    let lower_bound = |hi_bound: i64| -> Result<i64> {
        let mut lo = 0i64;
        let mut hi = hi_bound;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let k = value_type.read_i64(&store.read(mid as u64)?, field_offset as usize);
            if k < value {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(lo)
    };

    let lo = lower_bound(n)?;
    let exact = lo < n && value_type.read_i64(&store.read(lo as u64)?, field_offset as usize) == value;

    match bias {
        Bias::None => Ok(if exact { lo } else { -1 }),
        Bias::Backward => {
            if exact {
                Ok(lo)
            } else if lo == 0 {
                Ok(-1)
            } else {
                Ok(lo - 1)
            }
        }
        Bias::Forward => {
            if exact {
                // upper bound: smallest index with key > value.
                let mut lo2 = lo;
                let mut hi2 = n;
                while lo2 < hi2 {
                    let mid = lo2 + (hi2 - lo2) / 2;
                    let k = value_type.read_i64(&store.read(mid as u64)?, field_offset as usize);
                    if k <= value {
                        lo2 = mid + 1;
                    } else {
                        hi2 = mid;
                    }
                }
                Ok(lo2 - 1)
            } else if lo == n {
                Ok(-1)
            } else {
                Ok(lo)
            }
        }
        Bias::Nearest => {
            if exact {
                return Ok(lo);
            }
            let fwd = if lo < n { Some(lo) } else { None };
            let bwd = if lo > 0 { Some(lo - 1) } else { None };
            match (fwd, bwd) {
                (None, None) => Ok(-1),
                (Some(f), None) => Ok(f),
                (None, Some(b)) => Ok(b),
                (Some(f), Some(b)) => {
                    let fk = value_type.read_i64(&store.read(f as u64)?, field_offset as usize);
                    let bk = value_type.read_i64(&store.read(b as u64)?, field_offset as usize);
                    // ties break to BACKWARD.
                    if (fk - value).abs() < (value - bk).abs() {
                        Ok(f)
                    } else {
                        Ok(b)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "sort_test.rs"]
mod sort_test;
