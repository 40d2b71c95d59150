//! Universal store invariants (spec §8, properties 1-7), run against
//! every backend reachable through the public `Config`/`Store` API.

use std::io::Write;

use recidx::{Bias, Config, Store, ValueType};

const RECORD_SIZE: u32 = 12;
const N: u64 = 200;

/// Write the raw record bytes directly, independent of whichever backend
/// will later reopen the file under test.
fn populate(dir: &std::path::Path, always_mapped: bool, prefer_direct: bool) -> (Config, std::path::PathBuf) {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join("B.data");
    let mut config = Config::new(dir, "B", RECORD_SIZE);
    config.set_writable(true).set_always_mapped(always_mapped).set_prefer_direct(prefer_direct);

    let mut file = std::fs::OpenOptions::new().create(true).truncate(true).read(true).write(true).open(&path).unwrap();
    for i in 0..N {
        let mut buf = [0u8; RECORD_SIZE as usize];
        buf[0..4].copy_from_slice(&(i as u32).to_le_bytes());
        buf[4..12].copy_from_slice(&((i as i64) * 7).to_le_bytes());
        file.write_all(&buf).unwrap();
    }
    drop(file);
    (config, path)
}

fn open_backends(dir: &std::path::Path) -> Vec<(&'static str, Store)> {
    let mut out = Vec::new();

    let (config, path) = populate(&dir.join("descriptor"), false, true);
    out.push(("descriptor", Store::open(&config, &path).unwrap()));

    let (config, path) = populate(&dir.join("caching"), false, false);
    out.push(("caching", Store::open(&config, &path).unwrap()));

    let (config, path) = populate(&dir.join("single_mapped"), true, true);
    out.push(("single_mapped", Store::open(&config, &path).unwrap()));

    out
}

#[test]
fn invariant_read_matches_file_bytes() {
    let dir = tempfile::tempdir().unwrap();
    for (name, store) in open_backends(dir.path()) {
        for i in 0..N {
            let rec = store.read(i).unwrap();
            assert_eq!(rec.len(), RECORD_SIZE as usize, "backend {}", name);
            assert_eq!(ValueType::I64.read_i64(&rec, 4), (i as i64) * 7, "backend {}", name);
        }
    }
}

#[test]
fn invariant_write_at_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    for (name, mut store) in open_backends(dir.path()) {
        let mut buf = [0u8; RECORD_SIZE as usize];
        buf[0..4].copy_from_slice(&99u32.to_le_bytes());
        buf[4..12].copy_from_slice(&(-123456i64).to_le_bytes());
        store.write_at(5 * RECORD_SIZE as u64, &buf).unwrap();
        let rec = store.read(5).unwrap();
        assert_eq!(&rec[..], &buf[..], "backend {}", name);
    }
}

#[test]
fn invariant_swap_is_involutive() {
    let dir = tempfile::tempdir().unwrap();
    for (name, mut store) in open_backends(dir.path()) {
        let before = store.read(3).unwrap().to_vec();
        let other = store.read(17).unwrap().to_vec();
        store.swap(3, 17).unwrap();
        store.swap(3, 17).unwrap();
        assert_eq!(store.read(3).unwrap().to_vec(), before, "backend {}", name);
        assert_eq!(store.read(17).unwrap().to_vec(), other, "backend {}", name);
    }
}

#[test]
fn invariant_bulk_swap_matches_elementwise_swap() {
    let dir = tempfile::tempdir().unwrap();
    for (name, mut store) in open_backends(dir.path()) {
        let snapshot: Vec<Vec<u8>> = (0..N).map(|i| store.read(i).unwrap().to_vec()).collect();
        store.bulk_swap(10, 50, 6).unwrap();
        let bulk_result: Vec<Vec<u8>> = (0..N).map(|i| store.read(i).unwrap().to_vec()).collect();

        let mut expected = snapshot;
        for k in 0..6u64 {
            expected.swap((10 + k) as usize, (50 + k) as usize);
        }
        assert_eq!(bulk_result, expected, "backend {}", name);
    }
}

#[test]
fn invariant_sort_is_nondecreasing_and_preserves_multiset() {
    let dir = tempfile::tempdir().unwrap();
    for (name, mut store) in open_backends(dir.path()) {
        let before: Vec<i64> = (0..N).map(|i| store.read(i).unwrap().read_i64(ValueType::I64, 4)).collect();
        store.sort(4, ValueType::I64).unwrap();
        let after: Vec<i64> = (0..N).map(|i| store.read(i).unwrap().read_i64(ValueType::I64, 4)).collect();

        for w in after.windows(2) {
            assert!(w[0] <= w[1], "backend {} not sorted: {:?}", name, w);
        }
        let mut before_sorted = before;
        before_sorted.sort();
        let mut after_sorted = after;
        after_sorted.sort();
        assert_eq!(before_sorted, after_sorted, "backend {}", name);
    }
}

#[test]
fn invariant_binary_search_agrees_with_bias() {
    let dir = tempfile::tempdir().unwrap();
    for (name, mut store) in open_backends(dir.path()) {
        store.sort(4, ValueType::I64).unwrap();
        for i in 0..N {
            let v = store.read(i).unwrap().read_i64(ValueType::I64, 4);
            let idx = store.binary_search(v, 4, ValueType::I64, Bias::None).unwrap();
            assert!(idx >= 0, "backend {}", name);
            assert_eq!(store.read(idx as u64).unwrap().read_i64(ValueType::I64, 4), v, "backend {}", name);
        }
        let miss = store.binary_search(i64::MAX, 4, ValueType::I64, Bias::None).unwrap();
        assert_eq!(miss, -1, "backend {}", name);
    }
}

#[test]
fn invariant_backend_equivalence_for_same_operation_trace() {
    let dir = tempfile::tempdir().unwrap();
    let backends = open_backends(dir.path());
    let mut results: Vec<(&str, Vec<i64>)> = Vec::new();
    for (name, mut store) in backends {
        store.swap(2, 40).unwrap();
        store.swap(7, 9).unwrap();
        store.sort(4, ValueType::I64).unwrap();
        let out: Vec<i64> = (0..N).map(|i| store.read(i).unwrap().read_i64(ValueType::I64, 4)).collect();
        results.push((name, out));
    }
    for pair in results.windows(2) {
        assert_eq!(pair[0].1, pair[1].1, "{} vs {}", pair[0].0, pair[1].0);
    }
}
