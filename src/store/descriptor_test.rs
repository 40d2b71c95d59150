use super::*;

use std::io::Write;

fn fixture(name: &str, record_size: u32, records: &[&[u8]]) -> DescriptorStore {
    let mut path = std::env::temp_dir();
    path.push(format!("rust.recidx.store.descriptor.{}.bin", name));
    std::fs::remove_file(&path).ok();
    let mut fd = std::fs::OpenOptions::new().create(true).write(true).open(&path).unwrap();
    for r in records {
        fd.write_all(r).unwrap();
    }
    drop(fd);
    let fd = std::fs::OpenOptions::new().read(true).write(true).open(&path).unwrap();
    DescriptorStore::new(fd, record_size).unwrap()
}

#[test]
fn test_read_returns_exact_bytes() {
    let store = fixture("read", 4, &[&[1, 2, 3, 4], &[5, 6, 7, 8]]);
    assert_eq!(&*store.read(0).unwrap(), &[1, 2, 3, 4]);
    assert_eq!(&*store.read(1).unwrap(), &[5, 6, 7, 8]);
}

#[test]
fn test_rejects_size_not_multiple_of_record_size() {
    let mut path = std::env::temp_dir();
    path.push("rust.recidx.store.descriptor.bad.bin");
    std::fs::write(&path, [0u8; 7]).unwrap();
    let fd = std::fs::OpenOptions::new().read(true).write(true).open(&path).unwrap();
    match DescriptorStore::new(fd, 4) {
        Err(crate::Error::Precondition(_, _)) => (),
        res => panic!("{:?}", res.map(|_| ())),
    }
}

#[test]
fn test_write_at_and_append() {
    let mut store = fixture("write", 4, &[&[0, 0, 0, 0]]);
    store.write_at(0, &[9, 9, 9, 9]).unwrap();
    assert_eq!(&*store.read(0).unwrap(), &[9, 9, 9, 9]);

    let idx = store.append(&[1, 2, 3, 4]).unwrap();
    assert_eq!(idx, 1);
    assert_eq!(store.size_in_bytes(), 8);
    assert_eq!(&*store.read(1).unwrap(), &[1, 2, 3, 4]);
}

#[test]
fn test_swap_is_involution() {
    let mut store = fixture("swap", 4, &[&[1, 1, 1, 1], &[2, 2, 2, 2], &[3, 3, 3, 3]]);
    store.swap(0, 2).unwrap();
    assert_eq!(&*store.read(0).unwrap(), &[3, 3, 3, 3]);
    assert_eq!(&*store.read(2).unwrap(), &[1, 1, 1, 1]);
    store.swap(0, 2).unwrap();
    assert_eq!(&*store.read(0).unwrap(), &[1, 1, 1, 1]);
    assert_eq!(&*store.read(2).unwrap(), &[3, 3, 3, 3]);
}

#[test]
fn test_swap_noop_when_indices_equal() {
    let mut store = fixture("swap_noop", 4, &[&[7, 7, 7, 7]]);
    store.swap(0, 0).unwrap();
    assert_eq!(&*store.read(0).unwrap(), &[7, 7, 7, 7]);
}
