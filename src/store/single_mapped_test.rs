use super::*;

use std::io::Write;

fn fixture(name: &str, record_size: u32, records: &[&[u8]]) -> (std::fs::File, SingleMappedStore) {
    let mut path = std::env::temp_dir();
    path.push(format!("rust.recidx.store.single_mapped.{}.bin", name));
    std::fs::remove_file(&path).ok();
    let mut fd = std::fs::OpenOptions::new().create(true).write(true).open(&path).unwrap();
    for r in records {
        fd.write_all(r).unwrap();
    }
    drop(fd);
    let fd = std::fs::OpenOptions::new().read(true).write(true).open(&path).unwrap();
    let store = SingleMappedStore::new(&fd, record_size).unwrap();
    (fd, store)
}

#[test]
fn test_read_aliases_mapping() {
    let (_fd, store) = fixture("read", 4, &[&[1, 2, 3, 4], &[5, 6, 7, 8]]);
    assert_eq!(&*store.read(0).unwrap(), &[1, 2, 3, 4]);
    assert_eq!(&*store.read(1).unwrap(), &[5, 6, 7, 8]);
}

#[test]
fn test_write_at_updates_mapping() {
    let (_fd, mut store) = fixture("write", 4, &[&[0, 0, 0, 0]]);
    store.write_at(0, &[9, 9, 9, 9]).unwrap();
    assert_eq!(&*store.read(0).unwrap(), &[9, 9, 9, 9]);
}

#[test]
fn test_swap_involution() {
    let (_fd, mut store) = fixture("swap", 4, &[&[1, 1, 1, 1], &[2, 2, 2, 2], &[3, 3, 3, 3]]);
    store.swap(0, 2).unwrap();
    assert_eq!(&*store.read(0).unwrap(), &[3, 3, 3, 3]);
    assert_eq!(&*store.read(2).unwrap(), &[1, 1, 1, 1]);
    store.swap(0, 2).unwrap();
    assert_eq!(&*store.read(0).unwrap(), &[1, 1, 1, 1]);
    assert_eq!(&*store.read(2).unwrap(), &[3, 3, 3, 3]);
}

#[test]
fn test_append_is_unsupported() {
    let (_fd, mut store) = fixture("append", 4, &[&[0, 0, 0, 0]]);
    match store.append(&[1, 2, 3, 4]) {
        Err(crate::Error::Precondition(_, _)) => (),
        res => panic!("{:?}", res.map(|_| ())),
    }
}
