use super::*;

#[test]
fn test_with_slot_resets_content() {
    let pool = BufferPool::new(8, 2);
    pool.with_slot(0, |buf| buf.copy_from_slice(&[9u8; 8]));
    pool.with_slot(0, |buf| {
        assert_eq!(buf, &vec![0u8; 8]);
    });
}

#[test]
fn test_distinct_slots_are_independent() {
    let pool = BufferPool::new(4, 2);
    pool.with_slot(0, |buf| buf.copy_from_slice(&[1, 2, 3, 4]));
    pool.with_slot(1, |buf| buf.copy_from_slice(&[5, 6, 7, 8]));
    pool.with_slot(0, |buf| assert_eq!(buf, &vec![1, 2, 3, 4]));
    pool.with_slot(1, |buf| assert_eq!(buf, &vec![5, 6, 7, 8]));
}

#[test]
fn test_slot_wraps_modulo_concurrency() {
    let pool = BufferPool::new(4, 2);
    pool.with_slot(0, |buf| buf.copy_from_slice(&[1, 2, 3, 4]));
    pool.with_slot(2, |buf| assert_eq!(buf, &vec![0, 0, 0, 0]));
}

#[test]
fn test_allocate_gives_zeroed_buffer() {
    let pool = BufferPool::new(8, 2);
    let buf = pool.allocate(16);
    assert_eq!(buf.len(), 16);
    assert!(buf.iter().all(|&b| b == 0));
}
