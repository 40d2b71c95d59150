use super::*;

use crate::config::Config;
use crate::onetomany::writer::{InverseMode, OneToManyWriter};

fn tmp_dir(name: &str) -> std::path::PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("rust.recidx.onetomany.reader.{}", name));
    std::fs::remove_dir_all(&dir).ok();
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn build(dir: &std::path::Path, mode: InverseMode, edges: &[(i64, i64)]) -> Config {
    let config = Config::new(dir, "B", RECORD_SIZE);
    let mut writer = OneToManyWriter::create(&config, mode).unwrap();
    for (i, (k, v)) in edges.iter().enumerate() {
        writer.put(i as u32, i as u32, *k, *v).unwrap();
    }
    writer.close().unwrap();
    config
}

#[test]
fn test_values_returns_all_matches_in_ascending_order() {
    let dir = tmp_dir("values");
    let config = build(
        &dir,
        InverseMode::None,
        &[(5, 50), (1, 10), (5, 20), (1, 90), (5, 30)],
    );

    let reader = OneToManyReader::open(&config).unwrap();
    assert_eq!(reader.values(5).unwrap(), vec![20, 30, 50]);
    assert_eq!(reader.values(1).unwrap(), vec![10, 90]);
    assert_eq!(reader.values(999).unwrap(), Vec::<i64>::new());
}

#[test]
fn test_count_for_key() {
    let dir = tmp_dir("counts");
    let config = build(
        &dir,
        InverseMode::None,
        &[(7, 1), (7, 2), (7, 3), (9, 1)],
    );
    let reader = OneToManyReader::open(&config).unwrap();
    assert_eq!(reader.count_for_key(7).unwrap(), 3);
    assert_eq!(reader.count_for_key(9).unwrap(), 1);
    assert_eq!(reader.count_for_key(42).unwrap(), 0);
}

#[test]
fn test_nearest_key_rounds_up_to_next_present_key() {
    let dir = tmp_dir("nearest");
    let config = build(&dir, InverseMode::None, &[(10, 1), (20, 2), (40, 3)]);
    let reader = OneToManyReader::open(&config).unwrap();
    assert_eq!(reader.nearest_key(25, Bias::Forward).unwrap(), Some(40));
    assert_eq!(reader.nearest_key(20, Bias::Forward).unwrap(), Some(20));
    assert_eq!(reader.nearest_key(41, Bias::Forward).unwrap(), None);
    assert_eq!(reader.nearest_key(25, Bias::None).unwrap(), None);
}

#[test]
fn test_inverse_built_lazily_when_no_m21_file() {
    let dir = tmp_dir("lazy_inverse");
    let config = build(&dir, InverseMode::None, &[(1, 100), (2, 100), (3, 200)]);
    let reader = OneToManyReader::open(&config).unwrap();

    assert!(!dir.join("B.m21").exists());
    let inv = reader.inverse().unwrap();
    let mut keys_for_100 = inv.values(100).unwrap();
    keys_for_100.sort();
    assert_eq!(keys_for_100, vec![1, 2]);
}

#[test]
fn test_closure_visits_each_node_once_and_respects_pred() {
    let dir = tmp_dir("closure");
    // graph: 1 -> 2, 2 -> 3, 3 -> 1 (cycle), 2 -> 4
    let config = build(&dir, InverseMode::None, &[(1, 2), (2, 3), (3, 1), (2, 4)]);
    let reader = OneToManyReader::open(&config).unwrap();

    let visited = reader.closure(1, |_| true).unwrap();
    let mut sorted = visited.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted, vec![1, 2, 3, 4]);
    assert_eq!(visited.len(), sorted.len()); // no repeats despite the cycle.

    // stop expansion at node 2: its children (3, 4) are never discovered.
    let limited = reader.closure(1, |n| n != 2).unwrap();
    let mut limited_sorted = limited.clone();
    limited_sorted.sort();
    assert_eq!(limited_sorted, vec![1, 2]);
}
