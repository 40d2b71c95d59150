use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};

use super::*;

use crate::index::writer::IndexWriter;
use crate::schema::ValueType;

fn tmp_dir(name: &str) -> std::path::PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("rust.recidx.index.reader.{}", name));
    std::fs::remove_dir_all(&dir).ok();
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_s1_primary_read_after_write() {
    let dir = tmp_dir("s1");
    let schema = Schema::new(
        20,
        vec![
            Field::new("a", ValueType::I64, 0, IndexKind::CanonicalOrdering),
            Field::new("b", ValueType::I64, 8, IndexKind::None),
        ],
    )
    .unwrap();
    let config = Config::new(&dir, "B", 20);
    let mut writer = IndexWriter::create(&config, schema.clone()).unwrap();
    for i in 0..1000i64 {
        writer.write(&[("a", i * 23), ("b", -i)]).unwrap();
    }
    writer.close().unwrap();

    let reader = IndexReader::open(&config, schema).unwrap();
    assert_eq!(reader.size(), 1000);
    assert_eq!(reader.value_for(42, "a").unwrap(), 42 * 23);
    assert_eq!(reader.value_for(42, "b").unwrap(), -42);
    assert_eq!(reader.search_canonical(23 * 314, Bias::None).unwrap(), 314);
}

#[test]
fn test_s2_unique_field_lookup_after_shuffle() {
    let dir = tmp_dir("s2");
    let schema = Schema::new(
        16,
        vec![
            Field::new("off", ValueType::I64, 0, IndexKind::CanonicalOrdering),
            Field::new("id", ValueType::I64, 8, IndexKind::Unique),
        ],
    )
    .unwrap();
    let config = Config::new(&dir, "B", 16);
    let mut writer = IndexWriter::create(&config, schema.clone()).unwrap();

    // fixed pseudo-random permutation of 0..1000.
    let mut shuffle: Vec<i64> = (0..1000).collect();
    let mut rng = SmallRng::seed_from_u64(12345);
    shuffle.shuffle(&mut rng);

    for (i, id) in shuffle.iter().enumerate() {
        writer.write(&[("off", (i as i64) * 10), ("id", *id)]).unwrap();
    }
    writer.close().unwrap();

    let reader = IndexReader::open(&config, schema).unwrap();
    for (i, id) in shuffle.iter().enumerate() {
        assert_eq!(reader.search("id", *id, Bias::None).unwrap(), i as i64);
        assert_eq!(reader.search("off", (i as i64) * 10, Bias::None).unwrap(), i as i64);
    }
}

#[test]
fn test_search_non_indexable_field_errors() {
    let dir = tmp_dir("not_indexed");
    let schema = Schema::new(
        8,
        vec![
            Field::new("a", ValueType::I64, 0, IndexKind::CanonicalOrdering),
        ],
    )
    .unwrap();
    let config = Config::new(&dir, "B", 8);
    let mut writer = IndexWriter::create(&config, schema.clone()).unwrap();
    writer.write(&[("a", 1)]).unwrap();
    writer.close().unwrap();

    let schema_with_plain = Schema::new(
        16,
        vec![
            Field::new("a", ValueType::I64, 0, IndexKind::CanonicalOrdering),
            Field::new("plain", ValueType::I64, 8, IndexKind::None),
        ],
    )
    .unwrap();
    let config2 = Config::new(&dir, "C", 16);
    let mut writer2 = IndexWriter::create(&config2, schema_with_plain.clone()).unwrap();
    writer2.write(&[("a", 1), ("plain", 5)]).unwrap();
    writer2.close().unwrap();

    let reader = IndexReader::open(&config2, schema_with_plain).unwrap();
    match reader.search("plain", 5, Bias::None) {
        Err(crate::Error::NotIndexed(_, _)) => (),
        res => panic!("{:?}", res.map(|_| ())),
    }
}
