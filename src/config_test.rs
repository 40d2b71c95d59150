use super::*;

#[test]
fn test_config_defaults() {
    let config = Config::new("/tmp/whatever", "B", 24);
    assert!(config.prefer_direct);
    assert!(!config.prefer_mapped);
    assert!(!config.always_mapped);
    assert!(!config.writable);
    assert_eq!(config.concurrency, default_concurrency());
}

#[test]
fn test_config_builder_chain() {
    let mut config = Config::new("/tmp/whatever", "B", 24);
    config
        .set_prefer_mapped(true)
        .set_always_mapped(true)
        .set_writable(true)
        .set_concurrency(8);

    assert!(config.prefer_mapped);
    assert!(config.always_mapped);
    assert!(config.writable);
    assert_eq!(config.concurrency, 8);
}

#[test]
fn test_path_for() {
    let config = Config::new("/tmp/whatever", "B", 24);
    assert_eq!(config.path_for("offsets"), std::path::PathBuf::from("/tmp/whatever/B.offsets"));
    assert_eq!(config.path_for("key"), std::path::PathBuf::from("/tmp/whatever/B.key"));
}

#[test]
fn test_stats_toml_roundtrip() {
    let mut config = Config::new("/tmp/whatever", "B", 24);
    config.set_prefer_mapped(true).set_concurrency(6);
    let stats = config.stats();

    let s = stats.to_toml().expect("serialize");
    let back = Stats::from_toml(&s).expect("deserialize");
    assert_eq!(stats, back);
}
