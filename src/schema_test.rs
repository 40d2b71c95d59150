use super::*;

#[test]
fn test_schema_rejects_two_canonical_fields() {
    let fields = vec![
        Field::new("a", ValueType::I64, 0, IndexKind::CanonicalOrdering),
        Field::new("b", ValueType::I64, 8, IndexKind::CanonicalOrdering),
    ];
    match Schema::new(20, fields) {
        Err(crate::Error::Precondition(_, _)) => (),
        res => panic!("expected precondition error, got {:?}", res.map(|_| ())),
    }
}

#[test]
fn test_schema_rejects_decreasing_offsets() {
    let fields = vec![
        Field::new("a", ValueType::I64, 8, IndexKind::None),
        Field::new("b", ValueType::I64, 0, IndexKind::None),
    ];
    match Schema::new(20, fields) {
        Err(crate::Error::Precondition(_, _)) => (),
        res => panic!("expected precondition error, got {:?}", res.map(|_| ())),
    }
}

#[test]
fn test_schema_rejects_overflow() {
    let fields = vec![Field::new("a", ValueType::I64, 10, IndexKind::None)];
    match Schema::new(16, fields) {
        Err(crate::Error::Precondition(_, _)) => (),
        res => panic!("expected precondition error, got {:?}", res.map(|_| ())),
    }
}

#[test]
fn test_schema_accepts_valid_layout() {
    let fields = vec![
        Field::new("off", ValueType::I64, 0, IndexKind::CanonicalOrdering),
        Field::new("id", ValueType::I64, 8, IndexKind::Unique),
    ];
    let schema = Schema::new(20, fields).expect("valid schema");
    assert_eq!(schema.canonical_field().unwrap().name, "off");
    assert_eq!(schema.indexable_fields().count(), 2);
}

#[test]
fn test_value_type_roundtrip() {
    let mut buf = [0u8; 8];
    ValueType::I64.write_i64(&mut buf, 0, -12345);
    assert_eq!(ValueType::I64.read_i64(&buf, 0), -12345);

    let mut buf = [0u8; 4];
    ValueType::I32.write_i64(&mut buf, 0, -77);
    assert_eq!(ValueType::I32.read_i64(&buf, 0), -77);
}
