//! Schema description: the ordered, typed fields that give meaning to the
//! otherwise-opaque byte blocks a [crate::store::Store] persists.
//!
//! Schema is expressed as data (a `Vec<Field>`), not as language-level
//! types, so that application code can describe a record layout at
//! runtime without macros or generics — see spec §9 "Schema as data, not
//! types".

use crate::Result;

/// Every record carries a leading 32-bit sequence number; application
/// fields are packed starting at this offset.
pub const PAYLOAD_OFFSET: u32 = 4;

/// The closed set of primitive field types a [Field] may declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ValueType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    /// 128-bit unsigned pair, used only as the compound sort key of the
    /// one-to-many index (spec §4.6).
    U128Pair,
}

impl ValueType {
    /// Byte width of this type.
    pub fn width(&self) -> usize {
        match self {
            ValueType::I8 | ValueType::U8 => 1,
            ValueType::I16 | ValueType::U16 => 2,
            ValueType::I32 | ValueType::U32 => 4,
            ValueType::I64 => 8,
            ValueType::U128Pair => 16,
        }
    }

    /// Read this type at `offset` in `record` and return it widened to an
    /// `i64` sort key. Not valid for [ValueType::U128Pair] — use
    /// [ValueType::read_u128_pair] instead.
    pub fn read_i64(&self, record: &[u8], offset: usize) -> i64 {
        let b = &record[offset..offset + self.width()];
        match self {
            ValueType::I8 => b[0] as i8 as i64,
            ValueType::U8 => b[0] as i64,
            ValueType::I16 => i16::from_le_bytes(b.try_into().unwrap()) as i64,
            ValueType::U16 => u16::from_le_bytes(b.try_into().unwrap()) as i64,
            ValueType::I32 => i32::from_le_bytes(b.try_into().unwrap()) as i64,
            ValueType::U32 => u32::from_le_bytes(b.try_into().unwrap()) as i64,
            ValueType::I64 => i64::from_le_bytes(b.try_into().unwrap()),
            ValueType::U128Pair => panic!("use read_u128_pair for a compound key"),
        }
    }

    /// Write an `i64` sort key at `offset` in `record`, narrowing to this
    /// type's width.
    pub fn write_i64(&self, record: &mut [u8], offset: usize, value: i64) {
        let b = &mut record[offset..offset + self.width()];
        match self {
            ValueType::I8 | ValueType::U8 => b[0] = value as u8,
            ValueType::I16 | ValueType::U16 => b.copy_from_slice(&(value as u16).to_le_bytes()),
            ValueType::I32 | ValueType::U32 => b.copy_from_slice(&(value as u32).to_le_bytes()),
            ValueType::I64 => b.copy_from_slice(&value.to_le_bytes()),
            ValueType::U128Pair => panic!("use write_u128_pair for a compound key"),
        }
    }

    /// Read the compound `(high: i64, low: i64)` key used by the
    /// one-to-many index's sort order (spec §4.3).
    pub fn read_u128_pair(record: &[u8], offset: usize) -> (i64, i64) {
        let hi = i64::from_le_bytes(record[offset..offset + 8].try_into().unwrap());
        let lo = i64::from_le_bytes(record[offset + 8..offset + 16].try_into().unwrap());
        (hi, lo)
    }
}

/// Whether (and how) a field is materialized as a sorted shadow file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum IndexKind {
    None,
    /// Defines the "true" order of the primary store; at most one field
    /// per schema may declare this.
    CanonicalOrdering,
    Unique,
}

impl IndexKind {
    pub fn is_indexable(&self) -> bool {
        !matches!(self, IndexKind::None)
    }
}

/// One named, typed, positioned field of a [Schema].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Field {
    pub name: String,
    pub value_type: ValueType,
    /// Byte offset within the record's *payload* (i.e. relative to
    /// [PAYLOAD_OFFSET], not to the start of the record).
    pub offset: u32,
    pub index_kind: IndexKind,
}

impl Field {
    pub fn new(name: &str, value_type: ValueType, offset: u32, index_kind: IndexKind) -> Field {
        Field { name: name.to_string(), value_type, offset, index_kind }
    }

    /// Byte offset relative to the start of the record (i.e. including
    /// the leading sequence number).
    pub fn record_offset(&self) -> u32 {
        PAYLOAD_OFFSET + self.offset
    }
}

/// An ordered, validated set of [Field]s plus the record width they're
/// packed into.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Schema {
    pub record_size: u32,
    pub fields: Vec<Field>,
}

impl Schema {
    /// Validate and construct a schema. Checks the invariants of spec §3:
    /// at most one `CanonicalOrdering` field, offsets monotonically
    /// non-decreasing, and every field fits within `record_size`.
    pub fn new(record_size: u32, fields: Vec<Field>) -> Result<Schema> {
        if record_size == 0 {
            err_at!(Precondition, msg: "record_size must be > 0")?;
        }

        let mut canonical = 0;
        let mut last_offset = 0u32;
        for f in fields.iter() {
            if f.offset < last_offset {
                err_at!(
                    Precondition,
                    msg: "field {:?} offset {} precedes previous offset {}",
                    f.name, f.offset, last_offset
                )?;
            }
            last_offset = f.offset;

            let end = PAYLOAD_OFFSET + f.offset + (f.value_type.width() as u32);
            if end > record_size {
                err_at!(
                    Precondition,
                    msg: "field {:?} [{}..{}) overflows record_size {}",
                    f.name, PAYLOAD_OFFSET + f.offset, end, record_size
                )?;
            }

            if f.index_kind == IndexKind::CanonicalOrdering {
                canonical += 1;
            }
        }

        if canonical > 1 {
            err_at!(Precondition, msg: "schema declares {} canonical-ordering fields, at most 1 allowed", canonical)?;
        }

        Ok(Schema { record_size, fields })
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn canonical_field(&self) -> Option<&Field> {
        self.fields.iter().find(|f| f.index_kind == IndexKind::CanonicalOrdering)
    }

    pub fn indexable_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.index_kind.is_indexable())
    }
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod schema_test;
