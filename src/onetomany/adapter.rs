//! The one external-collaborator seam of the one-to-many index (spec
//! §4.7): translating between a node's on-disk record index and the
//! key/value domain it actually represents, delegating to whatever
//! primary/secondary index owns that translation.

use crate::Result;

pub trait GraphAdapter {
    /// Record index of `key`'s first occurrence in the forward store.
    fn index_of_key(&self, key: i64) -> Result<i64>;

    /// Record index of `value`'s first occurrence in the inverse store.
    fn index_of_value(&self, value: i64) -> Result<i64>;

    /// The application-level key that `index` (a `key_index` field from a
    /// forward/inverse record) refers to.
    fn key_for_key_index(&self, index: u32) -> Result<i64>;

    /// The application-level value that `index` (a `value_index` field)
    /// refers to.
    fn value_for_value_index(&self, index: u32) -> Result<i64>;
}

#[cfg(test)]
#[path = "adapter_test.rs"]
mod adapter_test;
