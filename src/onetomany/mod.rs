//! One-to-many (multi-valued) index (spec §4.6): 24-byte records
//! `[keyIdx:u32][valIdx:u32][key:i64][value:i64]`, sorted by the compound
//! 128-bit `(key, value)` key, with a `B.12m` forward file, lazily-built
//! `B.m21` inverse, and a `B.counts` sidecar.

pub mod adapter;
pub mod reader;
pub mod writer;

pub use adapter::GraphAdapter;
pub use reader::OneToManyReader;
pub use writer::{InverseMode, OneToManyWriter};

/// Byte width of one forward/inverse record.
pub const RECORD_SIZE: u32 = 24;
/// Byte width of one counts record.
pub const COUNTS_RECORD_SIZE: u32 = 16;
