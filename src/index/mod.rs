//! Schema-driven index writer/reader (spec §4.5): a primary `B.offsets`
//! file plus one sorted shadow file `B.<field>s` per indexable
//! non-canonical field.

pub mod reader;
pub mod writer;

pub use reader::IndexReader;
pub use writer::IndexWriter;
