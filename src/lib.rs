//! `recidx` is a fixed-record file store with a schema-driven index
//! layer on top of it.
//!
//! Every record in a store is the same fixed width `R`, and record `i`
//! lives at byte offset `i * R` — no header, no framing. Four
//! interchangeable backends implement that contract (plain positional
//! I/O, a thread-local caching variant, and two memory-mapped variants),
//! plus an adaptive backend that migrates between them under load.
//!
//! On top of the store sits a schema-driven index: an [IndexWriter]/
//! [IndexReader] pair that packs application fields into fixed records,
//! maintains sorted shadow files for any field declared indexable, and a
//! one-to-many extension ([onetomany]) for multi-valued relationships
//! with a lazily-built inverse.

#[macro_use]
mod error;

pub mod bufferpool;
pub mod config;
pub mod index;
pub mod onetomany;
pub mod regionlock;
pub mod schema;
pub mod store;
mod util;

pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::index::{IndexReader, IndexWriter};
pub use crate::regionlock::RegionLock;
pub use crate::schema::{Field, IndexKind, Schema, ValueType};
pub use crate::store::{AdaptiveStore, Bias, ByteView, Store};
