//! Module implement common utility functions and types.

pub mod files;

pub use files::{create_file_a, create_file_rw, load_toml, open_file_a, open_file_r, open_file_rw, read_at, sync_write, write_at};
