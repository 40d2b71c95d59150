//! The "storage specification": a builder-style [Config] describing how a
//! store/index should be opened, and its durable counterpart [Stats] —
//! the configuration a store was *actually* built with, persisted beside
//! the data so a later reader doesn't have to re-specify it.
//!
//! Grounded on `robt::Config`/`robt::Stats`: public fields, `set_*(&mut
//! self, ...) -> &mut Self` methods, and a TOML-backed `Stats` round-trip.

use std::path::PathBuf;

use crate::Result;

/// Default concurrency: one worker per logical CPU, mirroring the
/// teacher's `util::thread::Pool::new_synch`/`new_unsync`, which size a
/// default pool from `num_cpus::get()`.
pub fn default_concurrency() -> usize {
    num_cpus::get()
}

/// Builder for the options spec.md §6 lists, plus the `name`/`dir` pair
/// needed to locate an index's files on disk (`B.offsets`, `B.<field>s`,
/// `B.12m`, `B.m21`, `B.counts`).
#[derive(Clone, Debug)]
pub struct Config {
    pub dir: PathBuf,
    pub name: String,
    pub record_size: u32,
    pub prefer_direct: bool,
    pub prefer_mapped: bool,
    pub always_mapped: bool,
    pub writable: bool,
    pub concurrency: usize,
}

impl Config {
    /// New config for an index/store named `name` rooted at `dir`. All
    /// flags default to the conservative descriptor-based path; callers
    /// opt into mapping or write access explicitly.
    pub fn new(dir: impl Into<PathBuf>, name: &str, record_size: u32) -> Config {
        Config {
            dir: dir.into(),
            name: name.to_string(),
            record_size,
            prefer_direct: true,
            prefer_mapped: false,
            always_mapped: false,
            writable: false,
            concurrency: default_concurrency(),
        }
    }

    pub fn set_prefer_direct(&mut self, value: bool) -> &mut Self {
        self.prefer_direct = value;
        self
    }

    pub fn set_prefer_mapped(&mut self, value: bool) -> &mut Self {
        self.prefer_mapped = value;
        self
    }

    pub fn set_always_mapped(&mut self, value: bool) -> &mut Self {
        self.always_mapped = value;
        self
    }

    pub fn set_writable(&mut self, value: bool) -> &mut Self {
        self.writable = value;
        self
    }

    pub fn set_concurrency(&mut self, value: usize) -> &mut Self {
        self.concurrency = value.max(1);
        self
    }

    /// Path of a file named `B.<suffix>` under this config's directory.
    pub fn path_for(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.name, suffix))
    }

    pub fn stats(&self) -> Stats {
        Stats {
            record_size: self.record_size,
            prefer_direct: self.prefer_direct,
            prefer_mapped: self.prefer_mapped,
            always_mapped: self.always_mapped,
            writable: self.writable,
            concurrency: self.concurrency,
        }
    }
}

/// The durable, serializable record of the configuration a store was
/// actually built with. Round-trips through TOML exactly as
/// `robt::Stats` does for the teacher.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Stats {
    pub record_size: u32,
    pub prefer_direct: bool,
    pub prefer_mapped: bool,
    pub always_mapped: bool,
    pub writable: bool,
    pub concurrency: usize,
}

impl Stats {
    pub fn to_toml(&self) -> Result<String> {
        err_at!(Precondition, toml::to_string(self))
    }

    pub fn from_toml(s: &str) -> Result<Stats> {
        err_at!(Precondition, toml::from_str(s))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
