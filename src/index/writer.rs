//! `IndexWriter`: appends schema-packed records to a primary store,
//! detects illegal multi-threaded writes, and materializes sorted shadow
//! files on close (spec §4.5).

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
    thread::ThreadId,
};

use crate::{
    config::Config,
    schema::{Field, IndexKind, Schema, ValueType},
    store::{descriptor::DescriptorStore, Store},
    util, Result,
};

pub struct IndexWriter {
    dir: PathBuf,
    name: String,
    config: Config,
    schema: Schema,
    store: Store,
    seq: u32,
    first_thread: Mutex<Option<ThreadId>>,
    multi_threaded: AtomicBool,
}

impl IndexWriter {
    /// Opens `B.offsets` `CREATE|READ|WRITE` (spec §4.5) for a brand-new
    /// index. `config.record_size` must match `schema.record_size`.
    pub fn create(config: &Config, schema: Schema) -> Result<IndexWriter> {
        if schema.record_size != config.record_size {
            err_at!(
                Precondition,
                msg: "schema record_size {} does not match config record_size {}",
                schema.record_size, config.record_size
            )?;
        }
        let path = config.path_for("offsets");
        let fd = util::create_file_rw(path.as_os_str())?;
        let store = Store::Descriptor(DescriptorStore::new(fd, schema.record_size)?);
        Ok(IndexWriter {
            dir: config.dir.clone(),
            name: config.name.clone(),
            config: config.clone(),
            schema,
            store,
            seq: 0,
            first_thread: Mutex::new(None),
            multi_threaded: AtomicBool::new(false),
        })
    }

    /// Append one record. `values` names a field and the `i64` to pack
    /// at its declared offset; unnamed fields are left zeroed. Prepends
    /// the monotonically assigned sequence number.
    pub fn write(&mut self, values: &[(&str, i64)]) -> Result<u64> {
        self.check_thread()?;

        let r = self.schema.record_size as usize;
        let mut buf = vec![0u8; r];
        buf[0..4].copy_from_slice(&self.seq.to_le_bytes());
        for (name, value) in values {
            let field = match self.schema.field(name) {
                Some(f) => f,
                None => err_at!(Precondition, msg: "unknown field {:?}", name)?,
            };
            field.value_type.write_i64(&mut buf, field.record_offset() as usize, *value);
        }

        let idx = self.store.append(&buf)?;
        self.seq += 1;
        Ok(idx)
    }

    /// First writer thread wins silently; a second distinct thread either
    /// promotes to multi-threaded mode (schema has a canonical field) or
    /// fails fast (spec §4.5/§5).
    fn check_thread(&self) -> Result<()> {
        let tid = std::thread::current().id();
        let mut guard = self.first_thread.lock().unwrap();
        match *guard {
            None => {
                *guard = Some(tid);
                Ok(())
            }
            Some(first) if first == tid => Ok(()),
            Some(_) => {
                if self.schema.canonical_field().is_some() {
                    self.multi_threaded.store(true, Ordering::Release);
                    Ok(())
                } else {
                    err_at!(Precondition, msg: "multi-threaded writes require a CanonicalOrdering field")
                }
            }
        }
    }

    fn path_for(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.name, suffix))
    }

    /// (1) sort + renumber if multi-threaded writes happened; (2) for
    /// each indexable non-canonical field, copy the primary into
    /// `B.<field>s` and sort the copy in place; (3) drop all descriptors.
    /// A failure partway leaves the directory in a partial state —
    /// callers clean up, there is no recovery (spec §4.5).
    pub fn close(mut self) -> Result<()> {
        log::debug!("closing index {:?} ({} records written)", self.name, self.seq);
        if self.multi_threaded.load(Ordering::Acquire) {
            if let Some(canon) = self.schema.canonical_field().cloned() {
                log::info!("index {:?} had multi-threaded writes, sorting and renumbering by {:?}", self.name, canon.name);
                self.store.sort(canon.record_offset(), canon.value_type)?;
                let n = self.store.size();
                for i in 0..n {
                    self.store.write_typed(i, 0, ValueType::U32, i as i64)?;
                }
            }
        }

        let fields: Vec<Field> = self
            .schema
            .indexable_fields()
            .filter(|f| f.index_kind != IndexKind::CanonicalOrdering)
            .cloned()
            .collect();
        for field in &fields {
            log::debug!("materializing shadow index {:?}.{}s", self.name, field.name);
            self.materialize_shadow(field)?;
        }

        self.store.sync()?;
        self.write_stats()?;
        log::info!("closed index {:?}", self.name);
        Ok(())
    }

    /// Persist the configuration this index was actually built with
    /// (spec: `Config`/`Stats` ambient stack), durably in one call via
    /// [util::sync_write].
    fn write_stats(&self) -> Result<()> {
        let toml = self.config.stats().to_toml()?;
        let path = self.path_for("toml");
        let mut fd = util::create_file_rw(path.as_os_str())?;
        util::sync_write(&mut fd, toml.as_bytes())?;
        Ok(())
    }

    fn materialize_shadow(&self, field: &Field) -> Result<()> {
        let shadow_path = self.path_for(&format!("{}s", field.name));
        let fd = util::create_file_rw(shadow_path.as_os_str())?;
        let mut shadow = Store::Descriptor(DescriptorStore::new(fd, self.schema.record_size)?);

        let n = self.store.size();
        for i in 0..n {
            let bytes = self.store.read(i)?.to_vec();
            shadow.append(&bytes)?;
        }
        shadow.sort(field.record_offset(), field.value_type)?;
        shadow.sync()
    }
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod writer_test;
