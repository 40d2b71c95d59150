use std::path::PathBuf;

use crate::{
    config::Config,
    schema::ValueType,
    store::{descriptor::DescriptorStore, Store},
    util, Result,
};

use super::{COUNTS_RECORD_SIZE, RECORD_SIZE};

/// Whether (and when) the inverse `B.m21` file is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InverseMode {
    None,
    /// Append the flipped record inline, alongside every forward `put`.
    Inline,
    /// Build the inverse only on `close`, by streaming the sorted
    /// forward file and flipping each record.
    AtClose,
}

pub struct OneToManyWriter {
    dir: PathBuf,
    name: String,
    forward: Store,
    inverse: Option<Store>,
    inverse_mode: InverseMode,
}

fn pack(key_idx: u32, val_idx: u32, key: i64, value: i64) -> [u8; RECORD_SIZE as usize] {
    let mut buf = [0u8; RECORD_SIZE as usize];
    buf[0..4].copy_from_slice(&key_idx.to_le_bytes());
    buf[4..8].copy_from_slice(&val_idx.to_le_bytes());
    buf[8..16].copy_from_slice(&key.to_le_bytes());
    buf[16..24].copy_from_slice(&value.to_le_bytes());
    buf
}

impl OneToManyWriter {
    pub fn create(config: &Config, inverse_mode: InverseMode) -> Result<OneToManyWriter> {
        let fwd_path = config.path_for("12m");
        let fd = util::create_file_rw(fwd_path.as_os_str())?;
        let forward = Store::Descriptor(DescriptorStore::new(fd, RECORD_SIZE)?);

        let inverse = if inverse_mode == InverseMode::Inline {
            let inv_path = config.path_for("m21");
            let fd2 = util::create_file_rw(inv_path.as_os_str())?;
            Some(Store::Descriptor(DescriptorStore::new(fd2, RECORD_SIZE)?))
        } else {
            None
        };

        Ok(OneToManyWriter { dir: config.dir.clone(), name: config.name.clone(), forward, inverse, inverse_mode })
    }

    pub fn put(&mut self, key_idx: u32, val_idx: u32, key: i64, value: i64) -> Result<()> {
        self.forward.append(&pack(key_idx, val_idx, key, value))?;
        if let Some(inv) = &mut self.inverse {
            inv.append(&pack(val_idx, key_idx, value, key))?;
        }
        Ok(())
    }

    fn path_for(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.name, suffix))
    }

    /// (1) sort forward by compound `(key,value)`; (2) emit `B.counts`
    /// in one pass; (3) sort (or, if requested only at close, build)
    /// the inverse (spec §4.6).
    pub fn close(mut self) -> Result<()> {
        self.forward.sort(8, ValueType::U128Pair)?;
        self.write_counts()?;

        match self.inverse_mode {
            InverseMode::None => (),
            InverseMode::Inline => {
                if let Some(mut inv) = self.inverse.take() {
                    inv.sort(8, ValueType::U128Pair)?;
                    inv.sync()?;
                }
            }
            InverseMode::AtClose => self.build_inverse_at_close()?,
        }

        self.forward.sync()?;
        log::info!("closed one-to-many index {:?}", self.name);
        Ok(())
    }

    fn write_counts(&self) -> Result<()> {
        let path = self.path_for("counts");
        let fd = util::create_file_rw(path.as_os_str())?;
        let mut counts = Store::Descriptor(DescriptorStore::new(fd, COUNTS_RECORD_SIZE)?);

        let n = self.forward.size();
        let mut i = 0u64;
        while i < n {
            let rec = self.forward.read(i)?;
            let key_idx = u32::from_le_bytes(rec[0..4].try_into().unwrap());
            let key = ValueType::I64.read_i64(&rec, 8);
            drop(rec);

            let mut j = i + 1;
            while j < n {
                let r2 = self.forward.read(j)?;
                if ValueType::I64.read_i64(&r2, 8) != key {
                    break;
                }
                j += 1;
            }

            let mut buf = vec![0u8; COUNTS_RECORD_SIZE as usize];
            buf[0..4].copy_from_slice(&key_idx.to_le_bytes());
            buf[4..12].copy_from_slice(&key.to_le_bytes());
            buf[12..16].copy_from_slice(&((j - i) as u32).to_le_bytes());
            counts.append(&buf)?;
            i = j;
        }
        counts.sync()
    }

    fn build_inverse_at_close(&mut self) -> Result<()> {
        let inv_path = self.path_for("m21");
        let fd = util::create_file_rw(inv_path.as_os_str())?;
        let mut inv = Store::Descriptor(DescriptorStore::new(fd, RECORD_SIZE)?);

        let n = self.forward.size();
        for i in 0..n {
            let rec = self.forward.read(i)?;
            let key_idx = u32::from_le_bytes(rec[0..4].try_into().unwrap());
            let val_idx = u32::from_le_bytes(rec[4..8].try_into().unwrap());
            let key = ValueType::I64.read_i64(&rec, 8);
            let value = ValueType::I64.read_i64(&rec, 16);
            drop(rec);
            inv.append(&pack(val_idx, key_idx, value, key))?;
        }
        inv.sort(8, ValueType::U128Pair)?;
        inv.sync()
    }
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod writer_test;
