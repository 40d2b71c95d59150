use std::{
    ffi, fs,
    io::Write,
    os::unix::fs::FileExt,
    path,
};

use serde::de::DeserializeOwned;

use crate::Result;

/// Read exactly `buf.len()` bytes starting at `offset`, without disturbing
/// the file's shared seek position. Store backends issue every record
/// read through this helper rather than `Seek`+`Read`, since concurrent
/// readers on the same descriptor would otherwise race each other's
/// cursor (spec §4.1: "store reads are positional, not cursor-based").
pub fn read_at(fd: &fs::File, offset: u64, buf: &mut [u8]) -> Result<()> {
    err_at!(IoFailure, fd.read_exact_at(buf, offset), "read_at {}", offset)
}

/// Write `buf` at `offset`, without disturbing the file's shared seek
/// position. See [read_at].
pub fn write_at(fd: &fs::File, offset: u64, buf: &[u8]) -> Result<()> {
    err_at!(IoFailure, fd.write_all_at(buf, offset), "write_at {}", offset)
}

/// create a file in append mode for writing, truncating any existing file
/// at that path.
pub fn create_file_a(file: &ffi::OsStr) -> Result<fs::File> {
    let os_file = {
        let os_file = path::Path::new(file);
        fs::remove_file(os_file).ok(); // NOTE: ignore remove errors.
        os_file
    };

    {
        let parent = match os_file.parent() {
            Some(parent) => Ok(parent),
            None => err_at!(Precondition, msg: "{:?}", file),
        }?;
        err_at!(IoFailure, fs::create_dir_all(parent))?;
    };

    let mut opts = fs::OpenOptions::new();
    Ok(err_at!(
        IoFailure,
        opts.append(true).create_new(true).open(os_file)
    )?)
}

/// open existing file in append mode for writing.
pub fn open_file_a(file: &ffi::OsStr) -> Result<fs::File> {
    let os_file = path::Path::new(file);
    let mut opts = fs::OpenOptions::new();
    Ok(err_at!(IoFailure, opts.append(true).open(os_file))?)
}

/// open file for reading.
pub fn open_file_r(file: &ffi::OsStr) -> Result<fs::File> {
    let os_file = path::Path::new(file);
    Ok(err_at!(
        IoFailure,
        fs::OpenOptions::new().read(true).open(os_file)
    )?)
}

/// open existing file for reading and writing, e.g. for the in-place
/// sort pass that shadow-file materialization performs, or for a
/// read-write memory mapping.
pub fn open_file_rw(file: &ffi::OsStr) -> Result<fs::File> {
    let os_file = path::Path::new(file);
    Ok(err_at!(
        IoFailure,
        fs::OpenOptions::new().read(true).write(true).open(os_file)
    )?)
}

/// create a fresh file open for reading and writing (no `O_APPEND`),
/// truncating any existing file at that path. Store backends issue
/// positional writes via `write_at`, which an append-mode descriptor
/// would silently redirect to the end of the file regardless of the
/// requested offset — writers that need `swap`/`write_at` semantics
/// (as opposed to pure sequential appends) must open this way instead
/// of [create_file_a].
pub fn create_file_rw(file: &ffi::OsStr) -> Result<fs::File> {
    let os_file = {
        let os_file = path::Path::new(file);
        fs::remove_file(os_file).ok();
        os_file
    };

    {
        let parent = match os_file.parent() {
            Some(parent) => Ok(parent),
            None => err_at!(Precondition, msg: "{:?}", file),
        }?;
        err_at!(IoFailure, fs::create_dir_all(parent))?;
    };

    Ok(err_at!(
        IoFailure,
        fs::OpenOptions::new().read(true).write(true).create_new(true).open(os_file)
    )?)
}

/// Write `data` to `file` at its current position and fsync before
/// returning, so a sidecar file (e.g. a `Stats` TOML blob) is durable
/// the moment this call returns rather than only after the caller's own
/// `sync_all` pass.
pub fn sync_write(file: &mut fs::File, data: &[u8]) -> Result<usize> {
    err_at!(IoFailure, file.write_all(data))?;
    err_at!(IoFailure, file.sync_all())?;
    Ok(data.len())
}

/// Load a TOML file and parse it into `T`.
pub fn load_toml<P, T>(loc: P) -> Result<T>
where
    P: AsRef<path::Path>,
    T: DeserializeOwned,
{
    let ploc: &path::Path = loc.as_ref();
    let data = err_at!(IoFailure, fs::read(ploc))?;
    let s = err_at!(Precondition, std::str::from_utf8(&data), "not utf8 for {:?}", ploc)?;
    err_at!(Precondition, toml::from_str(s), "file:{:?}", ploc)
}

#[cfg(test)]
#[path = "files_test.rs"]
mod files_test;
