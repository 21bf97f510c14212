//! Storage collaborator seam.
//!
//! The logger never touches the filesystem directly; it talks to a
//! [`StorageDevice`] that hands out [`StorageFile`] handles. Each operation is
//! assumed atomic per call and reports success or failure through
//! [`StorageError`]. `FsDevice` is the production implementation over
//! `std::fs`; tests substitute in-memory devices.

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a storage primitive.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o error: {0}")]
    Io(#[from] io::Error),
}

/// A filesystem on the backing storage medium.
///
/// `create_file` is idempotent from the caller's point of view: it fails when
/// the file already exists, and the logger ignores that failure. Dropping a
/// [`StorageFile`] closes it.
pub trait StorageDevice: Send + Sync {
    /// Creates an empty file at `path`. Fails if the file already exists.
    fn create_file(&self, path: &str) -> Result<(), StorageError>;

    /// Opens the file at `path` for writing.
    fn open_file(&self, path: &str) -> Result<Box<dyn StorageFile>, StorageError>;

    /// Commits any outstanding writes to the medium.
    fn commit(&self) -> Result<(), StorageError>;
}

/// An open file handle on a [`StorageDevice`].
pub trait StorageFile: Send {
    /// Current size of the file in bytes.
    fn size(&mut self) -> Result<u64, StorageError>;

    /// Writes `data` at the given byte offset. With `flush` set, the data is
    /// pushed to the medium before the call returns.
    fn write_at(&mut self, offset: u64, data: &[u8], flush: bool) -> Result<(), StorageError>;
}

/// Storage device backed by a directory on the local filesystem.
///
/// Device-root paths such as `"/sdlog.log"` resolve against the configured
/// root directory.
pub struct FsDevice {
    root: PathBuf,
}

impl FsDevice {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute path a device-root path resolves to.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl StorageDevice for FsDevice {
    fn create_file(&self, path: &str) -> Result<(), StorageError> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.resolve(path))?;
        Ok(())
    }

    fn open_file(&self, path: &str) -> Result<Box<dyn StorageFile>, StorageError> {
        let file = OpenOptions::new().write(true).open(self.resolve(path))?;
        Ok(Box::new(FsFile { file }))
    }

    fn commit(&self) -> Result<(), StorageError> {
        // The per-write flush option already syncs file data; directory
        // metadata is left to the OS.
        Ok(())
    }
}

struct FsFile {
    file: File,
}

impl StorageFile for FsFile {
    fn size(&mut self) -> Result<u64, StorageError> {
        Ok(self.file.metadata()?.len())
    }

    fn write_at(&mut self, offset: u64, data: &[u8], flush: bool) -> Result<(), StorageError> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)?;
        if flush {
            self.file.sync_data()?;
        }
        Ok(())
    }
}
