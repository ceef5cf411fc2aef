//! Local file store

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::store::{read_up_to, RawByteStore};

#[derive(Debug)]
pub struct FileStore {
    file: File,
    path: PathBuf,
    writable: bool,
}

impl FileStore {
    /// Open an existing file read-only.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        tracing::debug!(path = %path.display(), "opened store read-only");
        Ok(Self {
            file,
            path: path.to_path_buf(),
            writable: false,
        })
    }

    /// Open an existing file for reading and appending.
    pub fn open_rw(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        tracing::debug!(path = %path.display(), "opened store read-write");
        Ok(Self {
            file,
            path: path.to_path_buf(),
            writable: true,
        })
    }

    /// Create (or truncate) a file for writing.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        tracing::debug!(path = %path.display(), "created store");
        Ok(Self {
            file,
            path: path.to_path_buf(),
            writable: true,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RawByteStore for FileStore {
    fn size(&mut self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn seek(&mut self, pos: u64) -> io::Result<u64> {
        self.file.seek(SeekFrom::Start(pos))
    }

    fn read(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        read_up_to(&mut self.file, max_len)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.file.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        if self.writable {
            self.file.sync_data()?;
        }
        tracing::debug!(path = %self.path.display(), "closed store");
        Ok(())
    }
}
