//! In-memory store over a growable buffer

use std::io::{self, Cursor, Seek, SeekFrom, Write};

use crate::store::{read_up_to, RawByteStore};

/// A `Vec<u8>` with its own position. Writes past the end zero-fill the gap.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Cursor<Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.inner.get_ref()
    }

    /// Direct access to the buffer, e.g. to corrupt bytes in tests.
    pub fn as_mut_bytes(&mut self) -> &mut Vec<u8> {
        self.inner.get_mut()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

impl From<Vec<u8>> for MemoryStore {
    fn from(data: Vec<u8>) -> Self {
        Self {
            inner: Cursor::new(data),
        }
    }
}

impl RawByteStore for MemoryStore {
    fn size(&mut self) -> io::Result<u64> {
        Ok(self.inner.get_ref().len() as u64)
    }

    fn seek(&mut self, pos: u64) -> io::Result<u64> {
        self.inner.seek(SeekFrom::Start(pos))
    }

    fn read(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        read_up_to(&mut self.inner, max_len)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.inner.write(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let mut store = MemoryStore::new();
        assert_eq!(store.write(b"abcdef").unwrap(), 6);
        assert_eq!(store.size().unwrap(), 6);

        store.seek(2).unwrap();
        assert_eq!(store.read(3).unwrap(), b"cde");
        assert_eq!(store.read(3).unwrap(), b"f", "short read at end-of-file");
        assert!(store.read(3).unwrap().is_empty());
    }

    #[test]
    fn test_overwrite_in_place() {
        let mut store = MemoryStore::from(b"aaaaaa".to_vec());
        store.write_all_at(2, b"XY").unwrap();
        assert_eq!(store.as_bytes(), b"aaXYaa");
    }

    #[test]
    fn test_seek_past_end_reads_empty_and_writes_zero_fill() {
        let mut store = MemoryStore::from(b"ab".to_vec());
        assert!(store.read_at(10, 4).unwrap().is_empty());

        store.write_all_at(4, b"z").unwrap();
        assert_eq!(store.into_inner(), b"ab\0\0z");
    }
}
