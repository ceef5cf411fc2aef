//! The storage capability trait

use std::io::{self, Read};

/// A byte-addressable device with a single shared position.
///
/// Callers must not assume the position survives between their own calls:
/// always `seek` (or use [`read_at`](RawByteStore::read_at) /
/// [`write_all_at`](RawByteStore::write_all_at)) before touching data.
pub trait RawByteStore {
    /// Current length in bytes.
    fn size(&mut self) -> io::Result<u64>;

    /// Move the position to `pos`. Positions past the end are allowed and
    /// read as end-of-file.
    fn seek(&mut self, pos: u64) -> io::Result<u64>;

    /// Read up to `max_len` bytes from the current position, advancing it.
    /// Returns fewer bytes only at end-of-file.
    fn read(&mut self, max_len: usize) -> io::Result<Vec<u8>>;

    /// Write at the current position (overwriting or extending), advancing it.
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Release the device. The store must not be used afterwards.
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }

    fn read_at(&mut self, pos: u64, len: usize) -> io::Result<Vec<u8>> {
        self.seek(pos)?;
        self.read(len)
    }

    fn write_all_at(&mut self, pos: u64, mut data: &[u8]) -> io::Result<()> {
        self.seek(pos)?;
        while !data.is_empty() {
            match self.write(data)? {
                0 => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "store accepted no bytes",
                    ))
                }
                n => data = &data[n..],
            }
        }
        Ok(())
    }
}

impl<S: RawByteStore + ?Sized> RawByteStore for &mut S {
    fn size(&mut self) -> io::Result<u64> {
        (**self).size()
    }

    fn seek(&mut self, pos: u64) -> io::Result<u64> {
        (**self).seek(pos)
    }

    fn read(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        (**self).read(max_len)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        (**self).write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<S: RawByteStore + ?Sized> RawByteStore for Box<S> {
    fn size(&mut self) -> io::Result<u64> {
        (**self).size()
    }

    fn seek(&mut self, pos: u64) -> io::Result<u64> {
        (**self).seek(pos)
    }

    fn read(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        (**self).read(max_len)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        (**self).write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Drain up to `max_len` bytes, retrying short reads until end-of-file.
pub(crate) fn read_up_to<R: Read>(reader: R, max_len: usize) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(max_len.min(16 * 1024 * 1024));
    reader.take(max_len as u64).read_to_end(&mut buf)?;
    Ok(buf)
}
