//! `std::io` adapters so a stream can feed `BufReader`, `io::copy`, hashers,
//! and media back-ends expecting `Read + Seek`.
//!
//! Seeks clamp instead of failing: `SeekFrom::End(n)` with `n > 0` lands on
//! the end, and a negative result lands on 0.

use std::io::{self, Read, Seek, SeekFrom, Write};

use seekcrypt_storage::RawByteStore;

use crate::stream::EncryptedStream;

impl<S: RawByteStore> Read for EncryptedStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_into(buf)?)
    }
}

impl<S: RawByteStore> Write for EncryptedStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(EncryptedStream::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(EncryptedStream::flush(self)?)
    }
}

impl<S: RawByteStore> Seek for EncryptedStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => n,
            SeekFrom::End(delta) => offset_by(self.logical_size(), delta),
            SeekFrom::Current(delta) => offset_by(self.position(), delta),
        };
        Ok(EncryptedStream::seek(self, target))
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position())
    }
}

fn offset_by(base: u64, delta: i64) -> u64 {
    if delta >= 0 {
        base.saturating_add(delta as u64)
    } else {
        base.saturating_sub(delta.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seekcrypt_crypto::{CipherKey, ChunkCodec, PLAIN_CHUNK_SIZE};
    use seekcrypt_storage::MemoryStore;
    use std::io::BufRead;

    fn codec() -> ChunkCodec {
        ChunkCodec::new(&CipherKey::from_bytes([0x11u8; 32]))
    }

    #[test]
    fn test_read_to_end_matches_plaintext() {
        let original: Vec<u8> = (0u8..=255).cycle().take(3 * PLAIN_CHUNK_SIZE + 77).collect();
        let store = MemoryStore::from(codec().encrypt_stream(&original).unwrap());
        let mut stream = EncryptedStream::open(store, codec()).unwrap();

        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn test_write_all_and_copy() {
        let original: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let mut stream = EncryptedStream::open(MemoryStore::new(), codec()).unwrap();

        std::io::copy(&mut &original[..], &mut stream).unwrap();
        stream.rewind().unwrap();

        let mut out = Vec::new();
        std::io::copy(&mut stream, &mut out).unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn test_seek_from_variants_clamp() {
        let store = MemoryStore::from(codec().encrypt_stream(&[9u8; 1000]).unwrap());
        let mut stream = EncryptedStream::open(store, codec()).unwrap();

        assert_eq!(Seek::seek(&mut stream, SeekFrom::End(-10)).unwrap(), 990);
        assert_eq!(Seek::seek(&mut stream, SeekFrom::Current(5)).unwrap(), 995);
        assert_eq!(Seek::seek(&mut stream, SeekFrom::Current(-2000)).unwrap(), 0);
        assert_eq!(Seek::seek(&mut stream, SeekFrom::End(50)).unwrap(), 1000);
        assert_eq!(Seek::seek(&mut stream, SeekFrom::Start(u64::MAX)).unwrap(), 1000);
        assert_eq!(stream.stream_position().unwrap(), 1000);
    }

    #[test]
    fn test_buffered_lines() {
        let text = b"first line\nsecond line\nthird line\n";
        let store = MemoryStore::from(codec().encrypt_stream(text).unwrap());
        let stream = EncryptedStream::open(store, codec()).unwrap();

        let lines: Vec<String> = std::io::BufReader::new(stream)
            .lines()
            .map(Result::unwrap)
            .collect();
        assert_eq!(lines, ["first line", "second line", "third line"]);
    }

    #[test]
    fn test_authentication_surfaces_as_invalid_data() {
        let mut sealed = codec().encrypt_stream(b"secret").unwrap();
        sealed[15] ^= 0x40;
        let mut stream = EncryptedStream::open(MemoryStore::from(sealed), codec()).unwrap();

        let err = stream.read_to_end(&mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_shrunk_store_is_not_mistaken_for_eof() {
        let original = vec![3u8; 2 * PLAIN_CHUNK_SIZE];
        let store = MemoryStore::from(codec().encrypt_stream(&original).unwrap());
        let mut stream = EncryptedStream::open(store, codec()).unwrap();
        stream
            .get_mut()
            .as_mut_bytes()
            .truncate(seekcrypt_crypto::PHYSICAL_CHUNK_SIZE);

        let err = std::io::copy(&mut stream, &mut std::io::sink()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_interior_write_surfaces_as_unsupported() {
        let store = MemoryStore::from(codec().encrypt_stream(b"0123456789").unwrap());
        let mut stream = EncryptedStream::open(store, codec()).unwrap();

        let err = stream.write_all(b"x").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
    }

    #[test]
    fn test_offset_by() {
        assert_eq!(offset_by(10, 5), 15);
        assert_eq!(offset_by(10, -15), 0);
        assert_eq!(offset_by(u64::MAX, 1), u64::MAX);
        assert_eq!(offset_by(10, i64::MIN), 0);
    }
}
