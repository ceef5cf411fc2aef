//! Random-access encrypted stream
//!
//! Read path for a request of `len` bytes at logical `cursor`:
//! ```text
//! cursor ──logical_to_physical──▶ physical_pos ──chunk_start──▶ start
//! start + chunk_span(offset_in_span + len) ──▶ end
//! store[start..end] ──decrypt_stream──▶ span ──slice──▶ span[offset_in_span..][..len]
//! ```
//!
//! Appends are buffered: bytes past the last full chunk stay in memory until
//! they fill a chunk or the stream is flushed, so a session never rewrites
//! chunks it has already sealed.
//!
//! Not safe for concurrent use: the cursor and the store position move in
//! separate steps.

use std::io;

use seekcrypt_core::{SeekcryptError, SeekcryptResult};
use seekcrypt_crypto::{ChunkCodec, OffsetTranslator, PHYSICAL_CHUNK_SIZE, PLAIN_CHUNK_SIZE};
use seekcrypt_storage::RawByteStore;
use tracing::{debug, trace, warn};
use zeroize::Zeroizing;

/// Size summary of a sealed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub physical_size: u64,
    pub logical_size: u64,
    pub chunk_count: u64,
    /// Plaintext the chunks could hold if the last one were full
    pub chunk_capacity: u64,
}

impl std::fmt::Display for StreamInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "physical size:  {} bytes", self.physical_size)?;
        writeln!(f, "logical size:   {} bytes", self.logical_size)?;
        writeln!(f, "chunks:         {}", self.chunk_count)?;
        write!(f, "chunk capacity: {} bytes", self.chunk_capacity)
    }
}

/// Plaintext view over a store holding sealed chunks.
pub struct EncryptedStream<S: RawByteStore> {
    store: S,
    codec: ChunkCodec,
    /// Geometry of the sealed chunks the stream treats as committed.
    sealed: OffsetTranslator,
    /// Plaintext following `sealed`; shorter than one chunk between calls.
    pending: Zeroizing<Vec<u8>>,
    /// Whether `pending` currently sits on the store as a short final chunk.
    pending_on_disk: bool,
    cursor: u64,
}

impl<S: RawByteStore + std::fmt::Debug> std::fmt::Debug for EncryptedStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedStream")
            .field("store", &self.store)
            .field("sealed", &self.sealed)
            .field("buffered", &self.pending.len())
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl<S: RawByteStore> EncryptedStream<S> {
    /// Bind to an already-open store. Reads the physical size once.
    pub fn open(mut store: S, codec: ChunkCodec) -> SeekcryptResult<Self> {
        let physical_size = store.size()?;
        let sealed = OffsetTranslator::for_physical_size(physical_size);
        debug!(
            physical_size,
            logical_size = sealed.logical_size(),
            "opened encrypted stream"
        );
        Ok(Self {
            store,
            codec,
            sealed,
            pending: Zeroizing::new(Vec::new()),
            pending_on_disk: false,
            cursor: 0,
        })
    }

    /// Logical size, after re-reading the physical size from the store.
    ///
    /// While appended bytes are buffered the stream owns the tail and the
    /// store is not consulted.
    pub fn size(&mut self) -> SeekcryptResult<u64> {
        self.refresh()?;
        Ok(self.logical_size())
    }

    /// Logical size as of the last refresh, buffered appends included; no I/O.
    pub fn logical_size(&self) -> u64 {
        self.sealed.logical_size() + self.pending.len() as u64
    }

    /// Physical size the store will have once buffered appends are flushed.
    pub fn physical_size(&self) -> u64 {
        self.translator().physical_size()
    }

    pub fn translator(&self) -> OffsetTranslator {
        if self.pending.is_empty() {
            self.sealed
        } else {
            OffsetTranslator::for_physical_size(
                self.sealed.physical_size()
                    + OffsetTranslator::physical_size_for(self.pending.len() as u64),
            )
        }
    }

    pub fn info(&self) -> StreamInfo {
        let t = self.translator();
        let physical_size = t.physical_size();
        StreamInfo {
            physical_size,
            logical_size: t.logical_size(),
            chunk_count: OffsetTranslator::chunk_count(physical_size),
            chunk_capacity: OffsetTranslator::chunk_capacity(physical_size),
        }
    }

    /// Move the cursor, clamped to `[0, logical_size]`. Returns the new position.
    pub fn seek(&mut self, logical_pos: u64) -> u64 {
        self.cursor = logical_pos.min(self.logical_size());
        self.cursor
    }

    pub fn position(&self) -> u64 {
        self.cursor
    }

    pub fn at_end(&self) -> bool {
        self.cursor >= self.logical_size()
    }

    pub fn bytes_available(&self) -> u64 {
        self.logical_size().saturating_sub(self.cursor)
    }

    /// Always false: any offset can be reached directly.
    pub fn is_sequential(&self) -> bool {
        false
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Advance the cursor without decrypting. Returns how far it moved.
    pub fn skip(&mut self, len: u64) -> u64 {
        let from = self.cursor;
        self.seek(from.saturating_add(len)) - from
    }

    /// Read up to `max_len` plaintext bytes at the cursor.
    ///
    /// Returns fewer bytes only at end-of-file. Only the chunks overlapping the
    /// request are fetched and opened. A store holding fewer bytes than its
    /// size promised fails with [`io::ErrorKind::UnexpectedEof`].
    pub fn read(&mut self, max_len: usize) -> SeekcryptResult<Vec<u8>> {
        if max_len == 0 || self.at_end() {
            return Ok(Vec::new());
        }

        let sealed_end = self.sealed.logical_size();
        let mut out = if self.cursor < sealed_end {
            self.read_sealed(max_len)?
        } else {
            Vec::new()
        };

        let want = max_len - out.len();
        if want > 0 && self.cursor >= sealed_end {
            let from = (self.cursor - sealed_end) as usize;
            let take = want.min(self.pending.len() - from);
            out.extend_from_slice(&self.pending[from..from + take]);
            self.cursor += take as u64;
        }
        Ok(out)
    }

    /// Read into `buf`, returning the number of bytes filled.
    pub fn read_into(&mut self, buf: &mut [u8]) -> SeekcryptResult<usize> {
        let bytes = self.read(buf.len())?;
        buf[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }

    /// Append `data` at the logical end.
    ///
    /// The cursor must sit at the end: rewriting sealed interior chunks is not
    /// supported. Only chunks that become full are sealed and written; the
    /// remainder is buffered until the next write fills it or `flush`/`close`
    /// seals it as a short final chunk. Every chunk but the last stays full.
    ///
    /// Two cases still rewrite a short final chunk in place: the first append
    /// after reopening a file whose last chunk is short, and an append after a
    /// `flush` that wrote a short chunk. If the store fails partway through
    /// such a write, that chunk on disk is lost (the stream keeps its
    /// plaintext in memory, so a later successful `flush` restores it). A
    /// failed write may also leave bytes past the last chunk.
    pub fn write(&mut self, data: &[u8]) -> SeekcryptResult<usize> {
        self.refresh()?;

        let end = self.logical_size();
        if self.cursor != end {
            return Err(SeekcryptError::OverwriteUnsupported {
                position: self.cursor,
                end,
            });
        }
        if data.is_empty() {
            return Ok(0);
        }

        self.adopt_tail()?;
        let before = self.pending.len();
        self.pending.extend_from_slice(data);
        self.pending_on_disk = false;
        if let Err(e) = self.seal_full_chunks() {
            self.pending.truncate(before);
            return Err(e);
        }

        self.cursor += data.len() as u64;
        debug!(
            appended = data.len(),
            buffered = self.pending.len(),
            logical_size = self.logical_size(),
            "appended to encrypted stream"
        );
        Ok(data.len())
    }

    /// Seal buffered appends as a short final chunk and flush the store.
    pub fn flush(&mut self) -> SeekcryptResult<()> {
        if !self.pending.is_empty() && !self.pending_on_disk {
            let tail = self.codec.encrypt_chunk(&self.pending)?;
            self.store.write_all_at(self.sealed.physical_size(), &tail)?;
            self.pending_on_disk = true;
            debug!(bytes = self.pending.len(), "sealed buffered tail");
        }
        self.store.flush()?;
        Ok(())
    }

    /// Flush buffered appends and close the underlying store.
    pub fn close(mut self) -> SeekcryptResult<()> {
        self.flush()?;
        self.store.close()?;
        Ok(())
    }

    pub fn get_ref(&self) -> &S {
        &self.store
    }

    /// Raw access to the store. Buffered appends are not on it until `flush`,
    /// and sizes are re-read on the next `size` or `write`.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Flush buffered appends and hand back the store.
    pub fn into_inner(mut self) -> SeekcryptResult<S> {
        self.flush()?;
        Ok(self.store)
    }

    fn read_sealed(&mut self, max_len: usize) -> SeekcryptResult<Vec<u8>> {
        let window = self.sealed.read_window(self.cursor, max_len as u64);
        trace!(
            cursor = self.cursor,
            start = window.start,
            end = window.end,
            "read window"
        );

        let expected = window.physical_len() as usize;
        let sealed = self.store.read_at(window.start, expected)?;
        if sealed.len() < expected {
            warn!(
                expected,
                got = sealed.len(),
                "store returned fewer bytes than its size promised"
            );
            return Err(SeekcryptError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "store returned {} of {expected} bytes at offset {}",
                    sealed.len(),
                    window.start
                ),
            )));
        }

        let mut span = self.codec.decrypt_stream(&sealed).inspect_err(|e| {
            warn!(
                first_chunk = window.start / PHYSICAL_CHUNK_SIZE as u64,
                error = %e,
                "failed to open chunk span"
            );
        })?;

        let begin = (window.offset_in_span as usize).min(span.len());
        let end = begin.saturating_add(max_len).min(span.len());
        span.truncate(end);
        span.drain(..begin);

        self.cursor += span.len() as u64;
        Ok(span)
    }

    /// Move a short final chunk from the store into `pending` so appends can
    /// extend it. The chunk stays on the store until it is sealed again.
    fn adopt_tail(&mut self) -> SeekcryptResult<()> {
        let physical_size = self.sealed.physical_size();
        let tail_start = self.sealed.chunk_start(physical_size);
        if !self.pending.is_empty() || tail_start == physical_size {
            return Ok(());
        }

        let sealed_tail = self
            .store
            .read_at(tail_start, (physical_size - tail_start) as usize)?;
        self.pending = Zeroizing::new(self.codec.decrypt_chunk(&sealed_tail)?);
        self.sealed = OffsetTranslator::for_physical_size(tail_start);
        self.pending_on_disk = true;
        debug!(
            tail_start,
            bytes = self.pending.len(),
            "buffering short final chunk for append"
        );
        Ok(())
    }

    fn seal_full_chunks(&mut self) -> SeekcryptResult<()> {
        let full = self.pending.len() - self.pending.len() % PLAIN_CHUNK_SIZE;
        if full == 0 {
            return Ok(());
        }

        let sealed = self.codec.encrypt_stream(&self.pending[..full])?;
        let at = self.sealed.physical_size();
        self.store.write_all_at(at, &sealed)?;
        self.sealed = OffsetTranslator::for_physical_size(at + sealed.len() as u64);
        self.pending.drain(..full);
        trace!(at, chunks = full / PLAIN_CHUNK_SIZE, "sealed full chunks");
        Ok(())
    }

    fn refresh(&mut self) -> SeekcryptResult<()> {
        if !self.pending.is_empty() {
            return Ok(());
        }
        let physical_size = self.store.size()?;
        if physical_size != self.sealed.physical_size() {
            self.sealed = OffsetTranslator::for_physical_size(physical_size);
            self.cursor = self.cursor.min(self.sealed.logical_size());
            debug!(physical_size, "store size changed");
        }
        Ok(())
    }
}
