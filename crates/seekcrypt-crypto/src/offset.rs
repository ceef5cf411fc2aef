//! Logical ↔ physical offset arithmetic
//!
//! Logical offsets address the plaintext; physical offsets address the sealed
//! bytes on disk. Every chunk except the last is full, so the mapping depends
//! only on the chunk constants and the two total sizes.
//!
//! Nothing here errors: positions past either end clamp to that end, since
//! reaching end-of-file is routine for a scrubbing reader.

use crate::{CHUNK_OVERHEAD, NONCE_SIZE, PHYSICAL_CHUNK_SIZE, PLAIN_CHUNK_SIZE};

const PLAIN: u64 = PLAIN_CHUNK_SIZE as u64;
const PHYSICAL: u64 = PHYSICAL_CHUNK_SIZE as u64;
const NONCE: u64 = NONCE_SIZE as u64;
const OVERHEAD: u64 = CHUNK_OVERHEAD as u64;

/// Offset mapping for one file, fixed at a given pair of sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetTranslator {
    physical_size: u64,
    logical_size: u64,
}

impl OffsetTranslator {
    /// Use explicit sizes. Mostly useful when the caller already tracks both.
    pub const fn new(physical_size: u64, logical_size: u64) -> Self {
        Self {
            physical_size,
            logical_size,
        }
    }

    /// Derive the logical size from the physical size.
    pub const fn for_physical_size(physical_size: u64) -> Self {
        Self::new(physical_size, Self::logical_size_for(physical_size))
    }

    pub const fn physical_size(&self) -> u64 {
        self.physical_size
    }

    pub const fn logical_size(&self) -> u64 {
        self.logical_size
    }

    /// Number of chunks, counting a short tail: `ceil(physical / 65564)`.
    pub const fn chunk_count(physical_size: u64) -> u64 {
        physical_size.div_ceil(PHYSICAL)
    }

    /// Plaintext capacity of those chunks if all of them were full.
    pub const fn chunk_capacity(physical_size: u64) -> u64 {
        Self::chunk_count(physical_size) * PLAIN
    }

    /// Exact plaintext length: capacity minus what the short tail lacks.
    ///
    /// A tail too small to hold a nonce and a tag carries no plaintext.
    /// For the uncorrected `chunk_count * PLAIN_CHUNK_SIZE` figure see [`Self::chunk_capacity`].
    pub const fn logical_size_for(physical_size: u64) -> u64 {
        let full = physical_size / PHYSICAL;
        let tail = physical_size % PHYSICAL;
        full * PLAIN + tail.saturating_sub(OVERHEAD)
    }

    /// On-disk length of a sealed plaintext of `logical_size` bytes.
    pub const fn physical_size_for(logical_size: u64) -> u64 {
        let full = logical_size / PLAIN;
        let tail = logical_size % PLAIN;
        let tail_physical = if tail == 0 { 0 } else { tail + OVERHEAD };
        full * PHYSICAL + tail_physical
    }

    /// Physical offset of the byte at `logical_pos` (just past its chunk's nonce).
    pub const fn logical_to_physical(&self, logical_pos: u64) -> u64 {
        if logical_pos >= self.logical_size {
            return self.physical_size;
        }
        (logical_pos / PLAIN) * PHYSICAL + NONCE + logical_pos % PLAIN
    }

    /// Logical offset of the byte at `physical_pos`.
    ///
    /// Nonce bytes map to their chunk's first byte and tag bytes to the
    /// chunk's end.
    pub fn physical_to_logical(&self, physical_pos: u64) -> u64 {
        if physical_pos >= self.physical_size {
            return self.logical_size;
        }
        let chunk = physical_pos / PHYSICAL;
        let within = (physical_pos % PHYSICAL).saturating_sub(NONCE).min(PLAIN);
        (chunk * PLAIN + within).min(self.logical_size)
    }

    /// Start of the chunk holding `physical_pos`.
    pub const fn chunk_start(&self, physical_pos: u64) -> u64 {
        let pos = if physical_pos > self.physical_size {
            self.physical_size
        } else {
            physical_pos
        };
        pos - pos % PHYSICAL
    }

    /// Chunk-aligned end of the span starting at `physical_start`'s chunk that
    /// holds at least `logical_len` plaintext bytes. Always at least one chunk.
    pub fn chunk_span(&self, physical_start: u64, logical_len: u64) -> u64 {
        let start = self.chunk_start(physical_start);
        let chunks = logical_len.div_ceil(PLAIN).max(1);
        start
            .saturating_add(chunks.saturating_mul(PHYSICAL))
            .min(self.physical_size)
    }

    /// Physical byte range to fetch so that `[logical_pos, logical_pos + len)`
    /// can be served, plus where that request begins inside the opened span.
    pub fn read_window(&self, logical_pos: u64, len: u64) -> ReadWindow {
        if logical_pos >= self.logical_size {
            return ReadWindow {
                start: self.physical_size,
                end: self.physical_size,
                offset_in_span: 0,
            };
        }
        let physical_pos = self.logical_to_physical(logical_pos);
        let start = self.chunk_start(physical_pos);
        let offset_in_span =
            self.physical_to_logical(physical_pos) - self.physical_to_logical(start);
        let end = self.chunk_span(start, offset_in_span.saturating_add(len));
        ReadWindow {
            start,
            end,
            offset_in_span,
        }
    }
}

/// Chunk-aligned physical range `[start, end)` and the request's offset
/// within its decrypted plaintext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadWindow {
    pub start: u64,
    pub end: u64,
    pub offset_in_span: u64,
}

impl ReadWindow {
    pub const fn physical_len(&self) -> u64 {
        self.end - self.start
    }
}
