//! seekcrypt-stream: a seekable plaintext view of a sealed chunk file
//!
//! # Overview
//! - `stream`: [`EncryptedStream`], read/write/seek in logical coordinates
//! - `io`: `std::io::{Read, Write, Seek}` adapters for the stream
//!
//! A read decrypts only the chunks overlapping the requested range, fresh on
//! every call. Writes append; sealed interior chunks are never rewritten.

pub mod io;
pub mod stream;

pub use stream::{EncryptedStream, StreamInfo};
