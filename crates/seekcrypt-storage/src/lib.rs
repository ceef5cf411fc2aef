//! seekcrypt-storage: the byte-addressable store under an encrypted stream
//!
//! The stream layer only needs `{size, seek, read, write, flush, close}`, so
//! anything offering those (a local file, a memory buffer, a remote object
//! with range reads) can carry sealed data.

pub mod file;
pub mod memory;
pub mod store;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::RawByteStore;
