//! seekcrypt-crypto: seekable chunked AEAD format
//!
//! Architecture: fixed-size chunks, each sealed independently with AES-256-GCM
//!
//! On-disk layout (headerless, chunks in logical order):
//! ```text
//! [12-byte nonce][<= 65536 bytes ciphertext][16-byte tag]  chunk 0
//! [12-byte nonce][<= 65536 bytes ciphertext][16-byte tag]  chunk 1
//! ...
//! AAD = "EncryptedPyQFile" for every chunk
//! ```
//!
//! Only the last chunk may be short, so chunk boundaries and the plaintext
//! length are recovered from the physical length alone (see [`offset`]).

pub mod chunk;
pub mod kdf;
pub mod keys;
pub mod offset;

pub use chunk::{chunk_sequence, ChunkCodec, ChunkKind, ChunkSequence, ASSOCIATED_DATA};
pub use kdf::{derive_cipher_key, generate_salt, KdfParams, SALT_SIZE};
pub use keys::{generate_key, CipherKey};
pub use offset::{OffsetTranslator, ReadWindow};

/// Size of an AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// Plaintext bytes carried by one full chunk
pub const PLAIN_CHUNK_SIZE: usize = 64 * 1024;

/// Per-chunk framing: nonce + tag
pub const CHUNK_OVERHEAD: usize = NONCE_SIZE + TAG_SIZE;

/// On-disk size of one full chunk (65564)
pub const PHYSICAL_CHUNK_SIZE: usize = NONCE_SIZE + PLAIN_CHUNK_SIZE + TAG_SIZE;
