//! Per-chunk AES-256-GCM encryption/decryption
//!
//! Physical chunk format (binary):
//! ```text
//! [12 bytes: random nonce][N bytes: ciphertext][16 bytes: GCM tag]
//! AAD = "EncryptedPyQFile"
//! ```
//!
//! Every chunk gets a fresh random nonce, so sealing the same plaintext twice
//! never yields the same bytes. The fixed AAD binds chunks to this format and
//! rejects chunks lifted from other AES-GCM containers under the same key.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use seekcrypt_core::{SeekcryptError, SeekcryptResult};
use std::iter::FusedIterator;

use crate::keys::CipherKey;
use crate::offset::OffsetTranslator;
use crate::{CHUNK_OVERHEAD, NONCE_SIZE, PHYSICAL_CHUNK_SIZE, PLAIN_CHUNK_SIZE};

/// Associated data authenticated with every chunk.
pub const ASSOCIATED_DATA: &[u8] = b"EncryptedPyQFile";

/// Which coordinate space a buffer lives in, and so how wide its chunks are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// Plaintext being split for sealing: `PLAIN_CHUNK_SIZE` slices
    Plain,
    /// Ciphertext being split for opening: `PHYSICAL_CHUNK_SIZE` slices
    Physical,
}

impl ChunkKind {
    pub const fn chunk_size(self) -> usize {
        match self {
            ChunkKind::Plain => PLAIN_CHUNK_SIZE,
            ChunkKind::Physical => PHYSICAL_CHUNK_SIZE,
        }
    }
}

/// Lazy, single-pass split of a buffer into consecutive chunks.
///
/// Yields full-width slices followed by at most one short tail; empty input
/// yields nothing.
#[derive(Debug)]
pub struct ChunkSequence<'a> {
    inner: std::slice::Chunks<'a, u8>,
}

impl<'a> Iterator for ChunkSequence<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ChunkSequence<'_> {}

impl FusedIterator for ChunkSequence<'_> {}

/// Split `data` into chunks of the width `kind` dictates.
pub fn chunk_sequence(data: &[u8], kind: ChunkKind) -> ChunkSequence<'_> {
    ChunkSequence {
        inner: data.chunks(kind.chunk_size()),
    }
}

/// Seals and opens chunks under one key.
///
/// Cloning shares nothing mutable; the cipher holds only the expanded key.
#[derive(Clone)]
pub struct ChunkCodec {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for ChunkCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkCodec")
            .field("cipher", &"AES-256-GCM [REDACTED]")
            .finish()
    }
}

impl ChunkCodec {
    pub fn new(key: &CipherKey) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.as_bytes().into()),
        }
    }

    /// Encrypt a single chunk of at most `PLAIN_CHUNK_SIZE` bytes.
    ///
    /// Returns: `[12-byte nonce][ciphertext][16-byte tag]`
    pub fn encrypt_chunk(&self, plaintext: &[u8]) -> SeekcryptResult<Vec<u8>> {
        if plaintext.len() > PLAIN_CHUNK_SIZE {
            return Err(SeekcryptError::Encryption(format!(
                "chunk of {} bytes exceeds the {PLAIN_CHUNK_SIZE}-byte chunk size",
                plaintext.len()
            )));
        }

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext,
                    aad: ASSOCIATED_DATA,
                },
            )
            .map_err(|e| SeekcryptError::Encryption(format!("chunk encryption failed: {e}")))?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    /// Decrypt a single physical chunk: `[12-byte nonce][ciphertext][16-byte tag]`.
    ///
    /// A tag mismatch is reported as [`SeekcryptError::Authentication`] and no
    /// plaintext is released.
    pub fn decrypt_chunk(&self, physical_chunk: &[u8]) -> SeekcryptResult<Vec<u8>> {
        if physical_chunk.len() < CHUNK_OVERHEAD {
            return Err(SeekcryptError::MalformedChunk(format!(
                "{} bytes (minimum {})",
                physical_chunk.len(),
                CHUNK_OVERHEAD
            )));
        }

        let (nonce_bytes, ciphertext_and_tag) = physical_chunk.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher
            .decrypt(
                nonce,
                Payload {
                    msg: ciphertext_and_tag,
                    aad: ASSOCIATED_DATA,
                },
            )
            .map_err(|_| SeekcryptError::Authentication)
    }

    /// Seal a whole plaintext buffer as a sequence of chunks.
    pub fn encrypt_stream(&self, plaintext: &[u8]) -> SeekcryptResult<Vec<u8>> {
        let physical_len = OffsetTranslator::physical_size_for(plaintext.len() as u64);
        let mut out = Vec::with_capacity(physical_len as usize);

        for chunk in chunk_sequence(plaintext, ChunkKind::Plain) {
            out.extend_from_slice(&self.encrypt_chunk(chunk)?);
        }
        Ok(out)
    }

    /// Open a whole chunk sequence. Fails if any chunk fails.
    pub fn decrypt_stream(&self, ciphertext: &[u8]) -> SeekcryptResult<Vec<u8>> {
        let logical_len = OffsetTranslator::logical_size_for(ciphertext.len() as u64);
        let mut out = Vec::with_capacity(logical_len as usize);

        for (index, chunk) in chunk_sequence(ciphertext, ChunkKind::Physical).enumerate() {
            let plain = self.decrypt_chunk(chunk).inspect_err(|e| {
                tracing::debug!(chunk = index, error = %e, "chunk rejected");
            })?;
            out.extend_from_slice(&plain);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{generate_key, CipherKey};
    use crate::TAG_SIZE;
    use proptest::prelude::*;

    fn codec() -> ChunkCodec {
        ChunkCodec::new(&generate_key())
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i.wrapping_mul(31) ^ (i >> 7)) as u8).collect()
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let codec = codec();
        let plaintext = b"hello, encrypted world!";

        let encrypted = codec.encrypt_chunk(plaintext).unwrap();
        let decrypted = codec.decrypt_chunk(&encrypted).unwrap();

        assert_eq!(&decrypted, plaintext);
    }

    #[test]
    fn test_encrypt_decrypt_empty() {
        let codec = codec();
        let encrypted = codec.encrypt_chunk(b"").unwrap();
        assert_eq!(encrypted.len(), CHUNK_OVERHEAD);
        assert_eq!(codec.decrypt_chunk(&encrypted).unwrap(), b"");
    }

    #[test]
    fn test_encrypted_size() {
        let codec = codec();
        let encrypted = codec.encrypt_chunk(&[0u8; 1000]).unwrap();

        // nonce (12) + plaintext (1000) + tag (16) = 1028
        assert_eq!(encrypted.len(), NONCE_SIZE + 1000 + TAG_SIZE);

        let full = codec.encrypt_chunk(&pattern(PLAIN_CHUNK_SIZE)).unwrap();
        assert_eq!(full.len(), PHYSICAL_CHUNK_SIZE);
    }

    #[test]
    fn test_oversized_chunk_rejected() {
        let codec = codec();
        let err = codec
            .encrypt_chunk(&vec![0u8; PLAIN_CHUNK_SIZE + 1])
            .unwrap_err();
        assert!(matches!(err, SeekcryptError::Encryption(_)));
        assert!(err.to_string().contains("65537 bytes"));

        let full = codec.encrypt_chunk(&vec![0u8; PLAIN_CHUNK_SIZE]).unwrap();
        assert_eq!(full.len(), PHYSICAL_CHUNK_SIZE);
    }

    #[test]
    fn test_same_plaintext_gets_fresh_nonce() {
        let codec = codec();
        let plaintext = pattern(4096);

        let a = codec.encrypt_chunk(&plaintext).unwrap();
        let b = codec.encrypt_chunk(&plaintext).unwrap();

        assert_ne!(a[..NONCE_SIZE], b[..NONCE_SIZE], "nonces must not repeat");
        assert_ne!(a, b);
        assert_eq!(codec.decrypt_chunk(&a).unwrap(), plaintext);
        assert_eq!(codec.decrypt_chunk(&b).unwrap(), plaintext);
    }

    #[test]
    fn test_nonces_unique_across_many_chunks() {
        let codec = codec();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2000 {
            let sealed = codec.encrypt_chunk(b"x").unwrap();
            assert!(seen.insert(sealed[..NONCE_SIZE].to_vec()), "nonce reused");
        }
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let sealed = codec().encrypt_chunk(b"secret data").unwrap();
        let result = codec().decrypt_chunk(&sealed);
        assert!(matches!(result, Err(SeekcryptError::Authentication)));
    }

    #[test]
    fn test_decrypt_wrong_associated_data() {
        let key = CipherKey::from_bytes([9u8; 32]);
        let cipher = Aes256Gcm::new(key.as_bytes().into());
        let nonce_bytes = [3u8; NONCE_SIZE];
        let foreign = cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: b"other format",
                    aad: b"SomethingElse",
                },
            )
            .unwrap();
        let mut chunk = nonce_bytes.to_vec();
        chunk.extend_from_slice(&foreign);

        let result = ChunkCodec::new(&key).decrypt_chunk(&chunk);
        assert!(matches!(result, Err(SeekcryptError::Authentication)));
    }

    #[test]
    fn test_tampered_nonce_ciphertext_and_tag() {
        let codec = codec();
        let sealed = codec.encrypt_chunk(&pattern(300)).unwrap();

        for index in [0, NONCE_SIZE, NONCE_SIZE + 150, sealed.len() - TAG_SIZE, sealed.len() - 1] {
            let mut tampered = sealed.clone();
            tampered[index] ^= 0x01;
            let result = codec.decrypt_chunk(&tampered);
            assert!(
                matches!(result, Err(SeekcryptError::Authentication)),
                "flip at byte {index} must fail authentication"
            );
        }
    }

    #[test]
    fn test_truncated_chunk_is_malformed() {
        let codec = codec();
        let result = codec.decrypt_chunk(&[0u8; CHUNK_OVERHEAD - 1]);
        assert!(matches!(result, Err(SeekcryptError::MalformedChunk(_))));
    }

    #[test]
    fn test_chunk_sequence_plain() {
        let data = vec![b'a'; 200_000];
        let chunks: Vec<_> = chunk_sequence(&data, ChunkKind::Plain).collect();

        assert_eq!(chunks.len(), 200_000usize.div_ceil(PLAIN_CHUNK_SIZE));
        assert_eq!(chunks[0].len(), PLAIN_CHUNK_SIZE);
        assert_eq!(chunks[3].len(), 200_000 - 3 * PLAIN_CHUNK_SIZE);
    }

    #[test]
    fn test_chunk_sequence_physical() {
        let data = vec![b'b'; 200_000];
        let seq = chunk_sequence(&data, ChunkKind::Physical);

        assert_eq!(seq.len(), 200_000usize.div_ceil(PHYSICAL_CHUNK_SIZE));
        let sizes: Vec<usize> = seq.map(<[u8]>::len).collect();
        assert_eq!(sizes[..3], [PHYSICAL_CHUNK_SIZE; 3]);
        assert_eq!(sizes[3], 200_000 - 3 * PHYSICAL_CHUNK_SIZE);
    }

    #[test]
    fn test_chunk_sequence_empty_and_exhausted() {
        assert_eq!(chunk_sequence(b"", ChunkKind::Plain).count(), 0);

        let data = [1u8; 10];
        let mut seq = chunk_sequence(&data, ChunkKind::Plain);
        assert_eq!(seq.next(), Some(&data[..]));
        assert_eq!(seq.next(), None);
        assert_eq!(seq.next(), None);
    }

    #[test]
    fn test_stream_layout() {
        let codec = codec();
        let plaintext = pattern(200_000);
        let sealed = codec.encrypt_stream(&plaintext).unwrap();

        // 3 full chunks + one 3392-byte tail
        assert_eq!(sealed.len(), 3 * PHYSICAL_CHUNK_SIZE + 3392 + CHUNK_OVERHEAD);
        assert_eq!(codec.decrypt_stream(&sealed).unwrap(), plaintext);
    }

    #[test]
    fn test_stream_empty() {
        let codec = codec();
        let sealed = codec.encrypt_stream(b"").unwrap();
        assert!(sealed.is_empty());
        assert!(codec.decrypt_stream(&sealed).unwrap().is_empty());
    }

    #[test]
    fn test_stream_tamper_is_isolated_to_its_chunk() {
        let codec = codec();
        let plaintext = pattern(3 * PLAIN_CHUNK_SIZE);
        let mut sealed = codec.encrypt_stream(&plaintext).unwrap();

        // Corrupt the middle chunk's ciphertext
        sealed[PHYSICAL_CHUNK_SIZE + NONCE_SIZE + 5] ^= 0x80;

        assert!(matches!(
            codec.decrypt_stream(&sealed),
            Err(SeekcryptError::Authentication)
        ));

        let first = &sealed[..PHYSICAL_CHUNK_SIZE];
        let third = &sealed[2 * PHYSICAL_CHUNK_SIZE..];
        assert_eq!(codec.decrypt_chunk(first).unwrap(), &plaintext[..PLAIN_CHUNK_SIZE]);
        assert_eq!(
            codec.decrypt_chunk(third).unwrap(),
            &plaintext[2 * PLAIN_CHUNK_SIZE..]
        );
    }

    #[test]
    fn test_codec_debug_redacts() {
        let rendered = format!("{:?}", codec());
        assert!(rendered.contains("REDACTED"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn stream_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..=(2 * PLAIN_CHUNK_SIZE + 512))) {
            let codec = ChunkCodec::new(&CipherKey::from_bytes([5u8; 32]));
            let sealed = codec.encrypt_stream(&data).unwrap();
            prop_assert_eq!(
                sealed.len() as u64,
                OffsetTranslator::physical_size_for(data.len() as u64)
            );
            let opened = codec.decrypt_stream(&sealed).unwrap();
            prop_assert_eq!(opened, data, "round-trip must be identical");
        }
    }
}
