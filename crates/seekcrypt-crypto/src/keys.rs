//! Cipher key material: generation and base64 key files

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use seekcrypt_core::{SeekcryptError, SeekcryptResult};
use zeroize::{Zeroize, Zeroizing};

use crate::KEY_SIZE;

/// A 256-bit AES-GCM key. Zeroized on drop.
#[derive(Clone)]
pub struct CipherKey {
    bytes: [u8; KEY_SIZE],
}

impl CipherKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Encode for storage in a key file.
    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(STANDARD.encode(self.bytes))
    }

    /// Parse a key file's contents. Surrounding whitespace is ignored.
    pub fn from_base64(encoded: &str) -> SeekcryptResult<Self> {
        let decoded = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|e| SeekcryptError::Key(format!("key is not valid base64: {e}")))?,
        );

        if decoded.len() != KEY_SIZE {
            return Err(SeekcryptError::Key(format!(
                "key has wrong size: {} bytes (expected {})",
                decoded.len(),
                KEY_SIZE
            )));
        }

        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&decoded);
        Ok(Self::from_bytes(bytes))
    }
}

impl Drop for CipherKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random 256-bit key.
pub fn generate_key() -> CipherKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    CipherKey::from_bytes(bytes)
}
