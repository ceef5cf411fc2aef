//! Key derivation: Argon2id passphrase → cipher key

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use seekcrypt_core::{SeekcryptError, SeekcryptResult};

use crate::keys::CipherKey;
use crate::KEY_SIZE;

/// Salt length for passphrase-derived keys
pub const SALT_SIZE: usize = 16;

/// Argon2id parameters for KDF
#[derive(Debug, Clone)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl From<&seekcrypt_core::config::CryptoConfig> for KdfParams {
    fn from(cfg: &seekcrypt_core::config::CryptoConfig) -> Self {
        Self {
            mem_cost_kib: cfg.argon2_mem_cost_kib,
            time_cost: cfg.argon2_time_cost,
            parallelism: cfg.argon2_parallelism,
        }
    }
}

/// Derive a 256-bit cipher key from a passphrase and salt using Argon2id.
///
/// The file format has no header, so the salt is kept by the caller (config
/// or alongside the key policy); it does not need to be secret.
pub fn derive_cipher_key(
    passphrase: &SecretString,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> SeekcryptResult<CipherKey> {
    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| SeekcryptError::Key(format!("invalid Argon2id params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(passphrase.expose_secret().as_bytes(), salt, &mut key)
        .map_err(|e| SeekcryptError::Key(format!("Argon2id KDF failed: {e}")))?;

    Ok(CipherKey::from_bytes(key))
}

/// Random salt for a new passphrase-protected setup.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
