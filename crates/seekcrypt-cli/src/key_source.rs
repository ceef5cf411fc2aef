//! Resolving the cipher key from the command line and config

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::SecretString;
use std::path::Path;
use zeroize::Zeroizing;

use seekcrypt_core::config::CryptoConfig;
use seekcrypt_crypto::{derive_cipher_key, CipherKey, KdfParams, SALT_SIZE};

/// Key precedence: `--key-file`, then `crypto.key_file`, then a passphrase
/// stretched with `crypto.kdf_salt`.
pub fn resolve_key(
    crypto: &CryptoConfig,
    key_file: Option<&Path>,
    passphrase: Option<&SecretString>,
) -> Result<CipherKey> {
    if let Some(path) = key_file.or(crypto.key_file.as_deref()) {
        tracing::debug!(path = %path.display(), "loading key file");
        return read_key_file(path);
    }

    let salt = crypto.kdf_salt.as_deref().context(
        "no key source: pass --key-file, set crypto.key_file, \
         or set crypto.kdf_salt to use a passphrase",
    )?;
    let salt = decode_salt(salt)?;

    let prompted;
    let passphrase = match passphrase {
        Some(p) => p,
        None => {
            prompted = SecretString::from(
                rpassword::prompt_password("Passphrase: ").context("reading passphrase")?,
            );
            &prompted
        }
    };

    tracing::debug!("deriving key from passphrase");
    Ok(derive_cipher_key(passphrase, &salt, &KdfParams::from(crypto))?)
}

pub fn read_key_file(path: &Path) -> Result<CipherKey> {
    let content = Zeroizing::new(
        std::fs::read_to_string(path)
            .with_context(|| format!("reading key file: {}", path.display()))?,
    );
    CipherKey::from_base64(&content)
        .with_context(|| format!("parsing key file: {}", path.display()))
}

/// Write a key file readable only by its owner. Refuses to clobber unless `force`.
pub fn write_key_file(path: &Path, key: &CipherKey, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "key file already exists: {} (use --force to replace it)",
            path.display()
        );
    }

    let mut contents = Zeroizing::new(key.to_base64().to_string());
    contents.push('\n');
    std::fs::write(path, contents.as_bytes())
        .with_context(|| format!("writing key file: {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("restricting key file mode: {}", path.display()))?;
    }
    Ok(())
}

pub fn decode_salt(encoded: &str) -> Result<[u8; SALT_SIZE]> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .context("crypto.kdf_salt is not valid base64")?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        anyhow::anyhow!(
            "crypto.kdf_salt has wrong size: {} bytes (expected {SALT_SIZE})",
            b.len()
        )
    })
}

pub fn encode_salt(salt: &[u8; SALT_SIZE]) -> String {
    STANDARD.encode(salt)
}
