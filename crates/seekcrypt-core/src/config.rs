use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SeekcryptError, SeekcryptResult};

/// Top-level configuration (loaded from seekcrypt.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeekcryptConfig {
    pub log: LogConfig,
    pub crypto: CryptoConfig,
    pub stream: StreamConfig,
}

impl SeekcryptConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> SeekcryptResult<Self> {
        if !path.exists() {
            tracing::warn!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| SeekcryptError::Config(format!("parsing {}: {e}", path.display())))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

/// Key material configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Path to a base64-encoded 256-bit key (takes precedence over a passphrase)
    pub key_file: Option<PathBuf>,
    /// Base64-encoded 16-byte salt for passphrase-derived keys
    pub kdf_salt: Option<String>,
    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB)
    pub argon2_mem_cost_kib: u32,
    /// Argon2id time cost (iterations, default: 3)
    pub argon2_time_cost: u32,
    /// Argon2id parallelism (default: 4)
    pub argon2_parallelism: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Chunks moved per batch when sealing or opening whole files (default: 16 = 1 MiB)
    pub io_chunks: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            key_file: None,
            kdf_salt: None,
            argon2_mem_cost_kib: 65536,
            argon2_time_cost: 3,
            argon2_parallelism: 4,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { io_chunks: 16 }
    }
}
