use thiserror::Error;

pub type SeekcryptResult<T> = Result<T, SeekcryptError>;

#[derive(Debug, Error)]
pub enum SeekcryptError {
    /// A chunk's tag did not verify. Never recovered locally.
    #[error("authentication failed: file corrupted or wrong key")]
    Authentication,

    #[error("malformed chunk: {0}")]
    MalformedChunk(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error(
        "write at logical offset {position} would overwrite sealed data ending at {end}; \
         only appends are supported"
    )]
    OverwriteUnsupported { position: u64, end: u64 },

    #[error("key error: {0}")]
    Key(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SeekcryptError {
    /// True for errors caused by the ciphertext itself (tampering, truncation, wrong key).
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            SeekcryptError::Authentication | SeekcryptError::MalformedChunk(_)
        )
    }
}

impl From<SeekcryptError> for std::io::Error {
    fn from(err: SeekcryptError) -> Self {
        use std::io::ErrorKind;

        match err {
            SeekcryptError::Io(e) => e,
            SeekcryptError::OverwriteUnsupported { .. } => {
                std::io::Error::new(ErrorKind::Unsupported, err)
            }
            e if e.is_integrity() => std::io::Error::new(ErrorKind::InvalidData, e),
            e => std::io::Error::other(e),
        }
    }
}
