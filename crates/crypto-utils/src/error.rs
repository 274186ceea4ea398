use thiserror::Error;

/// Cryptographic primitive errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
