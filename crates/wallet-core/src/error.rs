use thiserror::Error;

use chain_btc::error::BtcError;
use crypto_utils::CryptoError;

/// Wallet engine errors.
///
/// Derivation and signing failures are invariant violations: fatal to the
/// current operation, surfaced to the caller, never retried here. Network
/// failures pass through as [`BtcError::Network`] inside [`Self::Chain`] so
/// the caller can apply its own retry policy.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("hardened derivation requires the private parent key: {0}")]
    HardenedDerivationFromPublic(String),

    #[error("invalid extended key encoding: {0}")]
    InvalidEncoding(String),

    #[error("wallet has no change address to receive leftover funds")]
    NoChangeAddress,

    #[error(transparent)]
    Chain(#[from] BtcError),
}

impl From<CryptoError> for WalletError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::EntropyUnavailable(msg) => WalletError::Entropy(msg),
            CryptoError::InvalidInput(msg) => WalletError::KeyDerivation(msg),
        }
    }
}
