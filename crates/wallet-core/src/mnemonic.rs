use bip39::{Language, Mnemonic};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crypto_utils::random::try_random_bytes;
use crypto_utils::zeroizing::{ZeroizingBytes, ZeroizingString};

use crate::error::WalletError;

/// Mnemonic length, chosen at wallet creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WordCount {
    /// 12 words from 128 bits of entropy (the reference behavior).
    #[default]
    Words12,
    /// 24 words from 256 bits of entropy.
    Words24,
}

impl WordCount {
    /// Bytes of entropy backing a phrase of this length.
    pub fn entropy_bytes(self) -> usize {
        match self {
            WordCount::Words12 => 16,
            WordCount::Words24 => 32,
        }
    }

    /// Number of words in the phrase.
    pub fn words(self) -> usize {
        match self {
            WordCount::Words12 => 12,
            WordCount::Words24 => 24,
        }
    }
}

/// A validated BIP-39 recovery phrase, zeroed when dropped.
#[derive(Debug, Clone)]
pub struct MnemonicPhrase(ZeroizingString);

impl MnemonicPhrase {
    /// Wraps a phrase after validating its checksum.
    pub fn new(phrase: &str) -> Result<Self, WalletError> {
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
            .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
        Ok(Self(ZeroizingString::new(mnemonic.to_string())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn words(&self) -> Vec<&str> {
        self.0.split_whitespace().collect()
    }

    pub fn word_count(&self) -> usize {
        self.0.split_whitespace().count()
    }
}

/// The 512-bit wallet seed, zeroed when dropped.
///
/// Exists only in memory for the session; it is never serialized and never
/// persisted by the engine.
#[derive(Debug, Clone)]
pub struct Seed(ZeroizingBytes);

impl Seed {
    pub(crate) fn new(bytes: [u8; 64]) -> Self {
        Self(ZeroizingBytes::new(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Generate a fresh recovery phrase from cryptographically secure entropy.
///
/// Fails with [`WalletError::Entropy`] if the OS random source is
/// unavailable.
pub fn generate_mnemonic(word_count: WordCount) -> Result<MnemonicPhrase, WalletError> {
    let mut entropy = try_random_bytes(word_count.entropy_bytes())?;
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
    entropy.zeroize();
    Ok(MnemonicPhrase(ZeroizingString::new(mnemonic.to_string())))
}

/// Stretch a phrase (plus optional passphrase, empty by default) into the
/// 512-bit seed via PBKDF2.
///
/// Deterministic: the same (phrase, passphrase) pair always yields the same
/// seed.
pub fn derive_seed(phrase: &MnemonicPhrase, passphrase: &str) -> Result<Seed, WalletError> {
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase.as_str())
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
    Ok(Seed::new(mnemonic.to_seed(passphrase)))
}

/// The BIP-39 English word list, for UI autocomplete.
pub fn word_list() -> &'static [&'static str] {
    Language::English.word_list()
}

/// Whether a single word appears in the BIP-39 word list.
pub fn is_valid_word(word: &str) -> bool {
    Language::English.find_word(word).is_some()
}
