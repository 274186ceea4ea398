//! # wallet-core
//!
//! Hierarchical-deterministic Bitcoin wallet engine: mnemonic and seed
//! generation, BIP-32 key derivation, BIP-84 address sets, and the wallet
//! session that chains coin selection, transaction building, signing and
//! broadcast through the indexer collaborator.
//!
//! Every operation here is a pure, synchronous computation over explicit
//! inputs; the only I/O happens behind the [`chain_btc::indexer::Indexer`]
//! trait, at the session boundary.

pub mod address;
pub mod error;
pub mod hd;
pub mod mnemonic;
pub mod session;

pub use address::{derive_change_set, derive_receiving_set, Keychain, WalletAddress};
pub use error::WalletError;
pub use hd::{DerivationPath, ExtendedPrivateKey, ExtendedPublicKey};
pub use mnemonic::{derive_seed, generate_mnemonic, MnemonicPhrase, Seed, WordCount};
pub use session::{WalletConfig, WalletSession, WalletSnapshot};
