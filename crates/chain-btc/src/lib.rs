//! Bitcoin leaf crate for the HD wallet engine.
//!
//! Provides P2WPKH address derivation, the UTXO model with deterministic
//! coin selection, unsigned transaction assembly, segwit signing with
//! state-tagged transaction types, and the blockchain-indexer collaborator
//! interface.

pub mod address;
pub mod error;
pub mod indexer;
pub mod network;
pub mod signer;
pub mod transaction;
pub mod utxo;
