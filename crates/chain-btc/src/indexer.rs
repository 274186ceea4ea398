use serde::{Deserialize, Serialize};

use crate::error::BtcError;

/// Fallback fee rate when the indexer reports zero, so the engine never
/// builds a transaction that no node would relay.
pub const MIN_FEE_RATE_SAT_VBYTE: u64 = 1;

/// A spendable output as reported by the indexer, before the wallet
/// decorates it with ownership metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerUtxo {
    pub txid: String,
    pub vout: u32,
    #[serde(rename = "value")]
    pub value_sat: u64,
    /// Locking script, hex encoded.
    #[serde(rename = "scriptPubKey")]
    pub script_pubkey: String,
}

/// A confirmed-or-pending transaction touching a wallet address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub txid: String,
    #[serde(rename = "fee")]
    pub fee_sat: u64,
    pub confirmed: bool,
    pub block_height: Option<u32>,
}

/// The remote blockchain-indexer collaborator, specified at its boundary.
///
/// All four operations are fallible network calls returning typed data or
/// [`BtcError::Network`]. The engine assumes nothing about ordering or
/// freshness beyond "reflects chain state as of call time"; retry policy
/// belongs to implementations, not to the core.
pub trait Indexer {
    /// Spendable outputs currently paying to `address`.
    fn utxos_for_address(&self, address: &str) -> Result<Vec<IndexerUtxo>, BtcError>;

    /// History of transactions touching `address`.
    fn transactions_for_address(&self, address: &str)
        -> Result<Vec<TransactionSummary>, BtcError>;

    /// Current recommended fee rate in satoshis per virtual byte.
    fn fee_rate_sat_vbyte(&self) -> Result<u64, BtcError>;

    /// Submit a raw transaction; returns the txid reported by the network.
    fn broadcast(&self, raw_tx: &[u8]) -> Result<String, BtcError>;
}
