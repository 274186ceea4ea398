use serde::{Deserialize, Serialize};

use crate::error::BtcError;
use crate::transaction::estimate_fee;

/// Leftover below or at this value is folded into the fee instead of
/// creating a change output that would cost more to spend than it is worth.
pub const DUST_THRESHOLD_SAT: u64 = 546;

/// A spendable output owned by the wallet.
///
/// Decorated with the owning address and its full derivation path so the
/// signer can re-derive the controlling key without any cached key material.
/// Values are integer satoshis throughout; floating point never enters the
/// engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utxo {
    /// Transaction ID as a hex string (big-endian / display order).
    pub txid: String,
    /// Output index within the transaction.
    pub vout: u32,
    /// Value in satoshis.
    pub value_sat: u64,
    /// The locking script (scriptPubKey) serialized bytes.
    pub script_pubkey: Vec<u8>,
    /// The wallet address this output pays to.
    pub address: String,
    /// Full derivation path of the controlling key, from the master.
    pub derivation_path: String,
}

/// A single payment the caller wants to make.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTarget {
    pub address: String,
    pub amount_sat: u64,
}

/// One planned transaction output.
///
/// `Change` is the selector's designated change slot: it has a value but no
/// address yet; the transaction builder fills it with the caller-provided
/// change address before finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedOutput {
    Payment { address: String, value_sat: u64 },
    Change { value_sat: u64 },
}

impl PlannedOutput {
    pub fn value_sat(&self) -> u64 {
        match self {
            PlannedOutput::Payment { value_sat, .. } => *value_sat,
            PlannedOutput::Change { value_sat } => *value_sat,
        }
    }
}

/// Result of coin selection.
///
/// Invariant: `total_input_sat == sum(outputs) + fee_sat`, exactly, in
/// integer satoshis.
#[derive(Debug, Clone)]
pub struct CoinSelection {
    /// Chosen inputs, in selection order. The builder and signer preserve
    /// this order exactly.
    pub inputs: Vec<Utxo>,
    /// Planned outputs: payments in target order, then the change slot if
    /// the leftover exceeded the dust threshold.
    pub outputs: Vec<PlannedOutput>,
    /// Miner fee in satoshis.
    pub fee_sat: u64,
    /// Total value of the chosen inputs.
    pub total_input_sat: u64,
}

/// Select UTXOs to fund `targets` at the given fee rate.
///
/// Deterministic largest-first policy: candidates are ordered by value
/// descending, with (txid, vout) as tie-breakers, so identical inputs always
/// yield the identical selection regardless of the caller's ordering. The
/// fee is `fee_rate × estimated vsize` from P2WPKH weight estimates, updated
/// as inputs are accumulated.
///
/// Fails with [`BtcError::InsufficientFunds`] when no subset covers the
/// targets plus the fee, and with [`BtcError::InvalidAmount`] when the
/// final fee would exceed the total requested payment.
pub fn select_coins(
    utxos: &[Utxo],
    targets: &[PaymentTarget],
    fee_rate_sat_vbyte: u64,
) -> Result<CoinSelection, BtcError> {
    if targets.is_empty() {
        return Err(BtcError::TransactionBuild("no payment targets".into()));
    }
    if let Some(t) = targets.iter().find(|t| t.amount_sat == 0) {
        return Err(BtcError::TransactionBuild(format!(
            "zero-value payment target to {}",
            t.address
        )));
    }

    let target_total: u64 = targets.iter().map(|t| t.amount_sat).sum();

    let mut candidates: Vec<&Utxo> = utxos.iter().collect();
    candidates.sort_by(|a, b| {
        b.value_sat
            .cmp(&a.value_sat)
            .then_with(|| a.txid.cmp(&b.txid))
            .then_with(|| a.vout.cmp(&b.vout))
    });

    let mut selected: Vec<Utxo> = Vec::new();
    let mut total_sat: u64 = 0;

    for utxo in candidates {
        selected.push(utxo.clone());
        total_sat += utxo.value_sat;

        // Fee estimated with a change output present; the no-change case is
        // resolved in finalize_selection.
        let fee = estimate_fee(selected.len(), targets.len() + 1, fee_rate_sat_vbyte);
        if total_sat >= target_total + fee {
            return finalize_selection(selected, total_sat, targets, target_total, fee_rate_sat_vbyte);
        }
    }

    let fee = estimate_fee(selected.len().max(1), targets.len() + 1, fee_rate_sat_vbyte);
    Err(BtcError::InsufficientFunds {
        have_sat: total_sat,
        need_sat: target_total + fee,
    })
}

/// Decide the change-vs-fee split for a covering input set.
fn finalize_selection(
    inputs: Vec<Utxo>,
    total_input_sat: u64,
    targets: &[PaymentTarget],
    target_total: u64,
    fee_rate_sat_vbyte: u64,
) -> Result<CoinSelection, BtcError> {
    let fee_with_change = estimate_fee(inputs.len(), targets.len() + 1, fee_rate_sat_vbyte);
    let leftover = total_input_sat - target_total - fee_with_change;

    let mut outputs: Vec<PlannedOutput> = targets
        .iter()
        .map(|t| PlannedOutput::Payment {
            address: t.address.clone(),
            value_sat: t.amount_sat,
        })
        .collect();

    let fee_sat = if leftover > DUST_THRESHOLD_SAT {
        outputs.push(PlannedOutput::Change { value_sat: leftover });
        fee_with_change
    } else {
        // Dust-level leftover is folded into the fee rather than creating
        // an uneconomical output.
        total_input_sat - target_total
    };

    if fee_sat > target_total {
        return Err(BtcError::InvalidAmount {
            fee_sat,
            amount_sat: target_total,
        });
    }

    debug_assert_eq!(
        total_input_sat,
        outputs.iter().map(|o| o.value_sat()).sum::<u64>() + fee_sat
    );

    Ok(CoinSelection {
        inputs,
        outputs,
        fee_sat,
        total_input_sat,
    })
}
