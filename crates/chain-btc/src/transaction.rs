use bitcoin::absolute::LockTime;
use bitcoin::address::Address;
use bitcoin::script::ScriptBuf;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, Sequence, Transaction, TxIn, TxOut, Txid, Witness};

use crate::error::BtcError;
use crate::network::BtcNetwork;
use crate::utxo::{CoinSelection, PlannedOutput};

/// Estimated virtual size of a P2WPKH input (in vbytes).
/// Breakdown: 41 bytes non-witness + ~27 witness bytes / 4 = ~68 vbytes.
pub const P2WPKH_INPUT_VBYTES: u64 = 68;

/// Estimated virtual size of any output (in vbytes).
pub const OUTPUT_VBYTES: u64 = 31;

/// Fixed transaction overhead (in vbytes): version + locktime + segwit
/// marker/flag + counts.
pub const TX_OVERHEAD_VBYTES: u64 = 11;

/// Estimate the fee for a P2WPKH transaction.
///
/// Computes `estimated_vsize * fee_rate_sat_vbyte` where the vsize is a
/// function of the input and output counts under P2WPKH weight estimates.
pub fn estimate_fee(num_inputs: usize, num_outputs: usize, fee_rate_sat_vbyte: u64) -> u64 {
    let vsize = TX_OVERHEAD_VBYTES
        + (num_inputs as u64 * P2WPKH_INPUT_VBYTES)
        + (num_outputs as u64 * OUTPUT_VBYTES);
    vsize * fee_rate_sat_vbyte
}

/// An unsigned transaction carrying the metadata needed for segwit signing.
///
/// Each input's previous output (value + script) is committed here, so
/// sighash computation never needs the full previous transaction, and each
/// input records the derivation path of its controlling key so the signer
/// can re-derive it from the master. This type deliberately has no
/// broadcast serialization; only [`crate::signer::SignedTransaction`] does.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    /// The transaction with empty witnesses.
    pub tx: Transaction,
    /// The outputs being spent, in input order.
    pub prevouts: Vec<TxOut>,
    /// Full derivation path of each input's key, in input order.
    pub input_paths: Vec<String>,
    /// Miner fee committed by the selection.
    pub fee_sat: u64,
}

fn parse_address(addr: &str, network: BtcNetwork, role: &str) -> Result<Address, BtcError> {
    addr.parse::<Address<bitcoin::address::NetworkUnchecked>>()
        .map_err(|e| BtcError::InvalidAddress(format!("invalid {role} address: {e}")))?
        .require_network(network.to_bitcoin_network())
        .map_err(|e| BtcError::InvalidAddress(format!("{role} address wrong network: {e}")))
}

/// Assemble an unsigned P2WPKH transaction from a coin selection.
///
/// Protocol version 2, locktime 0, and every input sequence set to
/// `0xfffffffd` so the transaction signals replaceability. Input and output
/// order is preserved exactly as selected; reordering after signing would
/// invalidate every signature. The selection's designated change slot is
/// filled with `change_address` here.
pub fn build_transaction(
    selection: &CoinSelection,
    change_address: &str,
    network: BtcNetwork,
) -> Result<UnsignedTransaction, BtcError> {
    if selection.inputs.is_empty() {
        return Err(BtcError::TransactionBuild("selection has no inputs".into()));
    }

    let mut inputs = Vec::with_capacity(selection.inputs.len());
    let mut prevouts = Vec::with_capacity(selection.inputs.len());
    let mut input_paths = Vec::with_capacity(selection.inputs.len());

    for utxo in &selection.inputs {
        let txid: Txid = utxo
            .txid
            .parse()
            .map_err(|e| BtcError::TransactionBuild(format!("invalid txid: {e}")))?;

        inputs.push(TxIn {
            previous_output: OutPoint::new(txid, utxo.vout),
            script_sig: ScriptBuf::new(), // Empty for segwit.
            sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
            witness: Witness::default(),
        });

        prevouts.push(TxOut {
            value: Amount::from_sat(utxo.value_sat),
            script_pubkey: ScriptBuf::from(utxo.script_pubkey.clone()),
        });

        input_paths.push(utxo.derivation_path.clone());
    }

    let mut outputs = Vec::with_capacity(selection.outputs.len());
    for planned in &selection.outputs {
        let txout = match planned {
            PlannedOutput::Payment { address, value_sat } => TxOut {
                value: Amount::from_sat(*value_sat),
                script_pubkey: parse_address(address, network, "recipient")?.script_pubkey(),
            },
            PlannedOutput::Change { value_sat } => TxOut {
                value: Amount::from_sat(*value_sat),
                script_pubkey: parse_address(change_address, network, "change")?.script_pubkey(),
            },
        };
        outputs.push(txout);
    }

    // The selector guarantees this; refuse to emit a transaction if the
    // value equation does not hold.
    let out_total: u64 = outputs.iter().map(|o| o.value.to_sat()).sum();
    if selection.total_input_sat != out_total + selection.fee_sat {
        return Err(BtcError::TransactionBuild(format!(
            "value equation violated: inputs {} != outputs {} + fee {}",
            selection.total_input_sat, out_total, selection.fee_sat
        )));
    }

    let tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: inputs,
        output: outputs,
    };

    Ok(UnsignedTransaction {
        tx,
        prevouts,
        input_paths,
        fee_sat: selection.fee_sat,
    })
}
