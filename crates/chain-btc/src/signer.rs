use bitcoin::hashes::Hash;
use bitcoin::script::ScriptBuf;
use bitcoin::secp256k1::{Message, Secp256k1, SecretKey};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{CompressedPublicKey, Transaction, Witness};

use crate::error::BtcError;
use crate::transaction::UnsignedTransaction;

/// A fully signed, broadcast-ready transaction.
///
/// This is the only transaction state with a wire serialization; an
/// [`UnsignedTransaction`] cannot be handed to a broadcaster by
/// construction, and [`sign_transaction`] never returns a partially signed
/// transaction as success.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    tx: Transaction,
    fee_sat: u64,
}

impl SignedTransaction {
    /// Canonical segwit wire serialization for handoff to the broadcaster.
    pub fn to_bytes(&self) -> Vec<u8> {
        bitcoin::consensus::serialize(&self.tx)
    }

    /// Transaction id in display (big-endian hex) order.
    pub fn txid(&self) -> String {
        self.tx.compute_txid().to_string()
    }

    /// Miner fee committed by the selection that produced this transaction.
    pub fn fee_sat(&self) -> u64 {
        self.fee_sat
    }

    /// Read-only view of the underlying transaction.
    pub fn tx(&self) -> &Transaction {
        &self.tx
    }
}

/// Sign every input of `unsigned` with the given keys, one per input in
/// input order.
///
/// The caller re-derives each key from the master using the path recorded
/// on the input; keys are never cached here. For each input the key's
/// compressed public key must hash to the committed prevout's witness
/// program, the BIP-143 sighash is computed over the committed value, and
/// the finalized witness is `[DER signature + SIGHASH_ALL, pubkey]`.
///
/// Fails with [`BtcError::IncompleteSignature`] if fewer keys than inputs
/// are supplied or any input ends up without a finalized witness.
pub fn sign_transaction(
    unsigned: &UnsignedTransaction,
    keys: &[[u8; 32]],
) -> Result<SignedTransaction, BtcError> {
    let total = unsigned.tx.input.len();
    if keys.len() < total {
        return Err(BtcError::IncompleteSignature {
            signed: keys.len(),
            total,
        });
    }
    if keys.len() > total {
        return Err(BtcError::Signing(format!(
            "{} keys supplied for {} inputs",
            keys.len(),
            total
        )));
    }

    let secp = Secp256k1::new();
    let mut signed_tx = unsigned.tx.clone();

    for (index, key_bytes) in keys.iter().enumerate() {
        let secret_key = SecretKey::from_slice(key_bytes)
            .map_err(|e| BtcError::InvalidPrivateKey(format!("input {index}: {e}")))?;
        let public_key = bitcoin::secp256k1::PublicKey::from_secret_key(&secp, &secret_key);
        let compressed_pk = CompressedPublicKey(public_key);

        let script_code = ScriptBuf::new_p2wpkh(&compressed_pk.wpubkey_hash());

        // The witness program committed by the prevout must match this
        // key's pubkey hash; a wrong key must never produce a transaction
        // that looks signed.
        if unsigned.prevouts[index].script_pubkey != script_code {
            return Err(BtcError::Signing(format!(
                "input {index}: key does not control the spent output"
            )));
        }

        let mut sighash_cache = SighashCache::new(&unsigned.tx);
        let sighash = sighash_cache
            .p2wpkh_signature_hash(
                index,
                &script_code,
                unsigned.prevouts[index].value,
                EcdsaSighashType::All,
            )
            .map_err(|e| BtcError::Signing(format!("sighash computation failed: {e}")))?;

        let msg = Message::from_digest(sighash.to_byte_array());
        let signature = secp.sign_ecdsa(&msg, &secret_key);

        let mut sig_bytes = signature.serialize_der().to_vec();
        sig_bytes.push(EcdsaSighashType::All as u8);

        let mut witness = Witness::new();
        witness.push(&sig_bytes);
        witness.push(&public_key.serialize());

        signed_tx.input[index].witness = witness;
    }

    // A transaction is fully signed only when every input carries a
    // finalized witness.
    let signed = signed_tx
        .input
        .iter()
        .filter(|i| !i.witness.is_empty())
        .count();
    if signed != total {
        return Err(BtcError::IncompleteSignature { signed, total });
    }

    Ok(SignedTransaction {
        tx: signed_tx,
        fee_sat: unsigned.fee_sat,
    })
}
