use bitcoin::address::Address;
use bitcoin::CompressedPublicKey;

use crate::error::BtcError;
use crate::network::BtcNetwork;

/// Derive a P2WPKH (native SegWit bech32) address from a compressed public
/// key.
///
/// The 33-byte compressed secp256k1 key is hashed (SHA-256 then RIPEMD-160)
/// and wrapped as a version-0 witness program: `bc1q...` on mainnet,
/// `tb1q...` on testnet/signet. Pure function, no I/O; the same key and
/// network always produce the same string.
pub fn pubkey_to_p2wpkh_address(
    pubkey_bytes: &[u8; 33],
    network: BtcNetwork,
) -> Result<String, BtcError> {
    let compressed_pk = CompressedPublicKey::from_slice(pubkey_bytes).map_err(|e| {
        BtcError::InvalidPublicKey(format!("failed to parse compressed public key: {e}"))
    })?;

    let address = Address::p2wpkh(&compressed_pk, network.to_bitcoin_network());

    Ok(address.to_string())
}

/// Validate a Bitcoin address string against the given network.
///
/// Returns `true` if the address parses and belongs to `network`, `false`
/// if it is well-formed but for a different network. A string that is not
/// an address at all is an error.
pub fn validate_address(address: &str, network: BtcNetwork) -> Result<bool, BtcError> {
    let parsed = address
        .parse::<Address<bitcoin::address::NetworkUnchecked>>()
        .map_err(|e| BtcError::InvalidAddress(format!("failed to parse address: {e}")))?;

    Ok(parsed.is_valid_for_network(network.to_bitcoin_network()))
}
