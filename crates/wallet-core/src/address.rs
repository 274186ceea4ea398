use serde::{Deserialize, Serialize};

use chain_btc::address::pubkey_to_p2wpkh_address;

use crate::error::WalletError;
use crate::hd::{DerivationPath, ExtendedPublicKey};

/// Which branch of the account an address belongs to.
///
/// Receiving addresses live on chain 0, change addresses on chain 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keychain {
    Receiving,
    Change,
}

impl Keychain {
    /// The chain index used in derivation paths.
    pub fn chain_index(self) -> u32 {
        match self {
            Keychain::Receiving => 0,
            Keychain::Change => 1,
        }
    }
}

/// A derived wallet address.
///
/// A pure function of (account xpub, keychain, index, network): recomputing
/// with the same inputs always yields the same address. The full derivation
/// path and the master fingerprint are recorded so the signing key can be
/// re-derived later without any cached key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAddress {
    pub address: String,
    /// Full path from the master key, e.g. `m/84'/0'/0'/0/3`.
    pub derivation_path: String,
    pub keychain: Keychain,
    pub index: u32,
    pub master_fingerprint: [u8; 4],
}

/// Derive `count` sequential addresses on one keychain, starting at index 0.
///
/// `account_path` is the account-level prefix recorded in each address's
/// full derivation path. The window size is caller-configurable, and the
/// set can be re-derived with a larger `count` for gap-limit rescans.
pub fn derive_address_set(
    account_xpub: &ExtendedPublicKey,
    account_path: &str,
    keychain: Keychain,
    count: u32,
    master_fingerprint: [u8; 4],
) -> Result<Vec<WalletAddress>, WalletError> {
    let chain = keychain.chain_index();
    let mut addresses = Vec::with_capacity(count as usize);

    for index in 0..count {
        let relative: DerivationPath = format!("m/{chain}/{index}")
            .parse()
            .map_err(|e: bip32::Error| WalletError::KeyDerivation(e.to_string()))?;
        let child = account_xpub.derive_public(&relative)?;

        let address =
            pubkey_to_p2wpkh_address(&child.compressed_public_key(), account_xpub.network())?;

        addresses.push(WalletAddress {
            address,
            derivation_path: format!("{account_path}/{chain}/{index}"),
            keychain,
            index,
            master_fingerprint,
        });
    }

    Ok(addresses)
}

/// Derive the receiving window (chain 0).
pub fn derive_receiving_set(
    account_xpub: &ExtendedPublicKey,
    account_path: &str,
    count: u32,
    master_fingerprint: [u8; 4],
) -> Result<Vec<WalletAddress>, WalletError> {
    derive_address_set(
        account_xpub,
        account_path,
        Keychain::Receiving,
        count,
        master_fingerprint,
    )
}

/// Derive the change window (chain 1).
pub fn derive_change_set(
    account_xpub: &ExtendedPublicKey,
    account_path: &str,
    count: u32,
    master_fingerprint: [u8; 4],
) -> Result<Vec<WalletAddress>, WalletError> {
    derive_address_set(
        account_xpub,
        account_path,
        Keychain::Change,
        count,
        master_fingerprint,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hd::{bip84_account_path, ExtendedPrivateKey};
    use crate::mnemonic::{derive_seed, MnemonicPhrase};
    use chain_btc::network::BtcNetwork;

    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn account_fixture(network: BtcNetwork) -> (ExtendedPublicKey, String, [u8; 4]) {
        let phrase = MnemonicPhrase::new(TEST_MNEMONIC).unwrap();
        let seed = derive_seed(&phrase, "").unwrap();
        let master = ExtendedPrivateKey::master_from_seed(&seed, network).unwrap();
        let account_path = bip84_account_path(network, 0);
        let account = master
            .derive_private(&account_path.parse().unwrap())
            .unwrap();
        (account.to_xpub(), account_path, master.fingerprint())
    }

    #[test]
    fn first_receiving_addresses_match_bip84_vectors() {
        let (xpub, path, fp) = account_fixture(BtcNetwork::Mainnet);
        let set = derive_receiving_set(&xpub, &path, 2, fp).unwrap();

        // Reference vectors from the BIP-84 wallet for this mnemonic.
        assert_eq!(set[0].address, "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu");
        assert_eq!(set[1].address, "bc1qnjg0jd8228aq7egyzacy8cys3knf9xvrerkf9g");
        assert_eq!(set[0].derivation_path, "m/84'/0'/0'/0/0");
        assert_eq!(set[1].derivation_path, "m/84'/0'/0'/0/1");
    }

    #[test]
    fn first_change_address_matches_bip84_vector() {
        let (xpub, path, fp) = account_fixture(BtcNetwork::Mainnet);
        let set = derive_change_set(&xpub, &path, 1, fp).unwrap();

        assert_eq!(set[0].address, "bc1q8c6fshw2dlwun7ekn9qwf37cu2rn755upcp6el");
        assert_eq!(set[0].derivation_path, "m/84'/0'/0'/1/0");
        assert_eq!(set[0].keychain, Keychain::Change);
    }

    #[test]
    fn window_size_is_configurable() {
        let (xpub, path, fp) = account_fixture(BtcNetwork::Mainnet);
        let ten = derive_receiving_set(&xpub, &path, 10, fp).unwrap();
        let twenty = derive_receiving_set(&xpub, &path, 20, fp).unwrap();

        assert_eq!(ten.len(), 10);
        assert_eq!(twenty.len(), 20);
        // A wider window extends the same sequence; it never reshuffles it.
        assert_eq!(&twenty[..10], &ten[..]);
    }

    #[test]
    fn derivation_is_pure() {
        let (xpub, path, fp) = account_fixture(BtcNetwork::Mainnet);
        let a = derive_receiving_set(&xpub, &path, 5, fp).unwrap();
        let b = derive_receiving_set(&xpub, &path, 5, fp).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn receiving_and_change_sets_are_disjoint() {
        let (xpub, path, fp) = account_fixture(BtcNetwork::Mainnet);
        let receiving = derive_receiving_set(&xpub, &path, 10, fp).unwrap();
        let change = derive_change_set(&xpub, &path, 10, fp).unwrap();

        for r in &receiving {
            assert!(change.iter().all(|c| c.address != r.address));
        }
    }

    #[test]
    fn all_addresses_carry_master_fingerprint() {
        let (xpub, path, fp) = account_fixture(BtcNetwork::Mainnet);
        let set = derive_receiving_set(&xpub, &path, 3, fp).unwrap();
        assert!(set.iter().all(|a| a.master_fingerprint == fp));
        assert_eq!(hex::encode(fp), "73c5da0a");
    }

    #[test]
    fn testnet_addresses_use_tb1_prefix() {
        let (xpub, path, fp) = account_fixture(BtcNetwork::Testnet);
        let set = derive_receiving_set(&xpub, &path, 1, fp).unwrap();
        assert!(set[0].address.starts_with("tb1"));
        assert_eq!(set[0].derivation_path, "m/84'/1'/0'/0/0");
    }

    #[test]
    fn keychain_chain_indices() {
        assert_eq!(Keychain::Receiving.chain_index(), 0);
        assert_eq!(Keychain::Change.chain_index(), 1);
    }
}
