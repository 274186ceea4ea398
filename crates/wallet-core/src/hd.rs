use std::fmt;
use std::str::FromStr;

use bip32::{ExtendedKey, Prefix, PublicKey as _, XPrv, XPub};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use chain_btc::network::BtcNetwork;

use crate::error::WalletError;
use crate::mnemonic::Seed;

pub use bip32::{ChildNumber, DerivationPath};

/// HASH160: SHA-256 followed by RIPEMD-160.
fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(Sha256::digest(data)).into()
}

fn key_fingerprint(compressed_pubkey: &[u8; 33]) -> [u8; 4] {
    let mut fp = [0u8; 4];
    fp.copy_from_slice(&hash160(compressed_pubkey)[..4]);
    fp
}

fn private_prefix(network: BtcNetwork) -> Prefix {
    match network {
        BtcNetwork::Mainnet => Prefix::XPRV,
        BtcNetwork::Testnet | BtcNetwork::Signet => Prefix::TPRV,
    }
}

fn public_prefix(network: BtcNetwork) -> Prefix {
    match network {
        BtcNetwork::Mainnet => Prefix::XPUB,
        BtcNetwork::Testnet | BtcNetwork::Signet => Prefix::TPUB,
    }
}

/// The canonical BIP-84 account path for this network and account:
/// `m/84'/0'/account'` on mainnet, `m/84'/1'/account'` otherwise.
pub fn bip84_account_path(network: BtcNetwork, account: u32) -> String {
    format!("m/84'/{}'/{}'", network.coin_type(), account)
}

/// A BIP-32 extended private key bound to a network.
///
/// Owns the key material; `Debug` never prints it.
#[derive(Clone)]
pub struct ExtendedPrivateKey {
    xprv: XPrv,
    network: BtcNetwork,
}

impl ExtendedPrivateKey {
    /// Derive the master key from a seed via HMAC-SHA512.
    ///
    /// The astronomically unlikely invalid-scalar case surfaces as
    /// [`WalletError::KeyDerivation`]; it is never masked.
    pub fn master_from_seed(seed: &Seed, network: BtcNetwork) -> Result<Self, WalletError> {
        let xprv = XPrv::new(seed.as_bytes())
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        Ok(Self { xprv, network })
    }

    /// Walk `path` segment by segment, hardened and non-hardened alike.
    ///
    /// Deterministic: the same (parent, path) always yields the same child.
    pub fn derive_private(&self, path: &DerivationPath) -> Result<Self, WalletError> {
        let mut node = self.xprv.clone();
        for child in path.iter() {
            node = node
                .derive_child(child)
                .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        }
        Ok(Self {
            xprv: node,
            network: self.network,
        })
    }

    /// Strip private material.
    ///
    /// The result computes exactly the same addresses as deriving the
    /// public-only path directly and is incapable of yielding a private key.
    pub fn to_xpub(&self) -> ExtendedPublicKey {
        ExtendedPublicKey {
            xpub: self.xprv.public_key(),
            network: self.network,
        }
    }

    /// Base58Check serialization (`xprv` / `tprv` by network). The returned
    /// string is zeroed on drop.
    pub fn to_base58(&self) -> Zeroizing<String> {
        self.xprv.to_string(private_prefix(self.network))
    }

    /// Parse a Base58Check extended private key, requiring the version
    /// bytes that match `network`.
    pub fn from_base58(encoded: &str, network: BtcNetwork) -> Result<Self, WalletError> {
        let extended = ExtendedKey::from_str(encoded)
            .map_err(|e| WalletError::InvalidEncoding(e.to_string()))?;
        let expected = private_prefix(network);
        if extended.prefix != expected {
            return Err(WalletError::InvalidEncoding(format!(
                "version prefix {} does not match {} on {network}",
                extended.prefix.as_str(),
                expected.as_str(),
            )));
        }
        let xprv = XPrv::try_from(extended)
            .map_err(|e| WalletError::InvalidEncoding(e.to_string()))?;
        Ok(Self { xprv, network })
    }

    /// The raw 32-byte signing key, for handoff to the transaction signer.
    /// Callers must zeroize the bytes as soon as signing completes.
    pub fn private_key_bytes(&self) -> [u8; 32] {
        self.xprv.to_bytes()
    }

    /// The 33-byte compressed public key.
    pub fn compressed_public_key(&self) -> [u8; 33] {
        self.xprv.public_key().public_key().to_bytes()
    }

    /// First four bytes of HASH160 of the compressed public key. For the
    /// master key this is the wallet's immutable master fingerprint.
    pub fn fingerprint(&self) -> [u8; 4] {
        key_fingerprint(&self.compressed_public_key())
    }

    pub fn depth(&self) -> u8 {
        self.xprv.attrs().depth
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.xprv.attrs().parent_fingerprint
    }

    /// Raw child number, hardened bit included.
    pub fn child_index(&self) -> u32 {
        let child = self.xprv.attrs().child_number;
        child.index() | if child.is_hardened() { 1 << 31 } else { 0 }
    }

    pub fn network(&self) -> BtcNetwork {
        self.network
    }
}

impl PartialEq for ExtendedPrivateKey {
    fn eq(&self, other: &Self) -> bool {
        // The compressed public key pins the private scalar; comparing it
        // avoids copying secret bytes.
        let (a, b) = (self.xprv.attrs(), other.xprv.attrs());
        self.network == other.network
            && a.depth == b.depth
            && a.parent_fingerprint == b.parent_fingerprint
            && a.child_number == b.child_number
            && a.chain_code == b.chain_code
            && self.compressed_public_key() == other.compressed_public_key()
    }
}

impl Eq for ExtendedPrivateKey {}

impl fmt::Debug for ExtendedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedPrivateKey")
            .field("network", &self.network)
            .field("depth", &self.depth())
            .field("fingerprint", &hex::encode(self.fingerprint()))
            .finish_non_exhaustive()
    }
}

/// A BIP-32 extended public key bound to a network.
///
/// Carries no private material by construction ("neutered"); only
/// non-hardened children can be derived from it.
#[derive(Clone)]
pub struct ExtendedPublicKey {
    xpub: XPub,
    network: BtcNetwork,
}

impl ExtendedPublicKey {
    /// Walk a non-hardened `path`.
    ///
    /// Any hardened segment is rejected up front with
    /// [`WalletError::HardenedDerivationFromPublic`]; this is a hard
    /// boundary, not a best-effort fallback.
    pub fn derive_public(&self, path: &DerivationPath) -> Result<Self, WalletError> {
        if let Some(hardened) = path.iter().find(|c| c.is_hardened()) {
            return Err(WalletError::HardenedDerivationFromPublic(format!(
                "path segment {}' requires the private parent key",
                hardened.index(),
            )));
        }

        let mut node = self.xpub.clone();
        for child in path.iter() {
            node = node
                .derive_child(child)
                .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        }
        Ok(Self {
            xpub: node,
            network: self.network,
        })
    }

    /// Base58Check serialization (`xpub` / `tpub` by network).
    pub fn to_base58(&self) -> String {
        self.xpub.to_string(public_prefix(self.network))
    }

    /// Parse a Base58Check extended public key, requiring the version bytes
    /// that match `network`.
    pub fn from_base58(encoded: &str, network: BtcNetwork) -> Result<Self, WalletError> {
        let extended = ExtendedKey::from_str(encoded)
            .map_err(|e| WalletError::InvalidEncoding(e.to_string()))?;
        let expected = public_prefix(network);
        if extended.prefix != expected {
            return Err(WalletError::InvalidEncoding(format!(
                "version prefix {} does not match {} on {network}",
                extended.prefix.as_str(),
                expected.as_str(),
            )));
        }
        let xpub = XPub::try_from(extended)
            .map_err(|e| WalletError::InvalidEncoding(e.to_string()))?;
        Ok(Self { xpub, network })
    }

    /// The 33-byte compressed public key.
    pub fn compressed_public_key(&self) -> [u8; 33] {
        self.xpub.public_key().to_bytes()
    }

    /// First four bytes of HASH160 of the compressed public key.
    pub fn fingerprint(&self) -> [u8; 4] {
        key_fingerprint(&self.compressed_public_key())
    }

    pub fn depth(&self) -> u8 {
        self.xpub.attrs().depth
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.xpub.attrs().parent_fingerprint
    }

    /// Raw child number, hardened bit included.
    pub fn child_index(&self) -> u32 {
        let child = self.xpub.attrs().child_number;
        child.index() | if child.is_hardened() { 1 << 31 } else { 0 }
    }

    pub fn network(&self) -> BtcNetwork {
        self.network
    }
}

impl PartialEq for ExtendedPublicKey {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.xpub.attrs(), other.xpub.attrs());
        self.network == other.network
            && a.depth == b.depth
            && a.parent_fingerprint == b.parent_fingerprint
            && a.child_number == b.child_number
            && a.chain_code == b.chain_code
            && self.compressed_public_key() == other.compressed_public_key()
    }
}

impl Eq for ExtendedPublicKey {}

impl fmt::Debug for ExtendedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedPublicKey")
            .field("network", &self.network)
            .field("depth", &self.depth())
            .field("xpub", &self.to_base58())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // BIP-32 test vector 1.
    const VECTOR1_SEED_HEX: &str = "000102030405060708090a0b0c0d0e0f";
    const VECTOR1_XPRV: &str = "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi";
    const VECTOR1_XPUB: &str = "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8";
    // Chain m/0' from the same vector.
    const VECTOR1_M0H_XPUB: &str = "xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw";
    // Chain m/0'/1 from the same vector.
    const VECTOR1_M0H_1_XPUB: &str = "xpub6ASuArnXKPbfEwhqN6e3mwBcDTgzisQN1wXN9BJcM47sSikHjJf3UFHKkNAWbWMiGj7Wf5uMash7SyYq527Hqck2AxYysAA7xmALppuCkwQ";

    #[test]
    fn master_key_matches_bip32_vector1() {
        let seed_bytes = hex::decode(VECTOR1_SEED_HEX).unwrap();
        let xprv = XPrv::new(&seed_bytes).unwrap();
        let master = ExtendedPrivateKey {
            xprv,
            network: BtcNetwork::Mainnet,
        };

        assert_eq!(master.to_base58().as_str(), VECTOR1_XPRV);
        assert_eq!(master.to_xpub().to_base58(), VECTOR1_XPUB);
        assert_eq!(hex::encode(master.fingerprint()), "3442193e");
        assert_eq!(master.depth(), 0);
        assert_eq!(master.parent_fingerprint(), [0u8; 4]);
    }

    fn vector1_master() -> ExtendedPrivateKey {
        let seed_bytes = hex::decode(VECTOR1_SEED_HEX).unwrap();
        ExtendedPrivateKey {
            xprv: XPrv::new(&seed_bytes).unwrap(),
            network: BtcNetwork::Mainnet,
        }
    }

    #[test]
    fn hardened_child_matches_vector1() {
        let master = vector1_master();
        let path: DerivationPath = "m/0'".parse().unwrap();
        let child = master.derive_private(&path).unwrap();
        assert_eq!(child.to_xpub().to_base58(), VECTOR1_M0H_XPUB);
        assert_eq!(child.depth(), 1);
    }

    #[test]
    fn public_and_private_derivation_agree() {
        let master = vector1_master();
        let account = master.derive_private(&"m/0'".parse().unwrap()).unwrap();

        // Neuter then derive publicly vs derive privately then neuter.
        let via_public = account
            .to_xpub()
            .derive_public(&"m/1".parse().unwrap())
            .unwrap();
        let via_private = account
            .derive_private(&"m/1".parse().unwrap())
            .unwrap()
            .to_xpub();

        assert_eq!(via_public, via_private);
        assert_eq!(via_public.to_base58(), VECTOR1_M0H_1_XPUB);
    }

    #[test]
    fn derivation_is_deterministic() {
        let master = vector1_master();
        let path: DerivationPath = "m/0'/1/2'".parse().unwrap();
        let a = master.derive_private(&path).unwrap();
        let b = master.derive_private(&path).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn hardened_derivation_from_public_is_rejected() {
        let master = vector1_master();
        let xpub = master.to_xpub();
        let result = xpub.derive_public(&"m/0'/1".parse().unwrap());
        assert!(matches!(
            result,
            Err(WalletError::HardenedDerivationFromPublic(_))
        ));
    }

    #[test]
    fn xprv_base58_roundtrip() {
        let master = vector1_master();
        let encoded = master.to_base58();
        let decoded = ExtendedPrivateKey::from_base58(&encoded, BtcNetwork::Mainnet).unwrap();
        assert_eq!(decoded, master);
    }

    #[test]
    fn xpub_base58_roundtrip() {
        let master = vector1_master();
        let xpub = master
            .derive_private(&"m/0'".parse().unwrap())
            .unwrap()
            .to_xpub();
        let decoded =
            ExtendedPublicKey::from_base58(&xpub.to_base58(), BtcNetwork::Mainnet).unwrap();
        assert_eq!(decoded, xpub);
    }

    #[test]
    fn corrupted_encoding_is_rejected() {
        let mut encoded = VECTOR1_XPUB.to_string();
        // Flip a character in the checksum region.
        encoded.pop();
        encoded.push('9');
        let result = ExtendedPublicKey::from_base58(&encoded, BtcNetwork::Mainnet);
        assert!(matches!(result, Err(WalletError::InvalidEncoding(_))));
    }

    #[test]
    fn wrong_network_prefix_is_rejected() {
        // A mainnet xpub is not acceptable when a testnet tpub is expected.
        let result = ExtendedPublicKey::from_base58(VECTOR1_XPUB, BtcNetwork::Testnet);
        assert!(matches!(result, Err(WalletError::InvalidEncoding(_))));
    }

    #[test]
    fn private_key_never_parses_as_public() {
        let result = ExtendedPublicKey::from_base58(VECTOR1_XPRV, BtcNetwork::Mainnet);
        assert!(matches!(result, Err(WalletError::InvalidEncoding(_))));
    }

    #[test]
    fn xpub_carries_no_private_material() {
        let master = vector1_master();
        let xpub = master.to_xpub();
        // The serialized form must be a public key encoding.
        assert!(xpub.to_base58().starts_with("xpub"));
        // And its compressed key equals the master's public key.
        assert_eq!(xpub.compressed_public_key(), master.compressed_public_key());
    }

    #[test]
    fn bip84_account_paths() {
        assert_eq!(bip84_account_path(BtcNetwork::Mainnet, 0), "m/84'/0'/0'");
        assert_eq!(bip84_account_path(BtcNetwork::Testnet, 2), "m/84'/1'/2'");
        assert_eq!(bip84_account_path(BtcNetwork::Signet, 0), "m/84'/1'/0'");
        // Canonical form must parse back.
        let path: Result<DerivationPath, _> = bip84_account_path(BtcNetwork::Mainnet, 0).parse();
        assert!(path.is_ok());
    }

    #[test]
    fn testnet_keys_serialize_with_t_prefixes() {
        let seed_bytes = hex::decode(VECTOR1_SEED_HEX).unwrap();
        let master = ExtendedPrivateKey {
            xprv: XPrv::new(&seed_bytes).unwrap(),
            network: BtcNetwork::Testnet,
        };
        assert!(master.to_base58().starts_with("tprv"));
        assert!(master.to_xpub().to_base58().starts_with("tpub"));
    }

    #[test]
    fn master_from_mnemonic_seed_has_known_fingerprint() {
        use crate::mnemonic::{derive_seed, MnemonicPhrase};

        let phrase = MnemonicPhrase::new(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
        )
        .unwrap();
        let seed = derive_seed(&phrase, "").unwrap();
        let master = ExtendedPrivateKey::master_from_seed(&seed, BtcNetwork::Mainnet).unwrap();
        assert_eq!(hex::encode(master.fingerprint()), "73c5da0a");
    }

    #[test]
    fn debug_output_never_contains_key_material() {
        let master = vector1_master();
        let debug = format!("{:?}", master);
        assert!(!debug.contains("xprv9s21"));
    }
}
