use std::fmt;

use serde::Serialize;
use zeroize::Zeroize;

use chain_btc::indexer::{Indexer, TransactionSummary, MIN_FEE_RATE_SAT_VBYTE};
use chain_btc::network::BtcNetwork;
use chain_btc::signer::sign_transaction;
use chain_btc::transaction::build_transaction;
use chain_btc::utxo::{select_coins, PaymentTarget, Utxo};

use crate::address::{derive_change_set, derive_receiving_set, WalletAddress};
use crate::error::WalletError;
use crate::hd::{bip84_account_path, DerivationPath, ExtendedPrivateKey, ExtendedPublicKey};
use crate::mnemonic::{derive_seed, generate_mnemonic, MnemonicPhrase, WordCount};

/// Wallet construction parameters.
///
/// Nothing here is hard-coded in the engine: network, phrase length,
/// account number and the address window are all configuration.
#[derive(Clone)]
pub struct WalletConfig {
    pub network: BtcNetwork,
    pub word_count: WordCount,
    /// BIP-39 passphrase, empty by default.
    pub passphrase: String,
    /// BIP-84 account number.
    pub account: u32,
    /// How many receiving and change addresses to derive up front.
    pub address_window: u32,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            network: BtcNetwork::Mainnet,
            word_count: WordCount::Words12,
            passphrase: String::new(),
            account: 0,
            address_window: 10,
        }
    }
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field("network", &self.network)
            .field("word_count", &self.word_count)
            .field("account", &self.account)
            .field("address_window", &self.address_window)
            .finish_non_exhaustive()
    }
}

/// Read-only view of the session for the presentation layer.
///
/// Contains no private key material; the mnemonic is included because the
/// UI must be able to show the recovery phrase.
#[derive(Debug, Clone, Serialize)]
pub struct WalletSnapshot {
    pub mnemonic: String,
    pub xpub: String,
    pub master_fingerprint: String,
    pub network: String,
    pub receiving_addresses: Vec<WalletAddress>,
    pub change_addresses: Vec<WalletAddress>,
    pub utxos: Vec<Utxo>,
    pub transactions: Vec<TransactionSummary>,
    pub balance_sat: u64,
}

/// An in-memory wallet session.
///
/// The session is an explicit value passed to each operation; there is no
/// ambient singleton holding key material. It owns the master key for its
/// lifetime; per-input signing keys are re-derived on demand and zeroized
/// immediately after use. Nothing in the session is ever persisted.
pub struct WalletSession {
    config: WalletConfig,
    mnemonic: MnemonicPhrase,
    master: ExtendedPrivateKey,
    master_fingerprint: [u8; 4],
    account_path: String,
    account_xpub: ExtendedPublicKey,
    receiving: Vec<WalletAddress>,
    change: Vec<WalletAddress>,
    utxos: Vec<Utxo>,
    transactions: Vec<TransactionSummary>,
}

impl WalletSession {
    /// Create a session from a freshly generated mnemonic.
    pub fn generate(config: WalletConfig) -> Result<Self, WalletError> {
        let mnemonic = generate_mnemonic(config.word_count)?;
        Self::from_phrase(mnemonic, config)
    }

    /// Recover a session from an existing recovery phrase.
    pub fn from_mnemonic(phrase: &str, config: WalletConfig) -> Result<Self, WalletError> {
        Self::from_phrase(MnemonicPhrase::new(phrase)?, config)
    }

    fn from_phrase(mnemonic: MnemonicPhrase, config: WalletConfig) -> Result<Self, WalletError> {
        // The seed lives only for the duration of master derivation and is
        // zeroized when it drops at the end of this scope.
        let seed = derive_seed(&mnemonic, &config.passphrase)?;
        let master = ExtendedPrivateKey::master_from_seed(&seed, config.network)?;

        let master_fingerprint = master.fingerprint();
        let account_path = bip84_account_path(config.network, config.account);
        let parsed: DerivationPath = account_path
            .parse()
            .map_err(|e: bip32::Error| WalletError::KeyDerivation(e.to_string()))?;
        let account_xpub = master.derive_private(&parsed)?.to_xpub();

        let receiving = derive_receiving_set(
            &account_xpub,
            &account_path,
            config.address_window,
            master_fingerprint,
        )?;
        let change = derive_change_set(
            &account_xpub,
            &account_path,
            config.address_window,
            master_fingerprint,
        )?;

        Ok(Self {
            config,
            mnemonic,
            master,
            master_fingerprint,
            account_path,
            account_xpub,
            receiving,
            change,
            utxos: Vec::new(),
            transactions: Vec::new(),
        })
    }

    pub fn network(&self) -> BtcNetwork {
        self.config.network
    }

    pub fn mnemonic(&self) -> &MnemonicPhrase {
        &self.mnemonic
    }

    pub fn xpub_base58(&self) -> String {
        self.account_xpub.to_base58()
    }

    pub fn account_path(&self) -> &str {
        &self.account_path
    }

    pub fn master_fingerprint(&self) -> [u8; 4] {
        self.master_fingerprint
    }

    pub fn receiving_addresses(&self) -> &[WalletAddress] {
        &self.receiving
    }

    pub fn change_addresses(&self) -> &[WalletAddress] {
        &self.change
    }

    pub fn utxos(&self) -> &[Utxo] {
        &self.utxos
    }

    pub fn transactions(&self) -> &[TransactionSummary] {
        &self.transactions
    }

    pub fn balance_sat(&self) -> u64 {
        self.utxos.iter().map(|u| u.value_sat).sum()
    }

    /// Refresh UTXOs and transaction history from the indexer.
    ///
    /// Session state is replaced only after every collaborator call has
    /// succeeded, so a mid-sync network failure leaves the previous
    /// snapshot intact and the call safely retryable.
    pub fn sync<I: Indexer>(&mut self, indexer: &I) -> Result<(), WalletError> {
        let mut utxos = Vec::new();
        let mut transactions = Vec::new();

        for address in self.receiving.iter().chain(self.change.iter()) {
            for found in indexer.utxos_for_address(&address.address)? {
                let script_pubkey = hex::decode(&found.script_pubkey).map_err(|e| {
                    chain_btc::error::BtcError::Network(format!(
                        "indexer returned malformed script for {}: {e}",
                        address.address
                    ))
                })?;
                utxos.push(Utxo {
                    txid: found.txid,
                    vout: found.vout,
                    value_sat: found.value_sat,
                    script_pubkey,
                    address: address.address.clone(),
                    derivation_path: address.derivation_path.clone(),
                });
            }
            transactions.extend(indexer.transactions_for_address(&address.address)?);
        }

        self.utxos = utxos;
        self.transactions = transactions;
        Ok(())
    }

    /// Send `amount_sat` to `destination`: fee-rate fetch, coin selection,
    /// build, sign, broadcast. Returns the txid reported by the network.
    ///
    /// Change goes to the wallet's first change address. Spent inputs are
    /// dropped from the in-memory UTXO set on success.
    pub fn send_payment<I: Indexer>(
        &mut self,
        indexer: &I,
        destination: &str,
        amount_sat: u64,
    ) -> Result<String, WalletError> {
        let change_address = self
            .change
            .first()
            .ok_or(WalletError::NoChangeAddress)?
            .address
            .clone();

        let fee_rate = indexer.fee_rate_sat_vbyte()?.max(MIN_FEE_RATE_SAT_VBYTE);

        let targets = [PaymentTarget {
            address: destination.to_string(),
            amount_sat,
        }];
        let selection = select_coins(&self.utxos, &targets, fee_rate)?;
        let unsigned = build_transaction(&selection, &change_address, self.config.network)?;

        // Re-derive each input's key from the master via its recorded path;
        // the bytes are zeroized as soon as signing is done, success or not.
        let mut keys: Vec<[u8; 32]> = Vec::with_capacity(unsigned.input_paths.len());
        for path in &unsigned.input_paths {
            match self.signing_key_for(path) {
                Ok(key) => keys.push(key),
                Err(e) => {
                    keys.iter_mut().for_each(|k| k.zeroize());
                    return Err(e);
                }
            }
        }
        let signed = sign_transaction(&unsigned, &keys);
        keys.iter_mut().for_each(|k| k.zeroize());
        let signed = signed?;

        let txid = indexer.broadcast(&signed.to_bytes())?;

        self.utxos.retain(|u| {
            !selection
                .inputs
                .iter()
                .any(|spent| spent.txid == u.txid && spent.vout == u.vout)
        });

        Ok(txid)
    }

    fn signing_key_for(&self, path: &str) -> Result<[u8; 32], WalletError> {
        let parsed: DerivationPath = path
            .parse()
            .map_err(|e: bip32::Error| WalletError::KeyDerivation(e.to_string()))?;
        Ok(self.master.derive_private(&parsed)?.private_key_bytes())
    }

    /// Read-only view for the presentation layer.
    pub fn snapshot(&self) -> WalletSnapshot {
        WalletSnapshot {
            mnemonic: self.mnemonic.as_str().to_string(),
            xpub: self.xpub_base58(),
            master_fingerprint: hex::encode(self.master_fingerprint),
            network: self.config.network.to_string(),
            receiving_addresses: self.receiving.clone(),
            change_addresses: self.change.clone(),
            utxos: self.utxos.clone(),
            transactions: self.transactions.clone(),
            balance_sat: self.balance_sat(),
        }
    }
}

impl fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSession")
            .field("network", &self.config.network)
            .field("fingerprint", &hex::encode(self.master_fingerprint))
            .field("receiving", &self.receiving.len())
            .field("change", &self.change.len())
            .field("utxos", &self.utxos.len())
            .finish_non_exhaustive()
    }
}
