use bitcoin::Network;

/// Default Esplora endpoint for Bitcoin mainnet.
pub const MAINNET_ESPLORA: &str = "https://blockstream.info/api";

/// Default Esplora endpoint for Bitcoin testnet.
pub const TESTNET_ESPLORA: &str = "https://blockstream.info/testnet/api";

/// Default Esplora endpoint for Bitcoin signet.
pub const SIGNET_ESPLORA: &str = "https://mempool.space/signet/api";

/// Supported Bitcoin networks.
///
/// The network is a configuration choice that flows through key
/// serialization, address encoding, and indexer selection; nothing in the
/// engine hard-codes mainnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BtcNetwork {
    Mainnet,
    Testnet,
    Signet,
}

impl BtcNetwork {
    /// Convert to the `bitcoin` crate's `Network` type.
    pub fn to_bitcoin_network(self) -> Network {
        match self {
            BtcNetwork::Mainnet => Network::Bitcoin,
            BtcNetwork::Testnet => Network::Testnet,
            BtcNetwork::Signet => Network::Signet,
        }
    }

    /// BIP-44 coin type for derivation paths on this network.
    pub fn coin_type(self) -> u32 {
        match self {
            BtcNetwork::Mainnet => 0,
            BtcNetwork::Testnet | BtcNetwork::Signet => 1,
        }
    }

    /// Default Esplora endpoint for this network, for embedding indexer
    /// clients.
    pub fn esplora_url(self) -> &'static str {
        match self {
            BtcNetwork::Mainnet => MAINNET_ESPLORA,
            BtcNetwork::Testnet => TESTNET_ESPLORA,
            BtcNetwork::Signet => SIGNET_ESPLORA,
        }
    }
}

impl std::fmt::Display for BtcNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BtcNetwork::Mainnet => write!(f, "mainnet"),
            BtcNetwork::Testnet => write!(f, "testnet"),
            BtcNetwork::Signet => write!(f, "signet"),
        }
    }
}
