use thiserror::Error;

/// Bitcoin chain operation errors.
///
/// Every failure mode a caller may want to branch on is a distinct variant;
/// nothing is collapsed into a catch-all, so the embedding UI can tell
/// "insufficient funds" from "network unreachable" without string matching.
#[derive(Debug, Error)]
pub enum BtcError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("insufficient funds: have {have_sat} sat, need {need_sat} sat")]
    InsufficientFunds { have_sat: u64, need_sat: u64 },

    #[error("fee of {fee_sat} sat exceeds the {amount_sat} sat payment")]
    InvalidAmount { fee_sat: u64, amount_sat: u64 },

    #[error("transaction is not fully signed: {signed} of {total} inputs have a witness")]
    IncompleteSignature { signed: usize, total: usize },

    #[error("transaction build error: {0}")]
    TransactionBuild(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("network error: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_insufficient_funds() {
        let err = BtcError::InsufficientFunds {
            have_sat: 80_000,
            need_sat: 100_000,
        };
        assert_eq!(
            err.to_string(),
            "insufficient funds: have 80000 sat, need 100000 sat"
        );
    }

    #[test]
    fn display_invalid_amount() {
        let err = BtcError::InvalidAmount {
            fee_sat: 14_100,
            amount_sat: 1_000,
        };
        assert_eq!(err.to_string(), "fee of 14100 sat exceeds the 1000 sat payment");
    }

    #[test]
    fn display_incomplete_signature() {
        let err = BtcError::IncompleteSignature { signed: 1, total: 3 };
        assert_eq!(
            err.to_string(),
            "transaction is not fully signed: 1 of 3 inputs have a witness"
        );
    }

    #[test]
    fn display_invalid_address() {
        let err = BtcError::InvalidAddress("bad checksum".into());
        assert_eq!(err.to_string(), "invalid address: bad checksum");
    }

    #[test]
    fn display_network() {
        let err = BtcError::Network("connection refused".into());
        assert_eq!(err.to_string(), "network error: connection refused");
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> =
            Box::new(BtcError::Signing("sighash failed".into()));
        assert!(err.to_string().contains("sighash failed"));
    }

    #[test]
    fn variants_are_distinguishable() {
        let funds = BtcError::InsufficientFunds { have_sat: 0, need_sat: 1 };
        let network = BtcError::Network("timeout".into());
        assert!(matches!(funds, BtcError::InsufficientFunds { .. }));
        assert!(matches!(network, BtcError::Network(_)));
    }
}
