//! TokenTransfer domain model
//!
//! A TokenTransfer records a single ledger movement (mint, burn, or transfer)
//! observed from a blockchain connector. Records are immutable after creation:
//! the only mutation the persistence layer ever performs is assigning the
//! server-side `created` timestamp at first insert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use super::amount::TokenAmount;

/// The kind of ledger movement a transfer represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferType {
    /// Tokens created out of nothing (no sender)
    Mint,
    /// Tokens destroyed (no recipient)
    Burn,
    /// Tokens moved between two addresses
    Transfer,
}

/// Error raised when parsing a transfer type from its wire string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown transfer type '{0}'")]
pub struct TransferTypeParseError(pub String);

impl FromStr for TransferType {
    type Err = TransferTypeParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mint" => Ok(TransferType::Mint),
            "burn" => Ok(TransferType::Burn),
            "transfer" => Ok(TransferType::Transfer),
            other => Err(TransferTypeParseError(other.to_string())),
        }
    }
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferType::Mint => "mint",
            TransferType::Burn => "burn",
            TransferType::Transfer => "transfer",
        };
        f.write_str(s)
    }
}

/// Reference to the transaction that caused a transfer
///
/// Both fields are optional: transfers reported by a connector without a
/// tracked submitting transaction carry an empty reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRef {
    /// Transaction type (e.g. "token_transfer")
    pub tx_type: Option<String>,

    /// Transaction identifier
    pub id: Option<Uuid>,
}

/// A single token transfer observed from the blockchain
///
/// `(namespace, pool_id, protocol_id)` is the natural de-duplication key:
/// re-delivered connector events must reconcile against the existing row
/// rather than create a second one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenTransfer {
    /// System-generated unique identifier (UUID v7)
    pub local_id: Uuid,

    /// Kind of ledger movement
    pub transfer_type: TransferType,

    /// Token pool this transfer belongs to
    pub pool_id: Uuid,

    /// Token instance identifier within the pool (non-fungible pools)
    pub token_index: Option<String>,

    /// Token URI, if the connector reports one
    pub uri: Option<String>,

    /// Name of the connector plugin that reported this transfer
    pub connector: String,

    /// Namespace partition key
    pub namespace: String,

    /// Sender address (None for mints)
    pub from: Option<String>,

    /// Recipient address (None for burns)
    pub to: Option<String>,

    /// Identifier assigned by the external ledger/connector, unique within
    /// a pool
    pub protocol_id: String,

    /// Correlated off-chain message, if any
    pub message: Option<Uuid>,

    /// Hash of the correlated off-chain message
    pub message_hash: Option<String>,

    /// Reference to the causing transaction
    pub tx: TransactionRef,

    /// Identifier of the source blockchain event
    pub blockchain_event: Option<Uuid>,

    /// Amount moved (arbitrary-precision, non-negative)
    pub amount: TokenAmount,

    /// Server-assigned timestamp, set exactly once at first successful
    /// insert and never updated
    pub created: Option<DateTime<Utc>>,
}

impl TokenTransfer {
    /// Create a new transfer with a fresh local ID and current defaults
    ///
    /// # Arguments
    /// * `transfer_type` - Kind of ledger movement
    /// * `pool_id` - Token pool identifier
    /// * `connector` - Reporting connector plugin name
    /// * `namespace` - Namespace partition key
    /// * `protocol_id` - External-system identifier, unique within the pool
    pub fn new(
        transfer_type: TransferType,
        pool_id: Uuid,
        connector: String,
        namespace: String,
        protocol_id: String,
    ) -> Self {
        Self {
            local_id: Uuid::now_v7(),
            transfer_type,
            pool_id,
            token_index: None,
            uri: None,
            connector,
            namespace,
            from: None,
            to: None,
            protocol_id,
            message: None,
            message_hash: None,
            tx: TransactionRef::default(),
            blockchain_event: None,
            amount: TokenAmount::zero(),
            created: None,
        }
    }

    /// Check if this transfer is a mint
    pub fn is_mint(&self) -> bool {
        self.transfer_type == TransferType::Mint
    }

    /// Check if this transfer is a burn
    pub fn is_burn(&self) -> bool {
        self.transfer_type == TransferType::Burn
    }

    /// Check if this transfer has been persisted (created timestamp set)
    pub fn is_persisted(&self) -> bool {
        self.created.is_some()
    }
}

impl fmt::Display for TokenTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TokenTransfer({}, type={}, pool={}, protocol_id={})",
            self.local_id, self.transfer_type, self.pool_id, self.protocol_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transfer_defaults() {
        let pool = Uuid::now_v7();
        let transfer = TokenTransfer::new(
            TransferType::Transfer,
            pool,
            "erc1155".to_string(),
            "ns1".to_string(),
            "12345".to_string(),
        );

        assert_eq!(transfer.pool_id, pool);
        assert_eq!(transfer.namespace, "ns1");
        assert_eq!(transfer.protocol_id, "12345");
        assert!(transfer.amount.is_zero());
        assert!(!transfer.is_persisted());
        assert!(!transfer.is_mint());
        assert!(!transfer.is_burn());
    }

    #[test]
    fn test_transfer_type_round_trip() {
        for (s, t) in [
            ("mint", TransferType::Mint),
            ("burn", TransferType::Burn),
            ("transfer", TransferType::Transfer),
        ] {
            assert_eq!(s.parse::<TransferType>().unwrap(), t);
            assert_eq!(t.to_string(), s);
        }
        assert!("stake".parse::<TransferType>().is_err());
    }

    #[test]
    fn test_transfer_type_serde_lowercase() {
        let json = serde_json::to_string(&TransferType::Mint).unwrap();
        assert_eq!(json, "\"mint\"");
    }
}
