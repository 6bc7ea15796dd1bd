//! Tokenline Core - domain model for blockchain token transfers
//!
//! This crate provides the foundational types for the Tokenline persistence
//! layer, including:
//! - TokenTransfer model with mint/burn/transfer semantics
//! - Arbitrary-precision non-negative token amounts
//! - Structured error facility with a stable kind taxonomy
//! - Composable filter AST for ad-hoc queries
//! - Logging initialization profiles

pub mod errors;
pub mod filter;
pub mod logging;
pub mod model;

// Re-export commonly used types
pub use errors::{LedgerError, LedgerErrorKind, Result};
pub use filter::{FilterExpr, FilterQuery, SortField};
pub use model::{TokenAmount, TokenTransfer, TransactionRef, TransferType};
