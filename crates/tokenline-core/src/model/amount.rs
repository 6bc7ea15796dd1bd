//! Arbitrary-precision non-negative token amounts
//!
//! Blockchain token amounts routinely exceed u128 (ERC-20 values are 256-bit
//! integers), so amounts are carried as validated decimal strings end to end
//! and stored as TEXT.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when parsing a token amount
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountParseError {
    /// Amount string is empty
    #[error("amount cannot be empty")]
    Empty,

    /// Amount string contains a non-digit character (signs included)
    #[error("amount contains invalid character '{0}'")]
    InvalidDigit(char),
}

/// A non-negative integer token amount of arbitrary precision
///
/// The inner representation is a canonical decimal string: digits only, no
/// sign, no leading zeros (except the single digit "0"). Canonical form makes
/// equality and ordering well defined without a big-integer dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenAmount(String);

impl TokenAmount {
    /// The zero amount
    pub fn zero() -> Self {
        TokenAmount("0".to_string())
    }

    /// Get the canonical decimal string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this amount is zero
    pub fn is_zero(&self) -> bool {
        self.0 == "0"
    }
}

impl Default for TokenAmount {
    fn default() -> Self {
        TokenAmount::zero()
    }
}

impl FromStr for TokenAmount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AmountParseError::Empty);
        }
        if let Some(ch) = s.chars().find(|c| !c.is_ascii_digit()) {
            return Err(AmountParseError::InvalidDigit(ch));
        }
        let canonical = s.trim_start_matches('0');
        if canonical.is_empty() {
            return Ok(TokenAmount::zero());
        }
        Ok(TokenAmount(canonical.to_string()))
    }
}

impl TryFrom<String> for TokenAmount {
    type Error = AmountParseError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TokenAmount> for String {
    fn from(amount: TokenAmount) -> String {
        amount.0
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        TokenAmount(value.to_string())
    }
}

impl Ord for TokenAmount {
    /// Numeric ordering: canonical form means a longer string is a larger
    /// number, and equal lengths compare digit by digit.
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for TokenAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
