//! Coin amounts and their structural validation.
//!
//! Amounts are unsigned by type. A negative amount can only show up in text
//! form, which [`Coin::from_str`] rejects.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Shortest accepted denom, in bytes.
const MIN_DENOM_LEN: usize = 3;

/// Longest accepted denom, in bytes.
const MAX_DENOM_LEN: usize = 128;

/// Errors raised while parsing or validating coins.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoinsError {
    /// Denom does not match `[a-zA-Z][a-zA-Z0-9/:._-]{2,127}`.
    #[error("invalid denom: {0:?}")]
    InvalidDenom(String),
    /// The same denom appears more than once.
    #[error("duplicate denom {0}")]
    DuplicateDenom(String),
    /// Entries are not sorted by denom.
    #[error("denoms are not sorted: {previous} before {next}")]
    Unsorted {
        /// Denom of the earlier entry.
        previous: String,
        /// Denom of the entry that should have come first.
        next: String,
    },
    /// A coin string carried a negative amount.
    #[error("negative coin amount: {0}")]
    NegativeAmount(String),
    /// A coin string could not be parsed.
    #[error("invalid coin expression: {0:?}")]
    Parse(String),
    /// A denom other than the expected one was supplied.
    #[error("unsupported denom {denom}, only {expected} is supported")]
    UnsupportedDenom {
        /// The offending denom.
        denom: String,
        /// The only denom accepted by the caller.
        expected: String,
    },
}

/// Checks a denom against the native ledger's denom syntax.
pub fn validate_denom(denom: &str) -> Result<(), CoinsError> {
    let mut chars = denom.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok =
        chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'));
    if first_ok && rest_ok && (MIN_DENOM_LEN..=MAX_DENOM_LEN).contains(&denom.len()) {
        Ok(())
    } else {
        Err(CoinsError::InvalidDenom(denom.to_string()))
    }
}

/// A single amount of one denom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination identifier.
    pub denom: String,
    /// Amount in the smallest unit of `denom`.
    pub amount: U256,
}

impl Coin {
    /// Creates a coin. The denom is not validated.
    pub fn new(denom: impl Into<String>, amount: U256) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Creates a zero-valued coin of `denom`.
    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, U256::ZERO)
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = CoinsError;

    /// Parses `"<amount><denom>"`, e.g. `"1500atoken"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('-') {
            return Err(CoinsError::NegativeAmount(s.to_string()));
        }

        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| CoinsError::Parse(s.to_string()))?;
        let (amount, denom) = s.split_at(split);
        if amount.is_empty() {
            return Err(CoinsError::Parse(s.to_string()));
        }

        let amount =
            U256::from_str_radix(amount, 10).map_err(|_| CoinsError::Parse(s.to_string()))?;
        validate_denom(denom)?;
        Ok(Self::new(denom, amount))
    }
}

/// An ordered list of coins as supplied by a caller.
///
/// `Coins` keeps its entries exactly as given so that malformed input can be
/// detected by [`Coins::validate`] instead of being silently repaired.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// An empty set of coins.
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Wraps the given entries without sorting or validating them.
    pub fn new(coins: Vec<Coin>) -> Self {
        Self(coins)
    }

    /// A single-denom set; empty when `amount` is zero.
    pub fn single(denom: impl Into<String>, amount: U256) -> Self {
        if amount.is_zero() {
            Self::empty()
        } else {
            Self(vec![Coin::new(denom, amount)])
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Coin> {
        self.0.iter()
    }

    /// Borrows the entries.
    pub fn as_slice(&self) -> &[Coin] {
        &self.0
    }

    /// Sum of all entries of `denom`, zero if absent.
    pub fn amount_of(&self, denom: &str) -> U256 {
        self.0
            .iter()
            .filter(|coin| coin.denom == denom)
            .fold(U256::ZERO, |acc, coin| acc.saturating_add(coin.amount))
    }

    /// Checks the structural invariants: valid denoms, strictly ascending
    /// order, no duplicates.
    ///
    /// Zero amounts are accepted.
    pub fn validate(&self) -> Result<(), CoinsError> {
        for coin in &self.0 {
            validate_denom(&coin.denom)?;
        }

        for pair in self.0.windows(2) {
            let (previous, next) = (&pair[0].denom, &pair[1].denom);
            if previous == next {
                return Err(CoinsError::DuplicateDenom(next.clone()));
            }
            if previous > next {
                return Err(CoinsError::Unsorted {
                    previous: previous.clone(),
                    next: next.clone(),
                });
            }
        }

        Ok(())
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        Self(vec![coin])
    }
}

impl From<Vec<Coin>> for Coins {
    fn from(coins: Vec<Coin>) -> Self {
        Self(coins)
    }
}

impl<'a> IntoIterator for &'a Coins {
    type Item = &'a Coin;
    type IntoIter = std::slice::Iter<'a, Coin>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, coin) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{coin}")?;
        }
        Ok(())
    }
}

impl FromStr for Coins {
    type Err = CoinsError;

    /// Parses a comma-separated list such as `"5utoken,100atoken"`.
    ///
    /// Order is preserved; run [`Coins::validate`] afterwards.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::empty());
        }
        s.split(',')
            .map(Coin::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}
