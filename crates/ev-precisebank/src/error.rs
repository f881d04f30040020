//! Error types for the extended ledger and the conversion engine.

use crate::coin::CoinsError;
use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Failures of the extended-balance ledger.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtendedLedgerError {
    /// The zero address cannot own an extended balance.
    #[error("invalid address {0}")]
    InvalidAddress(Address),
    /// A debit exceeded the stored balance.
    #[error("insufficient extended balance for {address}: {balance} < {requested}")]
    InsufficientFunds {
        /// Debited address.
        address: Address,
        /// Balance held before the debit.
        balance: U256,
        /// Amount that was requested.
        requested: U256,
    },
    /// A credit would overflow 256 bits.
    #[error("extended balance overflow for {0}")]
    Overflow(Address),
}

/// Errors returned by [`crate::PreciseBank`] operations.
///
/// `E` is the error type of the wrapped native ledger. Native errors are
/// carried through unchanged.
#[derive(Debug, Error)]
pub enum PreciseBankError<E> {
    /// Input coins failed validation. Nothing was mutated.
    #[error("invalid coins: {0}")]
    InvalidCoins(#[from] CoinsError),
    /// A balance was requested in a denom other than the EVM denom.
    #[error("only evm denom {expected} is supported, got {denom}")]
    UnsupportedDenom {
        /// Requested denom.
        denom: String,
        /// The configured EVM denom.
        expected: String,
    },
    /// An account could not convert a native unit to cover a debit.
    #[error("insufficient funds: {address} needs {needed} native units, spendable {available}")]
    InsufficientFunds {
        /// Account being topped up.
        address: Address,
        /// Native units required.
        needed: U256,
        /// Native units spendable by the account.
        available: U256,
    },
    /// The reserve account cannot pay out a sweep.
    ///
    /// This means the reserve has fallen out of step with the extended
    /// balances it backs; it is never expected during normal operation.
    #[error("reserve account {reserve} cannot fund {needed} native units, holds {available}")]
    ReserveExhausted {
        /// Reserve account address.
        reserve: Address,
        /// Native units the sweep needed.
        needed: U256,
        /// Native units spendable by the reserve.
        available: U256,
    },
    /// A module name did not resolve to an account.
    #[error("module account {0} does not exist")]
    UnknownModule(String),
    /// The reserve account was named as a party of a conversion.
    #[error("reserve account {0} cannot send or receive converted funds")]
    ReserveAccount(Address),
    /// Extended ledger failure.
    #[error(transparent)]
    Ledger(#[from] ExtendedLedgerError),
    /// Native ledger failure, unchanged.
    #[error(transparent)]
    Native(E),
}

impl<E> PreciseBankError<E> {
    /// Returns true for errors that indicate a misconfigured host or a broken
    /// invariant rather than bad user input.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::UnknownModule(_) | Self::ReserveExhausted { .. })
    }

    /// Returns true if the engine rejected the call for lack of funds.
    ///
    /// Native ledger errors are opaque here and always report false.
    pub const fn is_insufficient_funds(&self) -> bool {
        matches!(
            self,
            Self::InsufficientFunds { .. }
                | Self::Ledger(ExtendedLedgerError::InsufficientFunds { .. })
        )
    }
}

/// Result alias for engine operations over a native ledger error `E`.
pub type PreciseBankResult<T, E> = Result<T, PreciseBankError<E>>;
