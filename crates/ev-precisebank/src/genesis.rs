//! Import and export of the extended ledger.

use crate::{
    error::ExtendedLedgerError,
    ledger::{ExtendedAccount, ExtendedLedger, ExtendedStore},
};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Initial or exported extended balances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisState {
    /// One record per address holding a non-zero extended balance.
    #[serde(default)]
    pub accounts: Vec<ExtendedAccount>,
}

impl GenesisState {
    /// Creates a state from the given records.
    pub const fn new(accounts: Vec<ExtendedAccount>) -> Self {
        Self { accounts }
    }

    /// Rejects duplicate addresses, the zero address and zero balances.
    pub fn validate(&self) -> Result<(), GenesisError> {
        let mut seen = BTreeSet::new();
        for account in &self.accounts {
            if account.address.is_zero() {
                return Err(GenesisError::ZeroAddress);
            }
            if account.balance.is_zero() {
                return Err(GenesisError::ZeroBalance(account.address));
            }
            if !seen.insert(account.address) {
                return Err(GenesisError::DuplicateAddress(account.address));
            }
        }
        Ok(())
    }
}

/// Genesis validation and import failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenesisError {
    /// The same address appears twice.
    #[error("duplicate account address {0}")]
    DuplicateAddress(Address),
    /// A record is keyed by the zero address.
    #[error("account address cannot be the zero address")]
    ZeroAddress,
    /// A record carries a zero balance.
    #[error("account {0} has a zero balance")]
    ZeroBalance(Address),
    /// Writing a record failed.
    #[error(transparent)]
    Ledger(#[from] ExtendedLedgerError),
}

impl<S: ExtendedStore> ExtendedLedger<S> {
    /// Validates `state` and writes every record.
    ///
    /// Nothing is written when validation fails.
    pub fn init_genesis(&mut self, state: &GenesisState) -> Result<(), GenesisError> {
        state.validate()?;
        for account in &state.accounts {
            self.set_account(account)?;
        }
        Ok(())
    }

    /// Exports every non-zero record in address order.
    pub fn export_genesis(&self) -> GenesisState {
        GenesisState::new(self.accounts())
    }
}
