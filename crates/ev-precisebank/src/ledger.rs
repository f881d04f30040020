//! Per-address storage of sub-unit (extended) balances.
//!
//! The [`ExtendedLedger`] adapter sits on top of any [`ExtendedStore`] and
//! enforces that zero balances are never stored: writing zero deletes the key
//! and reading a missing key yields zero.

use crate::error::ExtendedLedgerError;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key-addressable storage backing the extended ledger.
///
/// Implementations only need to behave like a map. Delete-on-zero and address
/// validation are handled by [`ExtendedLedger`].
pub trait ExtendedStore {
    /// Returns the stored amount, if any.
    fn get(&self, address: &Address) -> Option<U256>;

    /// Stores `amount` under `address`, replacing any previous value.
    fn insert(&mut self, address: Address, amount: U256);

    /// Deletes the entry for `address`.
    fn remove(&mut self, address: &Address);

    /// Iterates over every stored entry.
    fn iter(&self) -> Box<dyn Iterator<Item = (Address, U256)> + '_>;
}

/// Address-ordered in-memory store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryExtendedStore {
    entries: BTreeMap<Address, U256>,
}

impl MemoryExtendedStore {
    /// Creates an empty store.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ExtendedStore for MemoryExtendedStore {
    fn get(&self, address: &Address) -> Option<U256> {
        self.entries.get(address).copied()
    }

    fn insert(&mut self, address: Address, amount: U256) {
        self.entries.insert(address, amount);
    }

    fn remove(&mut self, address: &Address) {
        self.entries.remove(address);
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (Address, U256)> + '_> {
        Box::new(self.entries.iter().map(|(address, amount)| (*address, *amount)))
    }
}

/// One extended balance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedAccount {
    /// Owner of the balance.
    pub address: Address,
    /// Extended units held.
    pub balance: U256,
}

impl ExtendedAccount {
    /// Creates a record.
    pub const fn new(address: Address, balance: U256) -> Self {
        Self { address, balance }
    }
}

/// Balance operations over an [`ExtendedStore`].
#[derive(Debug, Clone, Default)]
pub struct ExtendedLedger<S = MemoryExtendedStore> {
    store: S,
}

impl<S: ExtendedStore> ExtendedLedger<S> {
    /// Wraps a store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrows the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the ledger and returns the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Extended balance of `address`, zero when absent.
    pub fn balance(&self, address: &Address) -> U256 {
        self.store.get(address).unwrap_or(U256::ZERO)
    }

    /// Overwrites the balance of `address`. Zero deletes the record.
    pub fn set_balance(
        &mut self,
        address: Address,
        amount: U256,
    ) -> Result<(), ExtendedLedgerError> {
        ensure_valid_address(&address)?;
        self.write(address, amount);
        Ok(())
    }

    /// Credits `amount` to `address`.
    pub fn add_balance(
        &mut self,
        address: Address,
        amount: U256,
    ) -> Result<(), ExtendedLedgerError> {
        ensure_valid_address(&address)?;
        if amount.is_zero() {
            return Ok(());
        }
        let updated = self
            .balance(&address)
            .checked_add(amount)
            .ok_or(ExtendedLedgerError::Overflow(address))?;
        self.write(address, updated);
        Ok(())
    }

    /// Debits `amount` from `address`. Fails without change if the balance is
    /// too small.
    pub fn remove_balance(
        &mut self,
        address: Address,
        amount: U256,
    ) -> Result<(), ExtendedLedgerError> {
        ensure_valid_address(&address)?;
        if amount.is_zero() {
            return Ok(());
        }
        let updated = self.debited(address, amount)?;
        self.write(address, updated);
        Ok(())
    }

    /// Moves `amount` from `from` to `to`.
    ///
    /// Sending zero is a no-op. On failure neither balance changes.
    pub fn send_balance(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ExtendedLedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        ensure_valid_address(&from)?;
        ensure_valid_address(&to)?;

        let from_balance = self.debited(from, amount)?;
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .balance(&to)
            .checked_add(amount)
            .ok_or(ExtendedLedgerError::Overflow(to))?;

        self.write(from, from_balance);
        self.write(to, to_balance);
        Ok(())
    }

    /// Returns the record of `address`, `None` when its balance is zero.
    pub fn account(&self, address: &Address) -> Option<ExtendedAccount> {
        self.store
            .get(address)
            .filter(|balance| !balance.is_zero())
            .map(|balance| ExtendedAccount::new(*address, balance))
    }

    /// Writes a full record. A zero balance deletes it.
    pub fn set_account(&mut self, account: &ExtendedAccount) -> Result<(), ExtendedLedgerError> {
        self.set_balance(account.address, account.balance)
    }

    /// All non-zero records ordered by address.
    pub fn accounts(&self) -> Vec<ExtendedAccount> {
        let mut accounts: Vec<_> = self
            .store
            .iter()
            .filter(|(_, balance)| !balance.is_zero())
            .map(|(address, balance)| ExtendedAccount::new(address, balance))
            .collect();
        accounts.sort_unstable_by_key(|account| account.address);
        accounts
    }

    /// Visits records in address order until `f` returns true.
    pub fn iterate<F>(&self, mut f: F)
    where
        F: FnMut(&ExtendedAccount) -> bool,
    {
        for account in &self.accounts() {
            if f(account) {
                break;
            }
        }
    }

    /// Sum of every stored balance.
    pub fn total(&self) -> U256 {
        self.store
            .iter()
            .fold(U256::ZERO, |acc, (_, balance)| acc.saturating_add(balance))
    }

    fn debited(&self, address: Address, amount: U256) -> Result<U256, ExtendedLedgerError> {
        let balance = self.balance(&address);
        balance
            .checked_sub(amount)
            .ok_or(ExtendedLedgerError::InsufficientFunds {
                address,
                balance,
                requested: amount,
            })
    }

    fn write(&mut self, address: Address, amount: U256) {
        if amount.is_zero() {
            self.store.remove(&address);
        } else {
            self.store.insert(address, amount);
        }
    }
}

impl<S: ExtendedStore + Clone> ExtendedLedger<S> {
    /// Copies the current state for a later [`ExtendedLedger::restore`].
    pub fn snapshot(&self) -> S {
        self.store.clone()
    }

    /// Replaces the state with a snapshot.
    pub fn restore(&mut self, snapshot: S) {
        self.store = snapshot;
    }
}

fn ensure_valid_address(address: &Address) -> Result<(), ExtendedLedgerError> {
    if address.is_zero() {
        return Err(ExtendedLedgerError::InvalidAddress(*address));
    }
    Ok(())
}
