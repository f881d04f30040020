//! In-memory native ledger and module registry.
//!
//! These implement [`NativeLedger`] and [`AccountRegistry`] with plain maps so
//! the engine can be driven end to end in tests and benches. They keep no
//! history and perform no persistence.

use crate::{
    coin::{Coin, Coins, CoinsError},
    traits::{AccountRegistry, NativeLedger},
};
use alloy_primitives::{keccak256, Address, U256};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Derives the account address of a module from its name.
///
/// The address is the low 20 bytes of `keccak256(name)`.
pub fn derive_module_address(name: &str) -> Address {
    Address::from_word(keccak256(name.as_bytes()))
}

/// Privileges a module account may hold on the native ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModulePermission {
    /// May create coins.
    Minter,
    /// May destroy coins.
    Burner,
}

/// A registered module account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleAccount {
    /// Module name.
    pub name: String,
    /// Account address derived from the name.
    pub address: Address,
    /// Granted privileges.
    pub permissions: BTreeSet<ModulePermission>,
}

impl ModuleAccount {
    /// Returns true if the module holds `permission`.
    pub fn has_permission(&self, permission: ModulePermission) -> bool {
        self.permissions.contains(&permission)
    }
}

/// Name-keyed registry of module accounts.
#[derive(Debug, Clone, Default)]
pub struct ModuleAccounts {
    modules: BTreeMap<String, ModuleAccount>,
}

impl ModuleAccounts {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self {
            modules: BTreeMap::new(),
        }
    }

    /// Registers `name` with `permissions` and returns the registry.
    pub fn with_module(mut self, name: &str, permissions: &[ModulePermission]) -> Self {
        self.register(name, permissions);
        self
    }

    /// Registers `name` with `permissions`, replacing any earlier entry, and
    /// returns its address.
    pub fn register(&mut self, name: &str, permissions: &[ModulePermission]) -> Address {
        let address = derive_module_address(name);
        self.modules.insert(
            name.to_string(),
            ModuleAccount {
                name: name.to_string(),
                address,
                permissions: permissions.iter().copied().collect(),
            },
        );
        address
    }

    /// Looks up a module by name.
    pub fn get(&self, name: &str) -> Option<&ModuleAccount> {
        self.modules.get(name)
    }
}

impl AccountRegistry for ModuleAccounts {
    fn module_address(&self, module: &str) -> Option<Address> {
        self.get(module).map(|account| account.address)
    }
}

/// Failures of the in-memory native ledger.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BankError {
    /// The coins are malformed.
    #[error(transparent)]
    InvalidCoins(#[from] CoinsError),
    /// The sender cannot cover the amount.
    #[error("insufficient funds: {address} has {spendable}{denom} spendable, needs {requested}{denom}")]
    InsufficientFunds {
        /// Debited account.
        address: Address,
        /// Denom being debited.
        denom: String,
        /// Spendable amount before the debit.
        spendable: U256,
        /// Requested amount.
        requested: U256,
    },
    /// No module of that name is registered.
    #[error("module account {0} does not exist")]
    UnknownModule(String),
    /// The module lacks the privilege for the call.
    #[error("module account {module} does not have {permission:?} permission")]
    Unauthorized {
        /// Module name.
        module: String,
        /// Missing privilege.
        permission: ModulePermission,
    },
    /// A balance or the supply would exceed 256 bits.
    #[error("{denom} amount overflow")]
    Overflow {
        /// Denom that overflowed.
        denom: String,
    },
    /// Transfers of the denom are switched off.
    #[error("{0} transfers are currently disabled")]
    SendDisabled(String),
}

type Balances = BTreeMap<String, U256>;

/// Map-backed [`NativeLedger`].
#[derive(Debug, Clone, Default)]
pub struct MemoryBank {
    modules: ModuleAccounts,
    balances: BTreeMap<Address, Balances>,
    locked: BTreeMap<Address, Balances>,
    supply: Balances,
    send_disabled: BTreeSet<String>,
}

impl MemoryBank {
    /// Creates an empty ledger aware of `modules`.
    pub const fn new(modules: ModuleAccounts) -> Self {
        Self {
            modules,
            balances: BTreeMap::new(),
            locked: BTreeMap::new(),
            supply: BTreeMap::new(),
            send_disabled: BTreeSet::new(),
        }
    }

    /// Registered modules.
    pub const fn modules(&self) -> &ModuleAccounts {
        &self.modules
    }

    /// Credits `coins` to `address` out of thin air, growing the supply.
    pub fn fund_account(&mut self, address: Address, coins: &Coins) -> Result<(), BankError> {
        coins.validate()?;
        for coin in coins {
            self.add_supply(&coin.denom, coin.amount)?;
            self.credit(address, coin)?;
        }
        Ok(())
    }

    /// Credits `coins` to the account of `module`, growing the supply.
    pub fn fund_module(&mut self, module: &str, coins: &Coins) -> Result<(), BankError> {
        let address = self.module(module)?.address;
        self.fund_account(address, coins)
    }

    /// Marks `coin` of `address` as unspendable, on top of anything locked
    /// before.
    pub fn lock(&mut self, address: Address, coin: &Coin) {
        let locked = self
            .locked
            .entry(address)
            .or_default()
            .entry(coin.denom.clone())
            .or_default();
        *locked = locked.saturating_add(coin.amount);
    }

    /// Switches transfers of `denom` off.
    pub fn disable_send(&mut self, denom: &str) {
        self.send_disabled.insert(denom.to_string());
    }

    /// Total amount of `denom` in existence.
    pub fn supply_of(&self, denom: &str) -> U256 {
        self.supply.get(denom).copied().unwrap_or(U256::ZERO)
    }

    fn module(&self, name: &str) -> Result<&ModuleAccount, BankError> {
        self.modules
            .get(name)
            .ok_or_else(|| BankError::UnknownModule(name.to_string()))
    }

    fn authorized(&self, name: &str, permission: ModulePermission) -> Result<Address, BankError> {
        let module = self.module(name)?;
        if !module.has_permission(permission) {
            return Err(BankError::Unauthorized {
                module: name.to_string(),
                permission,
            });
        }
        Ok(module.address)
    }

    fn amount(map: &BTreeMap<Address, Balances>, address: Address, denom: &str) -> U256 {
        map.get(&address)
            .and_then(|balances| balances.get(denom))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    fn spendable(&self, address: Address, denom: &str) -> U256 {
        Self::amount(&self.balances, address, denom)
            .saturating_sub(Self::amount(&self.locked, address, denom))
    }

    fn ensure_spendable(&self, address: Address, coins: &Coins) -> Result<(), BankError> {
        for coin in coins {
            let spendable = self.spendable(address, &coin.denom);
            if spendable < coin.amount {
                return Err(BankError::InsufficientFunds {
                    address,
                    denom: coin.denom.clone(),
                    spendable,
                    requested: coin.amount,
                });
            }
        }
        Ok(())
    }

    fn credit(&mut self, address: Address, coin: &Coin) -> Result<(), BankError> {
        if coin.is_zero() {
            return Ok(());
        }
        let balance = self
            .balances
            .entry(address)
            .or_default()
            .entry(coin.denom.clone())
            .or_default();
        *balance = balance.checked_add(coin.amount).ok_or_else(|| BankError::Overflow {
            denom: coin.denom.clone(),
        })?;
        Ok(())
    }

    // callers check spendable balances first
    fn debit(&mut self, address: Address, coin: &Coin) {
        let Some(balances) = self.balances.get_mut(&address) else {
            return;
        };
        if let Some(balance) = balances.get_mut(&coin.denom) {
            *balance = balance.saturating_sub(coin.amount);
            if balance.is_zero() {
                balances.remove(&coin.denom);
            }
        }
        if balances.is_empty() {
            self.balances.remove(&address);
        }
    }

    fn add_supply(&mut self, denom: &str, amount: U256) -> Result<(), BankError> {
        let supply = self.supply.entry(denom.to_string()).or_default();
        *supply = supply.checked_add(amount).ok_or_else(|| BankError::Overflow {
            denom: denom.to_string(),
        })?;
        Ok(())
    }
}

impl NativeLedger for MemoryBank {
    type Error = BankError;

    fn transfer(&mut self, from: Address, to: Address, coins: &Coins) -> Result<(), Self::Error> {
        coins.validate()?;
        self.ensure_spendable(from, coins)?;
        if from == to {
            return Ok(());
        }
        for coin in coins {
            if Self::amount(&self.balances, to, &coin.denom)
                .checked_add(coin.amount)
                .is_none()
            {
                return Err(BankError::Overflow {
                    denom: coin.denom.clone(),
                });
            }
        }
        for coin in coins {
            self.debit(from, coin);
            self.credit(to, coin)?;
        }
        Ok(())
    }

    fn mint(&mut self, module: &str, coins: &Coins) -> Result<(), Self::Error> {
        let address = self.authorized(module, ModulePermission::Minter)?;
        self.fund_account(address, coins)
    }

    fn burn(&mut self, module: &str, coins: &Coins) -> Result<(), Self::Error> {
        let address = self.authorized(module, ModulePermission::Burner)?;
        coins.validate()?;
        self.ensure_spendable(address, coins)?;
        for coin in coins {
            self.debit(address, coin);
            let supply = self.supply.entry(coin.denom.clone()).or_default();
            *supply = supply.saturating_sub(coin.amount);
        }
        Ok(())
    }

    fn balance(&self, address: Address, denom: &str) -> Coin {
        Coin::new(denom, Self::amount(&self.balances, address, denom))
    }

    fn spendable_coins(&self, address: Address) -> Coins {
        let Some(balances) = self.balances.get(&address) else {
            return Coins::empty();
        };
        balances
            .keys()
            .map(|denom| Coin::new(denom.clone(), self.spendable(address, denom)))
            .filter(|coin| !coin.is_zero())
            .collect::<Vec<_>>()
            .into()
    }

    fn is_send_enabled_coins(&self, coins: &[Coin]) -> Result<(), Self::Error> {
        match coins.iter().find(|coin| self.send_disabled.contains(&coin.denom)) {
            Some(coin) => Err(BankError::SendDisabled(coin.denom.clone())),
            None => Ok(()),
        }
    }
}
