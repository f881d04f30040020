//! # Dual-precision balances
//!
//! This crate lets an EVM that counts value in an 18-decimal denom run on top of
//! a native ledger with coarser precision (e.g. 6 decimals) without changing
//! the native ledger.
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`coin`] | Coin amounts, denom syntax and structural validation |
//! | [`config`] | Immutable denoms, multiplier and reserve module |
//! | [`convert`] | Amount validation and the native/extended split |
//! | [`ledger`] | Per-address sub-unit balances |
//! | [`genesis`] | Import and export of the sub-unit ledger |
//! | [`traits`] | Native ledger and module registry seams |
//! | [`keeper`] | The conversion engine, [`PreciseBank`] |
//! | [`memory`] | In-memory native ledger and module registry |
//!
//! ## Accounting
//!
//! An account's EVM balance is
//! `spendable_native * conversion_multiplier + extended`. The extended part
//! always stays below one multiplier; whole units are swept into the native
//! ledger and paid from the reserve module account. When an account needs more
//! extended units than it holds, one native unit is parked in the reserve and
//! converted.
//!
//! ```
//! use ev_precisebank::{
//!     ConversionConfig, MemoryBank, MemoryExtendedStore, ModuleAccounts, ModulePermission,
//!     PreciseBank,
//! };
//!
//! let modules = ModuleAccounts::new()
//!     .with_module("evm", &[ModulePermission::Minter, ModulePermission::Burner])
//!     .with_module("precisebank", &[]);
//! let mut bank = PreciseBank::new(
//!     ConversionConfig::default(),
//!     MemoryBank::new(modules.clone()),
//!     modules,
//!     MemoryExtendedStore::new(),
//! );
//! bank.mint_coins("evm", &"1000000000001atoken".parse()?)?;
//!
//! let evm = bank.module_address("evm")?;
//! assert_eq!(
//!     bank.get_balance(evm, "atoken")?.to_string(),
//!     "1000000000001atoken"
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod coin;
pub mod config;
pub mod convert;
pub mod error;
pub mod genesis;
pub mod keeper;
pub mod ledger;
pub mod memory;
pub mod traits;

#[cfg(test)]
mod test_utils;

pub use coin::{Coin, Coins, CoinsError};
pub use config::{ConfigError, ConversionConfig};
pub use error::{ExtendedLedgerError, PreciseBankError, PreciseBankResult};
pub use genesis::{GenesisError, GenesisState};
pub use keeper::PreciseBank;
pub use ledger::{ExtendedAccount, ExtendedLedger, ExtendedStore, MemoryExtendedStore};
pub use memory::{BankError, MemoryBank, ModuleAccounts, ModulePermission};
pub use traits::{AccountRegistry, NativeLedger};
