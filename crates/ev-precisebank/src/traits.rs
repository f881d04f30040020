//! Collaborators the engine is wired to.

use crate::coin::{Coin, Coins};
use alloy_primitives::Address;

/// Whole-unit coin ledger the engine converts against.
///
/// The engine only ever passes native-denom coins to the mutating methods.
/// Errors are returned to the engine's caller unchanged.
pub trait NativeLedger {
    /// Error raised by the ledger.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Moves `coins` between two accounts.
    fn transfer(&mut self, from: Address, to: Address, coins: &Coins) -> Result<(), Self::Error>;

    /// Creates `coins` in the account of `module`.
    fn mint(&mut self, module: &str, coins: &Coins) -> Result<(), Self::Error>;

    /// Destroys `coins` held by the account of `module`.
    fn burn(&mut self, module: &str, coins: &Coins) -> Result<(), Self::Error>;

    /// Full balance of `address` in `denom`.
    fn balance(&self, address: Address, denom: &str) -> Coin;

    /// Balances of `address` that are free to move.
    fn spendable_coins(&self, address: Address) -> Coins;

    /// Checks whether `coins` may be sent. Every denom is enabled by default.
    fn is_send_enabled_coins(&self, coins: &[Coin]) -> Result<(), Self::Error> {
        let _ = coins;
        Ok(())
    }
}

/// Resolves module names to their account addresses.
pub trait AccountRegistry {
    /// Returns the address of `module`, `None` when no such module exists.
    fn module_address(&self, module: &str) -> Option<Address>;
}
