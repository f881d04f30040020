//! The conversion engine.
//!
//! [`PreciseBank`] exposes an EVM-denom view over a native ledger that only
//! tracks whole native units. Sub-unit remainders live in an
//! [`ExtendedLedger`], backed one-for-one by native units parked in the
//! reserve module account.
//!
//! Every mutating operation follows the same pipeline:
//!
//! ```text
//! validate -> split -> native transfer -> top up sender -> extended move -> sweep recipient
//! ```
//!
//! Operations do not roll back on their own. Hosts wrap calls in their own
//! cache context or use [`PreciseBank::transact`].

use crate::{
    coin::{Coin, Coins},
    config::ConversionConfig,
    error::{ExtendedLedgerError, PreciseBankError, PreciseBankResult},
    genesis::{GenesisError, GenesisState},
    ledger::{ExtendedLedger, ExtendedStore, MemoryExtendedStore},
    traits::{AccountRegistry, NativeLedger},
};
use alloy_primitives::{Address, U256};
use tracing::{debug, error, instrument};

type BankResult<T, N> = PreciseBankResult<T, <N as NativeLedger>::Error>;

/// Dual-precision bank over a native ledger `N`, a module registry `A` and an
/// extended-balance store `S`.
#[derive(Debug, Clone)]
pub struct PreciseBank<N, A, S = MemoryExtendedStore> {
    config: ConversionConfig,
    native: N,
    registry: A,
    extended: ExtendedLedger<S>,
}

impl<N, A, S> PreciseBank<N, A, S>
where
    N: NativeLedger,
    A: AccountRegistry,
    S: ExtendedStore,
{
    /// Creates an engine over the given collaborators.
    pub const fn new(config: ConversionConfig, native: N, registry: A, store: S) -> Self {
        Self {
            config,
            native,
            registry,
            extended: ExtendedLedger::new(store),
        }
    }

    /// Conversion parameters.
    pub const fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// The wrapped native ledger.
    pub const fn native(&self) -> &N {
        &self.native
    }

    /// Mutable access to the native ledger, bypassing conversion.
    pub fn native_mut(&mut self) -> &mut N {
        &mut self.native
    }

    /// The module registry.
    pub const fn registry(&self) -> &A {
        &self.registry
    }

    /// The extended-balance ledger.
    pub const fn extended(&self) -> &ExtendedLedger<S> {
        &self.extended
    }

    /// Mutable access to the extended ledger, bypassing conversion.
    ///
    /// Writes made here are not backed by the reserve account.
    pub fn extended_mut(&mut self) -> &mut ExtendedLedger<S> {
        &mut self.extended
    }

    /// Loads extended balances from genesis.
    pub fn init_genesis(&mut self, state: &GenesisState) -> Result<(), GenesisError> {
        self.extended.init_genesis(state)
    }

    /// Exports extended balances.
    pub fn export_genesis(&self) -> GenesisState {
        self.extended.export_genesis()
    }

    /// Resolves a module account address.
    ///
    /// A missing module is a host configuration error and is reported as
    /// [`PreciseBankError::UnknownModule`].
    pub fn module_address(&self, module: &str) -> BankResult<Address, N> {
        self.registry
            .module_address(module)
            .ok_or_else(|| PreciseBankError::UnknownModule(module.to_string()))
    }

    /// Address of the reserve module account.
    pub fn reserve_address(&self) -> BankResult<Address, N> {
        self.module_address(self.config.reserve_module())
    }

    /// Spendable balance of `address` in the EVM denom: spendable native units
    /// times the multiplier plus the extended balance.
    pub fn get_balance(&self, address: Address, denom: &str) -> BankResult<Coin, N> {
        if denom != self.config.evm_denom() {
            return Err(PreciseBankError::UnsupportedDenom {
                denom: denom.to_string(),
                expected: self.config.evm_denom().to_string(),
            });
        }

        let native = self.spendable_native(address);
        let extended = self.extended.balance(&address);
        Ok(Coin::new(
            self.config.evm_denom(),
            self.config.combine(native, extended),
        ))
    }

    /// Sends native coins without any conversion.
    pub fn send_coins(&mut self, from: Address, to: Address, coins: &Coins) -> BankResult<(), N> {
        self.native
            .transfer(from, to, coins)
            .map_err(PreciseBankError::Native)
    }

    /// Native spendable coins of `address`.
    pub fn spendable_coins(&self, address: Address) -> Coins {
        self.native.spendable_coins(address)
    }

    /// Asks the native ledger whether `coins` may be sent.
    pub fn is_send_enabled_coins(&self, coins: &[Coin]) -> BankResult<(), N> {
        self.native
            .is_send_enabled_coins(coins)
            .map_err(PreciseBankError::Native)
    }

    /// Moves an EVM-denom amount from a module account to `recipient`.
    #[instrument(
        level = "debug",
        target = "precisebank",
        skip_all,
        fields(module = %module, recipient = %recipient, amount = %amount)
    )]
    pub fn send_coins_from_module_to_account(
        &mut self,
        module: &str,
        recipient: Address,
        amount: &Coins,
    ) -> BankResult<(), N> {
        let coin = self.config.validate_amount(amount)?;
        let sender = self.module_address(module)?;
        ensure_valid_addresses(&[sender, recipient])?;
        self.ensure_not_reserve(&[sender, recipient])?;

        let (native, remainder) = self.config.split(coin.amount);
        if !native.is_zero() {
            self.native
                .transfer(sender, recipient, &native.into())
                .map_err(PreciseBankError::Native)?;
        }

        self.top_up(sender, remainder)?;
        self.extended.send_balance(sender, recipient, remainder)?;
        self.sweep(recipient)
    }

    /// Moves an EVM-denom amount from `sender` to a module account.
    #[instrument(
        level = "debug",
        target = "precisebank",
        skip_all,
        fields(sender = %sender, module = %module, amount = %amount)
    )]
    pub fn send_coins_from_account_to_module(
        &mut self,
        sender: Address,
        module: &str,
        amount: &Coins,
    ) -> BankResult<(), N> {
        let coin = self.config.validate_amount(amount)?;
        let recipient = self.module_address(module)?;
        ensure_valid_addresses(&[sender, recipient])?;
        self.ensure_not_reserve(&[sender, recipient])?;

        let (native, remainder) = self.config.split(coin.amount);
        if !native.is_zero() {
            self.native
                .transfer(sender, recipient, &native.into())
                .map_err(PreciseBankError::Native)?;
        }

        self.top_up(sender, remainder)?;
        self.extended.send_balance(sender, recipient, remainder)?;
        self.sweep(recipient)
    }

    /// Creates an EVM-denom amount in a module account.
    #[instrument(
        level = "debug",
        target = "precisebank",
        skip_all,
        fields(module = %module, amount = %amount)
    )]
    pub fn mint_coins(&mut self, module: &str, amount: &Coins) -> BankResult<(), N> {
        let coin = self.config.validate_amount(amount)?;
        let address = self.module_address(module)?;
        self.ensure_not_reserve(&[address])?;

        let (native, remainder) = self.config.split(coin.amount);
        if !native.is_zero() {
            self.native
                .mint(module, &native.into())
                .map_err(PreciseBankError::Native)?;
        }

        self.extended.add_balance(address, remainder)?;
        self.sweep(address)
    }

    /// Destroys an EVM-denom amount held by a module account.
    #[instrument(
        level = "debug",
        target = "precisebank",
        skip_all,
        fields(module = %module, amount = %amount)
    )]
    pub fn burn_coins(&mut self, module: &str, amount: &Coins) -> BankResult<(), N> {
        let coin = self.config.validate_amount(amount)?;
        let address = self.module_address(module)?;
        self.ensure_not_reserve(&[address])?;

        let (native, remainder) = self.config.split(coin.amount);
        if !native.is_zero() {
            self.native
                .burn(module, &native.into())
                .map_err(PreciseBankError::Native)?;
        }

        self.top_up(address, remainder)?;
        self.extended.remove_balance(address, remainder)?;
        Ok(())
    }

    /// Converts one native unit of `address` into extended units when its
    /// extended balance is below `needed`.
    ///
    /// The native unit is parked in the reserve account and `address` is
    /// credited with exactly one multiplier of extended units. Nothing changes
    /// if `address` has no spendable native unit.
    pub fn top_up(&mut self, address: Address, needed: U256) -> BankResult<(), N> {
        let balance = self.extended.balance(&address);
        if balance >= needed {
            return Ok(());
        }

        let reserve = self.reserve_address()?;
        self.ensure_not_reserve(&[address])?;

        let one = U256::from(1u64);
        let available = self.spendable_native(address);
        if available < one {
            return Err(PreciseBankError::InsufficientFunds {
                address,
                needed: one,
                available,
            });
        }
        let credited = balance
            .checked_add(self.config.conversion_multiplier())
            .ok_or(ExtendedLedgerError::Overflow(address))?;

        self.native
            .transfer(
                address,
                reserve,
                &Coins::single(self.config.native_denom(), one),
            )
            .map_err(PreciseBankError::Native)?;
        self.extended.set_balance(address, credited)?;

        debug!(
            target: "precisebank",
            %address,
            %needed,
            extended = %credited,
            "converted one native unit to extended balance"
        );
        Ok(())
    }

    /// Converts every whole native unit held in the extended balance of
    /// `address` back into native coins paid out by the reserve.
    ///
    /// Fails with [`PreciseBankError::ReserveExhausted`] without changing
    /// anything if the reserve cannot pay.
    pub fn sweep(&mut self, address: Address) -> BankResult<(), N> {
        let balance = self.extended.balance(&address);
        let (native, remainder) = self.config.split(balance);
        if native.is_zero() {
            return Ok(());
        }

        let reserve = self.reserve_address()?;
        self.ensure_not_reserve(&[address])?;

        let available = self.spendable_native(reserve);
        if available < native.amount {
            error!(
                target: "precisebank",
                %reserve,
                %address,
                needed = %native.amount,
                %available,
                "reserve account cannot back swept extended balance"
            );
            return Err(PreciseBankError::ReserveExhausted {
                reserve,
                needed: native.amount,
                available,
            });
        }

        let swept = native.amount;
        self.native
            .transfer(reserve, address, &native.into())
            .map_err(PreciseBankError::Native)?;
        self.extended.set_balance(address, remainder)?;

        debug!(
            target: "precisebank",
            %address,
            native = %swept,
            extended = %remainder,
            "swept extended balance into native units"
        );
        Ok(())
    }

    fn spendable_native(&self, address: Address) -> U256 {
        self.native
            .spendable_coins(address)
            .amount_of(self.config.native_denom())
    }

    fn ensure_not_reserve(&self, parties: &[Address]) -> BankResult<(), N> {
        let reserve = self.reserve_address()?;
        if parties.contains(&reserve) {
            return Err(PreciseBankError::ReserveAccount(reserve));
        }
        Ok(())
    }
}

/// Rejects the zero address before any ledger is touched.
fn ensure_valid_addresses(parties: &[Address]) -> Result<(), ExtendedLedgerError> {
    match parties.iter().find(|address| address.is_zero()) {
        Some(address) => Err(ExtendedLedgerError::InvalidAddress(*address)),
        None => Ok(()),
    }
}

impl<N, A, S> PreciseBank<N, A, S>
where
    N: NativeLedger + Clone,
    A: AccountRegistry,
    S: ExtendedStore + Clone,
{
    /// Runs `f` and restores both ledgers if it fails.
    ///
    /// This gives a single engine call, or a batch of calls, the all-or-nothing
    /// behaviour a host cache context would otherwise provide.
    pub fn transact<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        let native = self.native.clone();
        let extended = self.extended.snapshot();

        let result = f(self);
        if result.is_err() {
            self.native = native;
            self.extended.restore(extended);
        }
        result
    }
}
