//! Property tests for the conversion engine.

use alloy_primitives::{Address, U256};
use ev_precisebank::{
    config::DEFAULT_RESERVE_MODULE, Coin, Coins, ConversionConfig, MemoryBank,
    MemoryExtendedStore, ModuleAccounts, ModulePermission, NativeLedger, PreciseBank,
    PreciseBankError,
};
use proptest::prelude::*;

const EVM_MODULE: &str = "evm";
const MULTIPLIER: u128 = 1_000_000_000_000;

type Bank = PreciseBank<MemoryBank, ModuleAccounts>;

fn user(seed: u8) -> Address {
    Address::with_last_byte(seed.max(1))
}

fn atoken(amount: u128) -> Coins {
    Coins::new(vec![Coin::new("atoken", U256::from(amount))])
}

/// Engine with a funded reserve, a funded module and funded users.
fn setup(users: &[Address], native: u64, extended: u128) -> Bank {
    let modules = ModuleAccounts::new()
        .with_module(
            EVM_MODULE,
            &[ModulePermission::Minter, ModulePermission::Burner],
        )
        .with_module(DEFAULT_RESERVE_MODULE, &[]);
    let mut bank = PreciseBank::new(
        ConversionConfig::default(),
        MemoryBank::new(modules.clone()),
        modules,
        MemoryExtendedStore::new(),
    );

    let reserve = bank.reserve_address().unwrap();
    let evm = bank.module_address(EVM_MODULE).unwrap();
    bank.native_mut()
        .fund_account(reserve, &Coins::single("utoken", U256::from(1_000_000u64)))
        .unwrap();
    for address in users.iter().copied().chain([evm]) {
        bank.native_mut()
            .fund_account(address, &Coins::single("utoken", U256::from(native)))
            .unwrap();
        bank.extended_mut()
            .set_balance(address, U256::from(extended % MULTIPLIER))
            .unwrap();
    }
    bank
}

fn value_of(bank: &Bank, addresses: &[Address]) -> U256 {
    addresses.iter().fold(U256::ZERO, |acc, address| {
        acc + bank.get_balance(*address, "atoken").unwrap().amount
    })
}

fn snapshot(bank: &Bank, addresses: &[Address]) -> Vec<(Coin, U256)> {
    addresses
        .iter()
        .map(|address| {
            (
                bank.native().balance(*address, "utoken"),
                bank.extended().balance(address),
            )
        })
        .collect()
}

#[derive(Debug, Clone)]
enum Op {
    ToAccount(u8, u128),
    ToModule(u8, u128),
    Mint(u128),
    Burn(u128),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let amount = 0u128..50 * MULTIPLIER;
    prop_oneof![
        (1u8..4, amount.clone()).prop_map(|(u, a)| Op::ToAccount(u, a)),
        (1u8..4, amount.clone()).prop_map(|(u, a)| Op::ToModule(u, a)),
        amount.clone().prop_map(Op::Mint),
        amount.prop_map(Op::Burn),
    ]
}

proptest! {
    /// Splitting recombines to the original amount and leaves a remainder
    /// below the multiplier.
    #[test]
    fn split_recombines(amount in any::<u128>()) {
        let config = ConversionConfig::default();
        let amount = U256::from(amount);
        let (native, remainder) = config.split(amount);
        prop_assert_eq!(native.denom.as_str(), "utoken");
        prop_assert!(remainder < config.conversion_multiplier());
        prop_assert_eq!(native.amount * config.conversion_multiplier() + remainder, amount);
    }

    /// Sends conserve the value held outside the reserve and move the
    /// reserve exactly in step with the extended ledger. Failed calls inside
    /// `transact` leave everything untouched.
    #[test]
    fn sends_conserve_value(
        ops in prop::collection::vec(op_strategy(), 1..16),
        native in 0u64..80,
        extended in any::<u128>(),
    ) {
        let users = [user(1), user(2), user(3)];
        let mut bank = setup(&users, native, extended);
        let reserve = bank.reserve_address().unwrap();
        let evm = bank.module_address(EVM_MODULE).unwrap();
        let parties = [users[0], users[1], users[2], evm];
        let multiplier = bank.config().conversion_multiplier();

        for op in ops {
            let before = snapshot(&bank, &parties);
            let value_before = value_of(&bank, &parties);
            let reserve_before = bank.native().balance(reserve, "utoken").amount;
            let extended_before = bank.extended().total();

            let (result, delta) = match op {
                Op::ToAccount(u, amount) => (
                    bank.transact(|bank| {
                        bank.send_coins_from_module_to_account(EVM_MODULE, user(u), &atoken(amount))
                    }),
                    None,
                ),
                Op::ToModule(u, amount) => (
                    bank.transact(|bank| {
                        bank.send_coins_from_account_to_module(user(u), EVM_MODULE, &atoken(amount))
                    }),
                    None,
                ),
                Op::Mint(amount) => (
                    bank.transact(|bank| bank.mint_coins(EVM_MODULE, &atoken(amount))),
                    Some((true, amount)),
                ),
                Op::Burn(amount) => (
                    bank.transact(|bank| bank.burn_coins(EVM_MODULE, &atoken(amount))),
                    Some((false, amount)),
                ),
            };

            if result.is_err() {
                prop_assert_eq!(snapshot(&bank, &parties), before);
                prop_assert_eq!(bank.native().balance(reserve, "utoken").amount, reserve_before);
                continue;
            }

            let value_after = value_of(&bank, &parties);
            match delta {
                None => {
                    prop_assert_eq!(value_after, value_before);
                    let reserve_after = bank.native().balance(reserve, "utoken").amount;
                    prop_assert_eq!(
                        reserve_after * multiplier + extended_before,
                        reserve_before * multiplier + bank.extended().total()
                    );
                }
                Some((true, amount)) => {
                    prop_assert_eq!(value_after, value_before + U256::from(amount));
                }
                Some((false, amount)) => {
                    prop_assert_eq!(value_after + U256::from(amount), value_before);
                }
            }

            for address in parties {
                prop_assert!(bank.extended().balance(&address) < multiplier);
            }
        }
    }

    /// Moving nothing changes nothing.
    #[test]
    fn zero_amounts_are_no_ops(native in 0u64..10, extended in any::<u128>(), empty in any::<bool>()) {
        let users = [user(1)];
        let mut bank = setup(&users, native, extended);
        let evm = bank.module_address(EVM_MODULE).unwrap();
        let parties = [users[0], evm];
        let before = snapshot(&bank, &parties);
        let nothing = if empty { Coins::empty() } else { atoken(0) };

        bank.send_coins_from_module_to_account(EVM_MODULE, users[0], &nothing).unwrap();
        bank.send_coins_from_account_to_module(users[0], EVM_MODULE, &nothing).unwrap();
        bank.mint_coins(EVM_MODULE, &nothing).unwrap();
        bank.burn_coins(EVM_MODULE, &nothing).unwrap();

        prop_assert_eq!(snapshot(&bank, &parties), before);
    }

    /// Any denom besides the EVM denom is rejected before anything moves.
    #[test]
    fn foreign_denoms_are_rejected(denom in "[b-z][a-z]{2,10}", amount in 1u64..1_000_000) {
        let users = [user(1)];
        let mut bank = setup(&users, 10, 0);
        let evm = bank.module_address(EVM_MODULE).unwrap();
        let parties = [users[0], evm];
        let before = snapshot(&bank, &parties);
        let coins = Coins::single(denom, U256::from(amount));

        let outcomes = [
            bank.send_coins_from_module_to_account(EVM_MODULE, users[0], &coins),
            bank.send_coins_from_account_to_module(users[0], EVM_MODULE, &coins),
            bank.mint_coins(EVM_MODULE, &coins),
            bank.burn_coins(EVM_MODULE, &coins),
        ];
        for outcome in outcomes {
            prop_assert!(matches!(outcome, Err(PreciseBankError::InvalidCoins(_))));
        }
        prop_assert_eq!(snapshot(&bank, &parties), before);
    }
}
